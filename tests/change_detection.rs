use bytemuck::{Pod, Zeroable};
use epoch_ecs::{Added, Changed, Component, Query, Read, TermList, World, Write};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
struct Transform {
    x: f32,
    y: f32,
    z: f32,
}
impl Component for Transform {}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
struct Velocity {
    vx: f32,
    vy: f32,
    vz: f32,
}
impl Component for Velocity {}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct Tag;
impl Component for Tag {}

fn count_rows<L: TermList>(world: &mut World) -> usize {
    let mut hits = 0;
    Query::<L>::new()
        .for_chunks(world, |view| {
            hits += view.end() - view.begin();
            Ok(())
        })
        .unwrap();
    hits
}

#[test]
fn added_matches_same_epoch_then_clears() {
    let mut world = World::new();
    world.spawn((Tag,)).unwrap();

    assert_eq!(count_rows::<(Added<Tag>,)>(&mut world), 1);

    world.next_epoch();
    assert_eq!(count_rows::<(Added<Tag>,)>(&mut world), 0);
}

#[test]
fn changed_matches_same_epoch_then_clears() {
    let mut world = World::new();
    const N: usize = 128;
    for i in 0..N {
        world
            .spawn((
                Transform { x: i as f32, y: 0.0, z: 0.0 },
                Velocity { vx: 1.0, vy: 0.0, vz: 0.0 },
            ))
            .unwrap();
    }

    // Write pass bumps the Transform write clocks.
    let dt = 1.0f32;
    Query::<(Write<Transform>, Read<Velocity>)>::new()
        .for_chunks(&mut world, |view| {
            let velocity = view.read::<Velocity>()?;
            let mut transform = view.write::<Transform>()?;
            for i in view.begin()..view.end() {
                transform[i].x += velocity[i].vx * dt;
            }
            Ok(())
        })
        .unwrap();

    // Every row was integrated.
    let mut index = 0usize;
    Query::<(Read<Transform>,)>::new()
        .for_chunks(&mut world, |view| {
            let transform = view.read::<Transform>()?;
            for i in view.begin()..view.end() {
                assert_eq!(transform[i].x, index as f32 + 1.0);
                index += 1;
            }
            Ok(())
        })
        .unwrap();
    assert_eq!(index, N);

    assert_eq!(count_rows::<(Changed<Transform>,)>(&mut world), N);

    world.next_epoch();
    assert_eq!(count_rows::<(Changed<Transform>,)>(&mut world), 0);
}

#[test]
fn reads_do_not_mark_chunks_changed() {
    let mut world = World::new();
    world
        .spawn((Transform { x: 0.0, y: 0.0, z: 0.0 },))
        .unwrap();
    world.next_epoch();

    // A read pass leaves the write clock at its old epoch.
    assert_eq!(count_rows::<(Read<Transform>,)>(&mut world), 1);
    assert_eq!(count_rows::<(Changed<Transform>,)>(&mut world), 0);
}

#[test]
fn writer_declaration_marks_chunks_even_without_mutation() {
    let mut world = World::new();
    world
        .spawn((Transform { x: 0.0, y: 0.0, z: 0.0 },))
        .unwrap();
    world.next_epoch();

    // The declaration is the contract: visiting the chunk is enough.
    Query::<(Write<Transform>,)>::new()
        .for_chunks(&mut world, |_view| Ok(()))
        .unwrap();

    assert_eq!(count_rows::<(Changed<Transform>,)>(&mut world), 1);
}

#[test]
fn changed_filters_chunks_skip_the_write_stamp() {
    let mut world = World::new();
    world
        .spawn((Transform { x: 0.0, y: 0.0, z: 0.0 },))
        .unwrap();
    world.next_epoch();

    // No write happened this epoch, so the filtered pass visits nothing and
    // its own Write declaration stamps nothing.
    Query::<(Changed<Transform>, Write<Transform>)>::new()
        .for_chunks(&mut world, |_view| Ok(()))
        .unwrap();
    assert_eq!(count_rows::<(Changed<Transform>,)>(&mut world), 0);
}

#[test]
fn added_granularity_is_per_chunk() {
    let mut world = World::new();
    world
        .spawn((Transform { x: 0.0, y: 0.0, z: 0.0 },))
        .unwrap();
    world.next_epoch();
    world
        .spawn((Transform { x: 1.0, y: 0.0, z: 0.0 },))
        .unwrap();

    // The second insert restamps the whole chunk: both rows are yielded. The
    // clocks are per chunk, not per row.
    assert_eq!(count_rows::<(Added<Transform>,)>(&mut world), 2);
}

#[test]
fn added_in_new_chunk_does_not_revive_old_chunks() {
    // Capacity 2 rows per chunk: 2 * (4 + 8) = 24 byte budget.
    #[repr(C)]
    #[derive(Clone, Copy, Pod, Zeroable)]
    struct Small(u32);
    impl Component for Small {}

    let mut world = World::with_chunk_budget(24);
    world.spawn((Small(0),)).unwrap();
    world.spawn((Small(1),)).unwrap();
    world.next_epoch();
    world.spawn((Small(2),)).unwrap();

    // The first chunk's add clock is stale; only the new chunk matches.
    assert_eq!(world.chunk_count_for::<(Small,)>(), 2);
    assert_eq!(count_rows::<(Added<Small>,)>(&mut world), 1);
}

#[test]
fn changed_and_added_clocks_are_independent() {
    let mut world = World::new();
    world
        .spawn((Transform { x: 0.0, y: 0.0, z: 0.0 },))
        .unwrap();

    // Fresh spawn: added matches, changed does not (no writer ran).
    assert_eq!(count_rows::<(Added<Transform>,)>(&mut world), 1);
    assert_eq!(count_rows::<(Changed<Transform>,)>(&mut world), 0);

    world.next_epoch();
    Query::<(Write<Transform>,)>::new()
        .for_chunks(&mut world, |_view| Ok(()))
        .unwrap();

    // After a write pass in a later epoch: changed matches, added does not.
    assert_eq!(count_rows::<(Changed<Transform>,)>(&mut world), 1);
    assert_eq!(count_rows::<(Added<Transform>,)>(&mut world), 0);
}
