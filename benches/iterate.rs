use std::hint::black_box;

use bytemuck::{Pod, Zeroable};
use criterion::{criterion_group, criterion_main, Criterion};
use epoch_ecs::{Component, Query, Read, World, Write};

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct Transform {
    x: f32,
    y: f32,
    z: f32,
}
impl Component for Transform {}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct Velocity {
    vx: f32,
    vy: f32,
    vz: f32,
}
impl Component for Velocity {}

fn make_world(n: usize) -> World {
    let mut world = World::new();
    for i in 0..n {
        world
            .spawn((
                Transform { x: i as f32, y: 0.0, z: 0.0 },
                Velocity { vx: 1.0, vy: 0.5, vz: 0.25 },
            ))
            .unwrap();
    }
    world
}

fn iterate_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");

    for &(label, n) in &[("integrate_100k", 100_000usize), ("integrate_1m", 1_000_000)] {
        let mut world = make_world(n);
        let query = Query::<(Write<Transform>, Read<Velocity>)>::new();

        group.bench_function(label, |b| {
            b.iter(|| {
                query
                    .for_chunks(&mut world, |view| {
                        let velocity = view.read::<Velocity>()?;
                        let mut transform = view.write::<Transform>()?;
                        for i in view.begin()..view.end() {
                            transform[i].x += velocity[i].vx;
                            transform[i].y += velocity[i].vy;
                            transform[i].z += velocity[i].vz;
                        }
                        Ok(())
                    })
                    .unwrap();
                black_box(&mut world);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, iterate_benchmark);
criterion_main!(benches);
