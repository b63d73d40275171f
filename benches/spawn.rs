use std::hint::black_box;

use bytemuck::{Pod, Zeroable};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use epoch_ecs::{Component, World};

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

fn populate(world: &mut World, n: usize) {
    for i in 0..n {
        world
            .spawn((
                Transform { x: i as f32, y: 0.0, z: 0.0 },
                Velocity { vx: 1.0, vy: 0.0, vz: 0.0 },
            ))
            .unwrap();
    }
}

fn spawn_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("spawn");

    for &(label, n) in &[("spawn_10k", 10_000usize), ("spawn_100k", 100_000)] {
        group.bench_function(label, |b| {
            b.iter_batched(
                World::new,
                |mut world| {
                    populate(&mut world, n);
                    black_box(world);
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, spawn_benchmark);
criterion_main!(benches);
