//! Chunk generation benchmarks
//!
//! Run with: cargo bench --package strata-core --bench chunk_generation

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use std::hint::black_box;
use strata_core::world::{CaveCarver, CaveParams, CellRandom, World, WorldConfig, WorldGenerator};

fn bench_cold_chunk(c: &mut Criterion) {
    let generator = WorldGenerator::with_defaults(42).expect("default generator");

    c.bench_function("generate_chunk_cold", |b| {
        let mut chunk_x = 0i32;
        b.iter(|| {
            chunk_x = chunk_x.wrapping_add(1);
            black_box(generator.generate_chunk(chunk_x))
        });
    });
}

fn bench_cave_mask(c: &mut Criterion) {
    let carver = CaveCarver::new(42, &CaveParams::default());
    let world = WorldConfig::default();

    c.bench_function("cave_mask", |b| {
        let mut chunk_x = 0i32;
        b.iter(|| {
            chunk_x = chunk_x.wrapping_add(1);
            black_box(carver.build_mask(chunk_x * 64, 64, &world, &CellRandom::new(42, chunk_x)))
        });
    });
}

fn bench_pregenerate(c: &mut Criterion) {
    let mut group = c.benchmark_group("pregenerate");
    group.sample_size(10);
    group.throughput(Throughput::Elements(16));
    group.bench_function("16_chunks_parallel", |b| {
        b.iter_batched(
            || World::with_defaults(42).expect("default world"),
            |mut world| black_box(world.pregenerate(0..16)),
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

fn bench_cached_get_block(c: &mut Criterion) {
    let mut world = World::with_defaults(42).expect("default world");
    world.pregenerate(-2..2);

    c.bench_function("get_block_cached", |b| {
        let mut x = -128i32;
        b.iter(|| {
            x = if x >= 127 { -128 } else { x + 1 };
            black_box(world.get_block(x, 200))
        });
    });
}

criterion_group!(
    benches,
    bench_cold_chunk,
    bench_cave_mask,
    bench_pregenerate,
    bench_cached_get_block
);
criterion_main!(benches);
