//! Criterion micro-benchmarks for arena allocation paths.

use std::alloc::Layout;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use unimem::{Arena, ArenaAlloc, ArenaConfig};
use unimem_bench::{bench_arena, fill_concurrently};

const CHUNKS: usize = 10_000;
const CHUNK: usize = 32;

/// Benchmark: reserve a 64MB host arena and release it.
fn bench_arena_new(c: &mut Criterion) {
    c.bench_function("arena_new_64mb", |b| {
        b.iter(|| {
            let arena = Arena::new(ArenaConfig::default()).unwrap();
            black_box(arena.base());
        });
    });
}

/// Benchmark: 10K single-threaded host allocations (mutex path).
fn bench_host_alloc_10k(c: &mut Criterion) {
    c.bench_function("host_alloc_10k", |b| {
        b.iter(|| {
            let arena = bench_arena(CHUNKS, CHUNK);
            let host = arena.host().unwrap();
            for _ in 0..CHUNKS {
                black_box(host.allocate(CHUNK).unwrap());
            }
        });
    });
}

/// Benchmark: 10K single-threaded device-path allocations (atomic path).
fn bench_device_alloc_10k(c: &mut Criterion) {
    c.bench_function("device_alloc_10k", |b| {
        b.iter(|| {
            let arena = bench_arena(CHUNKS, CHUNK);
            let device = arena.device().unwrap();
            for _ in 0..CHUNKS {
                black_box(device.allocate(CHUNK).unwrap());
            }
        });
    });
}

/// Benchmark: 10K aligned typed placements.
fn bench_create_unified_10k(c: &mut Criterion) {
    c.bench_function("create_unified_10k", |b| {
        b.iter(|| {
            let arena = bench_arena(CHUNKS, Layout::new::<[f64; 4]>().size());
            let host = arena.host().unwrap();
            for i in 0..CHUNKS {
                black_box(host.create_unified([i as f64; 4]).unwrap());
            }
        });
    });
}

/// Benchmark: 8 threads draining one arena, half host and half device.
fn bench_contended_fill(c: &mut Criterion) {
    c.bench_function("contended_fill_8_threads", |b| {
        b.iter(|| {
            let arena = bench_arena(CHUNKS * 8, CHUNK);
            black_box(fill_concurrently(&arena, 8, CHUNK));
        });
    });
}

criterion_group!(
    benches,
    bench_arena_new,
    bench_host_alloc_10k,
    bench_device_alloc_10k,
    bench_create_unified_10k,
    bench_contended_fill
);
criterion_main!(benches);
