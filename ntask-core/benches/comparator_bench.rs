#[macro_use]
extern crate criterion;

use criterion::{black_box, Criterion};

use ntask_core::alloc::MemoryBlockPool;
use ntask_core::compare::{bytes_comparator, double_comparator};

const SHORT_KEY: &[u8] = b"user-000042";
const LONG_KEY: &[u8] = b"user-000042/session/2026-10-17T08:00:00Z/clickstream";

fn comparator_benchmark(c: &mut Criterion) {
    c.bench_function("bytes_comparator_prefix", |b| {
        b.iter(|| bytes_comparator(black_box(LONG_KEY), black_box(SHORT_KEY)))
    });

    let left = 3.5f64.to_be_bytes();
    let right = 1.25f64.to_be_bytes();
    c.bench_function("double_comparator", |b| {
        b.iter(|| double_comparator(black_box(&left), black_box(&right)))
    });
}

fn pool_benchmark(c: &mut Criterion) {
    c.bench_function("pool_allocate_1k_blocks", |b| {
        b.iter(|| {
            let mut pool = MemoryBlockPool::new();
            pool.init(1 << 20, 1024).ok();
            for _ in 0..1024 {
                black_box(pool.allocate_min_block().ok());
            }
        })
    });
}

criterion_group!(benches, comparator_benchmark, pool_benchmark);
criterion_main!(benches);
