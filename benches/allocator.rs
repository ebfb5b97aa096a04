use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use block_pool::{BlockPool, ChainedArena, FixedArena, RawAllocator, SystemAlloc};

// Allocate/deallocate pair in steady state: after the first miss the
// pool serves every request from its free list.
fn pair_loop<A: RawAllocator<u8>>(alloc: &A, n: usize) {
    let ptr = alloc.allocate(black_box(n)).unwrap();
    unsafe { alloc.deallocate(ptr, n) };
}

// Timed bulk allocation of n single elements from a fresh allocator,
// cleanup untimed.
fn bulk_alloc_timing<A, F>(make: F, n: usize, iters: u64) -> Duration
where
    A: RawAllocator<u64>,
    F: Fn() -> A,
{
    let mut total = Duration::new(0, 0);

    for _ in 0..iters {
        let alloc = make();
        let mut ptrs = Vec::with_capacity(n);

        let start = Instant::now();
        for _ in 0..n {
            ptrs.push(alloc.allocate(black_box(1)).unwrap());
        }
        total += start.elapsed();

        for ptr in ptrs {
            unsafe { alloc.deallocate(ptr, 1) };
        }
    }

    total
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let _ = env_logger::try_init();

    let mut group = c.benchmark_group("AllocateDeallocate");

    for shift in 0..=16 {
        let size = 8usize << shift;

        group.bench_with_input(BenchmarkId::new("BlockPool", size), &size, |b, &size| {
            let pool = BlockPool::<u8>::new();
            b.iter(|| pair_loop(&pool, size));
        });

        group.bench_with_input(
            BenchmarkId::new("System Allocator", size),
            &size,
            |b, &size| {
                let alloc = SystemAlloc::<u8>::new();
                b.iter(|| pair_loop(&alloc, size));
            },
        );
    }

    group.finish();

    let mut group = c.benchmark_group("BulkAlloc");

    for &n in &[1_000usize, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("BlockPool", n), &n, |b, &n| {
            b.iter_custom(|iters| bulk_alloc_timing(BlockPool::<u64>::new, n, iters));
        });

        group.bench_with_input(BenchmarkId::new("FixedArena", n), &n, |b, &n| {
            b.iter_custom(|iters| bulk_alloc_timing(|| FixedArena::<u64>::with_capacity(n), n, iters));
        });

        group.bench_with_input(BenchmarkId::new("ChainedArena", n), &n, |b, &n| {
            b.iter_custom(|iters| {
                bulk_alloc_timing(|| ChainedArena::<u64>::with_config(2, 4096), n, iters)
            });
        });

        group.bench_with_input(BenchmarkId::new("System Allocator", n), &n, |b, &n| {
            b.iter_custom(|iters| bulk_alloc_timing(SystemAlloc::<u64>::new, n, iters));
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .warm_up_time(std::time::Duration::from_millis(100))
        .sample_size(50);
    targets = criterion_benchmark
}

criterion_main!(benches);
