//! Benchmark: lockless-map performance
//!
//! Maps are sized at twice the key count so every insert fits its chain.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use lockless_map::OpenAddressingMap;
use rand::Rng;
use std::sync::Arc;
use std::thread;

// Number of operations per benchmark
const SMALL_OPS: usize = 1_000;
const MEDIUM_OPS: usize = 10_000;
const LARGE_OPS: usize = 100_000;

// Thread counts to test
const THREAD_COUNTS: &[usize] = &[1, 2, 4, 8];

fn populated(keys: usize) -> OpenAddressingMap<usize, usize> {
    let map = OpenAddressingMap::new(keys * 2);
    for i in 0..keys {
        let _ = map.get_or_insert(i, i * 2);
    }
    map
}

/// Benchmark: Single-threaded insert operations
fn bench_single_thread_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread_insert");

    for &size in &[SMALL_OPS, MEDIUM_OPS, LARGE_OPS] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("lockless-map", size), &size, |b, &size| {
            b.iter(|| {
                let map = OpenAddressingMap::new(size * 2);
                for i in 0..size {
                    let _ = map.get_or_insert(black_box(i), black_box(i * 2));
                }
                map
            });
        });
    }

    group.finish();
}

/// Benchmark: Single-threaded get operations on random keys
fn bench_single_thread_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread_get");

    for &size in &[SMALL_OPS, MEDIUM_OPS, LARGE_OPS] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("lockless-map", size), &size, |b, &size| {
            let map = populated(size);
            let mut rng = rand::rng();
            // Half of the lookups miss.
            let keys: Vec<usize> = (0..size).map(|_| rng.random_range(0..size * 2)).collect();
            b.iter(|| {
                let mut sum = 0;
                for k in &keys {
                    if let Some(v) = map.get(black_box(k)) {
                        sum += v;
                    }
                }
                sum
            });
        });
    }

    group.finish();
}

/// Benchmark: Concurrent insert operations on disjoint keys
fn bench_concurrent_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_insert");
    group.sample_size(20);

    for &threads in THREAD_COUNTS {
        let ops_per_thread = MEDIUM_OPS / threads;
        let total_ops = ops_per_thread * threads;
        group.throughput(Throughput::Elements(total_ops as u64));

        group.bench_with_input(
            BenchmarkId::new("lockless-map", threads),
            &(threads, ops_per_thread),
            |b, &(threads, ops)| {
                b.iter(|| {
                    let map = Arc::new(OpenAddressingMap::new(total_ops * 2));
                    let handles: Vec<_> = (0..threads)
                        .map(|tid| {
                            let map = Arc::clone(&map);
                            thread::spawn(move || {
                                for i in 0..ops {
                                    let key = tid * ops + i;
                                    let _ = map.get_or_insert(black_box(key), black_box(key * 2));
                                }
                            })
                        })
                        .collect();
                    for h in handles {
                        h.join().unwrap();
                    }
                    map
                });
            },
        );
    }

    group.finish();
}

/// Benchmark: Every thread racing for the same keys
fn bench_contended_emplace(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_emplace");
    group.sample_size(20);

    for &threads in THREAD_COUNTS {
        group.throughput(Throughput::Elements((SMALL_OPS * threads) as u64));

        group.bench_with_input(
            BenchmarkId::new("lockless-map", threads),
            &threads,
            |b, &threads| {
                b.iter(|| {
                    let map = Arc::new(OpenAddressingMap::new(SMALL_OPS * 2));
                    let handles: Vec<_> = (0..threads)
                        .map(|_| {
                            let map = Arc::clone(&map);
                            thread::spawn(move || {
                                for i in 0..SMALL_OPS {
                                    let _ = map.get_or_emplace(black_box(i), || vec![i; 4]);
                                }
                            })
                        })
                        .collect();
                    for h in handles {
                        h.join().unwrap();
                    }
                    map
                });
            },
        );
    }

    group.finish();
}

/// Benchmark: Concurrent read operations
fn bench_concurrent_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_reads");
    group.sample_size(20);

    for &threads in THREAD_COUNTS {
        let ops_per_thread = MEDIUM_OPS / threads;
        let total_ops = ops_per_thread * threads;
        group.throughput(Throughput::Elements(total_ops as u64));

        group.bench_with_input(
            BenchmarkId::new("lockless-map", threads),
            &(threads, ops_per_thread),
            |b, &(threads, ops)| {
                let map = Arc::new(populated(total_ops));
                b.iter(|| {
                    let handles: Vec<_> = (0..threads)
                        .map(|_| {
                            let map = Arc::clone(&map);
                            thread::spawn(move || {
                                let mut sum: usize = 0;
                                for i in 0..ops {
                                    if let Some(v) = map.get(&black_box(i)) {
                                        sum += v;
                                    }
                                }
                                sum
                            })
                        })
                        .collect();
                    let sum: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
                    sum
                });
            },
        );
    }

    group.finish();
}

/// Benchmark: Mixed read-write workload (90% reads, 10% writes)
fn bench_mixed_workload(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_90read_10write");
    group.sample_size(20);

    for &threads in THREAD_COUNTS {
        let ops_per_thread = MEDIUM_OPS / threads;
        let total_ops = ops_per_thread * threads;
        group.throughput(Throughput::Elements(total_ops as u64));

        group.bench_with_input(
            BenchmarkId::new("lockless-map", threads),
            &(threads, ops_per_thread),
            |b, &(threads, ops)| {
                // Room for the pre-populated keys plus every write.
                let map = Arc::new(OpenAddressingMap::new(total_ops * 4));
                for i in 0..total_ops {
                    let _ = map.get_or_insert(i, i * 2);
                }
                b.iter(|| {
                    let handles: Vec<_> = (0..threads)
                        .map(|tid| {
                            let map = Arc::clone(&map);
                            thread::spawn(move || {
                                let mut sum: usize = 0;
                                for i in 0..ops {
                                    if i % 10 == 0 {
                                        // 10% writes
                                        let key = total_ops + tid * ops + i;
                                        let _ = map.get_or_insert(black_box(key), black_box(key));
                                    } else if let Some(v) = map.get(&black_box(i)) {
                                        sum += v;
                                    }
                                }
                                sum
                            })
                        })
                        .collect();
                    let sum: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
                    sum
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_thread_insert,
    bench_single_thread_get,
    bench_concurrent_insert,
    bench_contended_emplace,
    bench_concurrent_reads,
    bench_mixed_workload,
);

criterion_main!(benches);
