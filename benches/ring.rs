//! Ring buffer throughput benchmarks
//!
//! Measures single-context push/pop, slice transfers, and a two-thread
//! producer/consumer hand-off.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use ringpipe::ring::RingBuffer;
use std::hint::black_box;

fn push_pop_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("push_pop");
    group.throughput(Throughput::Elements(1));

    for capacity in [16usize, 256, 4096] {
        let mut ring = RingBuffer::<u64>::new(capacity).unwrap();
        group.bench_with_input(BenchmarkId::new("try_push_try_pop", capacity), &capacity, |b, _| {
            b.iter(|| {
                ring.try_push(black_box(42)).unwrap();
                black_box(ring.try_pop())
            })
        });
    }

    let mut ring = RingBuffer::<u64>::new(256).unwrap();
    for i in 0..256 {
        ring.try_push(i).unwrap();
    }
    group.bench_function("push_overwrite_full", |b| b.iter(|| black_box(ring.push_overwrite(black_box(7)))));

    group.finish();
}

fn slice_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("slices");

    for len in [16usize, 256] {
        let items: Vec<u8> = (0..len).map(|i| i as u8).collect();
        let mut out = vec![0u8; len];
        let mut ring = RingBuffer::<u8>::new(1024).unwrap();

        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::new("push_slice_pop_into", len), &items, |b, items| {
            let (mut prod, mut cons) = ring.split();
            b.iter(|| {
                let pushed = prod.try_push_slice(black_box(items));
                let popped = cons.pop_into(&mut out);
                black_box((pushed, popped))
            })
        });
    }

    group.finish();
}

fn cross_thread_benchmark(c: &mut Criterion) {
    const ITEMS: u64 = 100_000;

    let mut group = c.benchmark_group("cross_thread");
    group.throughput(Throughput::Elements(ITEMS));
    group.sample_size(20);

    for capacity in [64usize, 1024] {
        group.bench_with_input(BenchmarkId::new("spsc", capacity), &capacity, |b, &capacity| {
            b.iter(|| {
                let mut ring = RingBuffer::<u64>::new(capacity).unwrap();
                let (mut prod, mut cons) = ring.split();
                std::thread::scope(|scope| {
                    scope.spawn(move || {
                        for i in 0..ITEMS {
                            while prod.try_push(i).is_err() {
                                std::hint::spin_loop();
                            }
                        }
                    });

                    let mut sum = 0u64;
                    let mut seen = 0;
                    while seen < ITEMS {
                        if let Some(v) = cons.try_pop() {
                            sum = sum.wrapping_add(v);
                            seen += 1;
                        }
                    }
                    black_box(sum)
                })
            })
        });
    }

    group.finish();
}

criterion_group!(benches, push_pop_benchmark, slice_benchmark, cross_thread_benchmark);
criterion_main!(benches);
