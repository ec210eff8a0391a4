use confspin::htm::prelude::*;
use confspin::sync::prelude::*;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use crossbeam_utils::CachePadded;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};

const OPS: u64 = 40_000;

// Each op touches its own padded slot, so transactions rarely conflict.
fn slots(n: usize) -> Vec<CachePadded<AtomicU64>> {
    (0..n).map(|_| CachePadded::new(AtomicU64::new(0))).collect()
}

fn bench_transacted(c: &mut Criterion) {
    let threads = rayon::current_num_threads();
    let mut group = c.benchmark_group("transacted_throughput");
    group.throughput(Throughput::Elements(OPS));

    group.bench_function(BenchmarkId::new("detected", threads), |b| {
        let lock = BinarySpinLock::<DefaultSpin>::new();
        let counters = slots(threads);
        b.iter(|| {
            (0..OPS).into_par_iter().for_each(|i| {
                let slot = &counters[i as usize % threads];
                run_transacted(&lock, || slot.fetch_add(1, Ordering::Relaxed));
            })
        })
    });

    group.bench_function(BenchmarkId::new("always_fallback", threads), |b| {
        let lock = BinarySpinLock::<DefaultSpin>::new();
        let counters = slots(threads);
        let txr = Transactor::new(AlwaysFallback);
        b.iter(|| {
            (0..OPS).into_par_iter().for_each(|i| {
                let slot = &counters[i as usize % threads];
                txr.run(&lock, || slot.fetch_add(1, Ordering::Relaxed));
            })
        })
    });

    group.bench_function(BenchmarkId::new("tristate_detected", threads), |b| {
        let lock = TristateSpinLock::<DefaultSpin>::new();
        let counters = slots(threads);
        b.iter(|| {
            (0..OPS).into_par_iter().for_each(|i| {
                let slot = &counters[i as usize % threads];
                run_transacted(&lock, || slot.fetch_add(1, Ordering::Relaxed));
            })
        })
    });

    group.finish();
}

fn bench_small_alloc(c: &mut Criterion) {
    let mut group = c.benchmark_group("transacted_alloc");
    group.throughput(Throughput::Elements(OPS));

    for size in [16_usize, 65_536].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let lock = BinarySpinLock::<DefaultSpin>::new();
            b.iter(|| {
                (0..OPS).into_par_iter().for_each(|_| {
                    let v: Vec<u8> = run_transacted(&lock, || Vec::with_capacity(size));
                    let mut held = Some(v);
                    run_transacted(&lock, || drop(held.take()));
                })
            })
        });
    }

    group.finish();
}

criterion_group! {
    name = transacted_benches;
    config = Criterion::default().sample_size(20);
    targets = bench_transacted, bench_small_alloc
}
criterion_main!(transacted_benches);
