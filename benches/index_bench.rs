//! Index build and query benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;
use umibk::*;

const LEN: usize = 12;

fn counts(n: usize) -> Vec<(EncodedBarcode, u32)> {
    let mut rng = SmallRng::seed_from_u64(7);
    let mut seen = FxHashSet::default();
    let mut out = Vec::with_capacity(n);
    while out.len() < n {
        let seq: Vec<u8> = (0..LEN).map(|_| b"ATCG"[rng.gen_range(0..4)]).collect();
        let barcode = EncodedBarcode::encode(&seq).unwrap();
        if seen.insert(barcode.clone()) {
            out.push((barcode, rng.gen_range(1..100)));
        }
    }
    out
}

fn benchmark_distance(c: &mut Criterion) {
    let a: EncodedBarcode = "ACGTNACGTACGTTGCANNACGTACGTAGCTAGCATG".parse().unwrap();
    let b: EncodedBarcode = "ACGTAACGTACCTTGCANTACGTACGTAGCTAGCTTG".parse().unwrap();
    c.bench_function("distance_37bp", |bench| {
        bench.iter(|| distance(black_box(&a), black_box(&b)).unwrap())
    });
}

fn benchmark_near(c: &mut Criterion) {
    let data = counts(20_000);
    let targets: Vec<EncodedBarcode> = data.iter().take(64).map(|(b, _)| b.clone()).collect();
    let mut group = c.benchmark_group("near_k2");

    for strategy in SearchStrategy::ALL {
        let config = IndexConfig::new(LEN).with_strategy(strategy);
        let index = BkTree::build(data.iter().cloned(), config).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(strategy), &index, |bench, index| {
            bench.iter(|| {
                for target in &targets {
                    black_box(index.near(target, 2, UNBOUNDED_FREQ).unwrap());
                }
            });
        });
    }
    group.finish();
}

fn benchmark_collapse(c: &mut Criterion) {
    let data = counts(5_000);
    let mut order = data.clone();
    order.sort_by(|a, b| b.1.cmp(&a.1));

    c.bench_function("collapse_5000_k1", |bench| {
        bench.iter(|| {
            let mut index = BkTree::build(data.iter().cloned(), IndexConfig::new(LEN)).unwrap();
            for (rep, freq) in &order {
                if index.contains(rep) {
                    black_box(index.query_and_remove(rep, 1, *freq).unwrap());
                }
            }
        });
    });
}

criterion_group!(benches, benchmark_distance, benchmark_near, benchmark_collapse);
criterion_main!(benches);
