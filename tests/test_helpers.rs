//! Test helper functions for building barcode sets and indexes

#![allow(dead_code)]

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;
use umibk::{distance, BkTree, EncodedBarcode, IndexConfig, SearchStrategy, UNBOUNDED_FREQ};

/// Parse a barcode literal.
pub fn bc(seq: &str) -> EncodedBarcode {
    seq.parse().expect("valid barcode literal")
}

/// Build an index from string literals.
pub fn build_tree(entries: &[(&str, u32)], strategy: SearchStrategy) -> BkTree {
    let len = entries.first().map(|(seq, _)| seq.len()).unwrap_or(4);
    let config = IndexConfig::new(len).with_strategy(strategy);
    BkTree::build(entries.iter().map(|(seq, freq)| (bc(seq), *freq)), config)
        .expect("index builds")
}

/// Sorted decoded names, for readable assertions.
pub fn names(set: &FxHashSet<EncodedBarcode>) -> Vec<String> {
    let mut out: Vec<String> = set.iter().map(ToString::to_string).collect();
    out.sort();
    out
}

/// `count` distinct random barcodes over `ATCG` with frequencies in 1..=50.
///
/// Barcodes are clustered around a few seeds so radius queries hit.
pub fn random_counts(seed: u64, len: usize, count: usize) -> Vec<(EncodedBarcode, u32)> {
    const BASES: &[u8] = b"ATCG";
    let mut rng = SmallRng::seed_from_u64(seed);
    let seeds: Vec<Vec<u8>> = (0..8)
        .map(|_| (0..len).map(|_| BASES[rng.gen_range(0..4)]).collect())
        .collect();

    let mut seen = FxHashSet::default();
    let mut out = Vec::with_capacity(count);
    while out.len() < count {
        let mut seq = seeds[rng.gen_range(0..seeds.len())].clone();
        for _ in 0..rng.gen_range(0..=3) {
            let pos = rng.gen_range(0..len);
            seq[pos] = BASES[rng.gen_range(0..4)];
        }
        let barcode = EncodedBarcode::encode(&seq).expect("valid bases");
        if seen.insert(barcode.clone()) {
            out.push((barcode, rng.gen_range(1..=50)));
        }
    }
    out
}

/// Brute-force answer to a removal query over `live` entries.
pub fn brute_force_remove(
    live: &[(EncodedBarcode, u32)],
    target: &EncodedBarcode,
    k: u32,
    max_freq: u32,
) -> FxHashSet<EncodedBarcode> {
    live.iter()
        .filter(|(barcode, freq)| {
            let dist = distance(target, barcode).expect("equal lengths");
            (dist <= k && *freq <= max_freq) || (max_freq != UNBOUNDED_FREQ && dist == 0)
        })
        .map(|(barcode, _)| barcode.clone())
        .collect()
}

/// Greedy collapse: highest frequency first, each representative absorbs
/// live barcodes within `k` that are no more frequent than itself.
pub fn collapse(index: &mut BkTree, counts: &[(EncodedBarcode, u32)], k: u32) -> Vec<String> {
    let mut order: Vec<&(EncodedBarcode, u32)> = counts.iter().collect();
    order.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut lines = Vec::new();
    for (rep, freq) in order {
        if !index.contains(rep) {
            continue;
        }
        let members = index.query_and_remove(rep, k, *freq).expect("query succeeds");
        for member in names(&members) {
            lines.push(format!("{rep}\t{member}"));
        }
    }
    lines.sort();
    lines
}
