//! Shared memo of pairwise barcode distances
//!
//! Entries are keyed by the unordered pair of full barcode values, so two
//! unrelated pairs can never alias each other even when their hashes collide.
//! The map is split into lock shards chosen by the smaller barcode, letting
//! parallel traversals and independent indexes share one cache.

use std::fmt;
use std::hash::BuildHasher;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use rustc_hash::{FxBuildHasher, FxHashMap};
use tracing::debug;

use crate::barcode::{distance_unchecked, BarcodeError, EncodedBarcode};

const DEFAULT_SHARDS: usize = 16;

type Row = FxHashMap<EncodedBarcode, u32>;
type Shard = RwLock<FxHashMap<EncodedBarcode, Row>>;

/// Thread-safe distance memo.
pub struct DistanceCache {
    shards: Box<[Shard]>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "visualize", derive(serde::Serialize))]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that computed a fresh distance.
    pub misses: u64,
    /// Stored pairs.
    pub entries: usize,
}

impl DistanceCache {
    /// Create a cache with the default shard count.
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// Create a cache with `shards` lock shards (at least one).
    pub fn with_shards(shards: usize) -> Self {
        Self {
            shards: (0..shards.max(1))
                .map(|_| RwLock::new(FxHashMap::default()))
                .collect(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Distance between `a` and `b`, computed at most once per pair.
    pub fn distance(&self, a: &EncodedBarcode, b: &EncodedBarcode) -> Result<u32, BarcodeError> {
        if a.len() != b.len() {
            return Err(BarcodeError::LengthMismatch {
                left: a.len(),
                right: b.len(),
            });
        }
        Ok(self.distance_unchecked(a, b))
    }

    pub(crate) fn distance_unchecked(&self, a: &EncodedBarcode, b: &EncodedBarcode) -> u32 {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let shard = &self.shards[self.shard_index(lo)];

        let cached = shard.read().get(lo).and_then(|row| row.get(hi)).copied();
        if let Some(dist) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return dist;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let dist = distance_unchecked(lo, hi);
        shard
            .write()
            .entry(lo.clone())
            .or_default()
            .insert(hi.clone(), dist);
        dist
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.read().values().map(Row::len).sum::<usize>())
            .sum()
    }

    /// Returns `true` when no pair is stored.
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.read().is_empty())
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        let dropped = self.len();
        for shard in self.shards.iter() {
            shard.write().clear();
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        debug!(dropped, "cleared distance cache");
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    fn shard_index(&self, key: &EncodedBarcode) -> usize {
        (FxBuildHasher.hash_one(key) as usize) % self.shards.len()
    }
}

impl Default for DistanceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DistanceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistanceCache")
            .field("shards", &self.shards.len())
            .field("stats", &self.stats())
            .finish()
    }
}
