//! Index construction parameters

use std::sync::Arc;

use crate::cache::DistanceCache;

use super::SearchStrategy;

/// Configuration for building a barcode index.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Bases per barcode; every inserted or queried barcode must match.
    pub barcode_len: usize,
    /// Maximum edit distance the caller intends to query with. Carried for
    /// reference only; queries may use any radius.
    pub max_edits: u32,
    /// Strategy used by `query_and_remove` and `near`.
    pub strategy: SearchStrategy,
    /// Optional distance memo, possibly shared with other indexes.
    pub cache: Option<Arc<DistanceCache>>,
}

impl IndexConfig {
    /// Sequential, uncached configuration for `barcode_len`-base barcodes.
    pub fn new(barcode_len: usize) -> Self {
        Self {
            barcode_len,
            max_edits: 1,
            strategy: SearchStrategy::default(),
            cache: None,
        }
    }

    /// Set the pass-through maximum edit distance.
    pub fn with_max_edits(mut self, max_edits: u32) -> Self {
        self.max_edits = max_edits;
        self
    }

    /// Set the default search strategy.
    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Memoise distances in `cache`.
    pub fn with_cache(mut self, cache: Arc<DistanceCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Number of child slots per node (`barcode_len + 1`).
    pub fn slot_count(&self) -> usize {
        self.barcode_len + 1
    }
}
