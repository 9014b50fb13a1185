//! Barcode indexes
//!
//! [`BkTree`] arranges barcodes by exact distance from their parent so a
//! radius query only visits children inside the triangle-inequality band.
//! Matches are soft-deleted in place: the liveness flag flips, and the
//! `min_freq` / `subtree_exists` aggregates are recomputed bottom-up on the
//! way out of each query, keeping later pruning exact.
//!
//! [`LinearIndex`] answers the same queries by scanning every entry.

mod config;
mod linear;
mod node;
mod stats;
mod traversal;

pub use config::IndexConfig;
pub use linear::LinearIndex;
pub use node::TreeNode;
pub use stats::IndexStats;
pub use traversal::{SearchStrategy, UnknownStrategy};

use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::{debug, trace};

use crate::barcode::{BarcodeError, EncodedBarcode};

use traversal::{Metric, Query};

/// Frequency ceiling that admits every barcode.
pub const UNBOUNDED_FREQ: u32 = u32::MAX;

/// Errors raised by index construction and queries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// Barcode length does not match the index.
    #[error(transparent)]
    Barcode(#[from] BarcodeError),

    /// Frequencies start at one.
    #[error("barcode {0} has zero frequency")]
    ZeroFrequency(String),

    /// Barcode is already live in the index.
    #[error("barcode {0} is already indexed")]
    DuplicateBarcode(String),
}

/// Operations shared by every barcode index.
pub trait BarcodeIndex {
    /// Remove and return every live barcode within `k` of `target` whose
    /// frequency is at most `max_freq`. With a finite `max_freq`, `target`
    /// itself is removed regardless of its frequency.
    fn query_and_remove(
        &mut self,
        target: &EncodedBarcode,
        k: u32,
        max_freq: u32,
    ) -> Result<FxHashSet<EncodedBarcode>, IndexError>;

    /// Live barcodes within `k` of `target` with frequency at most
    /// `max_freq`, plus `target` itself. Does not modify the index.
    fn near(
        &self,
        target: &EncodedBarcode,
        k: u32,
        max_freq: u32,
    ) -> Result<FxHashSet<EncodedBarcode>, IndexError>;

    /// Whether `barcode` is live.
    fn contains(&self, barcode: &EncodedBarcode) -> bool;

    /// Number of live barcodes.
    fn len(&self) -> usize;

    /// Returns `true` once every barcode is removed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Diagnostic summary.
    fn stats(&self) -> IndexStats;
}

/// BK-tree over encoded barcodes with soft deletion.
#[derive(Debug)]
pub struct BkTree {
    root: Option<Box<TreeNode>>,
    /// Mirrors the live nodes for O(1) membership.
    live: FxHashSet<EncodedBarcode>,
    config: IndexConfig,
    metric: Metric,
    nodes: usize,
}

impl BkTree {
    /// Empty index.
    pub fn new(config: IndexConfig) -> Self {
        let metric = Metric::new(config.cache.clone());
        Self {
            root: None,
            live: FxHashSet::default(),
            config,
            metric,
            nodes: 0,
        }
    }

    /// Build from `(barcode, frequency)` pairs. The first pair becomes the root.
    pub fn build<I>(freqs: I, config: IndexConfig) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = (EncodedBarcode, u32)>,
    {
        let mut tree = Self::new(config);
        for (barcode, freq) in freqs {
            tree.insert(barcode, freq)?;
        }
        debug!(
            nodes = tree.nodes,
            barcode_len = tree.config.barcode_len,
            strategy = %tree.config.strategy,
            cached = tree.config.cache.is_some(),
            "built BK-tree index"
        );
        Ok(tree)
    }

    /// Insert a live barcode.
    pub fn insert(&mut self, barcode: EncodedBarcode, freq: u32) -> Result<(), IndexError> {
        self.check_len(&barcode)?;
        if freq == 0 {
            return Err(IndexError::ZeroFrequency(barcode.to_string()));
        }
        if self.live.contains(&barcode) {
            return Err(IndexError::DuplicateBarcode(barcode.to_string()));
        }

        self.live.insert(barcode.clone());
        self.nodes += 1;

        match self.root.as_deref_mut() {
            None => self.root = Some(Box::new(TreeNode::new(barcode, freq))),
            Some(root) => {
                let depth = root.attach(barcode, freq, &self.metric, self.config.slot_count());
                trace!(depth, freq, "attached barcode");
            }
        }
        Ok(())
    }

    /// [`BarcodeIndex::query_and_remove`] using the configured strategy.
    pub fn query_and_remove(
        &mut self,
        target: &EncodedBarcode,
        k: u32,
        max_freq: u32,
    ) -> Result<FxHashSet<EncodedBarcode>, IndexError> {
        self.query_and_remove_with(self.config.strategy, target, k, max_freq)
    }

    /// [`BarcodeIndex::query_and_remove`] with an explicit strategy.
    pub fn query_and_remove_with(
        &mut self,
        strategy: SearchStrategy,
        target: &EncodedBarcode,
        k: u32,
        max_freq: u32,
    ) -> Result<FxHashSet<EncodedBarcode>, IndexError> {
        self.check_len(target)?;
        let mut removed = FxHashSet::default();
        let max_slot = self.config.barcode_len;

        if let Some(root) = self.root.as_deref_mut() {
            if max_freq != UNBOUNDED_FREQ {
                let exact = Query::new(target, 0, UNBOUNDED_FREQ, max_slot, &self.metric);
                removed.extend(traversal::remove_near(root, &exact, strategy));
            }
            let query = Query::new(target, k, max_freq, max_slot, &self.metric);
            removed.extend(traversal::remove_near(root, &query, strategy));
        }

        for barcode in &removed {
            self.live.remove(barcode);
        }

        trace!(
            barcode = %target,
            k,
            max_freq,
            %strategy,
            removed = removed.len(),
            remaining = self.live.len(),
            "query_and_remove"
        );
        Ok(removed)
    }

    /// [`BarcodeIndex::near`] using the configured strategy.
    pub fn near(
        &self,
        target: &EncodedBarcode,
        k: u32,
        max_freq: u32,
    ) -> Result<FxHashSet<EncodedBarcode>, IndexError> {
        self.near_with(self.config.strategy, target, k, max_freq)
    }

    /// [`BarcodeIndex::near`] with an explicit strategy.
    pub fn near_with(
        &self,
        strategy: SearchStrategy,
        target: &EncodedBarcode,
        k: u32,
        max_freq: u32,
    ) -> Result<FxHashSet<EncodedBarcode>, IndexError> {
        self.check_len(target)?;
        let mut found = FxHashSet::default();
        found.insert(target.clone());

        if let Some(root) = self.root.as_deref() {
            let query = Query::new(target, k, max_freq, self.config.barcode_len, &self.metric);
            found.extend(traversal::collect_near(root, &query, strategy));
        }
        Ok(found)
    }

    /// Whether `barcode` is live.
    pub fn contains(&self, barcode: &EncodedBarcode) -> bool {
        self.live.contains(barcode)
    }

    /// Number of live barcodes.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Returns `true` once every barcode is removed.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Stored nodes, including removed ones.
    pub fn node_count(&self) -> usize {
        self.nodes
    }

    /// Bases per barcode.
    pub fn barcode_len(&self) -> usize {
        self.config.barcode_len
    }

    /// Pass-through maximum edit distance.
    pub fn max_edits(&self) -> u32 {
        self.config.max_edits
    }

    /// Default search strategy.
    pub fn strategy(&self) -> SearchStrategy {
        self.config.strategy
    }

    /// Root node, if any barcode was inserted.
    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_deref()
    }

    /// Diagnostic summary.
    pub fn stats(&self) -> IndexStats {
        IndexStats::from_root(self.root.as_deref(), self.live.len())
    }

    fn check_len(&self, barcode: &EncodedBarcode) -> Result<(), BarcodeError> {
        if barcode.len() != self.config.barcode_len {
            return Err(BarcodeError::LengthMismatch {
                left: self.config.barcode_len,
                right: barcode.len(),
            });
        }
        Ok(())
    }
}

impl BarcodeIndex for BkTree {
    fn query_and_remove(
        &mut self,
        target: &EncodedBarcode,
        k: u32,
        max_freq: u32,
    ) -> Result<FxHashSet<EncodedBarcode>, IndexError> {
        BkTree::query_and_remove(self, target, k, max_freq)
    }

    fn near(
        &self,
        target: &EncodedBarcode,
        k: u32,
        max_freq: u32,
    ) -> Result<FxHashSet<EncodedBarcode>, IndexError> {
        BkTree::near(self, target, k, max_freq)
    }

    fn contains(&self, barcode: &EncodedBarcode) -> bool {
        BkTree::contains(self, barcode)
    }

    fn len(&self) -> usize {
        BkTree::len(self)
    }

    fn stats(&self) -> IndexStats {
        BkTree::stats(self)
    }
}
