//! # BK-tree barcode index for UMI collapsing
//!
//! Near-duplicate barcodes (UMIs) are collapsed by repeatedly picking a
//! high-frequency representative and removing every live barcode within a
//! small edit distance of it. This crate provides the index that answers
//! those "find and remove" queries.
//!
//! ## Core pieces
//!
//! 1. **Codec**: 3 bits per base, with codes chosen so that any two distinct
//!    bases differ in exactly two bits; `N` is a wildcard tracked in a mask
//! 2. **Distance**: popcount over packed words, no per-base loop
//! 3. **BK-tree**: children keyed by exact distance to their parent, pruned
//!    by the triangle inequality and by per-subtree minimum frequency
//! 4. **Soft deletion**: matches are flagged, never unlinked, and subtree
//!    aggregates are recomputed on the way back up
//!
//! ## Usage Example
//!
//! ```
//! use umibk::{BkTree, EncodedBarcode, IndexConfig};
//!
//! let freqs = [("AAAA", 5), ("AAAT", 3), ("TTTT", 2)]
//!     .into_iter()
//!     .map(|(seq, freq)| (seq.parse::<EncodedBarcode>().unwrap(), freq));
//! let mut index = BkTree::build(freqs, IndexConfig::new(4)).unwrap();
//!
//! let target: EncodedBarcode = "AAAA".parse().unwrap();
//! let removed = index.query_and_remove(&target, 1, 5).unwrap();
//! assert_eq!(removed.len(), 2);
//! assert!(index.contains(&"TTTT".parse().unwrap()));
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod barcode; // Codec and distance metric
pub mod cache;   // Shared distance memo
pub mod index;   // BK-tree and reference index

// Re-exports for convenience
pub use barcode::{decode, distance, encode, BarcodeError, EncodedBarcode};
pub use cache::{CacheStats, DistanceCache};
pub use index::{
    BarcodeIndex, BkTree, IndexConfig, IndexError, IndexStats, LinearIndex, SearchStrategy,
    UNBOUNDED_FREQ,
};
