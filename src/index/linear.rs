//! Brute-force reference index
//!
//! Scans every entry per query. Same contract as the BK-tree, no pruning.

use rustc_hash::FxHashSet;

use crate::barcode::{BarcodeError, EncodedBarcode};

use super::traversal::Metric;
use super::{BarcodeIndex, IndexError, IndexStats, UNBOUNDED_FREQ};

#[derive(Debug)]
struct Entry {
    barcode: EncodedBarcode,
    freq: u32,
    live: bool,
}

/// Linear-scan index over barcodes of one length.
#[derive(Debug)]
pub struct LinearIndex {
    entries: Vec<Entry>,
    live: FxHashSet<EncodedBarcode>,
    barcode_len: usize,
    metric: Metric,
}

impl LinearIndex {
    /// Build from `(barcode, frequency)` pairs.
    pub fn build<I>(freqs: I, barcode_len: usize) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = (EncodedBarcode, u32)>,
    {
        let mut index = Self {
            entries: Vec::new(),
            live: FxHashSet::default(),
            barcode_len,
            metric: Metric::default(),
        };
        for (barcode, freq) in freqs {
            index.insert(barcode, freq)?;
        }
        Ok(index)
    }

    /// Append a live barcode.
    pub fn insert(&mut self, barcode: EncodedBarcode, freq: u32) -> Result<(), IndexError> {
        self.check_len(&barcode)?;
        if freq == 0 {
            return Err(IndexError::ZeroFrequency(barcode.to_string()));
        }
        if !self.live.insert(barcode.clone()) {
            return Err(IndexError::DuplicateBarcode(barcode.to_string()));
        }
        self.entries.push(Entry {
            barcode,
            freq,
            live: true,
        });
        Ok(())
    }

    fn sweep(&mut self, target: &EncodedBarcode, k: u32, max_freq: u32, removed: &mut FxHashSet<EncodedBarcode>) {
        for entry in self.entries.iter_mut().filter(|entry| entry.live) {
            if entry.freq <= max_freq && self.metric.distance(target, &entry.barcode) <= k {
                entry.live = false;
                self.live.remove(&entry.barcode);
                removed.insert(entry.barcode.clone());
            }
        }
    }

    fn check_len(&self, barcode: &EncodedBarcode) -> Result<(), BarcodeError> {
        if barcode.len() != self.barcode_len {
            return Err(BarcodeError::LengthMismatch {
                left: self.barcode_len,
                right: barcode.len(),
            });
        }
        Ok(())
    }
}

impl BarcodeIndex for LinearIndex {
    fn query_and_remove(
        &mut self,
        target: &EncodedBarcode,
        k: u32,
        max_freq: u32,
    ) -> Result<FxHashSet<EncodedBarcode>, IndexError> {
        self.check_len(target)?;
        let mut removed = FxHashSet::default();
        if max_freq != UNBOUNDED_FREQ {
            self.sweep(target, 0, UNBOUNDED_FREQ, &mut removed);
        }
        self.sweep(target, k, max_freq, &mut removed);
        Ok(removed)
    }

    fn near(
        &self,
        target: &EncodedBarcode,
        k: u32,
        max_freq: u32,
    ) -> Result<FxHashSet<EncodedBarcode>, IndexError> {
        self.check_len(target)?;
        let mut found: FxHashSet<EncodedBarcode> = self
            .entries
            .iter()
            .filter(|entry| {
                entry.live
                    && entry.freq <= max_freq
                    && self.metric.distance(target, &entry.barcode) <= k
            })
            .map(|entry| entry.barcode.clone())
            .collect();
        found.insert(target.clone());
        Ok(found)
    }

    fn contains(&self, barcode: &EncodedBarcode) -> bool {
        self.live.contains(barcode)
    }

    fn len(&self) -> usize {
        self.live.len()
    }

    fn stats(&self) -> IndexStats {
        let nodes = self.entries.len();
        IndexStats {
            nodes,
            live: self.live.len(),
            max_depth: usize::from(nodes > 0),
            mean_depth: if nodes > 0 { 1.0 } else { 0.0 },
            max_fanout: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bc(seq: &str) -> EncodedBarcode {
        seq.parse().unwrap()
    }

    #[test]
    fn scan_matches_radius_and_ceiling() {
        let mut index = LinearIndex::build(
            [("AAAA", 5), ("AAAT", 3), ("AATT", 6), ("TTTT", 2)]
                .into_iter()
                .map(|(s, f)| (bc(s), f)),
            4,
        )
        .unwrap();

        let removed = index.query_and_remove(&bc("AAAA"), 2, 5).unwrap();
        let mut names: Vec<String> = removed.iter().map(ToString::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["AAAA", "AAAT"]);
        assert_eq!(index.len(), 2);
        assert!(!index.contains(&bc("AAAT")));
        assert_eq!(index.stats().nodes, 4);
    }

    #[test]
    fn empty_index_near_returns_target() {
        let index = LinearIndex::build(std::iter::empty(), 4).unwrap();
        let found = index.near(&bc("ACGT"), 1, UNBOUNDED_FREQ).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains(&bc("ACGT")));
        assert!(index.is_empty());
    }
}
