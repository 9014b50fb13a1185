//! BK-tree node
//!
//! A child stored in slot `i` sits at distance exactly `i` from its parent,
//! which is why nodes are soft-deleted instead of unlinked: removing one
//! would strand every descendant keyed against it.

use crate::barcode::EncodedBarcode;

use super::traversal::Metric;

type Slot = Option<Box<TreeNode>>;

/// One barcode in the index plus the aggregates used for pruning.
#[derive(Debug)]
pub struct TreeNode {
    barcode: EncodedBarcode,
    freq: u32,
    /// Barcode has not been removed yet.
    exists: bool,
    /// Self or some descendant is live.
    subtree_exists: bool,
    /// Minimum frequency over self and live descendants; `u32::MAX` if none.
    min_freq: u32,
    /// Empty until the first child arrives, then `barcode_len + 1` slots.
    children: Vec<Slot>,
}

impl TreeNode {
    pub(crate) fn new(barcode: EncodedBarcode, freq: u32) -> Self {
        Self {
            barcode,
            freq,
            exists: true,
            subtree_exists: true,
            min_freq: freq,
            children: Vec::new(),
        }
    }

    /// Barcode held by this node.
    pub fn barcode(&self) -> &EncodedBarcode {
        &self.barcode
    }

    /// Observed frequency.
    pub fn freq(&self) -> u32 {
        self.freq
    }

    /// Whether this barcode is still live.
    #[inline]
    pub fn is_live(&self) -> bool {
        self.exists
    }

    /// Whether this node or any descendant is live.
    #[inline]
    pub fn subtree_live(&self) -> bool {
        self.subtree_exists
    }

    /// Minimum frequency among live nodes of this subtree.
    #[inline]
    pub fn min_freq(&self) -> u32 {
        self.min_freq
    }

    /// Child at exactly `distance` from this node.
    pub fn child(&self, distance: usize) -> Option<&TreeNode> {
        self.children.get(distance).and_then(|slot| slot.as_deref())
    }

    /// Occupied child slots as `(distance, child)`.
    pub fn children(&self) -> impl Iterator<Item = (usize, &TreeNode)> + '_ {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(slot, child)| child.as_deref().map(|child| (slot, child)))
    }

    /// Walk down from `self` and hang `barcode` off the first free slot on
    /// its distance path, folding `freq` into every node passed.
    pub(crate) fn attach(
        &mut self,
        barcode: EncodedBarcode,
        freq: u32,
        metric: &Metric,
        slot_count: usize,
    ) -> usize {
        let mut curr = self;
        let mut depth = 1;
        loop {
            let slot = metric.distance(&barcode, &curr.barcode) as usize;
            curr.min_freq = curr.min_freq.min(freq);
            curr.subtree_exists = true;

            if curr.children.is_empty() {
                curr.children.resize_with(slot_count, || None);
            }
            depth += 1;
            let next = &mut curr.children[slot];
            match next {
                Some(child) => curr = &mut **child,
                None => {
                    *next = Some(Box::new(TreeNode::new(barcode, freq)));
                    return depth;
                }
            }
        }
    }

    /// Mark not live. Returns `false` when already removed.
    #[inline]
    pub(crate) fn soft_delete(&mut self) -> bool {
        std::mem::replace(&mut self.exists, false)
    }

    /// Child slots whose index lies in `band`; empty for leaves.
    pub(crate) fn slots_in(&self, band: std::ops::RangeInclusive<usize>) -> &[Slot] {
        self.children.get(band).unwrap_or_default()
    }

    pub(crate) fn slots_in_mut(&mut self, band: std::ops::RangeInclusive<usize>) -> &mut [Slot] {
        self.children.get_mut(band).unwrap_or_default()
    }

    /// Recompute `subtree_exists` and `min_freq` from self and direct children.
    pub(crate) fn refresh_aggregates(&mut self) {
        let mut live = self.exists;
        let mut min_freq = if self.exists { self.freq } else { u32::MAX };

        for child in self.children.iter().flatten() {
            if child.subtree_exists {
                live = true;
                min_freq = min_freq.min(child.min_freq);
            }
        }

        self.subtree_exists = live;
        self.min_freq = min_freq;
    }
}
