//! Bounded-radius descent over the BK-tree
//!
//! Three interchangeable strategies walk the same admissible children:
//! - `Sequential`: plain depth-first recursion.
//! - `Batched`: distances for all admissible children of a node are computed
//!   into a buffer before any recursion starts.
//! - `Parallel`: admissible children are recursed as rayon tasks. Each task
//!   owns its subtree (`&mut` to a disjoint slot) and returns its own matches,
//!   which are concatenated by `reduce`.
//!
//! A child in slot `i` can only hold barcodes within `k` of the target when
//! `|d - i| <= k`, where `d` is the target's distance to the parent.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;

use crate::barcode::{distance_unchecked, EncodedBarcode};
use crate::cache::DistanceCache;

use super::node::TreeNode;

/// How a query descends the tree. All strategies return the same set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SearchStrategy {
    /// Depth-first, deterministic order.
    #[default]
    Sequential,
    /// Child distances computed up front per node, then recursed in order.
    Batched,
    /// Admissible children recursed concurrently on the rayon pool.
    Parallel,
}

impl SearchStrategy {
    /// Every strategy, in declaration order.
    pub const ALL: [SearchStrategy; 3] = [Self::Sequential, Self::Batched, Self::Parallel];

    /// Lower-case name used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Batched => "batched",
            Self::Parallel => "parallel",
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognised strategy name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown search strategy '{0}' (expected sequential, batched or parallel)")]
pub struct UnknownStrategy(pub String);

impl FromStr for SearchStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownStrategy(s.to_string()))
    }
}

/// Distance function used by an index, optionally memoised.
#[derive(Debug, Clone, Default)]
pub(crate) struct Metric {
    cache: Option<Arc<DistanceCache>>,
}

impl Metric {
    pub(crate) fn new(cache: Option<Arc<DistanceCache>>) -> Self {
        Self { cache }
    }

    /// Lengths must already match.
    #[inline]
    pub(crate) fn distance(&self, a: &EncodedBarcode, b: &EncodedBarcode) -> u32 {
        match &self.cache {
            Some(cache) => cache.distance_unchecked(a, b),
            None => distance_unchecked(a, b),
        }
    }
}

/// Parameters shared by every step of one descent.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Query<'a> {
    target: &'a EncodedBarcode,
    radius: u32,
    max_freq: u32,
    max_slot: usize,
    metric: &'a Metric,
}

impl<'a> Query<'a> {
    pub(crate) fn new(
        target: &'a EncodedBarcode,
        radius: u32,
        max_freq: u32,
        max_slot: usize,
        metric: &'a Metric,
    ) -> Self {
        Self {
            target,
            radius,
            max_freq,
            max_slot,
            metric,
        }
    }

    #[inline]
    fn distance_to(&self, node: &TreeNode) -> u32 {
        self.metric.distance(self.target, node.barcode())
    }

    /// Node is live and passes both the radius and frequency filters.
    #[inline]
    fn matches(&self, node: &TreeNode, dist: u32) -> bool {
        node.is_live() && dist <= self.radius && node.freq() <= self.max_freq
    }

    /// Subtree still holds a live node that could pass the frequency filter.
    #[inline]
    fn admits(&self, child: &TreeNode) -> bool {
        child.subtree_live() && child.min_freq() <= self.max_freq
    }

    /// Child slots that can hold a match, given the parent distance.
    #[inline]
    fn band(&self, dist: u32) -> RangeInclusive<usize> {
        let lo = dist.saturating_sub(self.radius) as usize;
        let hi = (dist.saturating_add(self.radius) as usize).min(self.max_slot);
        lo..=hi
    }
}

/// Soft-delete every match under `root` and return the removed barcodes.
pub(crate) fn remove_near(
    root: &mut TreeNode,
    query: &Query<'_>,
    strategy: SearchStrategy,
) -> Vec<EncodedBarcode> {
    let dist = query.distance_to(root);
    match strategy {
        SearchStrategy::Sequential => {
            let mut out = Vec::new();
            remove_sequential(root, query, dist, &mut out);
            out
        }
        SearchStrategy::Batched => {
            let mut out = Vec::new();
            remove_batched(root, query, dist, &mut out);
            out
        }
        SearchStrategy::Parallel => remove_parallel(root, query, dist),
    }
}

/// Collect every match under `root` without mutating it.
pub(crate) fn collect_near(
    root: &TreeNode,
    query: &Query<'_>,
    strategy: SearchStrategy,
) -> Vec<EncodedBarcode> {
    let dist = query.distance_to(root);
    match strategy {
        SearchStrategy::Sequential => {
            let mut out = Vec::new();
            near_sequential(root, query, dist, &mut out);
            out
        }
        SearchStrategy::Batched => {
            let mut out = Vec::new();
            near_batched(root, query, dist, &mut out);
            out
        }
        SearchStrategy::Parallel => near_parallel(root, query, dist),
    }
}

fn take_if_match(node: &mut TreeNode, query: &Query<'_>, dist: u32, out: &mut Vec<EncodedBarcode>) {
    if query.matches(node, dist) && node.soft_delete() {
        out.push(node.barcode().clone());
    }
}

fn remove_sequential(
    node: &mut TreeNode,
    query: &Query<'_>,
    dist: u32,
    out: &mut Vec<EncodedBarcode>,
) {
    take_if_match(node, query, dist, out);

    for child in node
        .slots_in_mut(query.band(dist))
        .iter_mut()
        .filter_map(|slot| slot.as_deref_mut())
    {
        if query.admits(child) {
            let child_dist = query.distance_to(child);
            remove_sequential(child, query, child_dist, out);
        }
    }

    node.refresh_aggregates();
}

fn remove_batched(
    node: &mut TreeNode,
    query: &Query<'_>,
    dist: u32,
    out: &mut Vec<EncodedBarcode>,
) {
    take_if_match(node, query, dist, out);

    let slots = node.slots_in_mut(query.band(dist));
    let batch: Vec<(usize, u32)> = slots
        .iter()
        .enumerate()
        .filter_map(|(offset, slot)| slot.as_deref().map(|child| (offset, child)))
        .filter(|(_, child)| query.admits(child))
        .map(|(offset, child)| (offset, query.distance_to(child)))
        .collect();

    for (offset, child_dist) in batch {
        if let Some(child) = slots[offset].as_deref_mut() {
            remove_batched(child, query, child_dist, out);
        }
    }

    node.refresh_aggregates();
}

fn remove_parallel(node: &mut TreeNode, query: &Query<'_>, dist: u32) -> Vec<EncodedBarcode> {
    let mut found = Vec::new();
    take_if_match(node, query, dist, &mut found);

    let nested = node
        .slots_in_mut(query.band(dist))
        .par_iter_mut()
        .filter_map(|slot| slot.as_deref_mut())
        .filter(|child| query.admits(child))
        .map(|child| {
            let child_dist = query.distance_to(child);
            remove_parallel(child, query, child_dist)
        })
        .reduce(Vec::new, concat);

    node.refresh_aggregates();
    concat(found, nested)
}

fn near_sequential(node: &TreeNode, query: &Query<'_>, dist: u32, out: &mut Vec<EncodedBarcode>) {
    if query.matches(node, dist) {
        out.push(node.barcode().clone());
    }

    for child in node.slots_in(query.band(dist)).iter().flatten() {
        if query.admits(child) {
            near_sequential(child, query, query.distance_to(child), out);
        }
    }
}

fn near_batched(node: &TreeNode, query: &Query<'_>, dist: u32, out: &mut Vec<EncodedBarcode>) {
    if query.matches(node, dist) {
        out.push(node.barcode().clone());
    }

    let batch: Vec<(&TreeNode, u32)> = node
        .slots_in(query.band(dist))
        .iter()
        .flatten()
        .filter(|child| query.admits(child))
        .map(|child| (&**child, query.distance_to(child)))
        .collect();

    for (child, child_dist) in batch {
        near_batched(child, query, child_dist, out);
    }
}

fn near_parallel(node: &TreeNode, query: &Query<'_>, dist: u32) -> Vec<EncodedBarcode> {
    let mut found = Vec::new();
    if query.matches(node, dist) {
        found.push(node.barcode().clone());
    }

    let nested = node
        .slots_in(query.band(dist))
        .par_iter()
        .flatten()
        .filter(|child| query.admits(child))
        .map(|child| near_parallel(child, query, query.distance_to(child)))
        .reduce(Vec::new, concat);

    concat(found, nested)
}

fn concat(mut left: Vec<EncodedBarcode>, mut right: Vec<EncodedBarcode>) -> Vec<EncodedBarcode> {
    if left.len() < right.len() {
        std::mem::swap(&mut left, &mut right);
    }
    left.append(&mut right);
    left
}
