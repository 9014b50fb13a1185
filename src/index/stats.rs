//! Diagnostic shape summary

use std::fmt;

use super::node::TreeNode;

/// Shape summary of an index. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "visualize", derive(serde::Serialize))]
pub struct IndexStats {
    /// Stored nodes, live or removed.
    pub nodes: usize,
    /// Live barcodes.
    pub live: usize,
    /// Deepest level (root = 1, empty = 0).
    pub max_depth: usize,
    /// Mean node depth.
    pub mean_depth: f64,
    /// Most occupied child slots on a single node.
    pub max_fanout: usize,
}

impl IndexStats {
    /// Walk the tree under `root` without recursion.
    pub(crate) fn from_root(root: Option<&TreeNode>, live: usize) -> Self {
        let mut stats = Self {
            live,
            ..Self::default()
        };
        let mut depth_sum = 0usize;
        let mut stack: Vec<(&TreeNode, usize)> = root.map(|node| (node, 1)).into_iter().collect();

        while let Some((node, depth)) = stack.pop() {
            stats.nodes += 1;
            stats.max_depth = stats.max_depth.max(depth);
            depth_sum += depth;

            let before = stack.len();
            stack.extend(node.children().map(|(_, child)| (child, depth + 1)));
            stats.max_fanout = stats.max_fanout.max(stack.len() - before);
        }

        if stats.nodes > 0 {
            stats.mean_depth = depth_sum as f64 / stats.nodes as f64;
        }
        stats
    }
}

impl fmt::Display for IndexStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "nodes={}\tlive={}\tmax_depth={}\tmean_depth={:.2}\tmax_fanout={}",
            self.nodes, self.live, self.max_depth, self.mean_depth, self.max_fanout
        )
    }
}
