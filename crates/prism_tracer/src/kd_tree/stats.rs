use std::fmt::Display;

use super::{KdNode, KdTree};

/// Shape of a built KD-tree, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdTreeStatistics {
    pub total_nodes: usize,
    pub leaf_nodes: usize,
    pub empty_leaves: usize,
    /// Depth of the deepest node; the root is at depth 0
    pub max_depth: usize,
    pub min_triangles_per_leaf: usize,
    pub max_triangles_per_leaf: usize,
    /// Triangles the tree was built over
    pub total_triangles: usize,
    /// Triangle references summed over all leaves, duplicates included
    pub distributed_triangles: usize,
}

impl KdTreeStatistics {
    fn leaf(triangles: usize, depth: usize) -> Self {
        KdTreeStatistics {
            total_nodes: 1,
            leaf_nodes: 1,
            empty_leaves: usize::from(triangles == 0),
            max_depth: depth,
            min_triangles_per_leaf: triangles,
            max_triangles_per_leaf: triangles,
            total_triangles: 0,
            distributed_triangles: triangles,
        }
    }

    /// Combine the statistics of two sibling subtrees.
    pub fn merge(&self, other: &Self) -> Self {
        KdTreeStatistics {
            total_nodes: self.total_nodes + other.total_nodes,
            leaf_nodes: self.leaf_nodes + other.leaf_nodes,
            empty_leaves: self.empty_leaves + other.empty_leaves,
            max_depth: self.max_depth.max(other.max_depth),
            min_triangles_per_leaf: self.min_triangles_per_leaf.min(other.min_triangles_per_leaf),
            max_triangles_per_leaf: self.max_triangles_per_leaf.max(other.max_triangles_per_leaf),
            total_triangles: self.total_triangles.max(other.total_triangles),
            distributed_triangles: self.distributed_triangles + other.distributed_triangles,
        }
    }

    /// Average number of leaves each triangle ends up in.
    pub fn duplication_factor(&self) -> f32 {
        if self.total_triangles == 0 {
            0.0
        } else {
            self.distributed_triangles as f32 / self.total_triangles as f32
        }
    }
}

impl Display for KdTreeStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} nodes ({} leaves, {} empty); depth {}; {} - {} triangles per leaf; {} triangles, {} distributed ({:.2}x)",
            self.total_nodes,
            self.leaf_nodes,
            self.empty_leaves,
            self.max_depth,
            self.min_triangles_per_leaf,
            self.max_triangles_per_leaf,
            self.total_triangles,
            self.distributed_triangles,
            self.duplication_factor()
        )
    }
}

impl KdTree {
    /// Node and leaf statistics, accumulated bottom-up.
    pub fn nodes_statistics(&self) -> KdTreeStatistics {
        let mut stats = if self.nodes.is_empty() {
            KdTreeStatistics::leaf(0, 0)
        } else {
            self.subtree_statistics(0, 0)
        };
        stats.total_triangles = self.triangle_count;
        stats
    }

    fn subtree_statistics(&self, index: usize, depth: usize) -> KdTreeStatistics {
        match self.nodes[index] {
            KdNode::Leaf { count, .. } => KdTreeStatistics::leaf(count as usize, depth),
            KdNode::Interior { above_child, .. } => {
                let below = self.subtree_statistics(index + 1, depth + 1);
                let above = self.subtree_statistics(above_child as usize, depth + 1);
                let mut merged = below.merge(&above);
                merged.total_nodes += 1;
                merged
            }
        }
    }
}
