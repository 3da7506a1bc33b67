//! Surface area heuristic KD-tree construction.

use prism_math::Aabb;

use super::{KdNode, KdTree, MAX_KD_TREE_DEPTH};
use crate::triangle::Triangle;

/// Cost of intersecting one triangle, relative to one traversal step.
const INTERSECTION_COST: f32 = 80.0;
const TRAVERSAL_COST: f32 = 1.0;
/// Cost discount for splits that leave one side empty.
const EMPTY_BONUS: f32 = 0.5;

/// Limits applied while building a [`KdTree`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildSettings {
    /// Deepest level an interior node may occupy
    pub max_depth: u32,
    /// Nodes with this many triangles or fewer become leaves
    pub leaf_size: u32,
    /// Splits more expensive than not splitting tolerated along one path
    pub max_bad_refines: u32,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            max_depth: 24,
            leaf_size: 2,
            max_bad_refines: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EdgeKind {
    // Order matters: at equal positions starts sort before ends
    Start,
    End,
}

#[derive(Debug, Clone, Copy)]
struct BoundEdge {
    position: f32,
    kind: EdgeKind,
}

struct Split {
    axis: usize,
    position: f32,
    cost: f32,
}

pub(super) struct Builder {
    triangle_bounds: Vec<Aabb>,
    settings: BuildSettings,
    nodes: Vec<KdNode>,
    triangle_indices: Vec<u32>,
    edges: Vec<BoundEdge>,
}

impl Builder {
    pub(super) fn new(triangles: &[Triangle], settings: BuildSettings) -> Self {
        let settings = BuildSettings {
            max_depth: settings.max_depth.min(MAX_KD_TREE_DEPTH as u32),
            ..settings
        };
        Self {
            triangle_bounds: triangles.iter().map(Triangle::bounds).collect(),
            settings,
            nodes: Vec::new(),
            triangle_indices: Vec::new(),
            edges: Vec::with_capacity(2 * triangles.len()),
        }
    }

    pub(super) fn build(mut self) -> KdTree {
        let bounds = self
            .triangle_bounds
            .iter()
            .fold(Aabb::EMPTY, |acc, b| Aabb::surrounding(&acc, b));
        let all: Vec<u32> = (0..self.triangle_bounds.len() as u32).collect();

        self.build_node(bounds, all, 0, 0);

        KdTree {
            nodes: self.nodes,
            triangle_indices: self.triangle_indices,
            bounds,
            triangle_count: self.triangle_bounds.len(),
        }
    }

    fn build_node(&mut self, node_bounds: Aabb, triangles: Vec<u32>, depth: u32, bad_refines: u32) {
        let node_index = self.nodes.len();
        // Placeholder until the node kind is known
        self.nodes.push(KdNode::Leaf { first: 0, count: 0 });

        let count = triangles.len();
        if count as u32 <= self.settings.leaf_size || depth >= self.settings.max_depth {
            self.make_leaf(node_index, &triangles);
            return;
        }

        let leaf_cost = INTERSECTION_COST * count as f32;
        let Some(split) = self.find_split(&node_bounds, &triangles) else {
            self.make_leaf(node_index, &triangles);
            return;
        };

        let bad_refines = if split.cost > leaf_cost {
            bad_refines + 1
        } else {
            bad_refines
        };
        if (split.cost > 4.0 * leaf_cost && count < 16) || bad_refines > self.settings.max_bad_refines {
            self.make_leaf(node_index, &triangles);
            return;
        }

        // Triangles touching the plane go to both sides
        let (below, above): (Vec<u32>, Vec<u32>) = {
            let mut below = Vec::with_capacity(count);
            let mut above = Vec::with_capacity(count);
            for &t in &triangles {
                let extent = self.triangle_bounds[t as usize].axis_interval(split.axis);
                if extent.min <= split.position {
                    below.push(t);
                }
                if extent.max >= split.position {
                    above.push(t);
                }
            }
            (below, above)
        };

        let (below_bounds, above_bounds) = node_bounds.split(split.axis, split.position);

        // Below child sits right after its parent
        self.build_node(below_bounds, below, depth + 1, bad_refines);
        let above_child = self.nodes.len() as u32;
        self.build_node(above_bounds, above, depth + 1, bad_refines);

        self.nodes[node_index] = KdNode::Interior {
            axis: split.axis as u8,
            split: split.position,
            above_child,
        };
    }

    fn make_leaf(&mut self, node_index: usize, triangles: &[u32]) {
        self.nodes[node_index] = KdNode::Leaf {
            first: self.triangle_indices.len() as u32,
            count: triangles.len() as u32,
        };
        self.triangle_indices.extend_from_slice(triangles);
    }

    /// Cheapest split plane strictly inside `node_bounds`.
    ///
    /// Tries the longest axis first and falls back to the other two when it
    /// has no candidate plane.
    fn find_split(&mut self, node_bounds: &Aabb, triangles: &[u32]) -> Option<Split> {
        let total_area = node_bounds.surface_area();
        if total_area <= 0.0 || !total_area.is_finite() {
            return None;
        }
        let inv_total_area = 1.0 / total_area;
        let d = node_bounds.size();
        let count = triangles.len();

        let first_axis = node_bounds.longest_axis();
        for retry in 0..3 {
            let axis = (first_axis + retry) % 3;
            let extent = node_bounds.axis_interval(axis);

            self.edges.clear();
            for &t in triangles {
                let b = self.triangle_bounds[t as usize].axis_interval(axis);
                self.edges.push(BoundEdge {
                    position: b.min,
                    kind: EdgeKind::Start,
                });
                self.edges.push(BoundEdge {
                    position: b.max,
                    kind: EdgeKind::End,
                });
            }
            self.edges.sort_by(|a, b| {
                a.position
                    .total_cmp(&b.position)
                    .then(a.kind.cmp(&b.kind))
            });

            let other0 = (axis + 1) % 3;
            let other1 = (axis + 2) % 3;
            let cap = d[other0] * d[other1];
            let perimeter = d[other0] + d[other1];

            let mut best: Option<Split> = None;
            let (mut below, mut above) = (0usize, count);
            for edge in &self.edges {
                if edge.kind == EdgeKind::End {
                    above -= 1;
                }

                if extent.surrounds(edge.position) {
                    let below_area = 2.0 * (cap + (edge.position - extent.min) * perimeter);
                    let above_area = 2.0 * (cap + (extent.max - edge.position) * perimeter);
                    let bonus = if below == 0 || above == 0 { EMPTY_BONUS } else { 0.0 };
                    let cost = TRAVERSAL_COST
                        + INTERSECTION_COST
                            * (1.0 - bonus)
                            * inv_total_area
                            * (below_area * below as f32 + above_area * above as f32);

                    if best.as_ref().map_or(true, |b| cost < b.cost) {
                        best = Some(Split {
                            axis,
                            position: edge.position,
                            cost,
                        });
                    }
                }

                if edge.kind == EdgeKind::Start {
                    below += 1;
                }
            }
            debug_assert!(below == count && above == 0);

            if best.is_some() {
                return best;
            }
        }
        None
    }
}
