//! KD-tree over the scene's triangle soup.
//!
//! Nodes live in one flat array. An interior node's below child is stored
//! right after it and the above child is referenced by index; leaves point at
//! a run of the shared triangle index list. The tree only stores indices, so
//! it carries no borrow of the triangles and queries take the slice it was
//! built from.
//!
//! Triangles straddling a split plane are referenced from both children.
//! Traversal tolerates the duplicates because it always keeps the closest hit.

mod build;
mod dump;
mod stats;

pub use build::BuildSettings;
pub use stats::KdTreeStatistics;

use arrayvec::ArrayVec;
use prism_math::{Aabb, Interval, Ray, Vec2, Vec3};

use crate::triangle::Triangle;

/// Capacity of the traversal stack, and therefore the deepest tree allowed.
pub const MAX_KD_TREE_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KdNode {
    Interior {
        axis: u8,
        split: f32,
        above_child: u32,
    },
    Leaf {
        first: u32,
        count: u32,
    },
}

/// Nearest hit found by [`KdTree::traverse`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraverseResult {
    pub triangle_index: u32,
    /// Weights of vertices 1 and 2
    pub barycentric: Vec2,
    pub point: Vec3,
    pub distance: f32,
}

#[derive(Debug, Clone)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    triangle_indices: Vec<u32>,
    bounds: Aabb,
    triangle_count: usize,
}

#[derive(Clone, Copy)]
struct PendingNode {
    node: usize,
    t_min: f32,
    t_max: f32,
}

impl KdTree {
    /// Build a tree over `triangles`. Depth is capped at [`MAX_KD_TREE_DEPTH`].
    pub fn build(triangles: &[Triangle], settings: BuildSettings) -> Self {
        build::Builder::new(triangles, settings).build()
    }

    /// Bounds of every triangle in the tree.
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn nodes(&self) -> &[KdNode] {
        &self.nodes
    }

    /// Triangle indices referenced by a leaf; empty for interior nodes.
    pub fn leaf_triangles(&self, node: &KdNode) -> &[u32] {
        match *node {
            KdNode::Leaf { first, count } => {
                &self.triangle_indices[first as usize..(first + count) as usize]
            }
            KdNode::Interior { .. } => &[],
        }
    }

    /// Nearest hit of `ray` within `ray_t`, or `None` when nothing is hit.
    ///
    /// `triangles` must be the slice the tree was built from. The ray
    /// direction must be normalized and finite; this is not checked.
    pub fn traverse(&self, triangles: &[Triangle], ray: &Ray, ray_t: Interval) -> Option<TraverseResult> {
        self.search(triangles, ray, ray_t, false)
            .map(|(triangle_index, hit)| TraverseResult {
                triangle_index,
                barycentric: hit.barycentric,
                point: ray.at(hit.distance),
                distance: hit.distance,
            })
    }

    /// True if anything lies along `ray` within `ray_t`. Stops at the first hit.
    pub fn occluded(&self, triangles: &[Triangle], ray: &Ray, ray_t: Interval) -> bool {
        self.search(triangles, ray, ray_t, true).is_some()
    }

    fn search(
        &self,
        triangles: &[Triangle],
        ray: &Ray,
        ray_t: Interval,
        any_hit: bool,
    ) -> Option<(u32, crate::triangle::TriangleHit)> {
        if self.nodes.is_empty() {
            return None;
        }
        let range = self.bounds.intersect(ray, ray_t)?;
        let (mut t_min, mut t_max) = (range.min, range.max);

        let mut stack: ArrayVec<PendingNode, MAX_KD_TREE_DEPTH> = ArrayVec::new();
        let mut closest = None;
        let mut closest_t = ray_t.max;
        let mut node_index = 0;

        loop {
            // Everything left is farther than the hit we already have
            if closest_t < t_min {
                break;
            }

            match self.nodes[node_index] {
                KdNode::Interior {
                    axis,
                    split,
                    above_child,
                } => {
                    let axis = axis as usize;
                    let origin = ray.origin[axis];
                    let direction = ray.direction[axis];

                    let t_plane = if direction == 0.0 {
                        f32::INFINITY
                    } else {
                        (split - origin) * ray.inv_direction[axis]
                    };

                    let below_first = origin < split || (origin == split && direction <= 0.0);
                    let (first, second) = if below_first {
                        (node_index + 1, above_child as usize)
                    } else {
                        (above_child as usize, node_index + 1)
                    };

                    if t_plane > t_max || t_plane <= 0.0 {
                        node_index = first;
                    } else if t_plane < t_min {
                        node_index = second;
                    } else {
                        // One entry per interior level on the current path, and
                        // build depth never exceeds the stack capacity
                        stack.push(PendingNode {
                            node: second,
                            t_min: t_plane,
                            t_max,
                        });
                        node_index = first;
                        t_max = t_plane;
                    }
                }
                KdNode::Leaf { first, count } => {
                    let leaf = &self.triangle_indices[first as usize..(first + count) as usize];
                    for &triangle_index in leaf {
                        let triangle = &triangles[triangle_index as usize];
                        if let Some(hit) = triangle.intersect(ray, Interval::new(ray_t.min, closest_t)) {
                            closest_t = hit.distance;
                            closest = Some((triangle_index, hit));
                            if any_hit {
                                return closest;
                            }
                        }
                    }

                    match stack.pop() {
                        Some(pending) => {
                            node_index = pending.node;
                            t_min = pending.t_min;
                            t_max = pending.t_max;
                        }
                        None => break,
                    }
                }
            }
        }

        closest
    }

    /// Visit every node depth-first with its bounds and depth (root is 0).
    pub fn walk<F: FnMut(&KdNode, &Aabb, usize)>(&self, mut visit: F) {
        if self.nodes.is_empty() {
            return;
        }
        let mut pending = vec![(0usize, self.bounds, 0usize)];
        while let Some((index, bounds, depth)) = pending.pop() {
            let node = &self.nodes[index];
            visit(node, &bounds, depth);
            if let KdNode::Interior {
                axis,
                split,
                above_child,
            } = *node
            {
                let (below, above) = bounds.split(axis as usize, split);
                pending.push((above_child as usize, above, depth + 1));
                pending.push((index + 1, below, depth + 1));
            }
        }
    }
}
