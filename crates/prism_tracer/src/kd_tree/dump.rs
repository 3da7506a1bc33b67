use std::fmt::Write;

use super::{KdNode, KdTree};

const AXIS_NAMES: [char; 3] = ['x', 'y', 'z'];

impl KdTree {
    /// Indented textual dump of the tree, one node per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.walk(|node, bounds, depth| {
            let indent = depth * 2;
            // Writing into a String cannot fail
            let _ = match *node {
                KdNode::Interior { axis, split, .. } => writeln!(
                    out,
                    "{:indent$}split {} = {:.4} [{:.3?} .. {:.3?}]",
                    "",
                    AXIS_NAMES[axis as usize],
                    split,
                    bounds.min(),
                    bounds.max()
                ),
                KdNode::Leaf { .. } => writeln!(
                    out,
                    "{:indent$}leaf {:?}",
                    "",
                    self.leaf_triangles(node)
                ),
            };
        });
        out
    }

    /// Log the statistics at info level and the full dump at debug level.
    pub fn log_structure(&self) {
        log::info!("KD-tree: {}", self.nodes_statistics());
        if log::log_enabled!(log::Level::Debug) {
            for line in self.dump().lines() {
                log::debug!("{line}");
            }
        }
    }
}
