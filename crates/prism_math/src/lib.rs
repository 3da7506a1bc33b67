// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod ray;
mod transform;

pub use aabb::{Aabb, BOX_EPSILON};
pub use interval::Interval;
pub use ray::Ray;
pub use transform::Mat4Ext;
