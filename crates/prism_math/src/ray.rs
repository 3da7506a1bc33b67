use crate::Vec3;

/// A ray with an origin and a unit-length direction.
///
/// The component-wise inverse of the direction is cached for slab tests.
/// Axes where the direction is zero get an infinite inverse; box tests treat
/// those axes as parallel instead of dividing.
///
/// A zero-length or NaN direction is a caller contract violation: the ray is
/// constructed, but every query against it returns an unspecified result.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub inv_direction: Vec3,
}

impl Ray {
    /// Create a new ray, normalizing `direction`.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        let direction = direction.normalize();
        let inv = |d: f32| if d == 0.0 { f32::INFINITY } else { 1.0 / d };
        Self {
            origin,
            direction,
            inv_direction: Vec3::new(inv(direction.x), inv(direction.y), inv(direction.z)),
        }
    }

    /// Ray leaving `origin` pushed by `epsilon` along `offset_dir`.
    ///
    /// Used to start secondary rays off a surface without hitting it again.
    pub fn offset(origin: Vec3, offset_dir: Vec3, direction: Vec3, epsilon: f32) -> Self {
        Self::new(origin + offset_dir * epsilon, direction)
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
