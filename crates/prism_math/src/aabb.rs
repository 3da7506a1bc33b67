use crate::{Interval, Ray, Vec3};

/// Padding applied to every slab in [`Aabb::intersect`].
///
/// Adjacent KD-tree cells share faces; widening each slab a little keeps rays
/// that graze a shared face from slipping between the two cells.
pub const BOX_EPSILON: f32 = 1.0e-4;

/// Axis-aligned bounding box used per triangle and per KD-tree node.
///
/// An AABB is defined by three intervals (one per axis) that bound a 3D volume.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Create a new AABB from three intervals.
    pub fn new(x: Interval, y: Interval, z: Interval) -> Self {
        Self { x, y, z }
    }

    /// Create an AABB from two corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            x: Interval::new(a.x.min(b.x), a.x.max(b.x)),
            y: Interval::new(a.y.min(b.y), a.y.max(b.y)),
            z: Interval::new(a.z.min(b.z), a.z.max(b.z)),
        }
    }

    /// Smallest box containing every point of the iterator; `EMPTY` for none.
    pub fn enclosing<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        points.into_iter().fold(Aabb::EMPTY, |aabb, p| aabb.grow(p))
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }

    /// Returns this box extended to contain `p`.
    pub fn grow(&self, p: Vec3) -> Self {
        Self {
            x: Interval::new(self.x.min.min(p.x), self.x.max.max(p.x)),
            y: Interval::new(self.y.min.min(p.y), self.y.max.max(p.y)),
            z: Interval::new(self.z.min.min(p.z), self.z.max.max(p.z)),
        }
    }

    /// Get the interval for a specific axis (0=X, 1=Y, 2=Z).
    pub fn axis_interval(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    pub fn min(&self) -> Vec3 {
        Vec3::new(self.x.min, self.y.min, self.z.min)
    }

    pub fn max(&self) -> Vec3 {
        Vec3::new(self.x.max, self.y.max, self.z.max)
    }

    /// Extent along each axis.
    pub fn size(&self) -> Vec3 {
        self.max() - self.min()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty() || self.z.is_empty()
    }

    pub fn surface_area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.size();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Returns true if the boxes share at least one point (touching counts).
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x.overlaps(&other.x) && self.y.overlaps(&other.y) && self.z.overlaps(&other.z)
    }

    /// Cut the box by the plane `axis = position` into (below, above).
    pub fn split(&self, axis: usize, position: f32) -> (Aabb, Aabb) {
        let mut below = *self;
        let mut above = *self;
        match axis {
            0 => {
                below.x.max = position;
                above.x.min = position;
            }
            1 => {
                below.y.max = position;
                above.y.min = position;
            }
            _ => {
                below.z.max = position;
                above.z.min = position;
            }
        }
        (below, above)
    }

    /// Slab test against the ray restricted to `ray_t`.
    ///
    /// Returns the parametric `[t_near, t_far]` overlap, or `None` when the ray
    /// misses. Every slab is widened by [`BOX_EPSILON`]. Axes where the ray
    /// direction is exactly zero are parallel to the slab: the ray is inside
    /// iff its origin lies within the widened slab.
    pub fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<Interval> {
        let mut t = ray_t;
        for axis in 0..3 {
            let slab = self.axis_interval(axis).expand(2.0 * BOX_EPSILON);
            let origin = ray.origin[axis];

            if ray.direction[axis] == 0.0 {
                if !slab.contains(origin) {
                    return None;
                }
                continue;
            }

            let inv = ray.inv_direction[axis];
            let mut t0 = (slab.min - origin) * inv;
            let mut t1 = (slab.max - origin) * inv;
            if inv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t.min = t0.max(t.min);
            t.max = t1.min(t.max);
            if t.max < t.min {
                return None;
            }
        }
        Some(t)
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    pub fn longest_axis(&self) -> usize {
        let size = self.size();
        if size.x > size.y && size.x > size.z {
            0
        } else if size.y > size.z {
            1
        } else {
            2
        }
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.min() + self.max()) * 0.5
    }

    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };

    pub const UNIVERSE: Aabb = Aabb {
        x: Interval::UNIVERSE,
        y: Interval::UNIVERSE,
        z: Interval::UNIVERSE,
    };
}

impl Default for Aabb {
    fn default() -> Self {
        Aabb::EMPTY
    }
}
