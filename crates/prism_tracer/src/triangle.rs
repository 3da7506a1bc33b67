//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection, with
//! edge vectors and face normal precomputed once per triangle.

use prism_math::{Aabb, Interval, Ray, Vec2, Vec3};

/// Determinant threshold below which a ray counts as parallel to the triangle.
const PARALLEL_EPSILON: f32 = 1e-9;

/// A world-space triangle with per-vertex shading data and cached support data.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    pub positions: [Vec3; 3],
    pub normals: [Vec3; 3],
    pub uvs: [Vec2; 3],
    /// Index into the scene's material list
    pub material_index: u32,

    // Support data
    edge1: Vec3,
    edge2: Vec3,
    face_normal: Vec3,
    bounds: Aabb,
}

/// Raw intersection: distance along the ray and barycentrics of vertices 1 and 2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    pub distance: f32,
    pub barycentric: Vec2,
}

/// Position, shading normal and UV blended from the three vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Triangle {
    pub fn new(positions: [Vec3; 3], normals: [Vec3; 3], uvs: [Vec2; 3], material_index: u32) -> Self {
        let [v0, v1, v2] = positions;
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        Self {
            positions,
            normals,
            uvs,
            material_index,
            edge1,
            edge2,
            face_normal: edge1.cross(edge2).normalize_or_zero(),
            bounds: Aabb::enclosing(positions),
        }
    }

    /// Triangle with flat normals and zero UVs.
    pub fn flat(positions: [Vec3; 3], material_index: u32) -> Self {
        let face_normal = (positions[1] - positions[0])
            .cross(positions[2] - positions[0])
            .normalize_or_zero();
        Self::new(positions, [face_normal; 3], [Vec2::ZERO; 3], material_index)
    }

    #[inline]
    pub fn edges(&self) -> (Vec3, Vec3) {
        (self.edge1, self.edge2)
    }

    /// Unit geometric normal, following the vertex winding. Zero if degenerate.
    #[inline]
    pub fn face_normal(&self) -> Vec3 {
        self.face_normal
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn area(&self) -> f32 {
        0.5 * self.edge1.cross(self.edge2).length()
    }

    /// Möller-Trumbore intersection.
    ///
    /// A hit needs barycentrics inside the triangle and a distance in the
    /// half-open range `[ray_t.min, ray_t.max)`.
    #[inline]
    pub fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<TriangleHit> {
        let h = ray.direction.cross(self.edge2);
        let a = self.edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < PARALLEL_EPSILON {
            return None;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.positions[0];
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(self.edge1);
        let v = f * ray.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * self.edge2.dot(q);
        if t < ray_t.min || t >= ray_t.max {
            return None;
        }

        Some(TriangleHit {
            distance: t,
            barycentric: Vec2::new(u, v),
        })
    }

    /// Blend per-vertex position, normal and UV at barycentric `(u, v)`.
    ///
    /// This is the single interpolation used for shading normals and texture
    /// lookups. A degenerate blended normal falls back to the face normal.
    pub fn interpolate(&self, barycentric: Vec2) -> SurfacePoint {
        let (u, v) = (barycentric.x, barycentric.y);
        let w = 1.0 - u - v;

        let normal = (w * self.normals[0] + u * self.normals[1] + v * self.normals[2])
            .try_normalize()
            .unwrap_or(self.face_normal);

        SurfacePoint {
            position: w * self.positions[0] + u * self.positions[1] + v * self.positions[2],
            normal,
            uv: w * self.uvs[0] + u * self.uvs[1] + v * self.uvs[2],
        }
    }

    /// Point at barycentric `(u, v)`.
    #[inline]
    pub fn point_at(&self, barycentric: Vec2) -> Vec3 {
        self.positions[0] + barycentric.x * self.edge1 + barycentric.y * self.edge2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facing_triangle() -> Triangle {
        // Triangle in XY plane at z=-1
        Triangle::new(
            [
                Vec3::new(-1.0, -1.0, -1.0),
                Vec3::new(1.0, -1.0, -1.0),
                Vec3::new(0.0, 1.0, -1.0),
            ],
            [Vec3::Z, Vec3::X, Vec3::Y],
            [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.5, 1.0)],
            3,
        )
    }

    #[test]
    fn test_support_data() {
        let tri = facing_triangle();
        let (e1, e2) = tri.edges();
        assert_eq!(e1, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(e2, Vec3::new(1.0, 2.0, 0.0));
        assert!((tri.face_normal() - Vec3::Z).length() < 1e-6);
        assert!((tri.area() - 2.0).abs() < 1e-6);
        assert_eq!(tri.bounds().min(), Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(tri.material_index, 3);
    }

    #[test]
    fn test_triangle_hit() {
        let tri = facing_triangle();

        // Ray pointing at triangle center
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let hit = tri.intersect(&ray, Interval::new(0.001, f32::INFINITY)).unwrap();

        assert!((hit.distance - 1.0).abs() < 0.001);
        assert!((tri.point_at(hit.barycentric) - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_triangle_miss() {
        let tri = facing_triangle();

        // Ray pointing away
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0));
        assert!(tri.intersect(&ray, Interval::new(0.001, f32::INFINITY)).is_none());

        // Ray passing beside the triangle
        let ray = Ray::new(Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(tri.intersect(&ray, Interval::new(0.001, f32::INFINITY)).is_none());

        // Parallel ray in the triangle's plane
        let ray = Ray::new(Vec3::new(-5.0, 0.0, -1.0), Vec3::X);
        assert!(tri.intersect(&ray, Interval::UNIVERSE).is_none());
    }

    #[test]
    fn test_hit_respects_interval() {
        let tri = facing_triangle();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        assert!(tri.intersect(&ray, Interval::new(0.0, 0.5)).is_none());
        assert!(tri.intersect(&ray, Interval::new(2.0, 5.0)).is_none());
        // Upper bound is exclusive
        assert!(tri.intersect(&ray, Interval::new(0.0, 1.0)).is_none());
    }

    #[test]
    fn test_back_face_hit() {
        let tri = facing_triangle();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -3.0), Vec3::Z);
        let hit = tri.intersect(&ray, Interval::new(0.0, f32::INFINITY)).unwrap();
        assert!((hit.distance - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_interpolate_at_vertices() {
        let tri = facing_triangle();

        let at_v0 = tri.interpolate(Vec2::ZERO);
        assert_eq!(at_v0.position, tri.positions[0]);
        assert_eq!(at_v0.normal, Vec3::Z);

        let at_v1 = tri.interpolate(Vec2::new(1.0, 0.0));
        assert_eq!(at_v1.normal, Vec3::X);
        assert_eq!(at_v1.uv, Vec2::new(1.0, 0.0));

        let at_v2 = tri.interpolate(Vec2::new(0.0, 1.0));
        assert_eq!(at_v2.uv, Vec2::new(0.5, 1.0));
    }

    #[test]
    fn test_interpolated_normal_is_unit() {
        let tri = facing_triangle();
        let p = tri.interpolate(Vec2::new(0.3, 0.3));
        assert!((p.normal.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_triangle_never_hit() {
        let tri = Triangle::flat([Vec3::ZERO, Vec3::X, Vec3::X * 2.0], 0);
        assert_eq!(tri.face_normal(), Vec3::ZERO);
        let ray = Ray::new(Vec3::new(0.5, 1.0, 0.0), -Vec3::Y);
        assert!(tri.intersect(&ray, Interval::UNIVERSE).is_none());
    }
}
