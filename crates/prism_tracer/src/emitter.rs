//! Area lights made of emissive triangles.

use prism_math::{Vec2, Vec3};

use crate::triangle::Triangle;

/// A contiguous run of scene triangles sharing one emissive material.
#[derive(Debug, Clone)]
pub struct Emitter {
    pub first_triangle: usize,
    pub triangle_count: usize,
    pub material_index: u32,
    areas: Vec<f32>,
    // Normalized running sum of `areas`
    cdf: Vec<f32>,
    total_area: f32,
}

/// A point sampled uniformly by area on an emitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmitterSample {
    pub point: Vec3,
    pub normal: Vec3,
    pub triangle_index: usize,
    /// Density with respect to area
    pub pdf: f32,
}

impl Emitter {
    pub fn new(first_triangle: usize, triangle_count: usize, material_index: u32) -> Self {
        Self {
            first_triangle,
            triangle_count,
            material_index,
            areas: Vec::new(),
            cdf: Vec::new(),
            total_area: 0.0,
        }
    }

    /// Precompute triangle areas and the sampling distribution.
    ///
    /// Must run once the scene's triangle list is final.
    pub fn prepare(&mut self, triangles: &[Triangle]) {
        let range = self.first_triangle..self.first_triangle + self.triangle_count;
        self.areas = triangles[range].iter().map(Triangle::area).collect();

        let mut running = 0.0;
        self.cdf = self
            .areas
            .iter()
            .map(|area| {
                running += area;
                running
            })
            .collect();
        self.total_area = running;

        if self.total_area > 0.0 {
            for c in &mut self.cdf {
                *c /= self.total_area;
            }
        }
    }

    pub fn total_area(&self) -> f32 {
        self.total_area
    }

    pub fn areas(&self) -> &[f32] {
        &self.areas
    }

    pub fn is_prepared(&self) -> bool {
        self.areas.len() == self.triangle_count
    }

    /// Pick a triangle with `u1` proportionally to area, then a uniform
    /// point on it with `u2` and `u3`. `None` for an unprepared or
    /// zero-area emitter.
    pub fn sample_point(&self, triangles: &[Triangle], u1: f32, u2: f32, u3: f32) -> Option<EmitterSample> {
        if !self.is_prepared() || self.total_area <= 0.0 {
            return None;
        }

        let local = self.cdf.partition_point(|&c| c <= u1).min(self.cdf.len() - 1);
        let triangle_index = self.first_triangle + local;
        let triangle = &triangles[triangle_index];

        let su = u2.sqrt();
        let barycentric = Vec2::new(su * (1.0 - u3), su * u3);

        Some(EmitterSample {
            point: triangle.point_at(barycentric),
            normal: triangle.face_normal(),
            triangle_index,
            pdf: 1.0 / self.total_area,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn two_triangles() -> Vec<Triangle> {
        vec![
            // Unrelated triangle before the emitter
            Triangle::flat([Vec3::ZERO, Vec3::X, Vec3::Y], 0),
            // Area 0.5
            Triangle::flat([Vec3::new(0.0, 5.0, 0.0), Vec3::new(1.0, 5.0, 0.0), Vec3::new(0.0, 5.0, 1.0)], 1),
            // Area 1.5
            Triangle::flat([Vec3::new(10.0, 5.0, 0.0), Vec3::new(13.0, 5.0, 0.0), Vec3::new(10.0, 5.0, 1.0)], 1),
        ]
    }

    #[test]
    fn test_prepare() {
        let triangles = two_triangles();
        let mut emitter = Emitter::new(1, 2, 1);
        assert!(!emitter.is_prepared());
        assert!(emitter.sample_point(&triangles, 0.5, 0.5, 0.5).is_none());

        emitter.prepare(&triangles);
        assert!(emitter.is_prepared());
        assert!((emitter.total_area() - 2.0).abs() < 1e-6);
        assert_eq!(emitter.areas().len(), 2);
    }

    #[test]
    fn test_sample_point_by_area() {
        let triangles = two_triangles();
        let mut emitter = Emitter::new(1, 2, 1);
        emitter.prepare(&triangles);

        let mut rng = StdRng::seed_from_u64(17);
        let count = 10_000;
        let mut on_large = 0;
        for _ in 0..count {
            let sample = emitter
                .sample_point(&triangles, rng.gen(), rng.gen(), rng.gen())
                .unwrap();
            assert!(sample.triangle_index == 1 || sample.triangle_index == 2);
            assert!((sample.point.y - 5.0).abs() < 1e-5);
            assert!(triangles[sample.triangle_index].bounds().overlaps(&prism_math::Aabb::from_points(
                sample.point - Vec3::splat(1e-4),
                sample.point + Vec3::splat(1e-4)
            )));
            assert!((sample.pdf - 0.5).abs() < 1e-6);
            if sample.triangle_index == 2 {
                on_large += 1;
            }
        }

        let fraction = on_large as f32 / count as f32;
        assert!((fraction - 0.75).abs() < 0.02, "fraction {fraction}");
    }
}
