//! Camera for primary ray generation.
//!
//! A pinhole camera, or a thin lens when the aperture is non-zero. The image
//! size is not part of the camera; every ray query takes the output size so
//! one camera serves the full render and single-pixel probes alike.

use prism_math::{Ray, UVec2, Vec2, Vec3};
use rand::RngCore;

use crate::sampling::gen_f32;

#[derive(Debug, Clone)]
pub struct Camera {
    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    // Lens settings
    vfov: f32,           // Vertical field of view in degrees
    aperture_size: f32,  // Lens diameter, 0 for a pinhole
    focus_distance: f32, // Distance from camera to plane of perfect focus

    // Orthonormal basis, kept in sync by every setter
    u: Vec3,
    v: Vec3,
    w: Vec3,
}

impl Camera {
    /// Camera at the origin looking down -Z with a 90 degree field of view.
    pub fn new() -> Self {
        let mut camera = Self {
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            vfov: 90.0,
            aperture_size: 0.0,
            focus_distance: 1.0,
            u: Vec3::X,
            v: Vec3::Y,
            w: Vec3::Z,
        };
        camera.update_basis();
        camera
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self.update_basis();
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, aperture_size: f32, focus_distance: f32) -> Self {
        self.vfov = vfov;
        self.aperture_size = aperture_size.max(0.0);
        self.focus_distance = focus_distance;
        self
    }

    pub fn set_aperture_size(&mut self, aperture_size: f32) {
        self.aperture_size = aperture_size.max(0.0);
    }

    pub fn set_focus_distance(&mut self, focus_distance: f32) {
        if focus_distance > 0.0 && focus_distance.is_finite() {
            self.focus_distance = focus_distance;
        }
    }

    pub fn position(&self) -> Vec3 {
        self.look_from
    }

    /// Unit viewing direction.
    pub fn direction(&self) -> Vec3 {
        -self.w
    }

    pub fn vfov(&self) -> f32 {
        self.vfov
    }

    pub fn aperture_size(&self) -> f32 {
        self.aperture_size
    }

    pub fn focus_distance(&self) -> f32 {
        self.focus_distance
    }

    fn update_basis(&mut self) {
        self.w = (self.look_from - self.look_at).try_normalize().unwrap_or(Vec3::Z);
        self.u = self.vup.cross(self.w).try_normalize().unwrap_or(Vec3::X);
        self.v = self.w.cross(self.u);
    }

    /// Ray through the center of the image.
    pub fn center_ray(&self) -> Ray {
        Ray::new(self.look_from, -self.w)
    }

    /// Ray through the center of `pixel`, with no lens sampling.
    pub fn primary_ray(&self, pixel: UVec2, output_size: UVec2) -> Ray {
        let target = self.film_point(pixel.as_vec2() + Vec2::splat(0.5), output_size);
        Ray::new(self.look_from, target)
    }

    /// Ray through a random point of `pixel`, from a random point on the
    /// lens when the aperture is open.
    pub fn sample_ray(&self, pixel: UVec2, output_size: UVec2, rng: &mut dyn RngCore) -> Ray {
        let offset = Vec2::new(gen_f32(rng), gen_f32(rng));
        let direction = self.film_point(pixel.as_vec2() + offset, output_size);

        if self.aperture_size <= 0.0 {
            return Ray::new(self.look_from, direction);
        }

        // Everything on the focus plane stays sharp
        let focus_point = self.look_from + direction * self.focus_distance;
        let lens = random_in_unit_disk(rng) * (0.5 * self.aperture_size);
        let origin = self.look_from + lens.x * self.u + lens.y * self.v;
        Ray::new(origin, focus_point - origin)
    }

    /// Direction towards film position `film` (in pixels, origin top-left),
    /// scaled so its component along the view direction is 1.
    fn film_point(&self, film: Vec2, output_size: UVec2) -> Vec3 {
        let size = output_size.max(UVec2::ONE).as_vec2();
        let h = (self.vfov.to_radians() / 2.0).tan();
        let aspect = size.x / size.y;

        let x = (2.0 * film.x / size.x - 1.0) * aspect * h;
        let y = (1.0 - 2.0 * film.y / size.y) * h;
        x * self.u + y * self.v - self.w
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Sample a random point in the unit disk.
fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec2 {
    loop {
        let p = Vec2::new(gen_f32(rng) * 2.0 - 1.0, gen_f32(rng) * 2.0 - 1.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_camera_basis() {
        let camera = Camera::new().with_position(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        assert!((camera.direction() + Vec3::Z).length() < 1e-6);
        assert_eq!(camera.center_ray().origin, Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_primary_ray_center_and_corners() {
        let camera = Camera::new()
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_lens(90.0, 0.0, 1.0);
        let size = UVec2::new(3, 3);

        // Odd sizes have a pixel straight down the view axis
        let center = camera.primary_ray(UVec2::new(1, 1), size);
        assert!((center.direction - camera.center_ray().direction).length() < 1e-6);

        // Row 0 is the top of the image, column 0 the left
        let top_left = camera.primary_ray(UVec2::new(0, 0), size);
        assert!(top_left.direction.x < 0.0);
        assert!(top_left.direction.y > 0.0);
    }

    #[test]
    fn test_looking_down() {
        let camera = Camera::new().with_position(Vec3::new(0.0, 0.5, 0.0), Vec3::ZERO, Vec3::Z);
        let ray = camera.primary_ray(UVec2::new(4, 4), UVec2::new(9, 9));
        assert!((ray.direction + Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_sample_ray_stays_in_pixel() {
        let camera = Camera::new().with_lens(60.0, 0.0, 1.0);
        let mut rng = StdRng::seed_from_u64(42);
        let size = UVec2::new(100, 50);

        let left = camera.primary_ray(UVec2::new(10, 20), size).direction;
        let right = camera.primary_ray(UVec2::new(12, 20), size).direction;
        for _ in 0..100 {
            let ray = camera.sample_ray(UVec2::new(11, 20), size, &mut rng);
            assert_eq!(ray.origin, Vec3::ZERO);
            assert!(ray.direction.x > left.x && ray.direction.x < right.x);
        }
    }

    #[test]
    fn test_thin_lens_focus() {
        let mut camera = Camera::new().with_lens(40.0, 0.5, 1.0);
        camera.set_focus_distance(4.0);
        camera.set_focus_distance(-1.0);
        assert_eq!(camera.focus_distance(), 4.0);

        let mut rng = StdRng::seed_from_u64(8);
        let size = UVec2::new(9, 9);
        for _ in 0..100 {
            let ray = camera.sample_ray(UVec2::new(4, 4), size, &mut rng);
            assert!(ray.origin.length() <= 0.25 + 1e-6);
            // All lens samples converge within one pixel on the focus plane
            let hit = ray.origin + ray.direction * ((-4.0 - ray.origin.z) / ray.direction.z);
            assert!(hit.truncate().length() < 4.0 * (40f32.to_radians() / 2.0).tan() * 2.0 / 9.0);
        }
    }
}
