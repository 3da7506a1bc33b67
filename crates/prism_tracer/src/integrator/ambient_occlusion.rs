use prism_math::Ray;
use rand::RngCore;

use super::Integrator;
use crate::material::Color;
use crate::sampling::sample_cosine_hemisphere;
use crate::scene::{Scene, RAY_EPSILON};

/// Single-bounce visibility gather.
///
/// A camera ray that hits a surface fires one occlusion ray into the
/// cosine-weighted hemisphere above it. Escaping rays bring back the
/// environment and rays blocked by an emitter bring back its emission. The
/// cosine factor is carried by the sampling density, so no weight is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmbientOcclusionIntegrator;

impl AmbientOcclusionIntegrator {
    pub fn new() -> Self {
        Self
    }
}

impl Integrator for AmbientOcclusionIntegrator {
    fn gather(&self, scene: &Scene, ray: &Ray, rng: &mut dyn RngCore) -> Color {
        let Some(hit) = scene.intersect(ray) else {
            return scene.environment().sample(ray.direction);
        };

        let material = scene.material(hit.material_index);
        if material.is_emissive() {
            return material.emissive;
        }

        let direction = sample_cosine_hemisphere(hit.normal, rng);
        let occlusion_ray = Ray::offset(hit.point, hit.normal, direction, RAY_EPSILON);
        match scene.intersect(&occlusion_ray) {
            None => scene.environment().sample(occlusion_ray.direction),
            Some(blocker) => scene.material(blocker.material_index).emissive,
        }
    }

    fn name(&self) -> &'static str {
        "ambient occlusion"
    }
}
