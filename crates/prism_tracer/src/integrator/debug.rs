use prism_math::{Ray, Vec3};
use rand::RngCore;

use super::Integrator;
use crate::bsdf::{build_bsdf, build_surface, direct_lighting};
use crate::material::Color;
use crate::scene::Scene;

/// What [`DebugIntegrator`] shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugMode {
    /// Shading normals mapped to `[0, 1]`
    #[default]
    Normals,
    /// Linear diffuse reflectance of the hit material
    Reflectance,
    /// `1 / (1 + distance)`
    Depth,
    /// Direct lighting from a light placed at the eye
    Headlight,
}

/// Noise-free views of the scene for checking geometry and materials.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugIntegrator {
    pub mode: DebugMode,
}

impl DebugIntegrator {
    pub fn new(mode: DebugMode) -> Self {
        Self { mode }
    }
}

impl Integrator for DebugIntegrator {
    fn gather(&self, scene: &Scene, ray: &Ray, _rng: &mut dyn RngCore) -> Color {
        let Some(hit) = scene.intersect(ray) else {
            return scene.environment().sample(ray.direction);
        };
        let material = scene.material(hit.material_index);

        match self.mode {
            DebugMode::Normals => hit.normal * 0.5 + Vec3::splat(0.5),
            DebugMode::Reflectance => material.diffuse,
            DebugMode::Depth => Vec3::splat(1.0 / (1.0 + hit.distance)),
            DebugMode::Headlight => {
                let base = if material.class == crate::material::MaterialClass::Conductor {
                    material.specular
                } else {
                    material.diffuse
                };
                let surface = build_surface(base, material.metalness, material.roughness.sqrt());
                let to_eye = -ray.direction;
                material.emissive + direct_lighting(&surface, &build_bsdf(hit.normal, to_eye, to_eye))
            }
        }
    }

    fn name(&self) -> &'static str {
        "debug"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrator::test_scenes::open_floor;
    use prism_core::Material;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_modes() {
        let scene = open_floor(Material::diffuse("floor", Vec3::splat(0.5)), Vec3::splat(0.3));
        let mut rng = StdRng::seed_from_u64(0);
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y);

        let normal = DebugIntegrator::new(DebugMode::Normals).gather(&scene, &ray, &mut rng);
        assert!((normal - Vec3::new(0.5, 1.0, 0.5)).length() < 1e-5);

        let reflectance = DebugIntegrator::new(DebugMode::Reflectance).gather(&scene, &ray, &mut rng);
        assert!((reflectance.x - 0.5f32.powf(2.2)).abs() < 1e-6);

        let depth = DebugIntegrator::new(DebugMode::Depth).gather(&scene, &ray, &mut rng);
        assert!((depth.x - 0.5).abs() < 1e-5);

        let lit = DebugIntegrator::new(DebugMode::Headlight).gather(&scene, &ray, &mut rng);
        assert!(lit.x > 0.0 && lit.x < 1.0);

        let sky = DebugIntegrator::default().gather(&scene, &Ray::new(Vec3::Y, Vec3::Y), &mut rng);
        assert_eq!(sky, Vec3::splat(0.3));
    }
}
