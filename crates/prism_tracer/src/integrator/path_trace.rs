use arrayvec::ArrayVec;
use prism_math::{Ray, Vec3};
use rand::RngCore;

use super::Integrator;
use crate::bsdf::build_surface;
use crate::fresnel::fresnel_reflectance;
use crate::material::{Color, Material, MaterialClass};
use crate::sampling::{
    diffuse_direction, gen_f32, refraction_coefficient, refraction_direction, sample_ggx,
    specular_direction,
};
use crate::scene::{Scene, RAY_EPSILON};

/// Bounces recorded per path; longer paths are cut off and contribute
/// nothing beyond the last recorded bounce.
pub const MAX_TRAVERSE_DEPTH: usize = 10;

/// Below this refraction coefficient light cannot get through.
const TRANSMISSION_EPSILON: f32 = 1e-5;

/// Unidirectional path tracer.
///
/// Emitters only contribute when a path happens to hit them. Each bounce
/// records the emission at the hit and the color multiplier for whatever
/// arrives from the next bounce; the records are folded back to front once
/// the path ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathTraceIntegrator;

impl PathTraceIntegrator {
    pub fn new() -> Self {
        Self
    }
}

/// One recorded bounce.
#[derive(Debug, Clone, Copy)]
struct Bounce {
    emissive: Color,
    multiplier: Color,
}

impl Integrator for PathTraceIntegrator {
    fn gather(&self, scene: &Scene, ray: &Ray, rng: &mut dyn RngCore) -> Color {
        let mut bounces: ArrayVec<Bounce, MAX_TRAVERSE_DEPTH> = ArrayVec::new();
        let mut ray = *ray;

        while !bounces.is_full() {
            let Some(hit) = scene.intersect(&ray) else {
                bounces.push(Bounce {
                    emissive: scene.environment().sample(ray.direction),
                    multiplier: Color::ZERO,
                });
                break;
            };

            let material = scene.material(hit.material_index);
            if material.is_emissive() {
                bounces.push(Bounce {
                    emissive: material.emissive,
                    multiplier: Color::ZERO,
                });
                break;
            }

            let (direction, multiplier) =
                choose_direction_and_multiplier(material, ray.direction, hit.normal, hit.front_face, rng);
            bounces.push(Bounce {
                emissive: material.emissive,
                multiplier,
            });
            ray = Ray::offset(hit.point, direction, direction, RAY_EPSILON);
        }

        bounces
            .iter()
            .rev()
            .fold(Color::ZERO, |result, bounce| bounce.emissive + bounce.multiplier * result)
    }

    fn name(&self) -> &'static str {
        "path trace"
    }
}

/// Pick the next direction and the color it is weighted by.
///
/// `normal` faces the incoming direction. It is perturbed once by the
/// material's GGX lobe and every choice below uses that microfacet normal.
/// Conductors always reflect, tinted by their specular color. Refractive
/// materials choose between reflection and transmission with the Fresnel
/// reflectance as the reflection probability; total internal reflection always
/// reflects. Other materials go specular with probability `1 - roughness` and
/// diffuse otherwise. Diffuse bounces are cosine-distributed, which carries
/// the cosine factor.
fn choose_direction_and_multiplier(
    material: &Material,
    incident: Vec3,
    normal: Vec3,
    entering: bool,
    rng: &mut dyn RngCore,
) -> (Vec3, Color) {
    let microfacet = sample_ggx(normal, material.alpha, rng);

    match material.class {
        MaterialClass::Conductor => (specular_direction(incident, microfacet, normal), material.specular),
        _ if material.is_refractive() => {
            let (n1, n2) = if entering {
                (1.0, material.ior)
            } else {
                (material.ior, 1.0)
            };
            let eta = n1 / n2;
            let k = refraction_coefficient(incident, microfacet, eta);

            if k >= TRANSMISSION_EPSILON {
                let cos_theta = (-incident.dot(microfacet)).clamp(0.0, 1.0);
                if gen_f32(rng) >= fresnel_reflectance(cos_theta, n1, n2) {
                    let direction = refraction_direction(incident, microfacet, normal, eta);
                    return (direction, material.diffuse);
                }
            }
            (specular_direction(incident, microfacet, normal), material.specular)
        }
        _ => {
            if gen_f32(rng) < 1.0 - material.roughness {
                (specular_direction(incident, microfacet, normal), material.specular)
            } else {
                let surface = build_surface(material.diffuse, material.metalness, material.roughness);
                (diffuse_direction(microfacet, normal, rng), surface.diffuse_color)
            }
        }
    }
}
