//! Random numbers and direction sampling.
//!
//! Every sampler takes the caller's generator explicitly; nothing here keeps
//! hidden state, so each worker can own an independent stream.

use prism_math::Vec3;
use rand::{Rng, RngCore};
use std::f32::consts::PI;

/// Uniform float in `[0, 1)`.
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Build an orthonormal basis from a unit normal vector.
///
/// Branchless construction from Duff et al. 2017.
pub fn build_orthonormal_basis(n: Vec3) -> (Vec3, Vec3) {
    let sign = if n.z >= 0.0 { 1.0 } else { -1.0 };
    let a = -1.0 / (sign + n.z);
    let b = n.x * n.y * a;

    let tangent = Vec3::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
    let bitangent = Vec3::new(b, sign + n.y * n.y * a, -n.y);

    (tangent, bitangent)
}

/// Map a direction given in the local frame around `n` (z = up) to world space.
#[inline]
pub fn to_world(local: Vec3, n: Vec3) -> Vec3 {
    let (tangent, bitangent) = build_orthonormal_basis(n);
    local.x * tangent + local.y * bitangent + local.z * n
}

/// Cosine-weighted direction on the hemisphere around `n`.
///
/// The pdf is `cos(theta) / pi`.
pub fn sample_cosine_hemisphere(n: Vec3, rng: &mut dyn RngCore) -> Vec3 {
    let u1 = gen_f32(rng);
    let u2 = gen_f32(rng);
    let r = u1.sqrt();
    let phi = 2.0 * PI * u2;
    let local = Vec3::new(r * phi.cos(), r * phi.sin(), (1.0 - u1).max(0.0).sqrt());
    to_world(local, n)
}

/// Uniform direction on the hemisphere around `n`. The pdf is `1 / (2 pi)`.
pub fn sample_uniform_hemisphere(n: Vec3, rng: &mut dyn RngCore) -> Vec3 {
    let z = gen_f32(rng);
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * gen_f32(rng);
    to_world(Vec3::new(r * phi.cos(), r * phi.sin(), z), n)
}

/// Sample a GGX-distributed microfacet normal around `n`.
///
/// `alpha` is the GGX width (squared perceptual roughness).
pub fn sample_ggx(n: Vec3, alpha: f32, rng: &mut dyn RngCore) -> Vec3 {
    let u1 = gen_f32(rng);
    let u2 = gen_f32(rng);

    let theta = (alpha * u1.sqrt() / (1.0 - u1).max(f32::MIN_POSITIVE).sqrt()).atan();
    let phi = 2.0 * PI * u2;

    let (sin_theta, cos_theta) = theta.sin_cos();
    let local = Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);
    to_world(local, n)
}

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refraction coefficient `k = 1 - eta^2 (1 - cos^2)` for incident `i` on a
/// surface facing it with normal `n`. Transmission is possible iff `k >= 0`.
#[inline]
pub fn refraction_coefficient(i: Vec3, n: Vec3, eta: f32) -> f32 {
    let cos_i = -i.dot(n);
    1.0 - eta * eta * (1.0 - cos_i * cos_i)
}

/// Snell refraction of `i` through a surface whose normal `n` faces the
/// incident side. `eta` is n_incident / n_transmitted. Returns `None` on
/// total internal reflection.
pub fn refract(i: Vec3, n: Vec3, eta: f32) -> Option<Vec3> {
    let k = refraction_coefficient(i, n, eta);
    if k < 0.0 {
        return None;
    }
    let cos_i = -i.dot(n);
    Some((eta * i + (eta * cos_i - k.sqrt()) * n).normalize())
}

/// Flip `d` back over the surface when it points below `n`.
#[inline]
fn keep_above(d: Vec3, n: Vec3) -> Vec3 {
    if d.dot(n) <= 0.0 {
        reflect(d, n)
    } else {
        d
    }
}

/// Cosine-weighted diffuse bounce around the microfacet normal `m`, kept on
/// the side of the facing normal `n`.
pub fn diffuse_direction(m: Vec3, n: Vec3, rng: &mut dyn RngCore) -> Vec3 {
    keep_above(sample_cosine_hemisphere(m, rng), n)
}

/// Mirror reflection of `i` about the microfacet normal `m`.
///
/// A reflection that ends up below the surface is reflected back about `n`.
pub fn specular_direction(i: Vec3, m: Vec3, n: Vec3) -> Vec3 {
    keep_above(reflect(i, m), n)
}

/// Refraction of `i` through the microfacet normal `m`.
///
/// Falls back to [`specular_direction`] under total internal reflection. A
/// transmitted direction that ends up on the incident side is reflected back
/// through the surface.
pub fn refraction_direction(i: Vec3, m: Vec3, n: Vec3, eta: f32) -> Vec3 {
    match refract(i, m, eta) {
        Some(t) if t.dot(n) >= 0.0 => reflect(t, n),
        Some(t) => t,
        None => specular_direction(i, m, n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_orthonormal_basis() {
        for n in [Vec3::Y, -Vec3::Z, Vec3::new(1.0, 2.0, -3.0).normalize()] {
            let (t, b) = build_orthonormal_basis(n);

            // Check orthogonality
            assert!(t.dot(n).abs() < 0.001);
            assert!(b.dot(n).abs() < 0.001);
            assert!(t.dot(b).abs() < 0.001);

            // Check unit length
            assert!((t.length() - 1.0).abs() < 0.001);
            assert!((b.length() - 1.0).abs() < 0.001);
        }
    }

    #[test]
    fn test_hemisphere_samples_stay_above() {
        let mut rng = StdRng::seed_from_u64(7);
        let n = Vec3::new(0.3, -0.5, 0.8).normalize();
        for _ in 0..1000 {
            let c = sample_cosine_hemisphere(n, &mut rng);
            let u = sample_uniform_hemisphere(n, &mut rng);
            assert!(c.dot(n) >= -1e-5);
            assert!(u.dot(n) >= -1e-5);
            assert!((c.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_cosine_hemisphere_mean() {
        // E[cos] under the cosine pdf is 2/3
        let mut rng = StdRng::seed_from_u64(11);
        let count = 20_000;
        let mean: f32 = (0..count)
            .map(|_| sample_cosine_hemisphere(Vec3::Z, &mut rng).z)
            .sum::<f32>()
            / count as f32;
        assert!((mean - 2.0 / 3.0).abs() < 0.01, "mean cos {mean}");
    }

    #[test]
    fn test_reflect() {
        let d = reflect(Vec3::new(1.0, -1.0, 0.0), Vec3::Y);
        assert_eq!(d, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_refract_straight_through() {
        let t = refract(-Vec3::Y, Vec3::Y, 1.0 / 1.5).unwrap();
        assert!((t + Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_refract_snell() {
        let i = Vec3::new(0.5_f32.sqrt(), -0.5_f32.sqrt(), 0.0);
        let eta = 1.0 / 1.5;
        let t = refract(i, Vec3::Y, eta).unwrap();
        // sin(t) = eta * sin(i)
        assert!((t.x - eta * i.x).abs() < 1e-5);
        assert!(t.y < 0.0);
    }

    #[test]
    fn test_total_internal_reflection() {
        // Leaving glass at 60 degrees is past the critical angle (~41.8)
        let i = Vec3::new(60f32.to_radians().sin(), -60f32.to_radians().cos(), 0.0);
        assert!(refraction_coefficient(i, Vec3::Y, 1.5) < 0.0);
        assert!(refract(i, Vec3::Y, 1.5).is_none());
    }

    #[test]
    fn test_specular_direction_above_surface() {
        let mut rng = StdRng::seed_from_u64(3);
        let i = Vec3::new(1.0, -0.05, 0.0).normalize();
        for _ in 0..1000 {
            let m = sample_ggx(Vec3::Y, 0.8, &mut rng);
            assert!(specular_direction(i, m, Vec3::Y).y >= 0.0);
        }
    }

    #[test]
    fn test_smooth_specular_is_mirror() {
        let mut rng = StdRng::seed_from_u64(5);
        let i = Vec3::new(1.0, -1.0, 0.0).normalize();
        let m = sample_ggx(Vec3::Y, 1e-8, &mut rng);
        let d = specular_direction(i, m, Vec3::Y);
        assert!((d - Vec3::new(1.0, 1.0, 0.0).normalize()).length() < 1e-3);
    }

    #[test]
    fn test_refraction_direction_below_surface() {
        let mut rng = StdRng::seed_from_u64(9);
        let i = Vec3::new(0.2, -1.0, 0.1).normalize();
        for _ in 0..1000 {
            let m = sample_ggx(Vec3::Y, 0.3, &mut rng);
            assert!(refraction_direction(i, m, Vec3::Y, 1.0 / 1.5).y <= 1e-5);
        }
    }

    #[test]
    fn test_diffuse_direction_above_surface() {
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..1000 {
            // A wide lobe tilts some microfacet normals far from the surface normal
            let m = sample_ggx(Vec3::Y, 1.0, &mut rng);
            let d = diffuse_direction(m, Vec3::Y, &mut rng);
            assert!(d.y >= 0.0);
            assert!((d.length() - 1.0).abs() < 1e-4);
        }
    }
}
