//! Microfacet BSDF terms.
//!
//! GGX distribution and Smith masking for the specular lobe, the
//! renormalized Burley diffuse term of Frostbite, and the per-point dot
//! products they share.

use prism_math::Vec3;
use std::f32::consts::PI;

use crate::material::Color;

/// Floor for denominators that vanish at grazing angles.
pub const MIN_FLOAT: f32 = 1e-7;

/// Smallest perceptual roughness fed to the GGX terms.
pub const MIN_ROUGHNESS: f32 = 0.01;

/// Base reflectance of a non-metal at normal incidence.
const DIELECTRIC_F0: f32 = 0.04;

/// Reflectance parameters of a shading point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub diffuse_color: Color,
    pub f0: Color,
    pub f90: Color,
    /// Perceptual roughness in `[MIN_ROUGHNESS, 1]`
    pub roughness: f32,
    /// `roughness^2`, the GGX width
    pub alpha: f32,
}

/// Dot products shared by every shading term at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bsdf {
    pub n_dot_l: f32,
    pub n_dot_v: f32,
    pub l_dot_h: f32,
    pub n_dot_h: f32,
}

pub fn build_surface(base_color: Color, metalness: f32, roughness: f32) -> Surface {
    let metalness = metalness.clamp(0.0, 1.0);
    let roughness = roughness.clamp(MIN_ROUGHNESS, 1.0);
    Surface {
        diffuse_color: base_color * (1.0 - metalness),
        f0: Vec3::splat(DIELECTRIC_F0).lerp(base_color, metalness),
        f90: Vec3::ONE,
        roughness,
        alpha: roughness * roughness,
    }
}

/// `n`, `l` and `v` are unit vectors; `l` and `v` point away from the surface.
pub fn build_bsdf(n: Vec3, l: Vec3, v: Vec3) -> Bsdf {
    let h = (l + v).normalize_or_zero();
    Bsdf {
        n_dot_l: n.dot(l).max(0.0),
        n_dot_v: n.dot(v).max(0.0),
        l_dot_h: l.dot(h).max(0.0),
        n_dot_h: n.dot(h).max(0.0),
    }
}

/// GGX normal distribution `D(h)`.
#[inline]
pub fn ggx_distribution(n_dot_h: f32, alpha: f32) -> f32 {
    let a2 = alpha * alpha;
    let d = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    a2 / (PI * (d * d).max(MIN_FLOAT))
}

/// Separable Smith masking-shadowing, `G1(l) * G1(v)`.
#[inline]
pub fn ggx_masking(n_dot_l: f32, n_dot_v: f32, alpha: f32) -> f32 {
    let a2 = alpha * alpha;
    let g1 = |x: f32| 2.0 * x / (x + (a2 + (1.0 - a2) * x * x).sqrt()).max(MIN_FLOAT);
    g1(n_dot_l) * g1(n_dot_v)
}

/// Height-correlated Smith masking-shadowing, `1 / (1 + lambda(l) + lambda(v))`.
#[inline]
pub fn ggx_masking_combined(n_dot_l: f32, n_dot_v: f32, alpha: f32) -> f32 {
    let a2 = alpha * alpha;
    let lambda = |x: f32| {
        let x2 = (x * x).max(MIN_FLOAT);
        0.5 * ((1.0 + a2 * (1.0 - x2) / x2).sqrt() - 1.0)
    };
    1.0 / (1.0 + lambda(n_dot_l) + lambda(n_dot_v))
}

#[inline]
pub fn fresnel_schlick(f0: Color, f90: Color, cos_theta: f32) -> Color {
    f0 + (f90 - f0) * (1.0 - cos_theta).clamp(0.0, 1.0).powi(5)
}

/// Renormalized Burley diffuse, written with lerps.
pub fn burley_diffuse_lerp(bsdf: &Bsdf, roughness: f32) -> f32 {
    let energy_bias = 0.5 * roughness;
    let energy_factor = 1.0 + (1.0 / 1.51 - 1.0) * roughness;
    let fd90 = energy_bias + 2.0 * bsdf.l_dot_h * bsdf.l_dot_h * roughness;

    let scatter = |cos: f32| 1.0 + (fd90 - 1.0) * (1.0 - cos).powi(5);
    scatter(bsdf.n_dot_l) * scatter(bsdf.n_dot_v) * energy_factor
}

/// Renormalized Burley diffuse, with the lerps multiplied out.
pub fn burley_diffuse_expanded(bsdf: &Bsdf, roughness: f32) -> f32 {
    let energy_bias = 0.5 * roughness;
    let energy_factor = 1.0 - 0.337_748_35 * roughness;
    let fd90 = energy_bias + 2.0 * bsdf.l_dot_h * bsdf.l_dot_h * roughness;

    let fl = (1.0 - bsdf.n_dot_l).powi(5);
    let fv = (1.0 - bsdf.n_dot_v).powi(5);
    let light_scatter = 1.0 - fl + fd90 * fl;
    let view_scatter = 1.0 - fv + fd90 * fv;
    light_scatter * view_scatter * energy_factor
}

/// Diffuse term without the `1 / pi` normalization.
#[inline]
pub fn diffuse_term(bsdf: &Bsdf, roughness: f32) -> f32 {
    #[cfg(feature = "expanded-diffuse")]
    {
        burley_diffuse_expanded(bsdf, roughness)
    }
    #[cfg(not(feature = "expanded-diffuse"))]
    {
        burley_diffuse_lerp(bsdf, roughness)
    }
}

/// Diffuse lobe times the cosine of the light direction.
pub fn diffuse_lighting(surface: &Surface, bsdf: &Bsdf) -> Color {
    surface.diffuse_color * (diffuse_term(bsdf, surface.roughness) / PI * bsdf.n_dot_l)
}

/// Specular lobe times the cosine of the light direction.
pub fn specular_lighting(surface: &Surface, bsdf: &Bsdf) -> Color {
    if bsdf.n_dot_l <= 0.0 || bsdf.n_dot_v <= 0.0 {
        return Color::ZERO;
    }
    let d = ggx_distribution(bsdf.n_dot_h, surface.alpha);
    let g = ggx_masking_combined(bsdf.n_dot_l, bsdf.n_dot_v, surface.alpha);
    let f = fresnel_schlick(surface.f0, surface.f90, bsdf.l_dot_h);
    f * (d * g / (4.0 * bsdf.n_dot_v).max(MIN_FLOAT))
}

/// Radiance reflected towards `v` per unit radiance arriving from `l`.
pub fn direct_lighting(surface: &Surface, bsdf: &Bsdf) -> Color {
    diffuse_lighting(surface, bsdf) + specular_lighting(surface, bsdf)
}
