//! Fresnel reflectance with phase, per polarization.
//!
//! Both functions return `(reflectance, phase)` where `x` holds the
//! s-polarized (perpendicular) component and `y` the p-polarized one. The
//! phase shifts are what thin-film interference needs; plain shading only
//! uses the reflectance, see [`fresnel_reflectance`].

use prism_math::Vec2;
use std::f32::consts::PI;

use crate::bsdf::MIN_FLOAT;

/// Fresnel terms at a dielectric/dielectric interface.
///
/// `cos_theta1` is the cosine of the incident angle, `n1` the index on the
/// incident side and `n2` the index on the far side.
pub fn fresnel_dielectric(cos_theta1: f32, n1: f32, n2: f32) -> (Vec2, Vec2) {
    let cos_theta1 = cos_theta1.clamp(0.0, 1.0);
    // sin^2 of the incident angle
    let sin2_theta1 = 1.0 - cos_theta1 * cos_theta1;
    let nr = n1 / n2;
    let nr2 = nr * nr;

    if nr2 * sin2_theta1 > 1.0 {
        // Total internal reflection
        let d = (sin2_theta1 - 1.0 / nr2).sqrt() / cos_theta1.max(MIN_FLOAT);
        let phase = Vec2::new(2.0 * (-nr2 * d).atan(), 2.0 * (-d).atan());
        return (Vec2::ONE, phase);
    }

    let cos_theta2 = (1.0 - nr2 * sin2_theta1).max(0.0).sqrt();
    let rs = (n2 * cos_theta1 - n1 * cos_theta2) / (n2 * cos_theta1 + n1 * cos_theta2).max(MIN_FLOAT);
    let rp = (n1 * cos_theta1 - n2 * cos_theta2) / (n1 * cos_theta1 + n2 * cos_theta2).max(MIN_FLOAT);

    let phase = Vec2::new(
        if rs < 0.0 { PI } else { 0.0 },
        if rp < 0.0 { PI } else { 0.0 },
    );
    (Vec2::new(rs * rs, rp * rp), phase)
}

/// Fresnel terms at a dielectric/conductor interface.
///
/// The conductor's complex index is `n2 (1 + i k)`. With `k == 0` this is the
/// dielectric case.
pub fn fresnel_conductor(cos_theta1: f32, n1: f32, n2: f32, k: f32) -> (Vec2, Vec2) {
    if k == 0.0 {
        return fresnel_dielectric(cos_theta1, n1, n2);
    }

    let ct1 = cos_theta1.clamp(0.0, 1.0);
    let sqr = |x: f32| x * x;

    let a = sqr(n2) * (1.0 - sqr(k)) - sqr(n1) * (1.0 - sqr(ct1));
    let b = (sqr(a) + sqr(2.0 * sqr(n2) * k)).sqrt();
    let u = ((a + b) / 2.0).max(0.0).sqrt();
    let v = ((b - a) / 2.0).max(0.0).sqrt();

    let rp = (sqr(n1 * ct1 - u) + sqr(v)) / (sqr(n1 * ct1 + u) + sqr(v)).max(MIN_FLOAT);
    let phase_p = (sqr(u) + sqr(v) - sqr(n1 * ct1)).atan2(2.0 * n1 * v * ct1) + PI;

    let x = sqr(n2) * (1.0 - sqr(k)) * ct1;
    let y = 2.0 * sqr(n2) * k * ct1;
    let rs = (sqr(x - n1 * u) + sqr(y - n1 * v)) / (sqr(x + n1 * u) + sqr(y + n1 * v)).max(MIN_FLOAT);
    let phase_s = (sqr(sqr(n2) * (1.0 + sqr(k)) * ct1) - sqr(n1) * (sqr(u) + sqr(v)))
        .atan2(2.0 * n1 * sqr(n2) * ct1 * (2.0 * k * u - (1.0 - sqr(k)) * v));

    (Vec2::new(rs, rp), Vec2::new(phase_s, phase_p))
}

/// Unpolarized dielectric reflectance, the mean of both polarizations.
#[inline]
pub fn fresnel_reflectance(cos_theta1: f32, n1: f32, n2: f32) -> f32 {
    let (r, _) = fresnel_dielectric(cos_theta1, n1, n2);
    0.5 * (r.x + r.y)
}
