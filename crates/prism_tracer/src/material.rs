//! Materials as the tracer sees them.
//!
//! Source materials are display-referred and carry free-form scales. They are
//! converted once at scene build into linear reflectances, a remapped
//! roughness and a class tag the integrators branch on.

use prism_math::Vec3;

/// Color type alias (linear RGB, unbounded)
pub type Color = Vec3;

/// Lower bound of the remapped roughness.
pub const MIN_MATERIAL_ROUGHNESS: f32 = 0.001;

/// Gamma used to decode display-referred reflectances.
const REFLECTANCE_GAMMA: f32 = 2.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialClass {
    Diffuse,
    Conductor,
    Dielectric,
}

impl MaterialClass {
    /// Classify by metalness: exactly 1 is a conductor, anything strictly
    /// between 0 and 1 a dielectric, the rest diffuse.
    pub fn from_metalness(metalness: f32) -> Self {
        if metalness == 1.0 {
            MaterialClass::Conductor
        } else if metalness > 0.0 && metalness < 1.0 {
            MaterialClass::Dielectric
        } else {
            MaterialClass::Diffuse
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub class: MaterialClass,
    /// Linear diffuse reflectance; also the transmission tint of dielectrics
    pub diffuse: Color,
    /// Linear specular reflectance
    pub specular: Color,
    pub emissive: Color,
    /// `clamp(roughness^4, 0.001, 1)`
    pub roughness: f32,
    /// GGX lobe width used when sampling directions
    pub alpha: f32,
    pub metalness: f32,
    pub ior: f32,
}

impl Material {
    pub fn from_source(source: &prism_core::Material) -> Self {
        let roughness = remap_roughness(source.roughness_scale);
        Self {
            name: source.name.clone(),
            class: MaterialClass::from_metalness(source.metalness_scale),
            diffuse: gamma_decode(source.diffuse_reflectance),
            specular: gamma_decode(source.specular_reflectance),
            emissive: source.emissive_color,
            roughness,
            alpha: roughness.sqrt(),
            metalness: source.metalness_scale,
            ior: source.index_of_refraction,
        }
    }

    #[inline]
    pub fn is_emissive(&self) -> bool {
        self.emissive.length_squared() > 0.0
    }

    /// Materials that may transmit light take the refractive bounce branch.
    #[inline]
    pub fn is_refractive(&self) -> bool {
        self.ior >= 1.0
    }
}

#[inline]
pub fn remap_roughness(roughness: f32) -> f32 {
    roughness.powi(4).clamp(MIN_MATERIAL_ROUGHNESS, 1.0)
}

#[inline]
pub fn gamma_decode(color: Color) -> Color {
    Color::new(
        color.x.max(0.0).powf(REFLECTANCE_GAMMA),
        color.y.max(0.0).powf(REFLECTANCE_GAMMA),
        color.z.max(0.0).powf(REFLECTANCE_GAMMA),
    )
}
