//! Radiance arriving from outside the scene.

use prism_core::{Texture, TextureResult};
use prism_math::Vec3;
use std::f32::consts::PI;
use std::path::Path;

use crate::material::Color;

/// Radiance seen along a direction that leaves the scene.
///
/// Samplers are shared by every render worker.
pub trait EnvironmentSampler: Send + Sync {
    /// `direction` is a unit vector.
    fn sample(&self, direction: Vec3) -> Color;
}

/// Same radiance in every direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantEnvironment {
    pub radiance: Color,
}

impl ConstantEnvironment {
    pub fn new(radiance: Color) -> Self {
        Self { radiance }
    }

    pub fn black() -> Self {
        Self::new(Color::ZERO)
    }
}

impl EnvironmentSampler for ConstantEnvironment {
    fn sample(&self, _direction: Vec3) -> Color {
        self.radiance
    }
}

/// Sky blending from the horizon color to the zenith color along +Y.
///
/// Directions below the horizon get the horizon color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientEnvironment {
    pub horizon: Color,
    pub zenith: Color,
}

impl GradientEnvironment {
    pub fn new(horizon: Color, zenith: Color) -> Self {
        Self { horizon, zenith }
    }
}

impl Default for GradientEnvironment {
    fn default() -> Self {
        Self::new(Color::ONE, Color::new(0.5, 0.7, 1.0))
    }
}

impl EnvironmentSampler for GradientEnvironment {
    fn sample(&self, direction: Vec3) -> Color {
        let t = direction.y.clamp(0.0, 1.0);
        self.horizon.lerp(self.zenith, t)
    }
}

/// Latitude-longitude environment map.
#[derive(Debug, Clone)]
pub struct EquirectangularEnvironment {
    texture: Texture,
    pub intensity: f32,
}

impl EquirectangularEnvironment {
    pub fn new(texture: Texture) -> Self {
        Self {
            texture,
            intensity: 1.0,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> TextureResult<Self> {
        let texture = Texture::load(path)?;
        log::info!(
            "Environment map {} ({}x{})",
            texture.path,
            texture.width,
            texture.height
        );
        Ok(Self::new(texture))
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }
}

/// Spherical texture coordinates of a unit direction. +Y maps to the top
/// row (`v = 1`) and `u` turns around +Y starting at +X.
pub fn direction_to_uv(direction: Vec3) -> (f32, f32) {
    let u = 0.5 + direction.z.atan2(direction.x) / (2.0 * PI);
    let v = 1.0 - direction.y.clamp(-1.0, 1.0).acos() / PI;
    (u, v)
}

impl EnvironmentSampler for EquirectangularEnvironment {
    fn sample(&self, direction: Vec3) -> Color {
        let (u, v) = direction_to_uv(direction);
        self.texture.sample(u, v) * self.intensity
    }
}
