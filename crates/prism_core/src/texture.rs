//! Image-backed textures.
//!
//! Textures are decoded with the `image` crate into linear RGBA floats.
//! Low dynamic range images are assumed sRGB encoded; floating point
//! formats (Radiance HDR, OpenEXR) are taken as already linear.

use std::path::Path;

use prism_math::Vec3;
use thiserror::Error;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to load texture {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Texture {0} has no pixels")]
    Empty(String),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A loaded texture with pixel data.
///
/// Stores pixels in linear RGB(A) float format for rendering.
#[derive(Clone, Debug)]
pub struct Texture {
    /// Texture width in pixels
    pub width: u32,

    /// Texture height in pixels
    pub height: u32,

    /// Stored as [R, G, B, A] per pixel, row-major order, top row first
    pub pixels: Vec<[f32; 4]>,

    /// Original file path (for debugging)
    pub path: String,
}

impl Texture {
    /// Create a new texture from pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<[f32; 4]>, path: impl Into<String>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height) as usize);
        Self {
            width,
            height,
            pixels,
            path: path.into(),
        }
    }

    /// Load a texture from a file path.
    pub fn load(path: impl AsRef<Path>) -> TextureResult<Self> {
        let path = path.as_ref();
        let name = path.to_string_lossy().to_string();

        let img = image::open(path).map_err(|source| match source {
            image::ImageError::IoError(e) => TextureError::Io(e),
            source => TextureError::Load {
                path: name.clone(),
                source,
            },
        })?;

        let is_float = matches!(
            img.color(),
            image::ColorType::Rgb32F | image::ColorType::Rgba32F
        );

        let (width, height, pixels) = if is_float {
            let rgba = img.to_rgba32f();
            let (w, h) = rgba.dimensions();
            (w, h, rgba.pixels().map(|p| p.0).collect::<Vec<_>>())
        } else {
            let rgba = img.to_rgba8();
            let (w, h) = rgba.dimensions();
            let pixels = rgba
                .pixels()
                .map(|p| {
                    [
                        srgb_to_linear(p[0]),
                        srgb_to_linear(p[1]),
                        srgb_to_linear(p[2]),
                        p[3] as f32 / 255.0, // Alpha is linear
                    ]
                })
                .collect::<Vec<_>>();
            (w, h, pixels)
        };

        if pixels.is_empty() {
            return Err(TextureError::Empty(name));
        }

        log::debug!(
            "Loaded texture: {} ({}x{}, {:.1} KB{})",
            name,
            width,
            height,
            (pixels.len() * std::mem::size_of::<[f32; 4]>()) as f32 / 1024.0,
            if is_float { ", float" } else { "" }
        );

        Ok(Self::new(width, height, pixels, name))
    }

    /// Sample the texture at UV coordinates (bilinear filtering).
    ///
    /// (0, 0) is the bottom-left corner and texel centers sit at half-pixel
    /// offsets. U wraps around, so the left and right columns blend across the
    /// seam. V is clamped so the poles of a lat-long map don't bleed into each
    /// other. An empty texture samples black.
    pub fn sample(&self, u: f32, v: f32) -> Vec3 {
        if self.width == 0 || self.height == 0 {
            return Vec3::ZERO;
        }

        // Continuous texel coordinates, flipping V for image rows
        let x = u.rem_euclid(1.0) * self.width as f32 - 0.5;
        let y = ((1.0 - v.clamp(0.0, 1.0)) * self.height as f32 - 0.5).clamp(0.0, (self.height - 1) as f32);

        let fx = x - x.floor();
        let fy = y - y.floor();

        let x0 = (x.floor() as i64).rem_euclid(self.width as i64) as u32;
        let x1 = (x0 + 1) % self.width;
        let y0 = y.floor() as u32;
        let y1 = (y0 + 1).min(self.height - 1);

        let top = self.texel(x0, y0).lerp(self.texel(x1, y0), fx);
        let bottom = self.texel(x0, y1).lerp(self.texel(x1, y1), fx);

        top.lerp(bottom, fy)
    }

    /// RGB of the pixel at integer coordinates; black when out of range.
    fn texel(&self, x: u32, y: u32) -> Vec3 {
        let idx = (y * self.width + x) as usize;
        self.pixels
            .get(idx)
            .map(|p| Vec3::new(p[0], p[1], p[2]))
            .unwrap_or(Vec3::ZERO)
    }
}

/// Convert sRGB byte value to linear float.
fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> Texture {
        // 2x2: top row red/green, bottom row blue/white
        Texture::new(
            2,
            2,
            vec![
                [1.0, 0.0, 0.0, 1.0],
                [0.0, 1.0, 0.0, 1.0],
                [0.0, 0.0, 1.0, 1.0],
                [1.0, 1.0, 1.0, 1.0],
            ],
            "checker",
        )
    }

    #[test]
    fn test_sample_texel_centers() {
        let tex = checker();

        // v = 1 is the top row
        assert!((tex.sample(0.25, 0.75) - Vec3::X).length() < 1e-5);
        assert!((tex.sample(0.75, 0.75) - Vec3::Y).length() < 1e-5);
        assert!((tex.sample(0.25, 0.25) - Vec3::Z).length() < 1e-5);

        let center = tex.sample(0.5, 0.5);
        assert!((center - Vec3::new(0.5, 0.5, 0.5)).length() < 1e-5);
    }

    #[test]
    fn test_sample_wraps_across_u_seam() {
        let tex = checker();

        // u = 0 sits halfway between the last and the first column
        let seam = tex.sample(0.0, 0.75);
        assert!((seam - Vec3::new(0.5, 0.5, 0.0)).length() < 1e-5);
        assert!((tex.sample(1.0, 0.75) - seam).length() < 1e-5);
        assert!((tex.sample(0.999, 0.75) - tex.sample(-0.001, 0.75)).length() < 1e-4);
    }

    #[test]
    fn test_empty_texture_samples_black() {
        let tex = Texture::new(0, 0, Vec::new(), "empty");
        assert_eq!(tex.sample(0.3, 0.6), Vec3::ZERO);
    }

    #[test]
    fn test_sample_clamps_v() {
        let tex = checker();
        assert_eq!(tex.sample(0.0, 1.5), tex.sample(0.0, 1.0));
        assert_eq!(tex.sample(0.0, -0.5), tex.sample(0.0, 0.0));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Texture::load("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, TextureError::Io(_)));
    }

    #[test]
    fn test_srgb_to_linear() {
        // Black stays black
        assert!((srgb_to_linear(0) - 0.0).abs() < 0.001);

        // White stays white
        assert!((srgb_to_linear(255) - 1.0).abs() < 0.001);

        // Mid-gray is darker in linear
        let mid = srgb_to_linear(128);
        assert!(mid < 0.5);
        assert!(mid > 0.1);
    }
}
