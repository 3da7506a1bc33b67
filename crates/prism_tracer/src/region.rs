//! Region-based image partitioning.
//!
//! Divides the output into rectangular regions that are traced
//! independently, ordered from the image center outward.

use prism_math::UVec2;

/// A rectangular region of the output image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// X coordinate of the region's top-left corner
    pub x: u32,
    /// Y coordinate of the region's top-left corner
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Position of this region in the render order
    pub index: usize,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    /// Pixels of the region in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = UVec2> + '_ {
        (self.y..self.y + self.height)
            .flat_map(move |y| (self.x..self.x + self.width).map(move |x| UVec2::new(x, y)))
    }
}

/// Tile a `width` x `height` image into regions of at most `region_size`
/// pixels a side, sorted so regions nearest the center come first.
pub fn generate_regions(width: u32, height: u32, region_size: u32) -> Vec<Region> {
    let region_size = region_size.max(1);
    let mut regions = Vec::new();

    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let rw = region_size.min(width - x);
            let rh = region_size.min(height - y);
            regions.push(Region::new(x, y, rw, rh, regions.len()));
            x += region_size;
        }
        y += region_size;
    }

    sort_spiral(&mut regions, width, height);

    for (i, region) in regions.iter_mut().enumerate() {
        region.index = i;
    }

    regions
}

/// Sort regions by distance from the image center.
fn sort_spiral(regions: &mut [Region], width: u32, height: u32) {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    let distance = |r: &Region| {
        let dx = r.x as f32 + r.width as f32 / 2.0 - center_x;
        let dy = r.y as f32 + r.height as f32 / 2.0 - center_y;
        dx * dx + dy * dy
    };

    // Stable, so ties keep scanline order
    regions.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_regions_exact_fit() {
        let regions = generate_regions(128, 128, 64);
        assert_eq!(regions.len(), 4); // 2x2 grid

        let total_pixels: u32 = regions.iter().map(|r| r.pixel_count()).sum();
        assert_eq!(total_pixels, 128 * 128);
    }

    #[test]
    fn test_generate_regions_partial_fit() {
        let regions = generate_regions(100, 70, 32);
        assert_eq!(regions.len(), 4 * 3);

        let total_pixels: u32 = regions.iter().map(|r| r.pixel_count()).sum();
        assert_eq!(total_pixels, 100 * 70);
    }

    #[test]
    fn test_every_pixel_once() {
        let regions = generate_regions(37, 23, 8);
        let mut seen = HashSet::new();
        for region in &regions {
            for pixel in region.pixels() {
                assert!(pixel.x < 37 && pixel.y < 23);
                assert!(seen.insert(pixel), "pixel {pixel} covered twice");
            }
        }
        assert_eq!(seen.len(), 37 * 23);
    }

    #[test]
    fn test_spiral_order() {
        let regions = generate_regions(192, 192, 64);
        assert_eq!(regions.len(), 9); // 3x3 grid

        // First region should be the center one
        assert_eq!((regions[0].x, regions[0].y), (64, 64));
        assert!(regions.iter().enumerate().all(|(i, r)| r.index == i));
    }

    #[test]
    fn test_empty_image() {
        assert!(generate_regions(0, 10, 8).is_empty());
    }
}
