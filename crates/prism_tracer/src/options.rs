//! Render options.
//!
//! Options are plain data read from JSON (camelCase keys). Every field has a
//! default, so a partial document only overrides what it names.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kd_tree::MAX_KD_TREE_DEPTH;

/// Errors produced while reading or validating [`Options`].
#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("Failed to parse options: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid option {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Options consumed by scene build and the region renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Samples averaged per output pixel
    pub rays_per_pixel: u32,

    /// Hard recursion bound for the KD-tree build
    #[serde(rename = "maxKDTreeDepth")]
    pub max_kd_tree_depth: u32,

    /// Triangle count at or below which a KD-tree node becomes a leaf
    #[serde(rename = "kdTreeLeafSize")]
    pub kd_tree_leaf_size: u32,

    /// Unsuccessful split attempts tolerated before forcing a leaf
    #[serde(rename = "kdTreeSplits")]
    pub kd_tree_splits: u32,

    /// Edge length in pixels of the regions dispatched to workers
    pub render_region_size: u32,

    /// Replace the configured integrator with a diagnostic view
    pub debug_rendering: bool,

    /// Dump the KD-tree structure to the log after building it
    #[serde(rename = "renderKDTree")]
    pub render_kd_tree: bool,

    /// Lens aperture diameter; 0 gives a pinhole camera
    pub aperture_size: f32,

    /// Added to the center-ray hit distance to get the focal distance
    pub focal_distance_correction: f32,

    /// Base seed for the per-region random generators
    pub seed: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            rays_per_pixel: 4,
            max_kd_tree_depth: 24,
            kd_tree_leaf_size: 2,
            kd_tree_splits: 3,
            render_region_size: 32,
            debug_rendering: false,
            render_kd_tree: false,
            aperture_size: 0.0,
            focal_distance_correction: 0.0,
            seed: 0,
        }
    }
}

impl Options {
    /// Parse options from a JSON document and validate them.
    pub fn from_json_str(json: &str) -> Result<Self, OptionsError> {
        let options: Options = serde_json::from_str(json)?;
        options.validate()
    }

    /// Check option values, clamping the tree depth to the traversal stack.
    pub fn validate(mut self) -> Result<Self, OptionsError> {
        if self.rays_per_pixel == 0 {
            return Err(OptionsError::Invalid {
                name: "raysPerPixel",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.render_region_size == 0 {
            return Err(OptionsError::Invalid {
                name: "renderRegionSize",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_kd_tree_depth == 0 {
            return Err(OptionsError::Invalid {
                name: "maxKDTreeDepth",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.aperture_size < 0.0 {
            return Err(OptionsError::Invalid {
                name: "apertureSize",
                reason: format!("{} is negative", self.aperture_size),
            });
        }
        if self.max_kd_tree_depth as usize > MAX_KD_TREE_DEPTH {
            log::warn!(
                "maxKDTreeDepth {} exceeds the traversal stack, clamping to {}",
                self.max_kd_tree_depth,
                MAX_KD_TREE_DEPTH
            );
            self.max_kd_tree_depth = MAX_KD_TREE_DEPTH as u32;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options = Options::from_json_str(r#"{ "raysPerPixel": 64, "renderKDTree": true }"#).unwrap();
        assert_eq!(options.rays_per_pixel, 64);
        assert!(options.render_kd_tree);
        assert_eq!(options.render_region_size, Options::default().render_region_size);
    }

    #[test]
    fn test_option_names() {
        let json = serde_json::to_value(Options::default()).unwrap();
        for key in [
            "raysPerPixel",
            "maxKDTreeDepth",
            "kdTreeLeafSize",
            "kdTreeSplits",
            "renderRegionSize",
            "debugRendering",
            "renderKDTree",
            "apertureSize",
            "focalDistanceCorrection",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
    }

    #[test]
    fn test_depth_is_clamped() {
        let options = Options::from_json_str(r#"{ "maxKDTreeDepth": 1000 }"#).unwrap();
        assert_eq!(options.max_kd_tree_depth as usize, MAX_KD_TREE_DEPTH);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            Options::from_json_str(r#"{ "raysPerPixel": 0 }"#),
            Err(OptionsError::Invalid { name: "raysPerPixel", .. })
        ));
        assert!(matches!(
            Options::from_json_str(r#"{ "renderRegionSize": 0 }"#),
            Err(OptionsError::Invalid { .. })
        ));
        assert!(matches!(
            Options::from_json_str("{ not json"),
            Err(OptionsError::Parse(_))
        ));
    }
}
