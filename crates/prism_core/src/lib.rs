//! Prism Core - scene input types for the prism ray tracer.
//!
//! This crate provides the geometry and material description that the
//! tracer flattens into its own triangle soup:
//!
//! - **Meshes**: indexed triangle batches with optional normals and UVs
//! - **Materials**: display-referred source materials with named properties
//! - **Geometry entries**: `(mesh, world transform, material)` triples
//! - **Textures**: image-backed RGBA float textures with bilinear sampling
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use prism_core::{GeometryEntry, Material, Mesh, SceneDescription, Transform};
//!
//! let mut scene = SceneDescription::new("demo");
//! let floor = Arc::new(Mesh::quad([a, b, c, d]));
//! let grey = Arc::new(Material::diffuse("grey", Vec3::splat(0.5)));
//! scene.add(floor, Transform::default(), grey);
//! ```

pub mod mesh;
pub mod scene;
pub mod texture;

// Re-export commonly used types
pub use mesh::Mesh;
pub use scene::{GeometryEntry, Material, SceneDescription, Transform};
pub use texture::{Texture, TextureError, TextureResult};
