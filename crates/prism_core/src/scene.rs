//! Scene description handed to the tracer.
//!
//! The tracer consumes a flat list of geometry entries, each pairing a mesh
//! with a world transform and a source material. Materials here are authored
//! in display-referred color; the tracer linearizes them on import.

use std::sync::Arc;

use prism_math::{Aabb, Mat4, Mat4Ext, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::mesh::Mesh;

/// A source material as exposed by the asset side.
///
/// Property names follow the authoring tool (`RoughnessScale`,
/// `MetallnessScale`, ...) so materials can be read straight from JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Material name, used to deduplicate materials shared by several batches
    #[serde(rename = "Name")]
    pub name: String,

    /// Diffuse reflectance (RGB, display-referred 0-1)
    #[serde(rename = "DiffuseReflectance")]
    pub diffuse_reflectance: Vec3,

    /// Specular reflectance (RGB, display-referred 0-1)
    #[serde(rename = "SpecularReflectance")]
    pub specular_reflectance: Vec3,

    /// Emitted radiance (RGB, linear)
    #[serde(rename = "EmissiveColor")]
    pub emissive_color: Vec3,

    /// Perceptual roughness (0=mirror, 1=rough)
    #[serde(rename = "RoughnessScale")]
    pub roughness_scale: f32,

    /// Metalness (0=dielectric, 1=conductor)
    #[serde(rename = "MetallnessScale")]
    pub metalness_scale: f32,

    /// Index of refraction; 0 marks an opaque surface
    #[serde(rename = "IndexOfRefraction")]
    pub index_of_refraction: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            diffuse_reflectance: Vec3::splat(0.5), // Grey default
            specular_reflectance: Vec3::ONE,
            emissive_color: Vec3::ZERO,
            roughness_scale: 1.0,
            metalness_scale: 0.0,
            index_of_refraction: 0.0,
        }
    }
}

impl Material {
    /// A rough diffuse material.
    pub fn diffuse(name: impl Into<String>, color: Vec3) -> Self {
        Self {
            name: name.into(),
            diffuse_reflectance: color,
            ..Default::default()
        }
    }

    /// A black diffuse surface emitting `radiance`.
    pub fn emissive(name: impl Into<String>, radiance: Vec3) -> Self {
        Self {
            name: name.into(),
            diffuse_reflectance: Vec3::ZERO,
            emissive_color: radiance,
            ..Default::default()
        }
    }

    /// A metal with the given tint and roughness.
    pub fn conductor(name: impl Into<String>, tint: Vec3, roughness: f32) -> Self {
        Self {
            name: name.into(),
            specular_reflectance: tint,
            roughness_scale: roughness,
            metalness_scale: 1.0,
            ..Default::default()
        }
    }

    /// A transparent dielectric such as glass or water.
    pub fn dielectric(name: impl Into<String>, tint: Vec3, ior: f32, roughness: f32) -> Self {
        Self {
            name: name.into(),
            diffuse_reflectance: tint,
            specular_reflectance: Vec3::ONE,
            roughness_scale: roughness,
            metalness_scale: 0.5,
            index_of_refraction: ior,
            ..Default::default()
        }
    }
}

/// Transform components that can be composed into a matrix.
#[derive(Clone, Debug)]
pub struct Transform {
    /// Translation
    pub translation: Vec3,

    /// Rotation (as quaternion)
    pub rotation: Quat,

    /// Scale
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform with only translation.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Convert to a 4x4 transformation matrix.
    ///
    /// Order: Scale -> Rotate -> Translate (SRT)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// One batch of triangles placed in the world with a material.
#[derive(Clone, Debug)]
pub struct GeometryEntry {
    pub mesh: Arc<Mesh>,
    pub transform: Mat4,
    pub material: Arc<Material>,
}

impl GeometryEntry {
    pub fn new(mesh: Arc<Mesh>, transform: Mat4, material: Arc<Material>) -> Self {
        Self {
            mesh,
            transform,
            material,
        }
    }

    /// World-space bounds of the batch.
    pub fn world_bounds(&self) -> Aabb {
        self.transform.transform_aabb(&self.mesh.bounds)
    }
}

/// A flat list of geometry entries making up one scene.
#[derive(Clone, Debug, Default)]
pub struct SceneDescription {
    pub entries: Vec<GeometryEntry>,

    /// Scene name (usually from filename)
    pub name: String,
}

impl SceneDescription {
    /// Create an empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Place `mesh` in the scene.
    pub fn add(&mut self, mesh: Arc<Mesh>, transform: Transform, material: Arc<Material>) {
        self.entries
            .push(GeometryEntry::new(mesh, transform.to_matrix(), material));
    }

    /// Compute the world-space bounding box of all entries.
    pub fn world_bounds(&self) -> Aabb {
        self.entries
            .iter()
            .fold(Aabb::EMPTY, |acc, e| Aabb::surrounding(&acc, &e.world_bounds()))
    }
}
