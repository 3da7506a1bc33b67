//! The tracer's flattened scene.
//!
//! Geometry entries are baked into one world-space triangle list with a
//! material index per triangle. Materials are deduplicated by name, emissive
//! batches become emitters, and a KD-tree is built over the result. Nothing
//! is shared by pointer: triangles refer to materials and emitters refer to
//! triangles by index.

use std::sync::Arc;
use std::time::Instant;

use prism_core::GeometryEntry;
use prism_math::{Interval, Mat4Ext, Ray, Vec2, Vec3};
use thiserror::Error;

use crate::camera::Camera;
use crate::emitter::Emitter;
use crate::environment::EnvironmentSampler;
use crate::kd_tree::{BuildSettings, KdTree};
use crate::material::Material;
use crate::options::Options;
use crate::triangle::Triangle;

/// Distance secondary rays are pushed off the surface they leave.
pub const RAY_EPSILON: f32 = 1e-4;

/// Input rejected by [`Scene::build`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("Geometry entry {entry} ({material}) has no vertices")]
    EmptyVertices { entry: usize, material: String },

    #[error("Geometry entry {entry} ({material}) has no indices")]
    EmptyIndices { entry: usize, material: String },

    #[error("Geometry entry {entry} has {count} indices, not a multiple of three")]
    IndexCount { entry: usize, count: usize },

    #[error("Geometry entry {entry} references vertex {index} of {vertex_count}")]
    IndexOutOfRange {
        entry: usize,
        index: u32,
        vertex_count: usize,
    },
}

/// Nearest surface along a ray, resolved for shading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub triangle_index: u32,
    pub material_index: u32,
    pub point: Vec3,
    pub distance: f32,
    /// Interpolated shading normal, turned to face the incoming ray
    pub normal: Vec3,
    /// True if the ray arrived on the side the triangle winding faces
    pub front_face: bool,
    pub uv: Vec2,
}

pub struct Scene {
    triangles: Vec<Triangle>,
    materials: Vec<Material>,
    emitters: Vec<Emitter>,
    kd_tree: KdTree,
    environment: Arc<dyn EnvironmentSampler>,
    options: Options,
    center_ray: Ray,
    focal_distance: Option<f32>,
}

impl Scene {
    /// Flatten `entries` and build the acceleration structure.
    ///
    /// `camera` provides the center ray used to find the focal distance.
    pub fn build(
        entries: &[GeometryEntry],
        camera: &Camera,
        options: Options,
        environment: Arc<dyn EnvironmentSampler>,
    ) -> Result<Self, SceneError> {
        let start = Instant::now();

        let (triangles, materials, mut emitters) = flatten(entries).map_err(|e| {
            log::error!("Scene build failed: {}", e);
            e
        })?;

        for emitter in &mut emitters {
            emitter.prepare(&triangles);
        }

        let kd_tree = KdTree::build(
            &triangles,
            BuildSettings {
                max_depth: options.max_kd_tree_depth,
                leaf_size: options.kd_tree_leaf_size,
                max_bad_refines: options.kd_tree_splits,
            },
        );
        if options.render_kd_tree {
            kd_tree.log_structure();
        } else {
            log::info!("KD-tree: {}", kd_tree.nodes_statistics());
        }

        let center_ray = camera.center_ray();
        let focal_distance = kd_tree
            .traverse(&triangles, &center_ray, Interval::new(0.0, f32::INFINITY))
            .map(|hit| hit.distance + options.focal_distance_correction);
        match focal_distance {
            Some(distance) => log::info!("Focal distance: {:.3}", distance),
            None => log::info!("Center ray hits nothing, keeping camera focus"),
        }

        log::info!(
            "Built scene: {} triangles, {} materials, {} emitters in {:.2?}",
            triangles.len(),
            materials.len(),
            emitters.len(),
            start.elapsed()
        );

        Ok(Self {
            triangles,
            materials,
            emitters,
            kd_tree,
            environment,
            options,
            center_ray,
            focal_distance,
        })
    }

    /// Replace every owned piece of geometry, keeping options and environment.
    pub fn rebuild(&mut self, entries: &[GeometryEntry], camera: &Camera) -> Result<(), SceneError> {
        *self = Self::build(entries, camera, self.options.clone(), Arc::clone(&self.environment))?;
        Ok(())
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    #[inline]
    pub fn material(&self, index: u32) -> &Material {
        &self.materials[index as usize]
    }

    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    pub fn kd_tree(&self) -> &KdTree {
        &self.kd_tree
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    #[inline]
    pub fn environment(&self) -> &dyn EnvironmentSampler {
        self.environment.as_ref()
    }

    pub fn center_ray(&self) -> Ray {
        self.center_ray
    }

    /// Center-ray hit distance plus the configured correction, if the
    /// center ray hit anything.
    pub fn focal_distance(&self) -> Option<f32> {
        self.focal_distance
    }

    /// Nearest surface hit by `ray`.
    pub fn intersect(&self, ray: &Ray) -> Option<SurfaceHit> {
        let hit = self
            .kd_tree
            .traverse(&self.triangles, ray, Interval::new(0.0, f32::INFINITY))?;
        let triangle = &self.triangles[hit.triangle_index as usize];
        let surface = triangle.interpolate(hit.barycentric);

        let normal = if surface.normal.dot(ray.direction) > 0.0 {
            -surface.normal
        } else {
            surface.normal
        };

        Some(SurfaceHit {
            triangle_index: hit.triangle_index,
            material_index: triangle.material_index,
            point: hit.point,
            distance: hit.distance,
            normal,
            front_face: triangle.face_normal().dot(ray.direction) <= 0.0,
            uv: surface.uv,
        })
    }

    /// True if anything lies along `ray` closer than `max_distance`.
    pub fn occluded(&self, ray: &Ray, max_distance: f32) -> bool {
        self.kd_tree
            .occluded(&self.triangles, ray, Interval::new(0.0, max_distance))
    }
}

type Flattened = (Vec<Triangle>, Vec<Material>, Vec<Emitter>);

fn flatten(entries: &[GeometryEntry]) -> Result<Flattened, SceneError> {
    let mut triangles = Vec::with_capacity(entries.iter().map(|e| e.mesh.triangle_count()).sum());
    let mut materials: Vec<Material> = Vec::new();
    let mut emitters = Vec::new();

    for (entry_index, entry) in entries.iter().enumerate() {
        validate_entry(entry_index, entry)?;

        let material_index = match materials.iter().position(|m| m.name == entry.material.name) {
            Some(index) => index,
            None => {
                materials.push(Material::from_source(&entry.material));
                materials.len() - 1
            }
        } as u32;

        let mesh = &entry.mesh;
        let first_triangle = triangles.len();
        for [i0, i1, i2] in mesh.triangles() {
            let positions = [i0, i1, i2].map(|i| entry.transform.transform_point3(mesh.position(i)));
            let face_normal = (positions[1] - positions[0])
                .cross(positions[2] - positions[0])
                .normalize_or_zero();
            let normals = [i0, i1, i2].map(|i| {
                mesh.normal(i)
                    .map(|n| entry.transform.transform_normal(n))
                    .unwrap_or(face_normal)
            });
            let uvs = [i0, i1, i2].map(|i| mesh.uv(i).unwrap_or(Vec2::ZERO));

            triangles.push(Triangle::new(positions, normals, uvs, material_index));
        }

        let triangle_count = triangles.len() - first_triangle;
        if materials[material_index as usize].is_emissive() {
            if triangle_count > 0 {
                emitters.push(Emitter::new(first_triangle, triangle_count, material_index));
            } else {
                log::debug!("Emissive entry {} contributed no triangles", entry_index);
            }
        }
    }

    Ok((triangles, materials, emitters))
}

fn validate_entry(entry_index: usize, entry: &GeometryEntry) -> Result<(), SceneError> {
    let mesh = &entry.mesh;
    if mesh.positions.is_empty() {
        return Err(SceneError::EmptyVertices {
            entry: entry_index,
            material: entry.material.name.clone(),
        });
    }
    if mesh.indices.is_empty() {
        return Err(SceneError::EmptyIndices {
            entry: entry_index,
            material: entry.material.name.clone(),
        });
    }
    if mesh.indices.len() % 3 != 0 {
        return Err(SceneError::IndexCount {
            entry: entry_index,
            count: mesh.indices.len(),
        });
    }
    if let Some(&index) = mesh.indices.iter().find(|&&i| i as usize >= mesh.positions.len()) {
        return Err(SceneError::IndexOutOfRange {
            entry: entry_index,
            index,
            vertex_count: mesh.positions.len(),
        });
    }
    Ok(())
}
