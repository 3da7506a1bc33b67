//! Triangle batch representation consumed by the tracer's scene build.
//!
//! A mesh is an indexed triangle list in object space. Positions are
//! mandatory; normals and UVs are optional per-vertex attributes.

use prism_math::{Aabb, Vec2, Vec3};

/// A mesh consisting of vertex positions, optional normals and UVs, and
/// triangle indices.
///
/// Triangles are wound counter-clockwise when viewed from the side their
/// face normal points to.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals (optional - will be computed if not provided)
    pub normals: Option<Vec<Vec3>>,

    /// UV coordinates (optional - one [u, v] per vertex)
    pub uvs: Option<Vec<[f32; 2]>>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Axis-aligned bounding box
    pub bounds: Aabb,
}

impl Mesh {
    /// Create a new mesh from positions and indices, optionally with normals.
    ///
    /// If normals are not provided, they will NOT be automatically computed.
    /// Call `compute_normals()` explicitly if you need them.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>, normals: Option<Vec<Vec3>>) -> Self {
        Self::new_with_uvs(positions, indices, normals, None)
    }

    /// Create a new mesh with UV coordinates.
    pub fn new_with_uvs(
        positions: Vec<Vec3>,
        indices: Vec<u32>,
        normals: Option<Vec<Vec3>>,
        uvs: Option<Vec<[f32; 2]>>,
    ) -> Self {
        let bounds = Aabb::enclosing(positions.iter().copied());
        Self {
            positions,
            normals,
            uvs,
            indices,
            bounds,
        }
    }

    /// A planar quad from four corners given counter-clockwise.
    ///
    /// Two triangles `(0, 1, 2)` and `(0, 2, 3)`, flat normals, UVs spanning
    /// the unit square.
    pub fn quad(corners: [Vec3; 4]) -> Self {
        let uvs = vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let mut mesh = Self::new_with_uvs(corners.to_vec(), vec![0, 1, 2, 0, 2, 3], None, Some(uvs));
        mesh.compute_normals();
        mesh
    }

    /// An axis-aligned box with outward-facing flat normals.
    ///
    /// Each face owns its four vertices so normals stay flat across edges.
    pub fn cuboid(min: Vec3, max: Vec3) -> Self {
        let c = |x: bool, y: bool, z: bool| {
            Vec3::new(
                if x { max.x } else { min.x },
                if y { max.y } else { min.y },
                if z { max.z } else { min.z },
            )
        };
        let faces = [
            [c(true, false, false), c(true, true, false), c(true, true, true), c(true, false, true)],
            [c(false, false, false), c(false, false, true), c(false, true, true), c(false, true, false)],
            [c(false, true, false), c(false, true, true), c(true, true, true), c(true, true, false)],
            [c(false, false, false), c(true, false, false), c(true, false, true), c(false, false, true)],
            [c(false, false, true), c(true, false, true), c(true, true, true), c(false, true, true)],
            [c(false, false, false), c(false, true, false), c(true, true, false), c(true, false, false)],
        ];

        let mut positions = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for face in faces {
            let base = positions.len() as u32;
            positions.extend_from_slice(&face);
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        let mut mesh = Self::new(positions, indices, None);
        mesh.compute_normals();
        mesh
    }

    /// Compute smooth vertex normals by averaging face normals.
    ///
    /// Each vertex normal is the normalized average of all face normals for
    /// faces that share that vertex.
    pub fn compute_normals(&mut self) {
        let vertex_count = self.positions.len();
        let mut normals = vec![Vec3::ZERO; vertex_count];

        for [i0, i1, i2] in self.triangles() {
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            let p0 = self.positions[i0];
            let face_normal = (self.positions[i1] - p0).cross(self.positions[i2] - p0);

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            // Default up normal for degenerate cases
            *normal = normal.try_normalize().unwrap_or(Vec3::Y);
        }

        self.normals = Some(normals);
    }

    /// Position of vertex `index`.
    #[inline]
    pub fn position(&self, index: usize) -> Vec3 {
        self.positions[index]
    }

    /// Normal of vertex `index`, if the mesh carries a per-vertex normal for it.
    #[inline]
    pub fn normal(&self, index: usize) -> Option<Vec3> {
        self.normals.as_ref().and_then(|n| n.get(index).copied())
    }

    /// UV of vertex `index`, if present.
    #[inline]
    pub fn uv(&self, index: usize) -> Option<Vec2> {
        self.uvs
            .as_ref()
            .and_then(|uvs| uvs.get(index))
            .map(|&[u, v]| Vec2::new(u, v))
    }

    /// Iterate over triangles as vertex index triples.
    ///
    /// A trailing partial triangle is skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}
