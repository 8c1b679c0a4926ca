//! Mesh storage (C3): vertex/index arrays, topology, world transform, and the
//! per-mesh texture references a shaded triangle needs.

use crate::math::{Color, Mat4, Vec2, Vec3, Vec4};
use crate::texture::TextureHandle;

/// Model-space vertex as read from the OBJ ingest.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub color: Color,
    pub uv: Vec2,
    pub normal: Vec3,
    pub tangent: Vec3,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            color: Color::WHITE,
            uv: Vec2::ZERO,
            normal: Vec3::ZERO,
            tangent: Vec3::ZERO,
        }
    }
}

/// Post-transform vertex. `position.w` always carries the original clip-space
/// `w`, never overwritten by a perspective-divided value — this is the
/// invariant perspective-correct interpolation depends on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VertexOut {
    pub position: Vec4,
    pub world_position: Vec3,
    pub color: Color,
    pub uv: Vec2,
    pub normal: Vec3,
    pub tangent: Vec3,
}

impl Default for VertexOut {
    fn default() -> Self {
        Self {
            position: Vec4::ZERO,
            world_position: Vec3::ZERO,
            color: Color::WHITE,
            uv: Vec2::ZERO,
            normal: Vec3::ZERO,
            tangent: Vec3::ZERO,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Topology {
    #[default]
    TriangleList,
    TriangleStrip,
}

/// References to a mesh's four optional texture maps, held as arena handles.
#[derive(Clone, Copy, Debug, Default)]
pub struct MeshTextures {
    pub diffuse: Option<TextureHandle>,
    pub normal: Option<TextureHandle>,
    pub specular: Option<TextureHandle>,
    pub gloss: Option<TextureHandle>,
}

/// A mesh: vertex array, index array, topology, world transform, transparency
/// flag, and texture references. Owns no drawing logic of its own.
pub struct Mesh {
    vertices: Vec<Vertex>,
    /// Per-mesh scratch buffer for the transform pipeline (C6). Resized to
    /// match `vertices.len()` the first time the pipeline runs, then
    /// overwritten in place every frame.
    vertices_out: Vec<VertexOut>,
    indices: Vec<u32>,
    topology: Topology,
    world_matrix: Mat4,
    transparent: bool,
    textures: MeshTextures,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>, topology: Topology) -> Self {
        Self {
            vertices,
            vertices_out: Vec::new(),
            indices,
            topology,
            world_matrix: Mat4::identity(),
            transparent: false,
            textures: MeshTextures::default(),
        }
    }

    pub fn with_transparency(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    pub fn with_textures(mut self, textures: MeshTextures) -> Self {
        self.textures = textures;
        self
    }

    pub fn with_world_matrix(mut self, world_matrix: Mat4) -> Self {
        self.world_matrix = world_matrix;
        self
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    pub fn textures(&self) -> &MeshTextures {
        &self.textures
    }

    pub fn world_matrix(&self) -> Mat4 {
        self.world_matrix
    }

    pub fn set_world_matrix(&mut self, world_matrix: Mat4) {
        self.world_matrix = world_matrix;
    }

    /// Ensures the scratch `vertices_out` buffer matches `vertices.len()`,
    /// allocating only on first use or after a vertex-count change.
    pub(crate) fn ensure_vertices_out(&mut self) -> &mut Vec<VertexOut> {
        if self.vertices_out.len() != self.vertices.len() {
            self.vertices_out = vec![VertexOut::default(); self.vertices.len()];
        }
        &mut self.vertices_out
    }

    pub(crate) fn vertices_out(&self) -> &[VertexOut] {
        &self.vertices_out
    }

    /// Number of triangles this mesh expands to, given its topology.
    pub fn triangle_count(&self) -> usize {
        match self.topology {
            Topology::TriangleList => self.indices.len() / 3,
            Topology::TriangleStrip => self.indices.len().saturating_sub(2),
        }
    }

    /// Returns the three vertex indices for triangle `i`, applying the
    /// triangle-strip winding-flip on odd-indexed triangles.
    pub fn triangle_indices(&self, i: usize) -> Option<[u32; 3]> {
        if i >= self.triangle_count() {
            return None;
        }
        let (i0, i1, i2) = match self.topology {
            Topology::TriangleList => {
                let base = i * 3;
                (
                    self.indices[base],
                    self.indices[base + 1],
                    self.indices[base + 2],
                )
            }
            Topology::TriangleStrip => {
                let (a, mut b, mut c) = (self.indices[i], self.indices[i + 1], self.indices[i + 2]);
                if i & 1 == 1 {
                    std::mem::swap(&mut b, &mut c);
                }
                (a, b, c)
            }
        };
        Some([i0, i1, i2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri_mesh() -> Mesh {
        Mesh::new(
            vec![Vertex::default(); 4],
            vec![0, 1, 2, 1, 2, 3],
            Topology::TriangleList,
        )
    }

    #[test]
    fn triangle_list_counts_and_indices() {
        let m = tri_mesh();
        assert_eq!(m.triangle_count(), 2);
        assert_eq!(m.triangle_indices(0), Some([0, 1, 2]));
        assert_eq!(m.triangle_indices(1), Some([1, 2, 3]));
        assert_eq!(m.triangle_indices(2), None);
    }

    #[test]
    fn triangle_strip_flips_odd_triangles() {
        let m = Mesh::new(
            vec![Vertex::default(); 4],
            vec![0, 1, 2, 3],
            Topology::TriangleStrip,
        );
        assert_eq!(m.triangle_count(), 2);
        assert_eq!(m.triangle_indices(0), Some([0, 1, 2]));
        // Odd triangle: indices 1 and 2 (second and third corner) swap to restore winding.
        assert_eq!(m.triangle_indices(1), Some([1, 3, 2]));
    }

    #[test]
    fn vertices_out_scratch_resizes_on_first_use() {
        let mut m = tri_mesh();
        assert!(m.vertices_out().is_empty());
        m.ensure_vertices_out();
        assert_eq!(m.vertices_out().len(), 4);
    }
}
