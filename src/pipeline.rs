//! Vertex transform pipeline (C6): transforms one mesh's vertices to clip
//! space, preserving the invariant perspective-correct interpolation needs.
//!
//! Grounded on `Renderer::ProjectMeshToNDC` in the original source.

use crate::camera::Camera;
use crate::math::Vec4;
use crate::mesh::{Mesh, VertexOut};

/// Transforms every vertex of `mesh` into clip space, storing world-space
/// position, color, uv, and world-transformed normal/tangent alongside it.
///
/// When a vertex's clip-space `w <= 0` (behind the camera), the raw,
/// un-divided clip coordinates are still stored — the rasterizer's frustum
/// rejection is what explicitly discards triangles touching such a vertex,
/// not this step.
pub fn transform_mesh(mesh: &mut Mesh, camera: &Camera) {
    let world = mesh.world_matrix();
    let mvp = camera.projection_matrix() * camera.view_matrix() * world;
    // Inverse-transpose so normals survive non-uniform scaling correctly.
    let normal_matrix = world.inverse().map(|m| m.transpose()).unwrap_or(world);

    let vertices = mesh.vertices().to_vec();
    let out = mesh.ensure_vertices_out();

    for (i, vertex) in vertices.iter().enumerate() {
        let clip = mvp * Vec4::point(vertex.position.x, vertex.position.y, vertex.position.z);

        if clip.w <= 0.0 {
            out[i] = VertexOut {
                position: clip,
                ..out[i]
            };
            continue;
        }

        let inv_w = 1.0 / clip.w;
        let ndc = Vec4::new(clip.x * inv_w, clip.y * inv_w, clip.z * inv_w, clip.w);

        out[i] = VertexOut {
            position: ndc,
            world_position: world.transform_point(vertex.position),
            color: vertex.color,
            uv: vertex.uv,
            normal: normal_matrix.transform_vector(vertex.normal).normalize(),
            tangent: normal_matrix.transform_vector(vertex.tangent).normalize(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::math::{Color, Vec2, Vec3};
    use crate::mesh::{Topology, Vertex};

    fn camera() -> Camera {
        Camera::from_fov_degrees(
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::UP,
            60.0,
            1.0,
            0.1,
            100.0,
        )
        .unwrap()
    }

    #[test]
    fn vertex_in_front_of_camera_gets_positive_w_and_divided_xy() {
        let mut mesh = Mesh::new(
            vec![Vertex {
                position: Vec3::ZERO,
                color: Color::WHITE,
                uv: Vec2::ZERO,
                normal: Vec3::new(0.0, 0.0, -1.0),
                tangent: Vec3::RIGHT,
            }],
            vec![0, 0, 0],
            Topology::TriangleList,
        );
        transform_mesh(&mut mesh, &camera());
        let out = mesh.vertices_out()[0];
        assert!(out.position.w > 0.0);
        // The origin is directly ahead on-axis, so NDC x/y should be ~0.
        assert!(out.position.x.abs() < 1e-3);
        assert!(out.position.y.abs() < 1e-3);
    }

    #[test]
    fn behind_camera_vertex_keeps_nonpositive_w() {
        let mut mesh = Mesh::new(
            vec![Vertex {
                position: Vec3::new(0.0, 0.0, -100.0),
                ..Vertex::default()
            }],
            vec![0, 0, 0],
            Topology::TriangleList,
        );
        transform_mesh(&mut mesh, &camera());
        assert!(mesh.vertices_out()[0].position.w <= 0.0);
    }

    #[test]
    fn normal_and_tangent_are_unit_length_after_transform() {
        let mut mesh = Mesh::new(
            vec![Vertex {
                position: Vec3::ZERO,
                normal: Vec3::new(0.0, 0.0, -1.0),
                tangent: Vec3::RIGHT,
                ..Vertex::default()
            }],
            vec![0, 0, 0],
            Topology::TriangleList,
        );
        transform_mesh(&mut mesh, &camera());
        let out = mesh.vertices_out()[0];
        assert!((out.normal.magnitude() - 1.0).abs() < 1e-4);
        assert!((out.tangent.magnitude() - 1.0).abs() < 1e-4);
    }
}
