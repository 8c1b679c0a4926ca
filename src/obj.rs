//! OBJ ingest (C4): a hand-rolled, line-oriented Wavefront OBJ parser.
//!
//! Grounded directly in `Utils::ParseOBJ` from the original C++ source: read
//! line by line, dispatch on the first token, and emit one non-deduplicated
//! `Vertex` per face corner (rather than deduplicating like `tobj` does) so
//! that the tangent-accumulation pass below has a vertex to accumulate into
//! per triangle corner, matching the original's algorithm exactly.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::math::{Color, Vec2, Vec3};
use crate::mesh::{Mesh, Topology, Vertex};

#[derive(Debug)]
pub enum LoadError {
    NotFound(PathBuf),
    Io(std::io::Error),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::NotFound(path) => write!(f, "OBJ file not found: {}", path.display()),
            LoadError::Io(e) => write!(f, "failed to read OBJ file: {}", e),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(e) => Some(e),
            LoadError::NotFound(_) => None,
        }
    }
}

/// Parses an OBJ file's positions/uvs/normals/faces into a flat, non-deduplicated
/// `Vertex` array plus an index buffer, computes per-vertex tangents, and
/// optionally flips the coordinate system (z-negation + winding swap + `v -> 1-v`).
///
/// Malformed directive lines are skipped; parsing continues. Zero triangles
/// produced is a valid, empty result — not an error.
pub fn load<P: AsRef<Path>>(path: P, flip_axis_and_winding: bool) -> Result<Mesh, LoadError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(LoadError::Io)?;
    Ok(parse(&text, flip_axis_and_winding))
}

/// Parses OBJ source text directly (used by tests and by [`load`]).
pub fn parse(text: &str, flip_axis_and_winding: bool) -> Mesh {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut uvs: Vec<Vec2> = Vec::new();

    let mut vertices: Vec<Vertex> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    for line in text.lines() {
        let mut tokens = line.split_whitespace();
        let Some(directive) = tokens.next() else {
            continue;
        };
        let rest: Vec<&str> = tokens.collect();

        match directive {
            "v" => {
                if let Some(p) = parse_vec3(&rest) {
                    positions.push(p);
                }
            }
            "vn" => {
                if let Some(n) = parse_vec3(&rest) {
                    normals.push(n);
                }
            }
            "vt" => {
                if rest.len() >= 2 {
                    if let (Ok(u), Ok(v)) = (rest[0].parse::<f32>(), rest[1].parse::<f32>()) {
                        // v is stored inverted (1 - v) immediately at load time,
                        // matching the original's `UVs.emplace_back(u, 1 - v)`.
                        uvs.push(Vec2::new(u, 1.0 - v));
                    }
                }
            }
            "f" => {
                parse_face(
                    &rest,
                    &positions,
                    &normals,
                    &uvs,
                    &mut vertices,
                    &mut indices,
                    flip_axis_and_winding,
                );
            }
            _ => {}
        }
    }

    accumulate_tangents(&mut vertices, &indices);
    finalize_vertices(&mut vertices, flip_axis_and_winding);

    Mesh::new(vertices, indices, Topology::TriangleList)
}

fn parse_vec3(tokens: &[&str]) -> Option<Vec3> {
    if tokens.len() < 3 {
        return None;
    }
    let x = tokens[0].parse::<f32>().ok()?;
    let y = tokens[1].parse::<f32>().ok()?;
    let z = tokens[2].parse::<f32>().ok()?;
    Some(Vec3::new(x, y, z))
}

/// Parses one face directive's three corners. Supports `p`, `p/t`, `p/t/n`,
/// and `p//n` (the original's optional-component slash syntax). A corner
/// whose position index is out of range aborts the whole face (skip, don't
/// emit a partial triangle).
fn parse_corner(
    token: &str,
    positions: &[Vec3],
    normals: &[Vec3],
    uvs: &[Vec2],
) -> Option<Vertex> {
    let mut parts = token.split('/');
    let pos_idx = parts.next()?.parse::<usize>().ok()?;
    if pos_idx == 0 || pos_idx > positions.len() {
        return None;
    }

    let mut vertex = Vertex {
        position: positions[pos_idx - 1],
        color: Color::WHITE,
        uv: Vec2::ZERO,
        normal: Vec3::ZERO,
        tangent: Vec3::ZERO,
    };

    if let Some(tex_str) = parts.next() {
        if !tex_str.is_empty() {
            if let Ok(tex_idx) = tex_str.parse::<usize>() {
                if tex_idx >= 1 && tex_idx <= uvs.len() {
                    vertex.uv = uvs[tex_idx - 1];
                }
            }
        }
    }
    if let Some(nrm_str) = parts.next() {
        if let Ok(nrm_idx) = nrm_str.parse::<usize>() {
            if nrm_idx >= 1 && nrm_idx <= normals.len() {
                vertex.normal = normals[nrm_idx - 1];
            }
        }
    }

    Some(vertex)
}

/// Parses one face directive's three corners, only committing vertices/indices
/// once all three corners resolve — a malformed or out-of-range corner
/// discards the whole face rather than emitting a partial triangle.
fn parse_face(
    tokens: &[&str],
    positions: &[Vec3],
    normals: &[Vec3],
    uvs: &[Vec2],
    vertices: &mut Vec<Vertex>,
    indices: &mut Vec<u32>,
    flip: bool,
) {
    if tokens.len() < 3 {
        return;
    }

    let Some(corner_vertices) = tokens
        .iter()
        .take(3)
        .map(|token| parse_corner(token, positions, normals, uvs))
        .collect::<Option<Vec<_>>>()
    else {
        return;
    };

    let base = vertices.len() as u32;
    vertices.extend(corner_vertices);
    let corners = [base, base + 1, base + 2];

    indices.push(corners[0]);
    if flip {
        indices.push(corners[2]);
        indices.push(corners[1]);
    } else {
        indices.push(corners[1]);
        indices.push(corners[2]);
    }
}

/// Accumulates per-triangle tangents onto each corner vertex from edge/uv
/// derivatives, following the spec's formula verbatim.
fn accumulate_tangents(vertices: &mut [Vertex], indices: &[u32]) {
    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);

        let p0 = vertices[i0].position;
        let p1 = vertices[i1].position;
        let p2 = vertices[i2].position;
        let uv0 = vertices[i0].uv;
        let uv1 = vertices[i1].uv;
        let uv2 = vertices[i2].uv;

        let edge0 = p1 - p0;
        let edge1 = p2 - p0;
        let diff_x = Vec2::new(uv1.x - uv0.x, uv2.x - uv0.x);
        let diff_y = Vec2::new(uv1.y - uv0.y, uv2.y - uv0.y);

        let r = diff_x.cross(diff_y);
        if r.abs() < f32::EPSILON {
            continue;
        }
        let inv_r = 1.0 / r;
        let tangent = (edge0 * diff_y.y - edge1 * diff_y.x) * inv_r;

        vertices[i0].tangent = vertices[i0].tangent + tangent;
        vertices[i1].tangent = vertices[i1].tangent + tangent;
        vertices[i2].tangent = vertices[i2].tangent + tangent;
    }
}

/// Orthonormalizes tangents against their vertex normal (reject + normalize)
/// and applies the axis/winding flip (z-negation on position/normal/tangent).
fn finalize_vertices(vertices: &mut [Vertex], flip: bool) {
    for v in vertices.iter_mut() {
        let rejected = v.tangent.reject(v.normal);
        v.tangent = if rejected.magnitude() > f32::EPSILON {
            rejected.normalize()
        } else {
            rejected
        };

        if flip {
            v.position.z *= -1.0;
            v.normal.z *= -1.0;
            v.tangent.z *= -1.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE_PTN: &str = "\
v -1.0 -1.0 0.0
v 1.0 -1.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.5 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1
";

    #[test]
    fn parses_positions_uvs_normals_and_faces() {
        let mesh = parse(TRIANGLE_PTN, false);
        assert_eq!(mesh.vertices().len(), 3);
        assert_eq!(mesh.indices(), &[0, 1, 2]);
    }

    #[test]
    fn flip_negates_z_and_swaps_winding() {
        let mesh = parse(TRIANGLE_PTN, true);
        assert_eq!(mesh.indices(), &[0, 2, 1]);
        for v in mesh.vertices() {
            assert_eq!(v.position.z, 0.0); // z was 0, negation is a no-op here
        }
    }

    #[test]
    fn tangent_is_orthogonal_to_normal() {
        let mesh = parse(TRIANGLE_PTN, true);
        for v in mesh.vertices() {
            assert!(v.tangent.dot(v.normal).abs() < 1e-4);
        }
    }

    #[test]
    fn supports_position_only_and_position_normal_faces() {
        let text = "\
v -1.0 -1.0 0.0
v 1.0 -1.0 0.0
v 0.0 1.0 0.0
vn 0.0 0.0 1.0
f 1 2 3
f 1//1 2//1 3//1
";
        let mesh = parse(text, false);
        assert_eq!(mesh.vertices().len(), 6);
        assert_eq!(mesh.indices().len(), 6);
    }

    #[test]
    fn malformed_face_line_is_skipped_not_fatal() {
        let text = "\
v -1.0 -1.0 0.0
v 1.0 -1.0 0.0
v 0.0 1.0 0.0
f 1 2 999
f 1 2 3
";
        let mesh = parse(text, false);
        // First face references an out-of-range position and is dropped whole;
        // only the second face's vertices survive.
        assert_eq!(mesh.vertices().len(), 3);
        assert_eq!(mesh.indices(), &[0, 1, 2]);
    }

    #[test]
    fn empty_source_yields_empty_mesh() {
        let mesh = parse("", false);
        assert_eq!(mesh.vertices().len(), 0);
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn missing_file_is_not_found_error() {
        let err = load("/nonexistent/path/to/mesh.obj", true).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }
}
