//! Pixel shading (C8): ambient + Lambert diffuse + Phong specular with
//! optional tangent-space normal mapping, gated by a shading-mode switch.
//!
//! Grounded on `Renderer::PixelShading` and `Mesh::SampleDiffuse` /
//! `SamplePhong` / `SampleNormalMap` in the original source.

use crate::light::DirectionalLight;
use crate::math::{Color, Mat4, Vec3, Vec4};
use crate::mesh::{Mesh, VertexOut};
use crate::texture::TextureArena;

const AMBIENT: Color = Color::new(0.025, 0.025, 0.025);
const SHININESS: f32 = 25.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ShadingMode {
    ObservedArea,
    Diffuse,
    Specular,
    #[default]
    Combined,
}

/// Shades one interpolated fragment, returning its color and alpha.
///
/// `use_normal_map` mirrors the renderer's toggle: when set and the mesh
/// isn't transparent, the normal is resampled from the mesh's normal map in
/// tangent space; otherwise the interpolated geometric normal is used as-is.
pub fn shade(
    fragment: &VertexOut,
    mesh: &Mesh,
    arena: &TextureArena,
    camera_position: Vec3,
    light: &DirectionalLight,
    mode: ShadingMode,
    use_normal_map: bool,
) -> (Color, f32) {
    let direction_to_light = light.direction_to_light();

    let sampled_normal = if use_normal_map && !mesh.is_transparent() {
        sample_normal_map(fragment, mesh, arena)
    } else {
        fragment.normal
    };

    let observed_area = sampled_normal.dot(direction_to_light);

    let (diffuse_color, alpha) = sample_diffuse(fragment.uv, mesh, arena, mesh.is_transparent());

    if mesh.is_transparent() || sampled_normal == fragment.normal {
        return (diffuse_color, alpha);
    }

    let lambert = diffuse_color * light.intensity * std::f32::consts::FRAC_1_PI;

    let view_dir = (fragment.world_position - camera_position).normalize();
    let specular = sample_phong(
        direction_to_light,
        view_dir,
        sampled_normal,
        fragment.uv,
        mesh,
        arena,
        SHININESS,
    );

    let color = match mode {
        ShadingMode::ObservedArea => {
            if observed_area <= 0.0 {
                Color::BLACK
            } else {
                Color::new(observed_area, observed_area, observed_area)
            }
        }
        ShadingMode::Diffuse => lambert,
        ShadingMode::Specular => specular,
        ShadingMode::Combined => {
            if observed_area <= 0.0 {
                Color::BLACK
            } else {
                (lambert + specular + AMBIENT) * observed_area
            }
        }
    };

    (color, alpha)
}

fn sample_diffuse(
    uv: crate::math::Vec2,
    mesh: &Mesh,
    arena: &TextureArena,
    want_alpha: bool,
) -> (Color, f32) {
    match mesh.textures().diffuse {
        None => (Color::BLACK, 1.0),
        Some(handle) => {
            if want_alpha {
                arena.get(handle).sample_with_alpha(uv)
            } else {
                (arena.get(handle).sample(uv), 1.0)
            }
        }
    }
}

fn sample_phong(
    direction_to_light: Vec3,
    view_dir: Vec3,
    normal: Vec3,
    uv: crate::math::Vec2,
    mesh: &Mesh,
    arena: &TextureArena,
    shininess: f32,
) -> Color {
    let textures = mesh.textures();
    let (Some(specular_handle), Some(gloss_handle)) = (textures.specular, textures.gloss) else {
        return Color::BLACK;
    };

    let ks = arena.get(specular_handle).sample(uv).b;
    let exp = arena.get(gloss_handle).sample(uv).b * shininess;

    let reflected = direction_to_light.reflect(normal);
    let cos_alpha = reflected.dot(view_dir).max(0.0);

    Color::WHITE * ks * cos_alpha.powf(exp)
}

fn sample_normal_map(fragment: &VertexOut, mesh: &Mesh, arena: &TextureArena) -> Vec3 {
    let Some(handle) = mesh.textures().normal else {
        return fragment.normal;
    };

    let binormal = fragment.normal.cross(fragment.tangent);
    let basis = Mat4::new([
        [fragment.tangent.x, binormal.x, fragment.normal.x, 0.0],
        [fragment.tangent.y, binormal.y, fragment.normal.y, 0.0],
        [fragment.tangent.z, binormal.z, fragment.normal.z, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);

    let sampled = arena.get(handle).sample(fragment.uv);
    let remapped = Vec3::new(
        2.0 * sampled.r - 1.0,
        2.0 * sampled.g - 1.0,
        2.0 * sampled.b - 1.0,
    );

    let transformed = (basis * Vec4::direction(remapped.x, remapped.y, remapped.z)).to_vec3();
    transformed.normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::DirectionalLight;
    use crate::math::Vec2;
    use crate::mesh::{Mesh, Topology, Vertex};

    fn lit_fragment(normal: Vec3) -> VertexOut {
        VertexOut {
            position: Vec4::point(0.0, 0.0, 0.0),
            world_position: Vec3::ZERO,
            color: Color::WHITE,
            uv: Vec2::new(0.5, 0.5),
            normal,
            tangent: Vec3::RIGHT,
        }
    }

    fn untextured_mesh() -> Mesh {
        Mesh::new(vec![Vertex::default()], vec![0, 0, 0], Topology::TriangleList)
    }

    /// A mesh with a normal map bound so the sampled normal actually diverges
    /// from the interpolated geometric one — without this, `shade` takes the
    /// "no normal map" early-return and the shading-mode switch never runs.
    fn mesh_with_normal_map(arena: &mut TextureArena) -> Mesh {
        use crate::texture::Texture;
        let normal_map = Texture::from_rgba8(vec![140, 120, 250, 255], 1, 1, 4);
        let handle = arena.insert(normal_map);
        Mesh::new(vec![Vertex::default()], vec![0, 0, 0], Topology::TriangleList).with_textures(
            crate::mesh::MeshTextures {
                normal: Some(handle),
                ..Default::default()
            },
        )
    }

    #[test]
    fn observed_area_mode_is_black_when_facing_away() {
        let mut arena = TextureArena::new();
        let mesh = mesh_with_normal_map(&mut arena);
        let light = DirectionalLight::new(Vec3::new(0.0, 0.0, 1.0), Color::WHITE, 1.0);
        let fragment = lit_fragment(Vec3::new(0.0, 0.0, 1.0));
        let (color, _) = shade(
            &fragment,
            &mesh,
            &arena,
            Vec3::new(0.0, 0.0, -5.0),
            &light,
            ShadingMode::ObservedArea,
            true,
        );
        assert_eq!(color, Color::BLACK);
    }

    #[test]
    fn observed_area_mode_is_grayscale_cosine_when_facing_light() {
        let mut arena = TextureArena::new();
        let mesh = mesh_with_normal_map(&mut arena);
        let light = DirectionalLight::new(Vec3::new(0.0, 0.0, 1.0), Color::WHITE, 1.0);
        let fragment = lit_fragment(Vec3::new(0.0, 0.0, -1.0));
        let (color, _) = shade(
            &fragment,
            &mesh,
            &arena,
            Vec3::new(0.0, 0.0, -5.0),
            &light,
            ShadingMode::ObservedArea,
            true,
        );
        assert!(color.r > 0.0 && color.r <= 1.0);
        assert_eq!(color.r, color.g);
        assert_eq!(color.g, color.b);
    }

    #[test]
    fn no_diffuse_texture_yields_black_cd_and_full_alpha() {
        let mesh = untextured_mesh();
        let arena = TextureArena::new();
        let light = DirectionalLight::new(Vec3::new(0.0, 0.0, 1.0), Color::WHITE, 1.0);
        let fragment = lit_fragment(Vec3::new(0.0, 0.0, -1.0));
        let (_, alpha) = shade(
            &fragment,
            &mesh,
            &arena,
            Vec3::new(0.0, 0.0, -5.0),
            &light,
            ShadingMode::Diffuse,
            false,
        );
        assert_eq!(alpha, 1.0);
    }

    #[test]
    fn transparent_mesh_returns_diffuse_sample_directly() {
        let mesh = Mesh::new(vec![Vertex::default()], vec![0, 0, 0], Topology::TriangleList)
            .with_transparency(true);
        let arena = TextureArena::new();
        let light = DirectionalLight::new(Vec3::new(0.0, 0.0, 1.0), Color::WHITE, 1.0);
        let fragment = lit_fragment(Vec3::new(0.0, 0.0, -1.0));
        let (color, alpha) = shade(
            &fragment,
            &mesh,
            &arena,
            Vec3::new(0.0, 0.0, -5.0),
            &light,
            ShadingMode::Combined,
            false,
        );
        // No diffuse texture bound, so the unlit fire layer is black/opaque.
        assert_eq!(color, Color::BLACK);
        assert_eq!(alpha, 1.0);
    }
}
