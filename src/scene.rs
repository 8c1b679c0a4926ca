//! Scene registry and the `Rasterizer` façade (C7/C8 orchestration): owns
//! meshes, the camera, the light, and per-frame render configuration, and
//! drives one `render()` call per frame.
//!
//! Grounded on `src/engine.rs` (`Engine`'s config-flag shape) and the
//! spec's scene/render contract; `Rasterizer` plays the role the original's
//! `Renderer` class does, minus the DirectX path.

use std::collections::HashMap;

use crate::camera::Camera;
use crate::light::DirectionalLight;
use crate::math::{Color, Mat4};
use crate::mesh::Mesh;
use crate::pipeline;
use crate::raster::{self, FrameBuffer, RenderConfig};
use crate::shader::ShadingMode;
use crate::texture::TextureArena;

/// Rotation rate applied to the designated rotating mesh, matching the
/// original's `45 deg/sec` constant. Without a delta-time input, one
/// `render()` call advances by this fixed step rather than a time-scaled one.
///
/// TODO: thread a `dt: f32` through `render()` once a driver has a clock, and
/// scale this by `dt` instead of treating every call as one fixed tick.
const ROTATION_STEP_RADIANS: f32 = 45.0_f32.to_radians() / 60.0;

/// Owns a scene's meshes, keyed by name for lookup and draw-order tracking.
#[derive(Default)]
pub struct Scene {
    meshes: Vec<Mesh>,
    keys: HashMap<String, usize>,
    rotating_mesh: Option<usize>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mesh under `key`, replacing any previous mesh at that key.
    pub fn insert(&mut self, key: impl Into<String>, mesh: Mesh) {
        let key = key.into();
        if let Some(&index) = self.keys.get(&key) {
            self.meshes[index] = mesh;
        } else {
            self.keys.insert(key, self.meshes.len());
            self.meshes.push(mesh);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Mesh> {
        self.keys.get(key).map(|&i| &self.meshes[i])
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Mesh> {
        self.keys.get(key).copied().map(move |i| &mut self.meshes[i])
    }

    /// Returns mesh indices in registration order. No depth sort is
    /// performed among transparent meshes.
    ///
    /// TODO: a caller wanting correct back-to-front blending among
    /// transparent meshes should sort these by world-space centroid depth
    /// before `render()` instead; not implemented since draw order among
    /// transparent meshes is explicitly not guaranteed.
    fn meshes_in_draw_order(&self) -> impl Iterator<Item = &Mesh> {
        self.meshes.iter()
    }

    pub fn set_rotating_mesh(&mut self, key: &str) {
        self.rotating_mesh = self.keys.get(key).copied();
    }

    pub fn clear_rotating_mesh(&mut self) {
        self.rotating_mesh = None;
    }

    fn advance_rotation(&mut self) {
        if let Some(index) = self.rotating_mesh {
            let mesh = &mut self.meshes[index];
            let spin = Mat4::rotation_y(ROTATION_STEP_RADIANS);
            mesh.set_world_matrix(spin * mesh.world_matrix());
        }
    }
}

/// The scene/render façade a driver talks to: owns the framebuffer, texture
/// arena, scene, camera, and light, and exposes `create`/`set_camera`/
/// `set_light`/`add_mesh`/`render`/the per-frame toggles from the spec's
/// external-interfaces table.
pub struct Rasterizer {
    framebuffer: FrameBuffer,
    arena: TextureArena,
    scene: Scene,
    camera: Camera,
    light: DirectionalLight,
    config: RenderConfig,
    background: Color,
    rotate_mesh: bool,
}

impl Rasterizer {
    /// Allocates color and depth buffers for a `width` x `height` frame.
    pub fn create(width: usize, height: usize, camera: Camera, light: DirectionalLight) -> Self {
        Self {
            framebuffer: FrameBuffer::new(width, height),
            arena: TextureArena::new(),
            scene: Scene::new(),
            camera,
            light,
            config: RenderConfig::default(),
            background: Color::new(0.1, 0.1, 0.1),
            rotate_mesh: false,
        }
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn set_light(&mut self, light: DirectionalLight) {
        self.light = light;
    }

    pub fn texture_arena_mut(&mut self) -> &mut TextureArena {
        &mut self.arena
    }

    pub fn add_mesh(&mut self, key: impl Into<String>, mesh: Mesh) {
        self.scene.insert(key, mesh);
    }

    pub fn mesh(&self, key: &str) -> Option<&Mesh> {
        self.scene.get(key)
    }

    pub fn mesh_mut(&mut self, key: &str) -> Option<&mut Mesh> {
        self.scene.get_mut(key)
    }

    pub fn set_rotating_mesh(&mut self, key: &str) {
        self.scene.set_rotating_mesh(key);
    }

    pub fn clear_rotating_mesh(&mut self) {
        self.scene.clear_rotating_mesh();
    }

    pub fn set_shading_mode(&mut self, mode: ShadingMode) {
        self.config.shading_mode = mode;
    }

    pub fn cycle_shading_mode(&mut self) {
        self.config.shading_mode = match self.config.shading_mode {
            ShadingMode::ObservedArea => ShadingMode::Diffuse,
            ShadingMode::Diffuse => ShadingMode::Specular,
            ShadingMode::Specular => ShadingMode::Combined,
            ShadingMode::Combined => ShadingMode::ObservedArea,
        };
    }

    pub fn cycle_cull_mode(&mut self) {
        use crate::raster::CullMode;
        self.config.cull_mode = match self.config.cull_mode {
            CullMode::Back => CullMode::Front,
            CullMode::Front => CullMode::None,
            CullMode::None => CullMode::Back,
        };
    }

    pub fn toggle_normal_map(&mut self) {
        self.config.use_normal_map = !self.config.use_normal_map;
    }

    pub fn toggle_depth_viz(&mut self) {
        self.config.depth_viz = !self.config.depth_viz;
    }

    pub fn toggle_bbox_viz(&mut self) {
        self.config.bbox_viz = !self.config.bbox_viz;
    }

    pub fn toggle_wireframe(&mut self) {
        self.config.wireframe = !self.config.wireframe;
    }

    pub fn toggle_uniform_clear(&mut self) {
        self.config.uniform_clear = !self.config.uniform_clear;
    }

    pub fn toggle_rotate_mesh(&mut self) {
        self.rotate_mesh = !self.rotate_mesh;
    }

    pub fn toggle_fire_visible(&mut self) {
        self.config.fire_visible = !self.config.fire_visible;
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    /// Renders one frame: advances the rotating mesh (if any), transforms
    /// every visible mesh to clip space, clears the buffers, then rasterizes
    /// each mesh in registration order.
    pub fn render(&mut self) {
        if self.rotate_mesh {
            self.scene.advance_rotation();
        }

        self.framebuffer.clear(self.background, self.config.uniform_clear);

        for mesh in &mut self.scene.meshes {
            if mesh.is_transparent() && !self.config.fire_visible {
                continue;
            }
            pipeline::transform_mesh(mesh, &self.camera);
        }

        for mesh in self.scene.meshes_in_draw_order() {
            if mesh.is_transparent() && !self.config.fire_visible {
                continue;
            }
            raster::render_mesh(
                &mut self.framebuffer,
                mesh,
                &self.arena,
                &self.camera,
                &self.light,
                &self.config,
            );
        }
    }

    /// Tile-parallel variant of [`Rasterizer::render`] (feature `parallel`).
    #[cfg(feature = "parallel")]
    pub fn render_tiled(&mut self) {
        if self.rotate_mesh {
            self.scene.advance_rotation();
        }

        self.framebuffer.clear(self.background, self.config.uniform_clear);

        for mesh in &mut self.scene.meshes {
            if mesh.is_transparent() && !self.config.fire_visible {
                continue;
            }
            pipeline::transform_mesh(mesh, &self.camera);
        }

        for mesh in self.scene.meshes_in_draw_order() {
            if mesh.is_transparent() && !self.config.fire_visible {
                continue;
            }
            raster::render_mesh_tiled(
                &mut self.framebuffer,
                mesh,
                &self.arena,
                &self.camera,
                &self.light,
                &self.config,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;
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

    fn light() -> DirectionalLight {
        DirectionalLight::new(Vec3::new(0.0, -1.0, 1.0), Color::WHITE, 1.0)
    }

    fn triangle() -> Mesh {
        Mesh::new(
            vec![
                Vertex { position: Vec3::new(-1.0, -1.0, 0.0), normal: Vec3::BACK, ..Vertex::default() },
                Vertex { position: Vec3::new(1.0, -1.0, 0.0), normal: Vec3::BACK, ..Vertex::default() },
                Vertex { position: Vec3::new(0.0, 1.0, 0.0), normal: Vec3::BACK, ..Vertex::default() },
            ],
            vec![0, 1, 2],
            Topology::TriangleList,
        )
    }

    #[test]
    fn rendering_an_empty_scene_leaves_the_background_color() {
        let mut rasterizer = Rasterizer::create(4, 4, camera(), light());
        rasterizer.render();
        let (color, _) = Color::unpack_argb(rasterizer.framebuffer().color_buffer()[0]);
        assert_eq!(color, Color::new(0.1, 0.1, 0.1));
    }

    #[test]
    fn a_visible_opaque_triangle_writes_depth_less_than_one() {
        let mut rasterizer = Rasterizer::create(8, 8, camera(), light());
        rasterizer.add_mesh("tri", triangle());
        rasterizer.render();
        let covered = rasterizer
            .framebuffer()
            .depth_buffer()
            .iter()
            .any(|&d| d < 1.0);
        assert!(covered);
    }

    #[test]
    fn hiding_fire_visibility_skips_transparent_meshes() {
        let mut rasterizer = Rasterizer::create(8, 8, camera(), light());
        rasterizer.add_mesh("fire", triangle().with_transparency(true));
        rasterizer.toggle_fire_visible();
        rasterizer.render();
        // The transparent mesh was skipped entirely; depth buffer stays clear.
        assert!(rasterizer.framebuffer().depth_buffer().iter().all(|&d| d == 1.0));
    }

    #[test]
    fn rotating_mesh_changes_world_matrix_between_renders() {
        let mut rasterizer = Rasterizer::create(4, 4, camera(), light());
        rasterizer.add_mesh("tri", triangle());
        rasterizer.set_rotating_mesh("tri");
        rasterizer.toggle_rotate_mesh();
        let before = rasterizer.mesh("tri").unwrap().world_matrix();
        rasterizer.render();
        let after = rasterizer.mesh("tri").unwrap().world_matrix();
        assert_ne!(before, after);
    }
}
