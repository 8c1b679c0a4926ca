//! Software triangle rasterizer (C7): the per-triangle, per-pixel loop that
//! turns a scene's transformed meshes into a framebuffer.
//!
//! # Algorithm
//!
//! For every triangle of every visible mesh:
//!
//! 1. Expand the mesh's index buffer per its [`Topology`](crate::mesh::Topology),
//!    skipping degenerate (repeated-index) triangles.
//! 2. Reject the triangle if any of its three NDC vertices falls outside the
//!    `[-1, 1]` x/y or `[0, 1]` z frustum bounds, or has `w <= 0`.
//! 3. Map NDC x/y to screen space: `sx = (1 + ndc.x) * 0.5 * width`,
//!    `sy = (1 - ndc.y) * 0.5 * height`.
//! 4. Compute the signed area of the screen-space triangle; cull by winding
//!    unless the mesh is transparent, and skip near-zero-area triangles
//!    (division-by-zero guard).
//! 5. Walk the triangle's clamped bounding box. For every pixel:
//!    - Early-reject by the triangle's minimum NDC depth against the current
//!      depth-buffer value.
//!    - Compute barycentric weights with early-exit per-component range
//!      checks; reject if the weights don't share a sign or their absolute
//!      sum isn't ~1.
//!    - Interpolate depth and `w` using the rational barycentric form (never
//!      the naive linear one — this is what makes interpolation
//!      perspective-correct).
//!    - Depth-test against the buffer; for opaque meshes, write the new depth.
//!    - Interpolate the remaining attributes, shade the fragment, and
//!      alpha-blend into the color buffer.
//!
//! Grounded directly in `Renderer::RenderCPU` and the barycentric/interpolation
//! helpers in `Utils.h` from the original source; the teacher's
//! `render/rasterizer/edgefunction.rs` supplied the overall doc-comment and
//! loop-structuring style but not the math (the teacher's own edge-function
//! test and inverted depth convention are not used here).

use crate::camera::Camera;
use crate::light::DirectionalLight;
use crate::math::{Color, Vec2};
use crate::mesh::{Mesh, VertexOut};
use crate::shader::{self, ShadingMode};
use crate::texture::TextureArena;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Triangle winding rejected during rasterization. Ignored for transparent
/// meshes, which always draw regardless of winding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CullMode {
    #[default]
    Back,
    Front,
    None,
}

/// Per-frame toggles a driver can flip between `render()` calls.
#[derive(Clone, Copy, Debug)]
pub struct RenderConfig {
    pub shading_mode: ShadingMode,
    pub cull_mode: CullMode,
    pub use_normal_map: bool,
    pub depth_viz: bool,
    pub bbox_viz: bool,
    pub wireframe: bool,
    pub uniform_clear: bool,
    pub fire_visible: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            shading_mode: ShadingMode::default(),
            cull_mode: CullMode::default(),
            use_normal_map: true,
            depth_viz: false,
            bbox_viz: false,
            wireframe: false,
            uniform_clear: false,
            fire_visible: true,
        }
    }
}

/// Owned color (ARGB8, packed) and depth (`f32`, NDC z) buffers.
pub struct FrameBuffer {
    width: usize,
    height: usize,
    color: Vec<u32>,
    depth: Vec<f32>,
}

const UNIFORM_CLEAR_COLOR: Color = Color::new(0.1, 0.1, 0.1);

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            color: vec![0; width * height],
            depth: vec![1.0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn color_buffer(&self) -> &[u32] {
        &self.color
    }

    pub fn depth_buffer(&self) -> &[f32] {
        &self.depth
    }

    /// Clears depth to `1.0` and color to either `background` or, when
    /// `uniform_clear` is set, a fixed neutral gray.
    pub fn clear(&mut self, background: Color, uniform_clear: bool) {
        let clear_color = if uniform_clear {
            UNIFORM_CLEAR_COLOR
        } else {
            background
        };
        let packed = clear_color.pack_argb(1.0);
        self.color.fill(packed);
        self.depth.fill(1.0);
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }
}

/// Barycentric weights for a screen-space pixel against a triangle, using the
/// original's early-exit-per-component `Cross` formulation. Any component
/// outside `[-1, 1]` short-circuits to an invalid `(1, -1, 1)` sentinel.
fn barycentric_weights(v0: Vec2, v1: Vec2, v2: Vec2, p: Vec2, inv_area: f32) -> (f32, f32, f32) {
    let u = (v2 - v1).cross(p - v1) * inv_area;
    if !(-1.0..=1.0).contains(&u) {
        return (1.0, -1.0, 1.0);
    }
    let v = (v0 - v2).cross(p - v2) * inv_area;
    if !(-1.0..=1.0).contains(&v) {
        return (1.0, -1.0, 1.0);
    }
    let w = (v1 - v0).cross(p - v0) * inv_area;
    if !(-1.0..=1.0).contains(&w) {
        return (1.0, -1.0, 1.0);
    }
    (u, v, w)
}

/// Validates and absolute-value-normalizes barycentric weights in place.
/// Weights are valid when all three share a sign and their absolute values
/// sum to ~1.
fn validate_barycentric(weights: &mut (f32, f32, f32)) -> bool {
    let (u, v, w) = *weights;
    let same_sign = u.signum() == v.signum() && v.signum() == w.signum();
    if !same_sign {
        return false;
    }
    let (au, av, aw) = (u.abs(), v.abs(), w.abs());
    *weights = (au, av, aw);
    (au + av + aw - 1.0).abs() < 1e-4
}

/// `InterpolateDepth`: the rational barycentric form for a single scalar
/// attribute (z or w), correct without a division-by-`w` per component.
fn interpolate_depth(z0: f32, z1: f32, z2: f32, weights: (f32, f32, f32)) -> f32 {
    let (u, v, w) = weights;
    (z0 * z1 * z2) / (u * z1 * z2 + v * z0 * z2 + w * z0 * z1)
}

/// `InterpolateAttribute`: perspective-correct interpolation of a
/// vector-valued attribute given the three vertices' `w`s and the already
/// interpolated depth.
fn interpolate<T>(d0: T, d1: T, d2: T, w0: f32, w1: f32, w2: f32, interpolated: f32, weights: (f32, f32, f32)) -> T
where
    T: std::ops::Mul<f32, Output = T> + std::ops::Add<Output = T> + std::ops::Div<f32, Output = T>,
{
    let (u, v, w) = weights;
    (d0 * (u * w1 * w2) + d1 * (v * w0 * w2) + d2 * (w * w0 * w1)) / (w0 * w1 * w2) * interpolated
}

fn ndc_in_frustum(v: &VertexOut) -> bool {
    v.position.x >= -1.0
        && v.position.x <= 1.0
        && v.position.y >= -1.0
        && v.position.y <= 1.0
        && v.position.z >= 0.0
        && v.position.z <= 1.0
}

fn to_screen(ndc_xy: (f32, f32), width: f32, height: f32) -> Vec2 {
    Vec2::new((1.0 + ndc_xy.0) * 0.5 * width, (1.0 - ndc_xy.1) * 0.5 * height)
}

/// One triangle's worth of work, already screen-mapped, ready to rasterize
/// against a framebuffer row range.
struct ScreenTriangle {
    v: [VertexOut; 3],
    screen: [Vec2; 3],
    min: (usize, usize),
    max: (usize, usize),
    inv_area: f32,
}

/// Builds the list of screen-space triangles for one mesh that survive
/// frustum and degenerate-index rejection. Shared by both the sequential and
/// tiled render paths so their coverage sets are identical.
fn gather_triangles(mesh: &Mesh, width: usize, height: usize) -> Vec<ScreenTriangle> {
    let mut triangles = Vec::with_capacity(mesh.triangle_count());
    for i in 0..mesh.triangle_count() {
        let Some([i0, i1, i2]) = mesh.triangle_indices(i) else {
            continue;
        };
        if i0 == i1 || i0 == i2 || i1 == i2 {
            continue;
        }
        let out = mesh.vertices_out();
        let v = [
            out[i0 as usize],
            out[i1 as usize],
            out[i2 as usize],
        ];
        if v.iter().any(|vert| !ndc_in_frustum(vert)) {
            continue;
        }

        let screen = [
            to_screen((v[0].position.x, v[0].position.y), width as f32, height as f32),
            to_screen((v[1].position.x, v[1].position.y), width as f32, height as f32),
            to_screen((v[2].position.x, v[2].position.y), width as f32, height as f32),
        ];

        let area = (screen[1] - screen[0]).cross(screen[2] - screen[0]);
        if area.abs() <= f32::EPSILON {
            continue;
        }

        let min_x = screen[0].x.min(screen[1].x).min(screen[2].x).floor().clamp(0.0, width as f32 - 1.0);
        let min_y = screen[0].y.min(screen[1].y).min(screen[2].y).floor().clamp(0.0, height as f32 - 1.0);
        let max_x = screen[0].x.max(screen[1].x).max(screen[2].x).ceil().clamp(0.0, width as f32 - 1.0);
        let max_y = screen[0].y.max(screen[1].y).max(screen[2].y).ceil().clamp(0.0, height as f32 - 1.0);

        triangles.push(ScreenTriangle {
            v,
            screen,
            min: (min_x as usize, min_y as usize),
            max: (max_x as usize, max_y as usize),
            inv_area: 1.0 / area,
        });
    }
    triangles
}

fn is_backfacing(area: f32, cull_mode: CullMode) -> bool {
    match cull_mode {
        CullMode::Back => area < 0.0,
        CullMode::Front => area > 0.0,
        CullMode::None => false,
    }
}

fn remap01(value: f32, low: f32, high: f32) -> f32 {
    ((value - low) / (high - low)).clamp(0.0, 1.0)
}

/// Draws one edge of a triangle as a Bresenham line, shading each pixel by
/// its depth-remapped gray value. `a`/`b` are the edge's screen-space
/// endpoints and NDC depths.
fn draw_wire_edge(framebuffer: &mut FrameBuffer, a: (Vec2, f32), b: (Vec2, f32)) {
    let (width, height) = (framebuffer.width(), framebuffer.height());
    let (mut x0, mut y0) = (a.0.x.round() as i64, a.0.y.round() as i64);
    let (x1, y1) = (b.0.x.round() as i64, b.0.y.round() as i64);

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let steps = dx.max(-dy).max(1) as f32;
    let mut step = 0.0;

    loop {
        if x0 >= 0 && y0 >= 0 && (x0 as usize) < width && (y0 as usize) < height {
            let t = (step / steps).clamp(0.0, 1.0);
            let z = a.1 + (b.1 - a.1) * t;
            let gray = remap01(z, 0.998, 1.0);
            let idx = framebuffer.index(x0 as usize, y0 as usize);
            framebuffer.color[idx] = Color::new(gray, gray, gray).pack_argb(1.0);
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
        step += 1.0;
    }
}

/// Shades and composites a single covered pixel. `color`/`depth` are the
/// target buffers (a full framebuffer's slices, or one tile's band); `idx` is
/// the pixel's offset into them, while `screen_pixel` is its position in the
/// *whole* framebuffer's screen space, used for barycentric evaluation and
/// the depth-visualization remap — these can differ when shading into a
/// band whose `idx` is relative to the band's own start row.
#[allow(clippy::too_many_arguments)]
fn shade_pixel(
    color: &mut [u32],
    depth: &mut [f32],
    idx: usize,
    screen_pixel: Vec2,
    tri: &ScreenTriangle,
    mesh: &Mesh,
    arena: &TextureArena,
    camera: &Camera,
    light: &DirectionalLight,
    config: &RenderConfig,
) {
    let min_depth = tri.v.iter().fold(f32::MAX, |m, v| m.min(v.position.z));
    if min_depth > depth[idx] {
        return;
    }

    let mut weights = barycentric_weights(tri.screen[0], tri.screen[1], tri.screen[2], screen_pixel, tri.inv_area);
    if !validate_barycentric(&mut weights) {
        return;
    }

    let (w0, w1, w2) = (tri.v[0].position.w, tri.v[1].position.w, tri.v[2].position.w);
    let z = interpolate_depth(tri.v[0].position.z, tri.v[1].position.z, tri.v[2].position.z, weights);
    if !(0.0..=1.0).contains(&z) {
        return;
    }
    let w_interp = interpolate_depth(w0, w1, w2, weights);
    if w_interp < 0.0 {
        return;
    }
    if z > depth[idx] {
        return;
    }

    if !mesh.is_transparent() {
        depth[idx] = z;
    }

    let fragment = VertexOut {
        position: crate::math::Vec4::new(screen_pixel.x, screen_pixel.y, z, w_interp),
        world_position: interpolate(
            tri.v[0].world_position,
            tri.v[1].world_position,
            tri.v[2].world_position,
            w0, w1, w2, w_interp, weights,
        ),
        color: interpolate(tri.v[0].color, tri.v[1].color, tri.v[2].color, w0, w1, w2, w_interp, weights),
        uv: interpolate(tri.v[0].uv, tri.v[1].uv, tri.v[2].uv, w0, w1, w2, w_interp, weights),
        normal: interpolate(tri.v[0].normal, tri.v[1].normal, tri.v[2].normal, w0, w1, w2, w_interp, weights)
            .normalize(),
        tangent: interpolate(tri.v[0].tangent, tri.v[1].tangent, tri.v[2].tangent, w0, w1, w2, w_interp, weights)
            .normalize(),
    };

    let (mut pixel_color, alpha) = shader::shade(
        &fragment,
        mesh,
        arena,
        camera.position(),
        light,
        config.shading_mode,
        config.use_normal_map,
    );

    if config.depth_viz {
        let remapped = remap01(depth[idx], 0.998, 1.0);
        pixel_color = Color::new(remapped, remapped, remapped);
    }

    let (existing, _) = Color::unpack_argb(color[idx]);
    let blended = (pixel_color * alpha + existing * (1.0 - alpha)).saturate();
    color[idx] = blended.pack_argb(1.0);
}

/// Rasterizes one already-transformed mesh's triangles into `framebuffer`.
#[allow(clippy::too_many_arguments)]
pub fn render_mesh(
    framebuffer: &mut FrameBuffer,
    mesh: &Mesh,
    arena: &TextureArena,
    camera: &Camera,
    light: &DirectionalLight,
    config: &RenderConfig,
) {
    let width = framebuffer.width();
    let triangles = gather_triangles(mesh, width, framebuffer.height());

    if config.wireframe {
        for tri in &triangles {
            let z = [tri.v[0].position.z, tri.v[1].position.z, tri.v[2].position.z];
            draw_wire_edge(framebuffer, (tri.screen[0], z[0]), (tri.screen[1], z[1]));
            draw_wire_edge(framebuffer, (tri.screen[1], z[1]), (tri.screen[2], z[2]));
            draw_wire_edge(framebuffer, (tri.screen[2], z[2]), (tri.screen[0], z[0]));
        }
        return;
    }

    for tri in &triangles {
        let area = (tri.screen[1] - tri.screen[0]).cross(tri.screen[2] - tri.screen[0]);
        if is_backfacing(area, config.cull_mode) && !mesh.is_transparent() {
            continue;
        }

        if config.bbox_viz {
            for py in tri.min.1..=tri.max.1 {
                for px in tri.min.0..=tri.max.0 {
                    let idx = framebuffer.index(px, py);
                    framebuffer.color[idx] = Color::WHITE.pack_argb(1.0);
                }
            }
            continue;
        }

        for py in tri.min.1..=tri.max.1 {
            for px in tri.min.0..=tri.max.0 {
                let idx = framebuffer.index(px, py);
                let screen_pixel = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                shade_pixel(
                    &mut framebuffer.color,
                    &mut framebuffer.depth,
                    idx,
                    screen_pixel,
                    tri,
                    mesh,
                    arena,
                    camera,
                    light,
                    config,
                );
            }
        }
    }
}

/// Row-band tile-parallel variant of [`render_mesh`]. Partitions the
/// framebuffer into horizontal bands via `par_chunks_mut` so each worker owns
/// a disjoint slice of both the color and depth buffers; no cross-tile
/// synchronization is needed since every triangle's pixel writes stay within
/// its own bounding box rows.
#[cfg(feature = "parallel")]
#[allow(clippy::too_many_arguments)]
pub fn render_mesh_tiled(
    framebuffer: &mut FrameBuffer,
    mesh: &Mesh,
    arena: &TextureArena,
    camera: &Camera,
    light: &DirectionalLight,
    config: &RenderConfig,
) {
    if config.wireframe {
        // Line draws cross band boundaries, so the tile-parallel split isn't
        // a safe fit; fall back to the sequential edge-draw path.
        render_mesh(framebuffer, mesh, arena, camera, light, config);
        return;
    }

    let width = framebuffer.width();
    let triangles = gather_triangles(mesh, width, framebuffer.height());

    const BAND_HEIGHT: usize = 16;
    let color = &mut framebuffer.color;
    let depth = &mut framebuffer.depth;

    color
        .par_chunks_mut(width * BAND_HEIGHT)
        .zip(depth.par_chunks_mut(width * BAND_HEIGHT))
        .enumerate()
        .for_each(|(band_index, (color_band, depth_band))| {
            let band_start_row = band_index * BAND_HEIGHT;
            let band_rows = color_band.len() / width;

            for tri in &triangles {
                let area = (tri.screen[1] - tri.screen[0]).cross(tri.screen[2] - tri.screen[0]);
                if is_backfacing(area, config.cull_mode) && !mesh.is_transparent() {
                    continue;
                }

                let row_start = tri.min.1.max(band_start_row);
                let row_end = tri.max.1.min(band_start_row + band_rows.saturating_sub(1));
                if row_start > row_end {
                    continue;
                }

                for py in row_start..=row_end {
                    let local_y = py - band_start_row;
                    for px in tri.min.0..=tri.max.0 {
                        let local_idx = local_y * width + px;
                        if config.bbox_viz {
                            color_band[local_idx] = Color::WHITE.pack_argb(1.0);
                            continue;
                        }
                        let screen_pixel = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                        shade_pixel(
                            color_band, depth_band, local_idx, screen_pixel, tri, mesh, arena, camera, light, config,
                        );
                    }
                }
            }
        });
}
