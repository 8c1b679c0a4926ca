use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use trirast::bench::{render_mesh, transform_mesh, Camera, DirectionalLight, FrameBuffer, Mesh, RenderConfig, TextureArena, Topology, Vertex};
use trirast::math::{Color, Vec2, Vec3};

const BUFFER_WIDTH: usize = 800;
const BUFFER_HEIGHT: usize = 600;

fn camera() -> Camera {
    Camera::from_fov_degrees(
        Vec3::new(0.0, 0.0, -5.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::UP,
        60.0,
        BUFFER_WIDTH as f32 / BUFFER_HEIGHT as f32,
        0.1,
        100.0,
    )
    .unwrap()
}

fn light() -> DirectionalLight {
    DirectionalLight::new(Vec3::new(0.3, -0.6, 0.7), Color::WHITE, 2.0)
}

fn vertex(position: Vec3) -> Vertex {
    Vertex {
        position,
        color: Color::WHITE,
        uv: Vec2::new(0.5, 0.5),
        normal: Vec3::BACK,
        tangent: Vec3::RIGHT,
    }
}

/// One triangle sized so the projected footprint spans roughly `span` pixels.
fn single_triangle(span: f32) -> Mesh {
    let half = span / BUFFER_HEIGHT as f32;
    Mesh::new(
        vec![
            vertex(Vec3::new(-half, -half, 0.0)),
            vertex(Vec3::new(half, -half, 0.0)),
            vertex(Vec3::new(0.0, half, 0.0)),
        ],
        vec![0, 1, 2],
        Topology::TriangleList,
    )
}

/// A grid of small, non-overlapping triangles covering most of the viewport.
fn triangle_grid(rows: usize, cols: usize) -> Mesh {
    let mut vertices = Vec::with_capacity(rows * cols * 3);
    let mut indices = Vec::with_capacity(rows * cols * 3);
    let cell = 1.6 / rows.max(cols) as f32;
    for row in 0..rows {
        for col in 0..cols {
            let x = -0.8 + col as f32 * cell;
            let y = -0.8 + row as f32 * cell;
            let base = vertices.len() as u32;
            vertices.push(vertex(Vec3::new(x, y, 0.0)));
            vertices.push(vertex(Vec3::new(x + cell * 0.9, y, 0.0)));
            vertices.push(vertex(Vec3::new(x, y + cell * 0.9, 0.0)));
            indices.extend_from_slice(&[base, base + 1, base + 2]);
        }
    }
    Mesh::new(vertices, indices, Topology::TriangleList)
}

fn render_once(mesh: &mut Mesh) {
    let camera = camera();
    let light = light();
    let arena = TextureArena::new();
    let config = RenderConfig::default();
    let mut framebuffer = FrameBuffer::new(BUFFER_WIDTH, BUFFER_HEIGHT);

    transform_mesh(mesh, &camera);
    render_mesh(&mut framebuffer, mesh, &arena, &camera, &light, &config);
}

fn benchmark_single_triangle(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_triangle");

    for (name, span) in [("small", 20.0), ("medium", 120.0), ("large", 400.0)] {
        group.bench_with_input(BenchmarkId::new("render_mesh", name), &span, |b, &span| {
            let mut mesh = single_triangle(span);
            b.iter(|| render_once(black_box(&mut mesh)));
        });
    }

    group.finish();
}

fn benchmark_many_triangles(c: &mut Criterion) {
    let mut group = c.benchmark_group("many_triangles");

    group.bench_function("render_mesh_400_triangles", |b| {
        let mut mesh = triangle_grid(20, 20);
        b.iter(|| render_once(black_box(&mut mesh)));
    });

    group.finish();
}

criterion_group!(benches, benchmark_single_triangle, benchmark_many_triangles);
criterion_main!(benches);
