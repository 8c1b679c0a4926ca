//! Minimal SDL2 driver exercising the `Rasterizer` façade: loads an OBJ mesh
//! and its textures, then renders it every frame while the window handles
//! toggling shading modes, culling, and the diagnostic visualizations.
//!
//! Replaces the teacher's `main.rs`/`display.rs`; gated behind the `demo`
//! feature so the library itself never requires SDL2.

use std::path::Path;

use trirast::camera::Camera;
use trirast::light::DirectionalLight;
use trirast::math::{Color, Vec3};
use trirast::mesh::MeshTextures;
use trirast::obj;
use trirast::scene::Rasterizer;
use trirast::texture::Texture;
use trirast::window::{FpsCounter, FrameLimiter, Key, Window, WindowEvent, WINDOW_HEIGHT, WINDOW_WIDTH};

fn main() -> Result<(), String> {
    let mut window = Window::new("trirast", WINDOW_WIDTH, WINDOW_HEIGHT)?;
    let mut limiter = FrameLimiter::new(&window);
    let mut fps_counter = FpsCounter::new();

    let camera = Camera::from_fov_degrees(
        Vec3::new(0.0, 0.0, -10.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::UP,
        45.0,
        WINDOW_WIDTH as f32 / WINDOW_HEIGHT as f32,
        0.1,
        100.0,
    )
    .map_err(|e| e.to_string())?;
    let light = DirectionalLight::new(Vec3::new(0.6, -0.7, 0.7), Color::WHITE, 2.0);

    let mut rasterizer = Rasterizer::create(WINDOW_WIDTH as usize, WINDOW_HEIGHT as usize, camera, light);

    load_vehicle(&mut rasterizer, Path::new("assets/vehicle.obj"))?;

    let mut running = true;
    while running {
        match window.poll_events() {
            WindowEvent::Quit => running = false,
            WindowEvent::Resize(w, h) => window.resize(w, h)?,
            WindowEvent::KeyPress(key) => handle_key(&mut rasterizer, key),
            WindowEvent::None => {}
        }

        rasterizer.render();

        let argb: Vec<u8> = rasterizer
            .framebuffer()
            .color_buffer()
            .iter()
            .flat_map(|pixel| pixel.to_ne_bytes())
            .collect();
        window.present(&argb)?;

        if let Some(fps) = fps_counter.tick() {
            window.set_title(&format!("trirast — {fps:.0} fps"));
        }
        limiter.wait_and_get_delta(&window);
    }

    Ok(())
}

fn handle_key(rasterizer: &mut Rasterizer, key: Key) {
    match key {
        Key::Num1 => rasterizer.cycle_shading_mode(),
        Key::Num2 => rasterizer.toggle_normal_map(),
        Key::Num3 => rasterizer.toggle_depth_viz(),
        Key::Num4 => rasterizer.toggle_bbox_viz(),
        Key::Num5 => rasterizer.toggle_wireframe(),
        Key::C => rasterizer.cycle_cull_mode(),
        Key::G => rasterizer.toggle_uniform_clear(),
        Key::R => rasterizer.toggle_rotate_mesh(),
        Key::F => rasterizer.toggle_fire_visible(),
    }
}

fn load_vehicle(rasterizer: &mut Rasterizer, obj_path: &Path) -> Result<(), String> {
    let mesh = obj::load(obj_path, true).map_err(|e| e.to_string())?;

    let textures_dir = obj_path.parent().unwrap_or(Path::new("."));
    let diffuse = load_texture(rasterizer, &textures_dir.join("vehicle_diffuse.png"));
    let normal = load_texture(rasterizer, &textures_dir.join("vehicle_normal.png"));
    let specular = load_texture(rasterizer, &textures_dir.join("vehicle_specular.png"));
    let gloss = load_texture(rasterizer, &textures_dir.join("vehicle_gloss.png"));

    let mesh = mesh.with_textures(MeshTextures {
        diffuse,
        normal,
        specular,
        gloss,
    });

    rasterizer.add_mesh("vehicle", mesh);
    rasterizer.set_rotating_mesh("vehicle");
    Ok(())
}

fn load_texture(rasterizer: &mut Rasterizer, path: &Path) -> Option<trirast::texture::TextureHandle> {
    Texture::from_file(path)
        .ok()
        .map(|texture| rasterizer.texture_arena_mut().insert(texture))
}
