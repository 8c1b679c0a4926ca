// Public API - exposed to library consumers
pub mod camera;
pub mod light;
pub mod math;
pub mod mesh;
pub mod obj;
pub mod pipeline;
pub mod prelude;
pub mod raster;
pub mod scene;
pub mod shader;
pub mod texture;

#[cfg(feature = "demo")]
pub mod window;

// Re-export commonly needed types at crate root for convenience
pub use camera::Camera;
pub use light::DirectionalLight;
pub use mesh::{Mesh, MeshTextures, Topology, Vertex};
pub use raster::{CullMode, FrameBuffer, RenderConfig};
pub use scene::{Rasterizer, Scene};
pub use shader::ShadingMode;
pub use texture::{Texture, TextureArena, TextureHandle};

/// Module exposing internals for benchmarking. Not part of the stable API.
pub mod bench {
    pub use crate::camera::Camera;
    pub use crate::light::DirectionalLight;
    pub use crate::mesh::{Mesh, Topology, Vertex};
    pub use crate::pipeline::transform_mesh;
    pub use crate::raster::{render_mesh, CullMode, FrameBuffer, RenderConfig};
    pub use crate::scene::Rasterizer;
    pub use crate::shader::ShadingMode;
    pub use crate::texture::TextureArena;

    #[cfg(feature = "parallel")]
    pub use crate::raster::render_mesh_tiled;
}
