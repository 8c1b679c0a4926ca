//! Linear algebra primitives: 2D/3D/4D vectors, a 4x4 matrix, and a float color.

pub mod color;
pub mod mat4;
pub mod vec2;
pub mod vec3;
pub mod vec4;

pub use color::Color;
pub use mat4::Mat4;
pub use vec2::Vec2;
pub use vec3::Vec3;
pub use vec4::Vec4;
