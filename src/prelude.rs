//! Common re-exports for crate-internal use.

pub use crate::math::{Color, Mat4, Vec2, Vec3, Vec4};
