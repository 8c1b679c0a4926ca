//! 2D RGBA8 texture sampling (C2).
//!
//! A [`Texture`] is an immutable, decoded 2D image. Sampling is nearest-neighbor
//! only; there is no mipmapping or filtering in the software path. Textures are
//! held by a [`TextureArena`] and referenced from meshes via a cheap, `Copy`
//! [`TextureHandle`] rather than a shared pointer.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::math::{Color, Vec2};

#[derive(Debug)]
pub enum TextureError {
    NotFound(PathBuf),
    Decode(image::ImageError),
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::NotFound(path) => write!(f, "texture not found: {}", path.display()),
            TextureError::Decode(e) => write!(f, "failed to decode texture: {}", e),
        }
    }
}

impl std::error::Error for TextureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TextureError::Decode(e) => Some(e),
            TextureError::NotFound(_) => None,
        }
    }
}

/// A decoded 2D RGBA8 image, immutable after construction.
pub struct Texture {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    pitch: u32,
}

impl Texture {
    /// Builds a texture directly from raw RGBA8 bytes and a row pitch (in bytes).
    pub fn from_rgba8(bytes: Vec<u8>, width: u32, height: u32, pitch: u32) -> Self {
        debug_assert!(pitch >= width * 4, "pitch smaller than one packed row");
        debug_assert_eq!(
            bytes.len(),
            (pitch * height) as usize,
            "byte buffer size doesn't match width/height/pitch"
        );
        Self {
            bytes,
            width,
            height,
            pitch,
        }
    }

    /// Convenience constructor decoding an image file via the `image` crate.
    /// Not part of the frame-time hot path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TextureError::NotFound(path.to_path_buf()));
        }
        let img = image::open(path)
            .map_err(TextureError::Decode)?
            .to_rgba8();
        let (width, height) = img.dimensions();
        let pitch = width * 4;
        Ok(Self::from_rgba8(img.into_raw(), width, height, pitch))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn pixel_at(&self, u: f32, v: f32) -> [u8; 4] {
        let u = u - u.floor();
        let v = v - v.floor();

        let x = ((u * self.width as f32) as i64).clamp(0, self.width as i64 - 1) as u32;
        let y = ((v * self.height as f32) as i64).clamp(0, self.height as i64 - 1) as u32;

        let offset = (y * self.pitch + x * 4) as usize;
        [
            self.bytes[offset],
            self.bytes[offset + 1],
            self.bytes[offset + 2],
            self.bytes[offset + 3],
        ]
    }

    /// Samples the RGB channels at `uv`, wrapping and using nearest-neighbor.
    pub fn sample(&self, uv: Vec2) -> Color {
        let [r, g, b, _] = self.pixel_at(uv.x, uv.y);
        Color::from_bytes(r, g, b)
    }

    /// Samples RGB and alpha at `uv`.
    pub fn sample_with_alpha(&self, uv: Vec2) -> (Color, f32) {
        let [r, g, b, a] = self.pixel_at(uv.x, uv.y);
        (Color::from_bytes(r, g, b), a as f32 / 255.0)
    }
}

/// A stable, `Copy` reference into a [`TextureArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureHandle(usize);

/// Owns a scene's textures; meshes hold [`TextureHandle`]s rather than shared
/// pointers, removing any cyclic-reference risk between meshes and textures.
#[derive(Default)]
pub struct TextureArena {
    textures: Vec<Texture>,
}

impl TextureArena {
    pub fn new() -> Self {
        Self {
            textures: Vec::new(),
        }
    }

    pub fn insert(&mut self, texture: Texture) -> TextureHandle {
        self.textures.push(texture);
        TextureHandle(self.textures.len() - 1)
    }

    pub fn get(&self, handle: TextureHandle) -> &Texture {
        &self.textures[handle.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard() -> Texture {
        // 2x2: top-left red, top-right green, bottom-left blue, bottom-right white.
        let bytes = vec![
            255, 0, 0, 255, 0, 255, 0, 255, // row 0
            0, 0, 255, 255, 255, 255, 255, 255, // row 1
        ];
        Texture::from_rgba8(bytes, 2, 2, 8)
    }

    #[test]
    fn sample_nearest_corners() {
        let tex = checkerboard();
        let top_left = tex.sample(Vec2::new(0.01, 0.01));
        assert_eq!(top_left, Color::new(1.0, 0.0, 0.0));

        let bottom_right = tex.sample(Vec2::new(0.99, 0.99));
        assert_eq!(bottom_right, Color::WHITE);
    }

    #[test]
    fn sample_wraps_outside_unit_range() {
        let tex = checkerboard();
        let wrapped = tex.sample(Vec2::new(1.01, 1.01));
        let base = tex.sample(Vec2::new(0.01, 0.01));
        assert_eq!(wrapped, base);

        let negative = tex.sample(Vec2::new(-0.01, -0.01));
        let bottom_right = tex.sample(Vec2::new(0.99, 0.99));
        assert_eq!(negative, bottom_right);
    }

    #[test]
    fn sample_with_alpha_reads_fourth_channel() {
        let bytes = vec![10, 20, 30, 128];
        let tex = Texture::from_rgba8(bytes, 1, 1, 4);
        let (color, alpha) = tex.sample_with_alpha(Vec2::new(0.5, 0.5));
        assert_eq!(color, Color::from_bytes(10, 20, 30));
        assert!((alpha - 128.0 / 255.0).abs() < 1e-4);
    }

    #[test]
    fn arena_handles_are_stable() {
        let mut arena = TextureArena::new();
        let h1 = arena.insert(checkerboard());
        let h2 = arena.insert(Texture::from_rgba8(vec![1, 2, 3, 4], 1, 1, 4));
        assert_eq!(arena.get(h1).width(), 2);
        assert_eq!(arena.get(h2).width(), 1);
    }
}
