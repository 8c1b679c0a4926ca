//! Pinhole camera (C5).
//!
//! # Coordinate System
//!
//! Left-handed: X right, Y up, Z forward (into the screen).
//!
//! Field of view is stored as `tan(fov / 2)` rather than the raw angle, so the
//! per-frame projection-matrix build doesn't repeat a `tan()` call.

use crate::math::{Mat4, Vec3};

#[derive(Debug)]
pub enum CameraError {
    /// `near` must be strictly positive.
    InvalidNear(f32),
    /// `far` must be strictly greater than `near`.
    InvalidFar { near: f32, far: f32 },
    /// `fov` must lie in `(0, pi)`.
    InvalidFov(f32),
}

impl std::fmt::Display for CameraError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraError::InvalidNear(near) => write!(f, "near must be > 0, got {near}"),
            CameraError::InvalidFar { near, far } => {
                write!(f, "far must be > near ({near}), got {far}")
            }
            CameraError::InvalidFov(fov) => write!(f, "fov must be in (0, pi), got {fov}"),
        }
    }
}

impl std::error::Error for CameraError {}

/// A pinhole camera: position, orientation, and projection parameters.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    position: Vec3,
    forward: Vec3,
    up: Vec3,
    tan_half_fov: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl Camera {
    /// Builds a camera from an fov given in radians.
    pub fn from_fov_radians(
        position: Vec3,
        forward: Vec3,
        up: Vec3,
        fov_radians: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Result<Self, CameraError> {
        if near <= 0.0 {
            return Err(CameraError::InvalidNear(near));
        }
        if far <= near {
            return Err(CameraError::InvalidFar { near, far });
        }
        if fov_radians <= 0.0 || fov_radians >= std::f32::consts::PI {
            return Err(CameraError::InvalidFov(fov_radians));
        }
        Ok(Self {
            position,
            forward: forward.normalize(),
            up: up.normalize(),
            tan_half_fov: (fov_radians * 0.5).tan(),
            aspect,
            near,
            far,
        })
    }

    /// Builds a camera from an fov given in degrees.
    pub fn from_fov_degrees(
        position: Vec3,
        forward: Vec3,
        up: Vec3,
        fov_degrees: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Result<Self, CameraError> {
        Self::from_fov_radians(
            position,
            forward,
            up,
            fov_degrees.to_radians(),
            aspect,
            near,
            far,
        )
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.forward = (target - self.position).normalize();
    }

    /// The left-handed look-at view matrix for this camera.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_lh(self.position, self.position + self.forward, self.up)
    }

    /// The left-handed perspective projection matrix for this camera.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_lh_tan(self.tan_half_fov, self.aspect, self.near, self.far)
    }

    /// `view * projection`, precomposed for callers that only need the product.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.view_matrix() * self.projection_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn default_camera() -> Camera {
        Camera::from_fov_degrees(
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::UP,
            45.0,
            16.0 / 9.0,
            0.1,
            100.0,
        )
        .unwrap()
    }

    #[test]
    fn rejects_non_positive_near() {
        let err = Camera::from_fov_degrees(
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::UP,
            45.0,
            1.0,
            0.0,
            10.0,
        )
        .unwrap_err();
        assert!(matches!(err, CameraError::InvalidNear(_)));
    }

    #[test]
    fn rejects_far_not_greater_than_near() {
        let err = Camera::from_fov_degrees(
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::UP,
            45.0,
            1.0,
            10.0,
            10.0,
        )
        .unwrap_err();
        assert!(matches!(err, CameraError::InvalidFar { .. }));
    }

    #[test]
    fn rejects_out_of_range_fov() {
        let err = Camera::from_fov_radians(
            Vec3::ZERO,
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::UP,
            std::f32::consts::PI,
            1.0,
            0.1,
            10.0,
        )
        .unwrap_err();
        assert!(matches!(err, CameraError::InvalidFov(_)));
    }

    #[test]
    fn view_matrix_places_origin_forward_of_camera() {
        let camera = Camera::from_fov_degrees(
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::UP,
            45.0,
            1.0,
            0.1,
            100.0,
        )
        .unwrap();
        let view = camera.view_matrix();
        let origin_in_view = view.transform_point(Vec3::ZERO);
        assert_relative_eq!(origin_in_view.z, 5.0, epsilon = 1e-4);
    }

    #[test]
    fn tan_half_fov_matches_degrees_conversion() {
        let camera = default_camera();
        let projection = camera.projection_matrix();
        // perspective_lh_tan's (0,0) term is near / (tan(fov/2) * near * aspect)
        // = 1 / (tan(fov/2) * aspect); sanity check it's finite and positive.
        assert!(projection.get(0, 0) > 0.0);
    }
}
