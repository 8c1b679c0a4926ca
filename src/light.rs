//! Directional light (C: input to the shader).
//!
//! The core treats the light as a pure directional source — shadow-map
//! sampling is out of scope and is described only as an optional hook a
//! caller may wire into the shader separately.

use crate::math::{Color, Vec3};

pub struct DirectionalLight {
    /// The normalized direction the light travels *toward* (not where it
    /// originates from).
    pub direction: Vec3,
    pub color: Color,
    pub intensity: f32,
}

impl DirectionalLight {
    pub fn new(direction: Vec3, color: Color, intensity: f32) -> Self {
        Self {
            direction: direction.normalize(),
            color,
            intensity,
        }
    }

    /// Unit vector pointing from a surface toward the light, used uniformly
    /// by the shader as `-normalize(direction)`.
    pub fn direction_to_light(&self) -> Vec3 {
        -self.direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_to_light_is_negated_and_normalized() {
        let light = DirectionalLight::new(Vec3::new(0.0, 0.0, 2.0), Color::WHITE, 1.0);
        let to_light = light.direction_to_light();
        assert!((to_light.magnitude() - 1.0).abs() < 1e-4);
        assert!(to_light.z < 0.0);
    }

    #[test]
    fn constructor_normalizes_non_unit_direction() {
        let light = DirectionalLight::new(Vec3::new(3.0, 0.0, 4.0), Color::WHITE, 1.0);
        assert!((light.direction.magnitude() - 1.0).abs() < 1e-4);
    }
}
