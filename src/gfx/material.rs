//! Phong material derived from an object's color
//!
//! Every drawable shares the same material shape: its color drives both the
//! diffuse and specular response, ambient response is fixed white, and the
//! shininess exponent comes from the frame's render parameters.

use crate::gfx::color::Color;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub diffuse: Color,
    pub ambient: Color,
    pub specular: Color,
    pub shininess: f32,
}

impl Material {
    pub fn for_object(color: Color, shininess: f32) -> Self {
        Self {
            diffuse: color,
            ambient: Color::WHITE,
            specular: color,
            shininess,
        }
    }

    /// Replaces the diffuse response, as the edge pass does with the edge color.
    pub fn with_diffuse(mut self, diffuse: Color) -> Self {
        self.diffuse = diffuse;
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::for_object(Color::WHITE, 32.0)
    }
}
