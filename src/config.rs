//! Viewer configuration
//!
//! Plain structs with defaults and `with_*` builders. Colors are held parsed;
//! hex strings are only accepted at the edges through the `*_hex` setters and
//! [`ParameterUpdate`](crate::gfx::scene::ParameterUpdate).

use std::{collections::HashMap, time::Duration};

use winit::keyboard::KeyCode;

use crate::{
    error::ColorError,
    gfx::{camera::input_controller::Action, color::Color, lighting::DEFAULT_LIGHT_CAPACITY},
};

/// Per-frame drawing switches and colors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParameters {
    pub draw_polygons: bool,
    pub draw_edges: bool,
    /// Scene lighting; off draws every object with its flat color.
    pub draw_light: bool,
    pub background_color: Color,
    pub edge_color: Color,
    pub material_shininess: f32,
}

impl Default for RenderParameters {
    fn default() -> Self {
        Self {
            draw_polygons: true,
            draw_edges: false,
            draw_light: true,
            background_color: Color::BLACK,
            edge_color: Color::WHITE,
            material_shininess: 32.0,
        }
    }
}

impl RenderParameters {
    pub fn with_polygons(mut self, enabled: bool) -> Self {
        self.draw_polygons = enabled;
        self
    }

    pub fn with_edges(mut self, enabled: bool) -> Self {
        self.draw_edges = enabled;
        self
    }

    pub fn with_lighting(mut self, enabled: bool) -> Self {
        self.draw_light = enabled;
        self
    }

    pub fn with_shininess(mut self, shininess: f32) -> Self {
        self.material_shininess = shininess;
        self
    }

    pub fn with_background_hex(mut self, hex: &str) -> Result<Self, ColorError> {
        self.background_color = hex.parse()?;
        Ok(self)
    }

    pub fn with_edge_hex(mut self, hex: &str) -> Result<Self, ColorError> {
        self.edge_color = hex.parse()?;
        Ok(self)
    }

    pub fn background_hex(&self) -> String {
        self.background_color.to_string()
    }

    pub fn edge_hex(&self) -> String {
        self.edge_color.to_string()
    }
}

/// Camera fly-through controls.
#[derive(Debug, Clone, PartialEq)]
pub struct InputConfig {
    /// World units per second.
    pub movement_speed: f32,
    /// Radians per pixel of drag per second of frame time.
    pub rotation_speed: f32,
    pub bindings: HashMap<KeyCode, Action>,
}

impl Default for InputConfig {
    fn default() -> Self {
        let bindings = [
            (KeyCode::KeyW, Action::Forward),
            (KeyCode::KeyS, Action::Backward),
            (KeyCode::KeyA, Action::Left),
            (KeyCode::KeyD, Action::Right),
            (KeyCode::KeyE, Action::Up),
            (KeyCode::KeyQ, Action::Down),
        ]
        .into_iter()
        .collect();

        Self {
            movement_speed: 5.0,
            rotation_speed: 0.4,
            bindings,
        }
    }
}

impl InputConfig {
    pub fn with_movement_speed(mut self, speed: f32) -> Self {
        self.movement_speed = speed;
        self
    }

    pub fn with_rotation_speed(mut self, speed: f32) -> Self {
        self.rotation_speed = speed;
        self
    }

    /// Binds `key` to `action`, replacing any previous binding for that key.
    pub fn with_binding(mut self, key: KeyCode, action: Action) -> Self {
        self.bindings.insert(key, action);
        self
    }
}

/// Top-level settings for [`ViewerApp`](crate::app::ViewerApp).
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub tick_rate: u32,
    pub light_capacity: usize,
    pub input: InputConfig,
    pub render: RenderParameters,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Vantage".to_string(),
            width: 1280,
            height: 720,
            tick_rate: 60,
            light_capacity: DEFAULT_LIGHT_CAPACITY,
            input: InputConfig::default(),
            render: RenderParameters::default(),
        }
    }
}

impl ViewerConfig {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_tick_rate(mut self, tick_rate: u32) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    pub fn with_light_capacity(mut self, capacity: usize) -> Self {
        self.light_capacity = capacity;
        self
    }

    pub fn with_input(mut self, input: InputConfig) -> Self {
        self.input = input;
        self
    }

    pub fn with_render(mut self, render: RenderParameters) -> Self {
        self.render = render;
        self
    }

    /// Time between ticks; a zero tick rate is treated as 1 Hz.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate.max(1) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_render_defaults() {
        let params = RenderParameters::default();
        assert!(params.draw_polygons);
        assert!(!params.draw_edges);
        assert!(params.draw_light);
        assert_eq!(params.background_hex(), "#000000");
        assert_eq!(params.edge_hex(), "#ffffff");
        assert_eq!(params.material_shininess, 32.0);
    }

    #[test]
    fn test_hex_setters_validate() {
        let params = RenderParameters::default()
            .with_background_hex("#336699")
            .unwrap();
        assert_eq!(params.background_hex(), "#336699");
        assert!(RenderParameters::default().with_edge_hex("white").is_err());
    }

    #[test]
    fn test_default_bindings() {
        let input = InputConfig::default();
        assert_eq!(input.bindings.len(), 6);
        assert_eq!(input.bindings.get(&KeyCode::KeyW), Some(&Action::Forward));
        assert_eq!(input.bindings.get(&KeyCode::KeyQ), Some(&Action::Down));

        let rebound = input.with_binding(KeyCode::ArrowUp, Action::Forward);
        assert_eq!(rebound.bindings.len(), 7);
    }

    #[test]
    fn test_tick_interval() {
        let config = ViewerConfig::default();
        assert_eq!(config.tick_rate, 60);
        assert_abs_diff_eq!(config.tick_interval().as_secs_f64(), 1.0 / 60.0, epsilon = 1e-9);
        assert_eq!(config.with_tick_rate(0).tick_interval(), Duration::from_secs(1));
    }
}
