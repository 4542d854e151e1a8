use std::collections::HashMap;

use cgmath::{Vector2, Vector3, Zero};
use winit::{
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use super::camera::Camera;
use crate::config::InputConfig;

/// Movement the camera can be asked to make, each bound to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Forward,
        Action::Backward,
        Action::Left,
        Action::Right,
        Action::Up,
        Action::Down,
    ];
}

/// What one `process_input` call did to the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraDelta {
    pub translation: Vector3<f32>,
    pub rotation: Vector3<f32>,
}

/// Fly-through camera input: held keys translate along the camera's own
/// basis, a left-button drag turns it.
///
/// Mouse motion is edge-triggered. Motion reported since the last
/// [`process_input`](Self::process_input) is consumed by that call; a held
/// button without new motion turns nothing.
pub struct InputController {
    pub movement_speed: f32,
    pub rotation_speed: f32,
    bindings: HashMap<KeyCode, Action>,
    held: HashMap<Action, bool>,
    is_mouse_pressed: bool,
    last_cursor: Option<Vector2<f64>>,
    pending_drag: Option<Vector2<f32>>,
}

impl InputController {
    pub fn new(config: &InputConfig) -> Self {
        Self {
            movement_speed: config.movement_speed,
            rotation_speed: config.rotation_speed,
            bindings: config.bindings.clone(),
            held: Action::ALL.into_iter().map(|action| (action, false)).collect(),
            is_mouse_pressed: false,
            last_cursor: None,
            pending_drag: None,
        }
    }

    /// Routes the window events the controller cares about. Returns `true`
    /// if the event was used.
    pub fn process_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => self.on_key(*code, *state == ElementState::Pressed),
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.on_mouse_button(*state == ElementState::Pressed);
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.on_mouse_move(position.x, position.y);
                true
            }
            WindowEvent::CursorLeft { .. } => {
                self.forget_cursor();
                true
            }
            WindowEvent::Focused(false) => {
                self.release_all();
                false
            }
            _ => false,
        }
    }

    /// Returns `false` for unbound keys.
    pub fn on_key(&mut self, key: KeyCode, pressed: bool) -> bool {
        match self.bindings.get(&key) {
            Some(action) => {
                self.held.insert(*action, pressed);
                true
            }
            None => false,
        }
    }

    pub fn on_mouse_button(&mut self, pressed: bool) {
        self.is_mouse_pressed = pressed;
    }

    /// Cursor position in window pixels. The first report only records the
    /// position.
    pub fn on_mouse_move(&mut self, x: f64, y: f64) {
        let position = Vector2::new(x, y);
        if let Some(last) = self.last_cursor {
            let step = (position - last).cast::<f32>().unwrap_or_else(Vector2::zero);
            *self.pending_drag.get_or_insert_with(Vector2::zero) += step;
        }
        self.last_cursor = Some(position);
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.get(&action).copied().unwrap_or(false)
    }

    pub fn is_mouse_pressed(&self) -> bool {
        self.is_mouse_pressed
    }

    /// The next cursor report starts a fresh drag instead of measuring from
    /// wherever the cursor was last seen.
    pub fn forget_cursor(&mut self) {
        self.last_cursor = None;
    }

    /// Clears held keys, the mouse button and cursor tracking, as when the
    /// window loses focus.
    pub fn release_all(&mut self) {
        self.held.values_mut().for_each(|held| *held = false);
        self.is_mouse_pressed = false;
        self.pending_drag = None;
        self.forget_cursor();
    }

    /// Advances `camera` by `delta_seconds` of input.
    ///
    /// Every held action adds its basis vector scaled by
    /// `movement_speed * delta_seconds`; the sum is not normalized, so
    /// diagonals move faster. A fresh drag while the button is down turns
    /// yaw by `-dx` and pitch by `-dy`, scaled by
    /// `rotation_speed * delta_seconds`, added onto the current rotation.
    pub fn process_input(&mut self, camera: &mut Camera, delta_seconds: f32) -> CameraDelta {
        let movement = self.movement_speed * delta_seconds;
        let turn = self.rotation_speed * delta_seconds;

        let forward = camera.transform.forward();
        let right = camera.transform.right();
        let up = camera.transform.up();

        let mut translation = Vector3::zero();
        for action in Action::ALL.into_iter().filter(|a| self.is_held(*a)) {
            translation += match action {
                Action::Forward => forward * movement,
                Action::Backward => -forward * movement,
                Action::Right => right * movement,
                Action::Left => -right * movement,
                Action::Up => up * movement,
                Action::Down => -up * movement,
            };
        }

        let mut rotation = Vector3::zero();
        if let Some(drag) = self.pending_drag.take() {
            if self.is_mouse_pressed {
                rotation.y = -drag.x * turn;
                rotation.z = -drag.y * turn;
            }
        }

        camera.transform.position += translation;
        camera.transform.rotation += rotation;

        CameraDelta {
            translation,
            rotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use cgmath::InnerSpace;

    fn controller() -> InputController {
        InputController::new(&InputConfig::default())
    }

    #[test]
    fn test_idle_input_leaves_camera_alone() {
        let mut input = controller();
        let mut camera = Camera::default();
        input.on_mouse_button(true);

        let delta = input.process_input(&mut camera, 1.0);
        assert_eq!(delta.translation, Vector3::zero());
        assert_eq!(delta.rotation, Vector3::zero());
        assert_eq!(camera, Camera::default());
    }

    #[test]
    fn test_forward_moves_exactly_speed_times_time() {
        let mut input = controller();
        let mut camera = Camera::default();
        let forward = camera.transform.forward();
        assert!(input.on_key(KeyCode::KeyW, true));

        input.process_input(&mut camera, 0.1);
        assert_abs_diff_eq!(camera.position(), forward * 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_movement_follows_camera_basis() {
        let mut input = controller();
        let mut camera = Camera::default();
        camera.transform.rotation.y = std::f32::consts::FRAC_PI_2;
        input.on_key(KeyCode::KeyW, true);

        let delta = input.process_input(&mut camera, 1.0);
        assert_abs_diff_eq!(delta.translation, Vector3::new(0.0, 0.0, -5.0), epsilon = 1e-5);
    }

    #[test]
    fn test_diagonal_is_faster() {
        let mut input = controller();
        let mut camera = Camera::default();
        input.on_key(KeyCode::KeyW, true);
        input.on_key(KeyCode::KeyD, true);

        let delta = input.process_input(&mut camera, 1.0);
        assert_abs_diff_eq!(delta.translation.magnitude(), 5.0 * 2f32.sqrt(), epsilon = 1e-5);
    }

    #[test]
    fn test_released_and_opposing_keys() {
        let mut input = controller();
        let mut camera = Camera::default();
        input.on_key(KeyCode::KeyE, true);
        input.on_key(KeyCode::KeyQ, true);
        assert_eq!(input.process_input(&mut camera, 1.0).translation, Vector3::zero());

        input.on_key(KeyCode::KeyQ, false);
        let delta = input.process_input(&mut camera, 1.0);
        assert_abs_diff_eq!(delta.translation, Vector3::new(0.0, 5.0, 0.0), epsilon = 1e-5);
        assert!(!input.on_key(KeyCode::KeyZ, true));
    }

    #[test]
    fn test_drag_rotates_once_per_motion() {
        let mut input = controller();
        let mut camera = Camera::default();
        input.on_mouse_move(100.0, 100.0);
        input.on_mouse_button(true);
        input.on_mouse_move(110.0, 95.0);

        let first = input.process_input(&mut camera, 0.5);
        assert_abs_diff_eq!(
            first.rotation,
            Vector3::new(0.0, -10.0 * 0.2, 5.0 * 0.2),
            epsilon = 1e-5
        );

        let second = input.process_input(&mut camera, 0.5);
        assert_eq!(second.rotation, Vector3::zero());
        assert_abs_diff_eq!(camera.transform.rotation, first.rotation, epsilon = 1e-6);
    }

    #[test]
    fn test_motion_without_button_is_discarded() {
        let mut input = controller();
        let mut camera = Camera::default();
        input.on_mouse_move(0.0, 0.0);
        input.on_mouse_move(50.0, 0.0);
        input.process_input(&mut camera, 1.0);

        input.on_mouse_button(true);
        assert_eq!(input.process_input(&mut camera, 1.0).rotation, Vector3::zero());
    }

    #[test]
    fn test_rotation_accumulates_without_wrapping() {
        let mut input = controller();
        let mut camera = Camera::default();
        input.on_mouse_button(true);
        input.on_mouse_move(0.0, 0.0);
        for step in 1..=100 {
            input.on_mouse_move(step as f64 * -100.0, 0.0);
            input.process_input(&mut camera, 1.0);
        }
        assert_relative_eq!(camera.transform.rotation.y, 100.0 * 100.0 * 0.4, epsilon = 1e-1);
    }

    #[test]
    fn test_release_all() {
        let mut input = controller();
        input.on_key(KeyCode::KeyW, true);
        input.on_mouse_button(true);
        input.release_all();
        assert!(!input.is_held(Action::Forward));
        assert!(!input.is_mouse_pressed());
    }

    #[test]
    fn test_drag_after_focus_loss_starts_fresh() {
        let mut input = controller();
        let mut camera = Camera::default();
        input.on_mouse_button(true);
        input.on_mouse_move(100.0, 100.0);
        input.release_all();

        input.on_mouse_button(true);
        input.on_mouse_move(400.0, 400.0);
        assert_eq!(input.process_input(&mut camera, 1.0).rotation, Vector3::zero());

        input.on_mouse_move(410.0, 400.0);
        let delta = input.process_input(&mut camera, 1.0);
        assert_abs_diff_eq!(delta.rotation, Vector3::new(0.0, -10.0 * 0.4, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_cursor_leaving_window_drops_last_position() {
        let mut input = controller();
        let mut camera = Camera::default();
        input.on_mouse_button(true);
        input.on_mouse_move(0.0, 0.0);
        input.forget_cursor();

        input.on_mouse_move(300.0, 0.0);
        assert_eq!(input.process_input(&mut camera, 1.0).rotation, Vector3::zero());
        assert!(input.is_mouse_pressed());
    }
}
