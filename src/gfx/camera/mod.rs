pub mod camera;
pub mod input_controller;

pub use camera::{aspect_ratio, Camera, Projection, NEAR_PLANE, ORTHOGONAL_HALF_EXTENT};
pub use input_controller::{Action, CameraDelta, InputController};
