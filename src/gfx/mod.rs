//! # Graphics Module
//!
//! Everything between the scene description and the pixels.
//!
//! ## Architecture Overview
//!
//! - **Scene** ([`scene`]) - objects, transforms, mesh loading and parameter updates
//! - **Camera** ([`camera`]) - view/projection and the fly-through input controller
//! - **Lighting** ([`lighting`]) - light slots and the Blinn-Phong reference model
//! - **Rendering** ([`rendering`]) - the device seam, frame protocol and wgpu backend
//! - **Resources** ([`resources`]) - render targets and textures
//!
//! The scene side never touches wgpu; only [`rendering::WgpuDevice`] and
//! [`resources`] do.

pub mod camera;
pub mod color;
pub mod geometry;
pub mod lighting;
pub mod material;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::{Camera, InputController, Projection};
pub use color::Color;
pub use rendering::{FrameRenderer, RendererContext};
pub use scene::{SceneObject, SceneState, Transform};
