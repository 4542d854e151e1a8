// src/lib.rs
//! Vantage 3D Viewer
//!
//! An interactive scene viewer built on wgpu and winit. The scene core
//! (transforms, camera, lights, meshes, input) is device-agnostic; the frame
//! protocol drives any [`gfx::rendering::RenderDevice`].

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod performance;
pub mod prelude;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::ViewerApp;
pub use config::{InputConfig, RenderParameters, ViewerConfig};
pub use error::{ColorError, MeshError, ParameterError, RenderError, RenderResult};

/// Creates a viewer with default settings
pub fn default() -> anyhow::Result<ViewerApp> {
    ViewerApp::new(ViewerConfig::default())
}
