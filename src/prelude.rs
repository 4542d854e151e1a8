//! # Vantage Prelude
//!
//! Commonly used types in one import.
//!
//! ```rust
//! use vantage::prelude::*;
//!
//! let mut scene = SceneState::default().with_default_lights();
//! let cube = scene.create_object(PrimitiveKind::Cube);
//!
//! let mut params = RenderParameters::default();
//! ParameterUpdate::Object(cube, ObjectChange::ColorHex("#ff8000".into()))
//!     .apply(&mut scene, &mut params)
//!     .unwrap();
//! assert_eq!(scene.object(cube).unwrap().color.to_string(), "#ff8000");
//! ```

// Application and configuration
pub use crate::app::ViewerApp;
pub use crate::config::{InputConfig, RenderParameters, ViewerConfig};
pub use crate::default;
pub use crate::error::{ColorError, MeshError, ParameterError, RenderError, RenderResult};

// Scene description
pub use crate::gfx::camera::{Action, Camera, InputController, Projection};
pub use crate::gfx::color::Color;
pub use crate::gfx::geometry::{generate_cube, generate_sphere, GeometryData, PrimitiveKind};
pub use crate::gfx::lighting::{Light, LightKind, LightSlots};
pub use crate::gfx::scene::{
    parameters::{Axis, CameraChange, LightChange, ObjectChange, ParameterUpdate, RenderChange},
    MeshData, MeshLoadSender, MeshState, ObjectId, SceneObject, SceneState, Shading,
    TextureBinding, Transform,
};

// Rendering
pub use crate::gfx::rendering::{
    FrameRenderer, FrameStats, RecordingDevice, RenderDevice, RendererContext, ShaderSources,
    WgpuDevice,
};
