//! # Scene
//!
//! The mutable state a frame is rendered from: [`SceneState`] owns the
//! ordered [`SceneObject`] list, the camera and the light slots. Objects are
//! placed with a [`Transform`] and carry their mesh through the
//! [`MeshState`] lifecycle, so geometry that is still loading is simply not
//! drawn yet.
//!
//! ```rust
//! use vantage::gfx::{geometry::PrimitiveKind, scene::SceneState};
//!
//! let mut scene = SceneState::default().with_default_lights();
//! let cube = scene.create_object(PrimitiveKind::Cube);
//! let (teapot, sender) = scene.begin_load("teapot.obj");
//!
//! // The loader hands back flat triangle-list buffers.
//! sender.fail("file not found");
//! scene.poll_loads();
//! assert!(scene.object(teapot).unwrap().drawable_mesh().is_none());
//! assert!(scene.object(cube).unwrap().drawable_mesh().is_some());
//! ```

pub mod mesh;
pub mod object;
pub mod parameters;
pub mod scene;
pub mod transform;

pub use mesh::{MeshData, MeshLoadSender, MeshState};
pub use object::{ObjectId, SceneObject, Shading, TextureBinding};
pub use parameters::{
    Axis, CameraChange, LightChange, ObjectChange, ParameterUpdate, RenderChange,
};
pub use scene::{SceneState, SceneStatistics};
pub use transform::Transform;
