use std::fmt;

use super::{
    mesh::{MeshData, MeshState},
    transform::Transform,
};
use crate::gfx::color::Color;

/// Stable handle to an object in a [`SceneState`](super::SceneState).
/// Ids are never reused, not even after a scene reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub usize);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shading {
    #[default]
    Lit,
    /// Drawn with its flat color even when scene lighting is on (light gizmos).
    Unlit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureBinding {
    pub unit: u32,
    pub scale: f32,
}

impl TextureBinding {
    pub fn new(unit: u32) -> Self {
        Self { unit, scale: 1.0 }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }
}

/// Anything drawable: a transform, a flat color and a mesh.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub transform: Transform,
    pub color: Color,
    pub mesh: MeshState,
    pub visible: bool,
    pub shading: Shading,
    pub texture: Option<TextureBinding>,
}

impl SceneObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            color: Color::WHITE,
            mesh: MeshState::NotLoaded,
            visible: true,
            shading: Shading::Lit,
            texture: None,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_mesh(mut self, mesh: MeshData) -> Self {
        self.mesh = MeshState::Ready(mesh);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_shading(mut self, shading: Shading) -> Self {
        self.shading = shading;
        self
    }

    pub fn with_texture(mut self, texture: TextureBinding) -> Self {
        self.texture = Some(texture);
        self
    }

    /// Mesh to draw this frame, if any. Hidden objects, meshes still loading
    /// and empty meshes all yield `None`.
    pub fn drawable_mesh(&self) -> Option<&MeshData> {
        if !self.visible {
            return None;
        }
        self.mesh.ready().filter(|mesh| !mesh.is_empty())
    }
}
