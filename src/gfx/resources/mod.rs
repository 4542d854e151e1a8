// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Render targets and sampled textures for the wgpu backend.

pub mod texture_resource;

pub use texture_resource::{rgba_len_matches, TextureResource};
