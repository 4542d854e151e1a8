// src/wgpu_utils/mod.rs
//! WGPU utility functions and helpers
//!
//! Binding layout shorthands and typed uniform buffers used by the wgpu
//! backend.

pub mod binding_types;
pub mod uniform_buffer;

pub use binding_types::*;
pub use uniform_buffer::{aligned_stride, ArrayBuffer, DynamicUniformBuffer, UniformBuffer};
