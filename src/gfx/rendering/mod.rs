// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! The frame protocol ([`FrameRenderer`]) drives any [`RenderDevice`] through
//! a [`RendererContext`]. [`WgpuDevice`] renders to a window;
//! [`RecordingDevice`] records calls for headless runs and tests.

pub mod context;
pub mod device;
pub mod frame_renderer;
pub mod pipeline_manager;
pub mod recording;
pub mod shaders;
pub mod uniforms;
pub mod wgpu_device;

pub use context::{RendererContext, GLOBAL_CAPABILITIES};
pub use device::{
    BufferHandle, Capability, DrawMode, ProgramHandle, RenderDevice, ShaderHandle, ShaderStage,
    UniformValue,
};
pub use frame_renderer::{FrameRenderer, FrameStats, EDGE_POLYGON_OFFSET, FILL_POLYGON_OFFSET};
pub use pipeline_manager::{PipelineConfig, PipelineManager, PipelineStats};
pub use recording::{DeviceCall, RecordingDevice};
pub use shaders::{shader_light_count, ShaderSources};
pub use wgpu_device::{WgpuDevice, OPENGL_TO_WGPU_MATRIX};
