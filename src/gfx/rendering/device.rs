//! The GPU binding layer the frame protocol talks to
//!
//! [`RenderDevice`] is a small immediate-mode surface: named uniforms,
//! attribute buffers and array draws against one linked program. The frame
//! renderer only ever speaks this trait, so the same call sequence drives
//! the wgpu backend and the in-memory [`RecordingDevice`](super::RecordingDevice).

use std::fmt;

use cgmath::{Matrix4, Vector3, Vector4};

use crate::{error::RenderResult, gfx::color::Color};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Global pipeline switches turned on once a program is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    DepthTest,
    PolygonOffsetFill,
    SampleAlphaToCoverage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawMode {
    Triangles,
    /// Closed outline through consecutive vertices.
    LineLoop,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    /// Column-major
    Mat4([[f32; 4]; 4]),
}

impl From<bool> for UniformValue {
    fn from(value: bool) -> Self {
        UniformValue::Int(value as i32)
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

impl From<Vector3<f32>> for UniformValue {
    fn from(value: Vector3<f32>) -> Self {
        UniformValue::Vec3(value.into())
    }
}

impl From<Vector4<f32>> for UniformValue {
    fn from(value: Vector4<f32>) -> Self {
        UniformValue::Vec4(value.into())
    }
}

impl From<Matrix4<f32>> for UniformValue {
    fn from(value: Matrix4<f32>) -> Self {
        UniformValue::Mat4(value.into())
    }
}

/// RGB only; alpha never reaches a `vec3` uniform.
impl From<Color> for UniformValue {
    fn from(value: Color) -> Self {
        UniformValue::Vec3(value.to_rgb_array())
    }
}

/// A GL-style rendering device with one active program.
///
/// Uniform and attribute names that the active program does not declare
/// are ignored, as a GL program ignores an unknown uniform location.
pub trait RenderDevice {
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> RenderResult<ShaderHandle>;

    fn delete_shader(&mut self, shader: ShaderHandle);

    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> RenderResult<ProgramHandle>;

    fn delete_program(&mut self, program: ProgramHandle);

    fn use_program(&mut self, program: ProgramHandle);

    /// Current drawable size in pixels.
    fn surface_size(&self) -> (u32, u32);

    fn set_viewport(&mut self, width: u32, height: u32);

    fn viewport(&self) -> (u32, u32);

    fn enable(&mut self, capability: Capability);

    /// Starts a frame by clearing color and depth.
    fn begin_frame(&mut self, clear_color: Color) -> RenderResult<()>;

    fn set_uniform(&mut self, name: &str, value: UniformValue);

    /// Uploads `data` and binds it to `attribute` with `components` floats
    /// per vertex.
    fn create_buffer(&mut self, attribute: &str, components: u32, data: &[f32]) -> BufferHandle;

    fn delete_buffer(&mut self, buffer: BufferHandle);

    fn set_polygon_offset(&mut self, factor: f32, units: f32);

    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32);

    /// Finishes the frame and presents it.
    fn end_frame(&mut self) -> RenderResult<()>;
}
