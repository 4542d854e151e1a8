//! In-memory [`RenderDevice`] that records every call
//!
//! Used for headless runs and for asserting the frame protocol call by
//! call. Failures can be injected at compile and link time.

use std::collections::HashSet;

use super::device::{
    BufferHandle, Capability, DrawMode, ProgramHandle, RenderDevice, ShaderHandle, ShaderStage,
    UniformValue,
};
use crate::{
    error::{RenderError, RenderResult},
    gfx::color::Color,
};

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CompileShader(ShaderStage),
    DeleteShader(ShaderHandle),
    LinkProgram(ShaderHandle, ShaderHandle),
    DeleteProgram(ProgramHandle),
    UseProgram(ProgramHandle),
    SetViewport(u32, u32),
    Enable(Capability),
    BeginFrame(Color),
    SetUniform(String, UniformValue),
    CreateBuffer {
        buffer: BufferHandle,
        attribute: String,
        components: u32,
        len: usize,
    },
    DeleteBuffer(BufferHandle),
    PolygonOffset(f32, f32),
    DrawArrays {
        mode: DrawMode,
        first: u32,
        count: u32,
    },
    EndFrame,
}

#[derive(Debug, Clone, PartialEq)]
enum Failure {
    Compile(ShaderStage, String),
    Link(String),
}

#[derive(Debug, Default)]
pub struct RecordingDevice {
    calls: Vec<DeviceCall>,
    surface: (u32, u32),
    viewport: (u32, u32),
    next_handle: u32,
    live_buffers: HashSet<BufferHandle>,
    live_programs: HashSet<ProgramHandle>,
    failure: Option<Failure>,
}

impl RecordingDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            surface: (width, height),
            ..Default::default()
        }
    }

    /// Makes every later compile of `stage` fail with `log`.
    pub fn fail_compile(mut self, stage: ShaderStage, log: impl Into<String>) -> Self {
        self.failure = Some(Failure::Compile(stage, log.into()));
        self
    }

    /// Makes every later link fail with `log`.
    pub fn fail_link(mut self, log: impl Into<String>) -> Self {
        self.failure = Some(Failure::Link(log.into()));
        self
    }

    pub fn clear_failure(&mut self) {
        self.failure = None;
    }

    pub fn resize_surface(&mut self, width: u32, height: u32) {
        self.surface = (width, height);
    }

    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<DeviceCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn draw_calls(&self) -> Vec<(DrawMode, u32, u32)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DeviceCall::DrawArrays { mode, first, count } => Some((*mode, *first, *count)),
                _ => None,
            })
            .collect()
    }

    /// Every value uploaded to `name`, in order.
    pub fn uniform_uploads(&self, name: &str) -> Vec<UniformValue> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DeviceCall::SetUniform(uniform, value) if uniform == name => Some(*value),
                _ => None,
            })
            .collect()
    }

    /// Buffers created but not yet deleted.
    pub fn live_buffers(&self) -> usize {
        self.live_buffers.len()
    }

    pub fn live_programs(&self) -> usize {
        self.live_programs.len()
    }

    fn next(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl RenderDevice for RecordingDevice {
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> RenderResult<ShaderHandle> {
        self.calls.push(DeviceCall::CompileShader(stage));
        if let Some(Failure::Compile(failing, log)) = &self.failure {
            if *failing == stage {
                return Err(RenderError::compile(stage, log));
            }
        }
        if source.trim().is_empty() {
            return Err(RenderError::compile(stage, "empty shader source"));
        }
        Ok(ShaderHandle(self.next()))
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        self.calls.push(DeviceCall::DeleteShader(shader));
    }

    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> RenderResult<ProgramHandle> {
        self.calls.push(DeviceCall::LinkProgram(vertex, fragment));
        if let Some(Failure::Link(log)) = &self.failure {
            return Err(RenderError::link(log));
        }
        let program = ProgramHandle(self.next());
        self.live_programs.insert(program);
        Ok(program)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.calls.push(DeviceCall::DeleteProgram(program));
        self.live_programs.remove(&program);
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.calls.push(DeviceCall::UseProgram(program));
    }

    fn surface_size(&self) -> (u32, u32) {
        self.surface
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.calls.push(DeviceCall::SetViewport(width, height));
        self.viewport = (width, height);
    }

    fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    fn enable(&mut self, capability: Capability) {
        self.calls.push(DeviceCall::Enable(capability));
    }

    fn begin_frame(&mut self, clear_color: Color) -> RenderResult<()> {
        self.calls.push(DeviceCall::BeginFrame(clear_color));
        Ok(())
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.calls
            .push(DeviceCall::SetUniform(name.to_string(), value));
    }

    fn create_buffer(&mut self, attribute: &str, components: u32, data: &[f32]) -> BufferHandle {
        let buffer = BufferHandle(self.next());
        self.live_buffers.insert(buffer);
        self.calls.push(DeviceCall::CreateBuffer {
            buffer,
            attribute: attribute.to_string(),
            components,
            len: data.len(),
        });
        buffer
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.live_buffers.remove(&buffer);
        self.calls.push(DeviceCall::DeleteBuffer(buffer));
    }

    fn set_polygon_offset(&mut self, factor: f32, units: f32) {
        self.calls.push(DeviceCall::PolygonOffset(factor, units));
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32) {
        self.calls.push(DeviceCall::DrawArrays { mode, first, count });
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        self.calls.push(DeviceCall::EndFrame);
        Ok(())
    }
}
