use super::{
    device::{Capability, ProgramHandle, RenderDevice, ShaderStage},
    shaders::ShaderSources,
};
use crate::error::RenderResult;

/// Capabilities every ready context turns on.
pub const GLOBAL_CAPABILITIES: [Capability; 3] = [
    Capability::DepthTest,
    Capability::PolygonOffsetFill,
    Capability::SampleAlphaToCoverage,
];

/// A device with a linked, active scene program.
///
/// Only [`RendererContext::initialize`] creates one, so holding a context
/// means the renderer is ready. A failed initialization consumes the device
/// and leaves nothing behind.
#[derive(Debug)]
pub struct RendererContext<D: RenderDevice> {
    device: D,
    program: ProgramHandle,
}

impl<D: RenderDevice> RendererContext<D> {
    pub fn initialize(mut device: D, sources: &ShaderSources) -> RenderResult<Self> {
        let program = build_program(&mut device, sources)
            .inspect_err(|e| log::error!("renderer initialization failed: {}", e))?;

        device.use_program(program);
        let (width, height) = device.surface_size();
        device.set_viewport(width, height);
        for capability in GLOBAL_CAPABILITIES {
            device.enable(capability);
        }

        log::info!("renderer ready, viewport {}x{}", width, height);
        Ok(Self { device, program })
    }

    /// Swaps in a program built from `sources`. The current program is only
    /// deleted once the replacement has linked; on failure it stays active.
    pub fn reinitialize(&mut self, sources: &ShaderSources) -> RenderResult<()> {
        let program = build_program(&mut self.device, sources)
            .inspect_err(|e| log::error!("renderer re-initialization failed: {}", e))?;

        self.device.use_program(program);
        self.device.delete_program(self.program);
        self.program = program;
        log::info!("scene program replaced");
        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        log::debug!("viewport resized to {}x{}", width, height);
        self.device.set_viewport(width, height);
    }

    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }
}

fn build_program<D: RenderDevice>(
    device: &mut D,
    sources: &ShaderSources,
) -> RenderResult<ProgramHandle> {
    let vertex = device.compile_shader(ShaderStage::Vertex, &sources.vertex)?;
    let fragment = match device.compile_shader(ShaderStage::Fragment, &sources.fragment) {
        Ok(fragment) => fragment,
        Err(e) => {
            device.delete_shader(vertex);
            return Err(e);
        }
    };

    let program = device.link_program(vertex, fragment);
    device.delete_shader(vertex);
    device.delete_shader(fragment);
    program
}
