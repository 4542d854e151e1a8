//! wgpu implementation of [`RenderDevice`]
//!
//! wgpu has no immediate-mode draws, so the device keeps GL-style state
//! (named uniforms, bound attribute buffers, enabled capabilities) and
//! snapshots it on every `draw_arrays`. `end_frame` replays the recorded
//! draws into a single render pass: one pipeline per draw-state
//! combination, per-draw uniforms behind a dynamic offset, and line loops
//! expanded into indexed line lists.

use std::{
    collections::{HashMap, HashSet},
    ops::Range,
    sync::Arc,
};

use bytemuck::{Pod, Zeroable};
use cgmath::{Matrix4, SquareMatrix};
use wgpu::util::DeviceExt;
use winit::window::Window;

use super::{
    device::{
        BufferHandle, Capability, DrawMode, ProgramHandle, RenderDevice, ShaderHandle, ShaderStage,
        UniformValue,
    },
    pipeline_manager::{PipelineConfig, PipelineManager},
    shaders::shader_light_count,
    uniforms::{self, LightField},
};
use crate::{
    error::{RenderError, RenderResult},
    gfx::{color::Color, resources::TextureResource},
    wgpu_utils::{binding_types, ArrayBuffer, DynamicUniformBuffer, UniformBuffer},
};

/// Remaps GL clip-space depth (-1..1) to wgpu's 0..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Sample count used when the surface and depth formats support it.
pub const MSAA_SAMPLES: u32 = 4;

const ATTRIBUTE_SLOTS: usize = 3;

// Largest per-vertex stride of any attribute, used to size the zero buffer.
const MAX_ATTRIBUTE_STRIDE: u64 = 12;

static POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![0 => Float32x3];
static NORMAL_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];
static TEX_COORD_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![2 => Float32x2];

fn vertex_layouts() -> Vec<wgpu::VertexBufferLayout<'static>> {
    vec![
        wgpu::VertexBufferLayout {
            array_stride: 12,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &POSITION_ATTRIBUTES,
        },
        wgpu::VertexBufferLayout {
            array_stride: 12,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &NORMAL_ATTRIBUTES,
        },
        wgpu::VertexBufferLayout {
            array_stride: 8,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &TEX_COORD_ATTRIBUTES,
        },
    ]
}

/// Vertex buffer slot an attribute name is bound to.
pub fn attribute_slot(name: &str) -> Option<usize> {
    match name {
        uniforms::VERTEX_POSITION => Some(0),
        uniforms::VERTEX_NORMAL => Some(1),
        uniforms::TEXTURE_POSITION => Some(2),
        _ => None,
    }
}

/// Index list drawing the closed outline of `count` vertices from `first`
/// as a line list.
pub fn line_loop_indices(first: u32, count: u32) -> Vec<u32> {
    if count < 2 {
        return Vec::new();
    }
    (0..count)
        .flat_map(|i| [first + i, first + (i + 1) % count])
        .collect()
}

/// `group(0) binding(0)`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub camera_position: [f32; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

/// One entry of the `group(0) binding(1)` light array.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightBlock {
    pub diffuse: [f32; 4],
    pub ambient: [f32; 4],
    pub specular: [f32; 4],
    pub position: [f32; 4],
}

/// `group(1) binding(0)`, one dynamic-offset slot per draw.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DrawUniforms {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub diffuse: [f32; 4],
    pub ambient: [f32; 4],
    pub specular: [f32; 4],
    pub shininess: f32,
    pub use_lighting: u32,
    pub use_texture: u32,
    pub texture_scale: f32,
}

impl Default for FrameUniforms {
    fn default() -> Self {
        let identity: [[f32; 4]; 4] = Matrix4::<f32>::identity().into();
        Self {
            camera_position: [0.0, 0.0, 0.0, 1.0],
            view: identity,
            projection: identity,
        }
    }
}

impl Default for DrawUniforms {
    fn default() -> Self {
        let identity: [[f32; 4]; 4] = Matrix4::<f32>::identity().into();
        Self {
            model: identity,
            normal: identity,
            diffuse: [1.0; 4],
            ambient: [1.0; 4],
            specular: [1.0; 4],
            shininess: 1.0,
            use_lighting: 0,
            use_texture: 0,
            texture_scale: 1.0,
        }
    }
}

fn as_vec4(value: UniformValue, w: f32) -> Option<[f32; 4]> {
    match value {
        UniformValue::Vec3([x, y, z]) => Some([x, y, z, w]),
        UniformValue::Vec4(v) => Some(v),
        _ => None,
    }
}

fn as_float(value: UniformValue) -> Option<f32> {
    match value {
        UniformValue::Float(f) => Some(f),
        UniformValue::Int(i) => Some(i as f32),
        _ => None,
    }
}

fn as_flag(value: UniformValue) -> Option<u32> {
    match value {
        UniformValue::Int(i) => Some((i != 0) as u32),
        UniformValue::Float(f) => Some((f != 0.0) as u32),
        _ => None,
    }
}

fn as_mat4(value: UniformValue) -> Option<[[f32; 4]; 4]> {
    match value {
        UniformValue::Mat4(m) => Some(m),
        _ => None,
    }
}

/// Named-uniform state of the scene program, laid out for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformState {
    pub frame: FrameUniforms,
    pub lights: Vec<LightBlock>,
    pub draw: DrawUniforms,
    pub texture_unit: u32,
}

impl UniformState {
    pub fn new(light_slots: usize) -> Self {
        Self {
            frame: FrameUniforms::default(),
            lights: vec![LightBlock::zeroed(); light_slots],
            draw: DrawUniforms::default(),
            texture_unit: 0,
        }
    }

    /// Stores `value` under `name`. Returns false when the program declares
    /// no such uniform or the value has the wrong shape.
    pub fn set(&mut self, name: &str, value: UniformValue) -> bool {
        let applied = match name {
            uniforms::CAMERA_POSITION => {
                as_vec4(value, 1.0).map(|v| self.frame.camera_position = v)
            }
            uniforms::VIEW_MATRIX => as_mat4(value).map(|m| self.frame.view = m),
            uniforms::PROJECTION_MATRIX => as_mat4(value)
                .map(|m| self.frame.projection = (OPENGL_TO_WGPU_MATRIX * Matrix4::from(m)).into()),
            uniforms::MODEL_MATRIX => as_mat4(value).map(|m| self.draw.model = m),
            uniforms::NORMAL_MATRIX => as_mat4(value).map(|m| self.draw.normal = m),
            uniforms::MATERIAL_DIFFUSE => as_vec4(value, 1.0).map(|v| self.draw.diffuse = v),
            uniforms::MATERIAL_AMBIENT => as_vec4(value, 1.0).map(|v| self.draw.ambient = v),
            uniforms::MATERIAL_SPECULAR => as_vec4(value, 1.0).map(|v| self.draw.specular = v),
            uniforms::MATERIAL_SHININESS => as_float(value).map(|f| self.draw.shininess = f),
            uniforms::USE_LIGHTING => as_flag(value).map(|f| self.draw.use_lighting = f),
            uniforms::USE_TEXTURE => as_flag(value).map(|f| self.draw.use_texture = f),
            uniforms::TEXTURE_SCALE => as_float(value).map(|f| self.draw.texture_scale = f),
            uniforms::TEXTURE => match value {
                UniformValue::Int(unit) if unit >= 0 => {
                    self.texture_unit = unit as u32;
                    Some(())
                }
                _ => None,
            },
            _ => self.set_light(name, value),
        };
        applied.is_some()
    }

    fn set_light(&mut self, name: &str, value: UniformValue) -> Option<()> {
        let (slot, field) = uniforms::parse_light_uniform(name)?;
        let light = self.lights.get_mut(slot)?;
        let target = match field {
            LightField::Diffuse => &mut light.diffuse,
            LightField::Ambient => &mut light.ambient,
            LightField::Specular => &mut light.specular,
            LightField::Position => &mut light.position,
        };
        *target = as_vec4(value, 0.0)?;
        Some(())
    }
}

/// Draw state that needs a distinct pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineKey {
    pub mode: DrawMode,
    pub depth_test: bool,
    /// `(units, factor)` polygon offset
    pub bias: Option<(i32, f32)>,
    pub alpha_to_coverage: bool,
}

impl PipelineKey {
    pub fn for_draw(
        mode: DrawMode,
        capabilities: &HashSet<Capability>,
        polygon_offset: (f32, f32),
        sample_count: u32,
    ) -> Self {
        let (factor, units) = polygon_offset;
        let offset_active = mode == DrawMode::Triangles
            && capabilities.contains(&Capability::PolygonOffsetFill)
            && (factor != 0.0 || units != 0.0);
        Self {
            mode,
            depth_test: capabilities.contains(&Capability::DepthTest),
            bias: offset_active.then(|| (units.round() as i32, factor)),
            alpha_to_coverage: sample_count > 1
                && capabilities.contains(&Capability::SampleAlphaToCoverage),
        }
    }

    pub fn name(&self, program: ProgramHandle) -> String {
        let bias = match self.bias {
            Some((units, factor)) => format!("{}/{}", units, factor),
            None => "none".to_string(),
        };
        format!(
            "{}{:?}:depth={}:bias={}:a2c={}",
            program_prefix(program),
            self.mode,
            self.depth_test,
            bias,
            self.alpha_to_coverage
        )
    }

    fn topology(&self) -> wgpu::PrimitiveTopology {
        match self.mode {
            DrawMode::Triangles => wgpu::PrimitiveTopology::TriangleList,
            DrawMode::LineLoop => wgpu::PrimitiveTopology::LineList,
        }
    }
}

fn program_prefix(program: ProgramHandle) -> String {
    format!("program-{}/", program.0)
}

fn shader_name(shader: ShaderHandle) -> String {
    format!("shader-{}", shader.0)
}

struct VertexBuffer {
    buffer: wgpu::Buffer,
    vertices: u32,
}

enum DrawRange {
    Direct(Range<u32>),
    Indexed(Range<u32>),
}

struct DrawRecord {
    pipeline: String,
    uniform_slot: u32,
    buffers: [Option<wgpu::Buffer>; ATTRIBUTE_SLOTS],
    texture_unit: Option<u32>,
    range: DrawRange,
}

struct PendingFrame {
    clear_color: wgpu::Color,
    draws: Vec<DrawRecord>,
    draw_uniforms: Vec<DrawUniforms>,
    line_indices: Vec<u32>,
    // Vertices the zero buffer must cover for draws missing an attribute.
    fallback_vertices: u32,
}

struct SceneLayouts {
    frame: wgpu::BindGroupLayout,
    draw: wgpu::BindGroupLayout,
    texture: wgpu::BindGroupLayout,
}

impl SceneLayouts {
    fn new(device: &wgpu::Device) -> Self {
        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Bind Group Layout"),
            entries: &[
                binding_types::entry(0, binding_types::uniform()),
                binding_types::entry(1, binding_types::uniform()),
            ],
        });
        let draw = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Draw Bind Group Layout"),
            entries: &[binding_types::entry(
                0,
                binding_types::uniform_dynamic(std::mem::size_of::<DrawUniforms>() as u64),
            )],
        });
        let texture = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Texture Bind Group Layout"),
            entries: &[
                binding_types::entry(0, binding_types::texture_2d()),
                binding_types::entry(
                    1,
                    binding_types::sampler(wgpu::SamplerBindingType::Filtering),
                ),
            ],
        });
        Self {
            frame,
            draw,
            texture,
        }
    }

    fn all(&self) -> Vec<wgpu::BindGroupLayout> {
        vec![self.frame.clone(), self.draw.clone(), self.texture.clone()]
    }
}

/// Window-backed wgpu device
pub struct WgpuDevice {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    sample_count: u32,
    depth_texture: TextureResource,
    msaa_target: Option<TextureResource>,

    pipelines: PipelineManager,
    layouts: SceneLayouts,
    frame_uniforms: UniformBuffer<FrameUniforms>,
    light_uniforms: ArrayBuffer<LightBlock>,
    frame_bind_group: wgpu::BindGroup,
    draw_uniforms: DynamicUniformBuffer<DrawUniforms>,
    draw_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    white_texture: wgpu::BindGroup,
    textures: HashMap<u32, wgpu::BindGroup>,
    zero_buffer: Option<(wgpu::Buffer, u32)>,

    shaders: HashMap<ShaderHandle, ShaderStage>,
    programs: HashSet<ProgramHandle>,
    active_program: Option<ProgramHandle>,
    capabilities: HashSet<Capability>,
    viewport: (u32, u32),
    polygon_offset: (f32, f32),
    uniforms: UniformState,
    buffers: HashMap<BufferHandle, VertexBuffer>,
    attributes: [Option<BufferHandle>; ATTRIBUTE_SLOTS],
    frame: Option<PendingFrame>,
    next_handle: u32,
}

impl WgpuDevice {
    /// Brings up adapter, device and surface for `window`.
    ///
    /// The light array is sized once here; programs linked later must
    /// declare the same number of slots.
    pub fn new(window: Arc<Window>, light_capacity: usize) -> RenderResult<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(RenderError::context)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(RenderError::context)?;
        log::info!("using adapter {:?}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("WGPU Device"),
            required_features: wgpu::Features::default(),
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::Off,
        }))
        .map_err(RenderError::context)?;
        device.on_uncaptured_error(Box::new(|error: wgpu::Error| {
            log::error!("wgpu error: {}", error);
        }));
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| RenderError::context("surface reports no supported formats"))?;
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let multisample_supported = adapter
            .get_texture_format_features(format)
            .flags
            .sample_count_supported(MSAA_SAMPLES)
            && adapter
                .get_texture_format_features(TextureResource::DEPTH_FORMAT)
                .flags
                .sample_count_supported(MSAA_SAMPLES);
        let sample_count = if multisample_supported { MSAA_SAMPLES } else { 1 };
        log::debug!("surface {:?}, {} sample(s)", format, sample_count);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, sample_count, "Depth Texture");
        let msaa_target = (sample_count > 1).then(|| {
            TextureResource::create_msaa_target(&device, &config, sample_count, "MSAA Target")
        });

        let layouts = SceneLayouts::new(&device);
        let light_slots = shader_light_count(light_capacity);
        let frame_uniforms = UniformBuffer::<FrameUniforms>::new(&device);
        let light_uniforms = ArrayBuffer::<LightBlock>::new(&device, light_slots);
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &layouts.frame,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame_uniforms.binding_resource(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_uniforms.binding_resource(),
                },
            ],
        });

        let draw_uniforms = DynamicUniformBuffer::<DrawUniforms>::new(&device, 64);
        let draw_bind_group = create_draw_bind_group(&device, &layouts, &draw_uniforms);

        let sampler = TextureResource::create_sampler(&device);
        let white = TextureResource::create_white(&device, &queue);
        let white_texture = create_texture_bind_group(&device, &layouts, &white, &sampler);

        Ok(Self {
            surface,
            pipelines: PipelineManager::new(device.clone()),
            device,
            queue,
            config,
            sample_count,
            depth_texture,
            msaa_target,
            layouts,
            frame_uniforms,
            light_uniforms,
            frame_bind_group,
            draw_uniforms,
            draw_bind_group,
            sampler,
            white_texture,
            textures: HashMap::new(),
            zero_buffer: None,
            shaders: HashMap::new(),
            programs: HashSet::new(),
            active_program: None,
            capabilities: HashSet::new(),
            viewport: (0, 0),
            polygon_offset: (0.0, 0.0),
            uniforms: UniformState::new(light_slots),
            buffers: HashMap::new(),
            attributes: [None; ATTRIBUTE_SLOTS],
            frame: None,
            next_handle: 0,
        })
    }

    /// Reconfigures the swapchain and render targets. Zero sizes (a
    /// minimized window) are ignored.
    pub fn resize_surface(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = TextureResource::create_depth_texture(
            &self.device,
            &self.config,
            self.sample_count,
            "Depth Texture",
        );
        if self.sample_count > 1 {
            self.msaa_target = Some(TextureResource::create_msaa_target(
                &self.device,
                &self.config,
                self.sample_count,
                "MSAA Target",
            ));
        }
    }

    /// Uploads RGBA8 pixels to texture `unit`, replacing what was there.
    pub fn upload_texture(
        &mut self,
        unit: u32,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> RenderResult<()> {
        if !crate::gfx::resources::rgba_len_matches(data, width, height) {
            return Err(RenderError::Texture(format!(
                "{} bytes do not form a {}x{} RGBA8 image",
                data.len(),
                width,
                height
            )));
        }
        let texture = TextureResource::create_from_rgba_data(
            &self.device,
            &self.queue,
            data,
            width,
            height,
            &format!("Texture Unit {}", unit),
        );
        let bind_group =
            create_texture_bind_group(&self.device, &self.layouts, &texture, &self.sampler);
        self.textures.insert(unit, bind_group);
        log::debug!("texture unit {} holds {}x{}", unit, width, height);
        Ok(())
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    fn next(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn pipeline_config(&self, program: ProgramHandle, key: &PipelineKey) -> PipelineConfig {
        let prefix = program_prefix(program);
        let mut config = PipelineConfig::with_shaders(
            &format!("{}vertex", prefix),
            &format!("{}fragment", prefix),
        )
        .with_label(&key.name(program))
        .with_bind_group_layouts(self.layouts.all())
        .with_vertex_buffers(vertex_layouts())
        .with_primitive_topology(key.topology())
        .with_depth(TextureResource::DEPTH_FORMAT, key.depth_test)
        .with_multisample(wgpu::MultisampleState {
            count: self.sample_count,
            mask: !0,
            alpha_to_coverage_enabled: key.alpha_to_coverage,
        })
        .with_color_targets(vec![Some(wgpu::ColorTargetState {
            format: self.config.format,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        })]);
        if let Some((units, factor)) = key.bias {
            config = config.with_depth_bias(wgpu::DepthBiasState {
                constant: units,
                slope_scale: factor,
                clamp: 0.0,
            });
        }
        config
    }

    /// Registers the pipeline for `key` under the active program and
    /// returns its name.
    fn pipeline_for(&mut self, program: ProgramHandle, key: &PipelineKey) -> String {
        let name = key.name(program);
        if !self.pipelines.has_pipeline(&name) {
            let config = self.pipeline_config(program, key);
            self.pipelines.register_pipeline(&name, config);
        }
        name
    }

    fn ensure_zero_buffer(&mut self, vertices: u32) -> Option<wgpu::Buffer> {
        if vertices == 0 {
            return None;
        }
        match &self.zero_buffer {
            Some((buffer, capacity)) if *capacity >= vertices => Some(buffer.clone()),
            _ => {
                let capacity = vertices.next_power_of_two();
                let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Zero Attribute Buffer"),
                    size: capacity as u64 * MAX_ATTRIBUTE_STRIDE,
                    usage: wgpu::BufferUsages::VERTEX,
                    mapped_at_creation: false,
                });
                self.zero_buffer = Some((buffer.clone(), capacity));
                Some(buffer)
            }
        }
    }
}

fn create_draw_bind_group(
    device: &wgpu::Device,
    layouts: &SceneLayouts,
    draw_uniforms: &DynamicUniformBuffer<DrawUniforms>,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Draw Bind Group"),
        layout: &layouts.draw,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: draw_uniforms.binding_resource(),
        }],
    })
}

fn create_texture_bind_group(
    device: &wgpu::Device,
    layouts: &SceneLayouts,
    texture: &TextureResource,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Texture Bind Group"),
        layout: &layouts.texture,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}

impl RenderDevice for WgpuDevice {
    fn compile_shader(&mut self, stage: ShaderStage, source: &str) -> RenderResult<ShaderHandle> {
        if source.trim().is_empty() {
            return Err(RenderError::compile(stage, "empty shader source"));
        }
        let shader = ShaderHandle(self.next());
        self.pipelines
            .load_shader(&shader_name(shader), source)
            .map_err(|log| RenderError::compile(stage, log))?;
        self.shaders.insert(shader, stage);
        Ok(shader)
    }

    fn delete_shader(&mut self, shader: ShaderHandle) {
        self.shaders.remove(&shader);
        self.pipelines.remove_shader(&shader_name(shader));
    }

    fn link_program(
        &mut self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> RenderResult<ProgramHandle> {
        match (self.shaders.get(&vertex), self.shaders.get(&fragment)) {
            (Some(ShaderStage::Vertex), Some(ShaderStage::Fragment)) => {}
            _ => return Err(RenderError::link("expected a vertex and a fragment shader")),
        }

        let program = ProgramHandle(self.next());
        let prefix = program_prefix(program);
        self.pipelines
            .alias_shader(&shader_name(vertex), &format!("{}vertex", prefix));
        self.pipelines
            .alias_shader(&shader_name(fragment), &format!("{}fragment", prefix));

        // Building one pipeline checks the stage interface and bindings.
        let check_key = PipelineKey::for_draw(
            DrawMode::Triangles,
            &self.capabilities,
            (0.0, 0.0),
            self.sample_count,
        );
        let name = self.pipeline_for(program, &check_key);
        if let Err(log) = self.pipelines.ensure_pipeline(&name) {
            self.pipelines.remove_pipelines(&prefix);
            self.pipelines.remove_shader(&format!("{}vertex", prefix));
            self.pipelines.remove_shader(&format!("{}fragment", prefix));
            return Err(RenderError::link(log));
        }

        self.programs.insert(program);
        Ok(program)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if !self.programs.remove(&program) {
            return;
        }
        let prefix = program_prefix(program);
        self.pipelines.remove_pipelines(&prefix);
        self.pipelines.remove_shader(&format!("{}vertex", prefix));
        self.pipelines.remove_shader(&format!("{}fragment", prefix));
        if self.active_program == Some(program) {
            self.active_program = None;
        }
    }

    fn use_program(&mut self, program: ProgramHandle) {
        if self.programs.contains(&program) {
            self.active_program = Some(program);
        } else {
            log::warn!("use_program: unknown program {:?}", program);
        }
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    fn enable(&mut self, capability: Capability) {
        if capability == Capability::SampleAlphaToCoverage && self.sample_count == 1 {
            log::debug!("alpha-to-coverage has no effect without multisampling");
        }
        self.capabilities.insert(capability);
    }

    fn begin_frame(&mut self, clear_color: Color) -> RenderResult<()> {
        if self.frame.is_some() {
            log::warn!("begin_frame called twice, discarding unfinished frame");
        }
        self.frame = Some(PendingFrame {
            clear_color: clear_color.into(),
            draws: Vec::new(),
            draw_uniforms: Vec::new(),
            line_indices: Vec::new(),
            fallback_vertices: 0,
        });
        Ok(())
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        if !self.uniforms.set(name, value) {
            log::trace!("ignoring uniform '{}' = {:?}", name, value);
        }
    }

    fn create_buffer(&mut self, attribute: &str, components: u32, data: &[f32]) -> BufferHandle {
        let handle = BufferHandle(self.next());
        let buffer = if data.is_empty() {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(attribute),
                size: MAX_ATTRIBUTE_STRIDE,
                usage: wgpu::BufferUsages::VERTEX,
                mapped_at_creation: false,
            })
        } else {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(attribute),
                    contents: bytemuck::cast_slice(data),
                    usage: wgpu::BufferUsages::VERTEX,
                })
        };
        let vertices = data.len() as u32 / components.max(1);
        self.buffers.insert(handle, VertexBuffer { buffer, vertices });

        match attribute_slot(attribute) {
            Some(slot) => self.attributes[slot] = Some(handle),
            None => log::trace!("attribute '{}' is not declared, buffer left unbound", attribute),
        }
        handle
    }

    fn delete_buffer(&mut self, buffer: BufferHandle) {
        self.buffers.remove(&buffer);
        for bound in self.attributes.iter_mut() {
            if *bound == Some(buffer) {
                *bound = None;
            }
        }
    }

    fn set_polygon_offset(&mut self, factor: f32, units: f32) {
        self.polygon_offset = (factor, units);
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32) {
        let Some(program) = self.active_program else {
            log::warn!("draw_arrays without an active program");
            return;
        };
        if self.frame.is_none() {
            log::warn!("draw_arrays outside begin_frame/end_frame");
            return;
        }

        let key = PipelineKey::for_draw(
            mode,
            &self.capabilities,
            self.polygon_offset,
            self.sample_count,
        );
        let pipeline = self.pipeline_for(program, &key);

        let mut missing_attribute = false;
        let mut buffers: [Option<wgpu::Buffer>; ATTRIBUTE_SLOTS] = Default::default();
        for (slot, bound) in self.attributes.iter().enumerate() {
            match bound.and_then(|handle| self.buffers.get(&handle)) {
                Some(vertex_buffer) if vertex_buffer.vertices >= first + count => {
                    buffers[slot] = Some(vertex_buffer.buffer.clone());
                }
                _ => missing_attribute = true,
            }
        }

        let texture_unit = (self.uniforms.draw.use_texture != 0).then_some(self.uniforms.texture_unit);
        if let Some(unit) = texture_unit {
            if !self.textures.contains_key(&unit) {
                log::trace!("texture unit {} is empty, sampling white", unit);
            }
        }

        let draw = self.uniforms.draw;
        let Some(frame) = self.frame.as_mut() else {
            return;
        };

        let range = match mode {
            DrawMode::Triangles => DrawRange::Direct(first..first + count),
            DrawMode::LineLoop => {
                let indices = line_loop_indices(first, count);
                if indices.is_empty() {
                    return;
                }
                let start = frame.line_indices.len() as u32;
                frame.line_indices.extend(indices);
                DrawRange::Indexed(start..frame.line_indices.len() as u32)
            }
        };
        if missing_attribute {
            frame.fallback_vertices = frame.fallback_vertices.max(first + count);
        }

        frame.draw_uniforms.push(draw);
        frame.draws.push(DrawRecord {
            pipeline,
            uniform_slot: frame.draw_uniforms.len() as u32 - 1,
            buffers,
            texture_unit,
            range,
        });
    }

    fn end_frame(&mut self) -> RenderResult<()> {
        let Some(frame) = self.frame.take() else {
            log::warn!("end_frame without begin_frame");
            return Ok(());
        };

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface acquire timed out, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(RenderError::surface(e)),
        };

        for draw in &frame.draws {
            self.pipelines
                .ensure_pipeline(&draw.pipeline)
                .map_err(RenderError::link)?;
        }

        self.frame_uniforms
            .update_content(&self.queue, self.uniforms.frame);
        self.light_uniforms
            .update_data(&self.queue, &self.uniforms.lights);
        if self
            .draw_uniforms
            .write(&self.device, &self.queue, &frame.draw_uniforms)
        {
            self.draw_bind_group =
                create_draw_bind_group(&self.device, &self.layouts, &self.draw_uniforms);
        }

        let zero_buffer = self.ensure_zero_buffer(frame.fallback_vertices);
        let index_buffer = (!frame.line_indices.is_empty()).then(|| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Line Loop Indices"),
                    contents: bytemuck::cast_slice(&frame.line_indices),
                    usage: wgpu::BufferUsages::INDEX,
                })
        });

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let (color_view, resolve_target) = match &self.msaa_target {
            Some(msaa) => (&msaa.view, Some(&view)),
            None => (&view, None),
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: color_view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(frame.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let width = self.viewport.0.min(self.config.width);
            let height = self.viewport.1.min(self.config.height);
            if width > 0 && height > 0 {
                render_pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
                render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
                if let Some(index_buffer) = &index_buffer {
                    render_pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                }

                for draw in &frame.draws {
                    let Some(pipeline) = self.pipelines.pipeline(&draw.pipeline) else {
                        continue;
                    };
                    render_pass.set_pipeline(pipeline);
                    render_pass.set_bind_group(
                        1,
                        &self.draw_bind_group,
                        &[self.draw_uniforms.offset(draw.uniform_slot)],
                    );
                    let texture = draw
                        .texture_unit
                        .and_then(|unit| self.textures.get(&unit))
                        .unwrap_or(&self.white_texture);
                    render_pass.set_bind_group(2, texture, &[]);

                    for (slot, buffer) in draw.buffers.iter().enumerate() {
                        if let Some(buffer) = buffer.as_ref().or(zero_buffer.as_ref()) {
                            render_pass.set_vertex_buffer(slot as u32, buffer.slice(..));
                        }
                    }

                    match &draw.range {
                        DrawRange::Direct(range) => render_pass.draw(range.clone(), 0..1),
                        DrawRange::Indexed(range) => {
                            render_pass.draw_indexed(range.clone(), 0, 0..1)
                        }
                    }
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout_sizes() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 144);
        assert_eq!(std::mem::size_of::<LightBlock>(), 64);
        assert_eq!(std::mem::size_of::<DrawUniforms>(), 192);
    }

    #[test]
    fn test_attribute_slots() {
        assert_eq!(attribute_slot(uniforms::VERTEX_POSITION), Some(0));
        assert_eq!(attribute_slot(uniforms::VERTEX_NORMAL), Some(1));
        assert_eq!(attribute_slot(uniforms::TEXTURE_POSITION), Some(2));
        assert_eq!(attribute_slot("a_vertexColor"), None);
    }

    #[test]
    fn test_line_loop_closes() {
        assert_eq!(line_loop_indices(0, 3), vec![0, 1, 1, 2, 2, 0]);
        assert_eq!(line_loop_indices(4, 2), vec![4, 5, 5, 4]);
        assert!(line_loop_indices(0, 1).is_empty());
    }

    #[test]
    fn test_uniform_state_routes_names() {
        let mut state = UniformState::new(2);
        assert!(state.set(uniforms::MATERIAL_DIFFUSE, UniformValue::Vec3([0.5, 0.25, 1.0])));
        assert_eq!(state.draw.diffuse, [0.5, 0.25, 1.0, 1.0]);

        assert!(state.set(uniforms::USE_LIGHTING, true.into()));
        assert_eq!(state.draw.use_lighting, 1);

        assert!(state.set(uniforms::TEXTURE, UniformValue::Int(3)));
        assert_eq!(state.texture_unit, 3);

        assert!(state.set(
            &uniforms::light_uniform(1, LightField::Position),
            UniformValue::Vec4([1.0, 2.0, 3.0, 0.0])
        ));
        assert_eq!(state.lights[1].position, [1.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn test_uniform_state_ignores_unknown_and_mistyped() {
        let mut state = UniformState::new(1);
        let before = state.clone();
        assert!(!state.set("u_fog", UniformValue::Float(1.0)));
        assert!(!state.set(uniforms::MODEL_MATRIX, UniformValue::Float(1.0)));
        assert!(!state.set(
            &uniforms::light_uniform(5, LightField::Diffuse),
            UniformValue::Vec3([1.0; 3])
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn test_projection_is_remapped_to_wgpu_depth() {
        let mut state = UniformState::new(1);
        let identity: [[f32; 4]; 4] = Matrix4::<f32>::identity().into();
        state.set(uniforms::PROJECTION_MATRIX, UniformValue::Mat4(identity));
        let expected: [[f32; 4]; 4] = OPENGL_TO_WGPU_MATRIX.into();
        assert_eq!(state.frame.projection, expected);
    }

    #[test]
    fn test_pipeline_key_offset_only_for_triangles() {
        let capabilities: HashSet<Capability> = [
            Capability::DepthTest,
            Capability::PolygonOffsetFill,
            Capability::SampleAlphaToCoverage,
        ]
        .into_iter()
        .collect();

        let fill = PipelineKey::for_draw(DrawMode::Triangles, &capabilities, (1.0, 1.0), 4);
        assert_eq!(fill.bias, Some((1, 1.0)));
        assert!(fill.alpha_to_coverage);

        let edges = PipelineKey::for_draw(DrawMode::LineLoop, &capabilities, (1.0, 1.0), 4);
        assert_eq!(edges.bias, None);

        let single_sample = PipelineKey::for_draw(DrawMode::Triangles, &capabilities, (0.0, 0.0), 1);
        assert_eq!(single_sample.bias, None);
        assert!(!single_sample.alpha_to_coverage);
    }

    #[test]
    fn test_pipeline_key_without_capabilities() {
        let key = PipelineKey::for_draw(DrawMode::Triangles, &HashSet::new(), (1.0, 1.0), 4);
        assert!(!key.depth_test);
        assert_eq!(key.bias, None);
        assert!(!key.alpha_to_coverage);
    }

    #[test]
    fn test_pipeline_names_are_scoped_by_program() {
        let key = PipelineKey::for_draw(DrawMode::Triangles, &HashSet::new(), (0.0, 0.0), 1);
        let a = key.name(ProgramHandle(1));
        let b = key.name(ProgramHandle(2));
        assert_ne!(a, b);
        assert!(a.starts_with(&program_prefix(ProgramHandle(1))));
    }
}
