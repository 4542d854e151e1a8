//! Render pipeline management system for wgpu
//!
//! Shader modules are loaded by name; pipeline configurations are registered
//! up front and turned into pipelines lazily, the first time a frame needs
//! them.

use std::{collections::HashMap, sync::Arc};
use wgpu::*;

/// Configuration for creating a render pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub vertex_buffers: Vec<VertexBufferLayout<'static>>,
    pub primitive_topology: PrimitiveTopology,
    pub cull_mode: Option<Face>,
    pub depth_format: Option<TextureFormat>,
    pub depth_test: bool,
    pub depth_bias: DepthBiasState,
    pub multisample: MultisampleState,
    pub color_targets: Vec<Option<ColorTargetState>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: "Default Pipeline".to_string(),
            vertex_shader: "vertex".to_string(),
            fragment_shader: "fragment".to_string(),
            bind_group_layouts: Vec::new(),
            vertex_buffers: Vec::new(),
            primitive_topology: PrimitiveTopology::TriangleList,
            cull_mode: None,
            depth_format: None,
            depth_test: true,
            depth_bias: DepthBiasState::default(),
            multisample: MultisampleState::default(),
            color_targets: vec![Some(ColorTargetState {
                format: TextureFormat::Bgra8Unorm,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
        }
    }
}

impl PipelineConfig {
    /// Creates a config drawing with the two named shader modules
    pub fn with_shaders(vertex_shader: &str, fragment_shader: &str) -> Self {
        Self {
            vertex_shader: vertex_shader.to_string(),
            fragment_shader: fragment_shader.to_string(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    /// One layout per attribute buffer, in slot order
    pub fn with_vertex_buffers(mut self, buffers: Vec<VertexBufferLayout<'static>>) -> Self {
        self.vertex_buffers = buffers;
        self
    }

    pub fn with_primitive_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.primitive_topology = topology;
        self
    }

    /// Attaches a depth target of `format`. With `test` off the target is
    /// neither compared against nor written.
    pub fn with_depth(mut self, format: TextureFormat, test: bool) -> Self {
        self.depth_format = Some(format);
        self.depth_test = test;
        self
    }

    /// Only applied to triangle topologies; wgpu rejects bias on lines.
    pub fn with_depth_bias(mut self, bias: DepthBiasState) -> Self {
        self.depth_bias = bias;
        self
    }

    pub fn with_multisample(mut self, multisample: MultisampleState) -> Self {
        self.multisample = multisample;
        self
    }

    pub fn with_color_targets(mut self, targets: Vec<Option<ColorTargetState>>) -> Self {
        self.color_targets = targets;
        self
    }
}

/// Manages render pipelines with caching and lazy creation
pub struct PipelineManager {
    device: Arc<Device>,
    pipelines: HashMap<String, RenderPipeline>,
    pipeline_configs: HashMap<String, PipelineConfig>,
    shader_modules: HashMap<String, ShaderModule>,
}

impl PipelineManager {
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            pipelines: HashMap::new(),
            pipeline_configs: HashMap::new(),
            shader_modules: HashMap::new(),
        }
    }

    /// Compiles WGSL source into a named module.
    ///
    /// Validation errors are captured and returned as the compile log instead
    /// of reaching the device's uncaptured error handler.
    pub fn load_shader(&mut self, name: &str, source: &str) -> Result<(), String> {
        self.device.push_error_scope(ErrorFilter::Validation);
        let shader_module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(error.to_string());
        }

        self.shader_modules.insert(name.to_string(), shader_module);
        Ok(())
    }

    /// Makes the module loaded as `name` also reachable as `alias`.
    pub fn alias_shader(&mut self, name: &str, alias: &str) -> bool {
        match self.shader_modules.get(name).cloned() {
            Some(module) => {
                self.shader_modules.insert(alias.to_string(), module);
                true
            }
            None => false,
        }
    }

    /// Drops a module. Pipelines already built from it stay valid.
    pub fn remove_shader(&mut self, name: &str) {
        self.shader_modules.remove(name);
    }

    /// Registers a pipeline configuration without creating it
    pub fn register_pipeline(&mut self, name: &str, config: PipelineConfig) {
        self.pipelines.remove(name);
        self.pipeline_configs.insert(name.to_string(), config);
    }

    /// Creates the named pipeline if it does not exist yet.
    pub fn ensure_pipeline(&mut self, name: &str) -> Result<(), String> {
        if self.pipelines.contains_key(name) {
            return Ok(());
        }

        let config = self
            .pipeline_configs
            .get(name)
            .ok_or_else(|| format!("Pipeline '{}' is not registered", name))?;

        self.device.push_error_scope(ErrorFilter::Validation);
        let pipeline = self.create_pipeline_from_config(name, config);
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(format!("Pipeline '{}': {}", name, error));
        }
        let pipeline = pipeline?;

        log::debug!("created pipeline '{}'", name);
        self.pipelines.insert(name.to_string(), pipeline);
        Ok(())
    }

    /// A pipeline previously created by [`Self::ensure_pipeline`].
    pub fn pipeline(&self, name: &str) -> Option<&RenderPipeline> {
        self.pipelines.get(name)
    }

    /// Forgets every pipeline and configuration whose name starts with
    /// `prefix`.
    pub fn remove_pipelines(&mut self, prefix: &str) {
        self.pipelines.retain(|name, _| !name.starts_with(prefix));
        self.pipeline_configs
            .retain(|name, _| !name.starts_with(prefix));
    }

    fn create_pipeline_from_config(
        &self,
        name: &str,
        config: &PipelineConfig,
    ) -> Result<RenderPipeline, String> {
        let vertex_module = self
            .shader_modules
            .get(&config.vertex_shader)
            .ok_or_else(|| format!("Shader '{}' not found", config.vertex_shader))?;
        let fragment_module = self
            .shader_modules
            .get(&config.fragment_shader)
            .ok_or_else(|| format!("Shader '{}' not found", config.fragment_shader))?;

        let bind_group_layout_refs: Vec<&BindGroupLayout> =
            config.bind_group_layouts.iter().collect();
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some(&format!("{} Layout", name)),
                bind_group_layouts: &bind_group_layout_refs,
                push_constant_ranges: &[],
            });

        let bias = match config.primitive_topology {
            PrimitiveTopology::TriangleList | PrimitiveTopology::TriangleStrip => config.depth_bias,
            _ => DepthBiasState::default(),
        };

        let depth_stencil = config.depth_format.map(|format| DepthStencilState {
            format,
            depth_write_enabled: config.depth_test,
            depth_compare: if config.depth_test {
                CompareFunction::Less
            } else {
                CompareFunction::Always
            },
            stencil: StencilState::default(),
            bias,
        });

        let pipeline = self
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(&config.label),
                layout: Some(&pipeline_layout),
                vertex: VertexState {
                    module: vertex_module,
                    entry_point: Some("vs_main"),
                    buffers: &config.vertex_buffers,
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment: Some(FragmentState {
                    module: fragment_module,
                    entry_point: Some("fs_main"),
                    targets: &config.color_targets,
                    compilation_options: PipelineCompilationOptions::default(),
                }),
                primitive: PrimitiveState {
                    topology: config.primitive_topology,
                    strip_index_format: None,
                    front_face: FrontFace::Ccw,
                    cull_mode: config.cull_mode,
                    polygon_mode: PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil,
                multisample: config.multisample,
                multiview: None,
                cache: None,
            });

        Ok(pipeline)
    }

    pub fn get_stats(&self) -> PipelineStats {
        PipelineStats {
            total_pipelines: self.pipelines.len(),
            registered_pipelines: self.pipeline_configs.len(),
            loaded_shaders: self.shader_modules.len(),
        }
    }

    pub fn has_pipeline(&self, name: &str) -> bool {
        self.pipeline_configs.contains_key(name)
    }
}

/// Statistics about pipeline manager state
#[derive(Debug)]
pub struct PipelineStats {
    pub total_pipelines: usize,
    pub registered_pipelines: usize,
    pub loaded_shaders: usize,
}
