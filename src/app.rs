use cgmath::Vector3;
use std::{
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc,
    },
    time::Instant,
};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    config::{RenderParameters, ViewerConfig},
    error::RenderError,
    gfx::{
        camera::{Camera, InputController},
        rendering::{FrameRenderer, RendererContext, ShaderSources, WgpuDevice},
        scene::{ParameterUpdate, SceneState, Transform},
    },
    performance::PerformanceMonitor,
};

/// Camera placed on the -X axis, looking down +X at the origin.
pub fn default_camera() -> Camera {
    Camera::new(Transform::from_position(Vector3::new(-6.0, 0.0, 0.0)))
}

/// Window, renderer and scene driven by a fixed-rate tick
pub struct ViewerApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct PendingTexture {
    unit: u32,
    width: u32,
    height: u32,
    data: Vec<u8>,
}

struct AppState {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    renderer: Option<RendererContext<WgpuDevice>>,
    frame_renderer: FrameRenderer,
    scene: SceneState,
    render_parameters: RenderParameters,
    input: InputController,
    monitor: PerformanceMonitor,
    updates: Receiver<ParameterUpdate>,
    update_sender: Sender<ParameterUpdate>,
    pending_textures: Vec<PendingTexture>,
    last_tick: Instant,
    next_tick: Instant,
    fatal: Option<RenderError>,
}

impl ViewerApp {
    /// Creates the event loop and a scene holding only the default lights.
    pub fn new(config: ViewerConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new()?;

        let scene = SceneState::new(default_camera(), config.light_capacity).with_default_lights();
        let (update_sender, updates) = mpsc::channel();

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                input: InputController::new(&config.input),
                render_parameters: config.render.clone(),
                config,
                window: None,
                renderer: None,
                frame_renderer: FrameRenderer::new(),
                scene,
                monitor: PerformanceMonitor::new(),
                updates,
                update_sender,
                pending_textures: Vec::new(),
                last_tick: Instant::now(),
                next_tick: Instant::now(),
                fatal: None,
            },
        })
    }

    pub fn scene(&self) -> &SceneState {
        &self.app_state.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneState {
        &mut self.app_state.scene
    }

    pub fn render_parameters_mut(&mut self) -> &mut RenderParameters {
        &mut self.app_state.render_parameters
    }

    /// Handle for queueing updates from other threads; they are applied at
    /// the start of the next tick.
    pub fn parameter_sender(&self) -> Sender<ParameterUpdate> {
        self.app_state.update_sender.clone()
    }

    /// Queues RGBA8 pixels for texture `unit`, uploaded once the window
    /// exists.
    pub fn add_texture(&mut self, unit: u32, width: u32, height: u32, data: Vec<u8>) {
        self.app_state.pending_textures.push(PendingTexture {
            unit,
            width,
            height,
            data,
        });
    }

    /// Runs until the window closes or Escape is pressed.
    pub fn run(mut self) -> anyhow::Result<()> {
        let _ = env_logger::try_init();

        let Some(event_loop) = self.event_loop.take() else {
            anyhow::bail!("event loop already consumed");
        };
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self.app_state)?;

        match self.app_state.fatal.take() {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: RenderError) {
        log::error!("{}", error);
        self.fatal = Some(error);
        event_loop.exit();
    }

    fn tick(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;

        self.scene.poll_loads();
        while let Ok(update) = self.updates.try_recv() {
            // Rejections are logged by `apply`.
            let _ = update.apply(&mut self.scene, &mut self.render_parameters);
        }
        self.input.process_input(&mut self.scene.camera, elapsed);

        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        self.monitor.begin_frame();
        let result =
            self.frame_renderer
                .render_frame(renderer, &self.scene, &self.render_parameters);
        self.monitor.end_frame();

        match result {
            Ok(stats) => self.monitor.update_render_stats(&stats),
            Err(error) => self.fail(event_loop, error),
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, RenderError::context(e)),
        };
        self.window = Some(window.clone());

        let capacity = self.config.light_capacity;
        let context = WgpuDevice::new(window, capacity).and_then(|device| {
            RendererContext::initialize(device, &ShaderSources::scene(capacity))
        });
        let mut context = match context {
            Ok(context) => context,
            Err(e) => return self.fail(event_loop, e),
        };

        for texture in self.pending_textures.drain(..) {
            if let Err(e) = context.device_mut().upload_texture(
                texture.unit,
                texture.width,
                texture.height,
                &texture.data,
            ) {
                log::warn!("texture unit {}: {}", texture.unit, e);
            }
        }

        log::info!(
            "viewer running at {} Hz with {} object(s)",
            self.config.tick_rate,
            self.scene.len()
        );
        self.renderer = Some(context);
        self.last_tick = Instant::now();
        self.next_tick = self.last_tick;
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.input.process_window_event(&event) {
            return;
        }

        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.device_mut().resize_surface(width, height);
                    renderer.resize(width, height);
                }
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_tick {
            self.tick(event_loop);
            self.next_tick = now + self.config.tick_interval();
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_tick));
    }
}
