use actorloop_assets::AssetStore;
use actorloop_common::Color;
use actorloop_kernel::{FrameReport, SceneConfig, Simulation};
use actorloop_render::{
    DrawCommand, DrawList, FixedStep, FrameDriver, FrameRecorder, RenderBackend, TARGET_FPS,
};
use actorloop_render_wgpu::{RenderStats, WgpuRenderer};
use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "actorloop-desktop", about = "Entities on a ring, colliding in a window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene file (.yaml, .yml or .json); the built-in demo scene otherwise
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Model for every entity, overriding the scene (`builtin:cube` or an OBJ path)
    #[arg(long)]
    model: Option<String>,

    /// Window width in pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Window height in pixels
    #[arg(long, default_value_t = 600)]
    height: u32,
}

/// Simulation side of the app: everything that exists without a GPU.
struct AppState {
    driver: FrameDriver,
    sim: Simulation,
    assets: AssetStore,
    recorder: FrameRecorder,
    pacing: FixedStep,
    last_tick: Instant,
    frame: Option<DrawList>,
    last_report: FrameReport,
    last_stats: RenderStats,
    show_hud: bool,
    started: Instant,
    torn_down: bool,
}

impl AppState {
    fn new(scene: &SceneConfig) -> Result<Self> {
        let mut assets = AssetStore::new();
        let mut sim = Simulation::new();
        let ids = scene
            .populate(&mut sim, &mut assets)
            .context("failed to populate scene")?;
        tracing::info!(entities = ids.len(), meshes = assets.mesh_count(), "scene ready");

        Ok(Self {
            driver: FrameDriver::from_scene(scene),
            sim,
            assets,
            recorder: FrameRecorder::new(),
            pacing: FixedStep::new(TARGET_FPS),
            last_tick: Instant::now(),
            frame: None,
            last_report: FrameReport::default(),
            last_stats: RenderStats::default(),
            show_hud: true,
            started: Instant::now(),
            torn_down: false,
        })
    }

    /// Run every simulation frame that is due at the fixed rate, keeping the
    /// draw list of the newest one. Redraws between ticks reuse it.
    fn update(&mut self) -> Result<()> {
        let now = Instant::now();
        let due = self.pacing.advance(now - self.last_tick);
        self.last_tick = now;

        for _ in 0..due {
            if self.recorder.should_terminate() {
                break;
            }
            self.last_report = self
                .driver
                .frame(&mut self.sim, &self.assets, &mut self.recorder)?;
            self.frame = Some(
                self.recorder
                    .take_frame()
                    .context("recorder finished a frame without a draw list")?,
            );
            for event in self.sim.drain_events() {
                tracing::trace!(?event, "simulation event");
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Escape => self.recorder.request_terminate(),
            KeyCode::F1 => self.show_hud = !self.show_hud,
            _ => {}
        }
    }

    /// Release every entity's asset. Safe to call more than once.
    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        match self.sim.teardown(&mut self.assets) {
            Ok(released) => tracing::info!(
                released,
                frames = self.sim.frame(),
                live = self.assets.stats().live(),
                "assets released"
            ),
            Err(e) => tracing::error!("teardown failed: {e}"),
        }
    }

    fn draw_ui(&self, ctx: &EguiContext, frame: &DrawList) {
        // Frame text is placed in physical pixels.
        let ppp = ctx.pixels_per_point();
        let painter = ctx.layer_painter(egui::LayerId::background());
        for command in frame.texts() {
            if let DrawCommand::Text {
                text,
                x,
                y,
                size,
                tint,
            } = command
            {
                painter.text(
                    egui::pos2(*x as f32 / ppp, *y as f32 / ppp),
                    egui::Align2::LEFT_TOP,
                    text,
                    egui::FontId::proportional(*size as f32 / ppp),
                    to_color32(*tint),
                );
            }
        }

        if !self.show_hud {
            return;
        }

        egui::Window::new("Simulation")
            .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
            .resizable(false)
            .show(ctx, |ui| {
                let elapsed = self.started.elapsed().as_secs_f64().max(1e-6);
                ui.label(format!(
                    "Frame: {}  ({:.0} fps)",
                    self.sim.frame(),
                    self.sim.frame() as f64 / elapsed
                ));
                ui.label(format!(
                    "Entities: {}  Meshes: {}",
                    self.sim.entity_count(),
                    self.assets.mesh_count()
                ));
                ui.label(format!(
                    "Contacts: {}  Flips: {}  Debug: {}",
                    self.last_report.contacts,
                    self.last_report.flips,
                    self.last_report.debug_primitives
                ));
                ui.label(format!(
                    "Draws: {} instances in {} batches, {} line vertices",
                    self.last_stats.instances,
                    self.last_stats.batches,
                    self.last_stats.line_vertices
                ));
                ui.separator();
                egui::Grid::new("entities").striped(true).show(ui, |ui| {
                    ui.strong("Entity");
                    ui.strong("x");
                    ui.strong("Tag");
                    ui.end_row();
                    for entity in self.sim.registry().iter() {
                        ui.label(entity.id().to_string());
                        ui.label(format!("{:+.3}", entity.position().x));
                        ui.label(entity.tag().to_string());
                        ui.end_row();
                    }
                });
                ui.separator();
                ui.small("F1: Toggle HUD | Esc: Quit");
            });
    }
}

fn to_color32(color: Color) -> egui::Color32 {
    let [r, g, b, a] = color.to_array().map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
    egui::Color32::from_rgba_unmultiplied(r, g, b, a)
}

/// GPU resources, created once the window exists.
struct Gpu {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(window: Arc<Window>, egui_ctx: &EguiContext) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("actorloop_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("failed to create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        // Scene colors are sRGB byte values already; write them unconverted.
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(&device, surface_format, config.width, config.height);

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }
}

struct GpuApp {
    state: AppState,
    title: String,
    size: PhysicalSize<u32>,
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    error: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(state: AppState, title: String, size: PhysicalSize<u32>) -> Self {
        Self {
            state,
            title,
            size,
            window: None,
            gpu: None,
            egui_ctx: EguiContext::default(),
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.error = Some(error);
        self.state.teardown();
        event_loop.exit();
    }

    fn redraw(&mut self) -> Result<()> {
        let (Some(window), Some(gpu)) = (&self.window, &mut self.gpu) else {
            return Ok(());
        };

        self.state.update()?;
        let Some(frame) = self.state.frame.as_ref() else {
            return Ok(());
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return Ok(());
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return Ok(());
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.state.last_stats =
            gpu.renderer
                .render(&gpu.device, &gpu.queue, &view, &self.state.assets, frame);

        let raw_input = gpu.egui_winit.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx, frame);
        });
        gpu.egui_winit
            .handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();
        Ok(())
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.title.clone())
            .with_inner_size(self.size);
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };

        match Gpu::new(window.clone(), &self.egui_ctx) {
            Ok(gpu) => {
                self.gpu = Some(gpu);
                self.window = Some(window);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(window), Some(gpu)) = (&self.window, &mut self.gpu) {
            let response = gpu.egui_winit.on_window_event(window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                self.state.recorder.request_terminate();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                self.state.handle_key(key);
            }
            WindowEvent::RedrawRequested => {
                if self.state.recorder.should_terminate() {
                    return;
                }
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // The termination query is polled once per frame boundary.
        if self.state.recorder.should_terminate() {
            self.state.teardown();
            event_loop.exit();
            return;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.state.teardown();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("actorloop-desktop starting");

    let mut scene = match &cli.scene {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("failed to load scene {}", path.display()))?,
        None => SceneConfig::default(),
    };
    if let Some(model) = cli.model {
        scene = scene.with_model(model);
    }

    let state = AppState::new(&scene)?;
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(
        state,
        scene.title.clone(),
        PhysicalSize::new(cli.width, cli.height),
    );
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
