mod hud;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use orbitview_engine::{
    Clock, EngineError, FrameStats, FrameTimer, SceneVariant, Viewer, ViewerConfig, Viewport,
    renderer_settings,
};
use orbitview_input::{PointerButton, PointerTracker};
use orbitview_render::{PerspectiveCamera, RenderError, Renderer};
use orbitview_render_wgpu::WgpuRenderer;
use orbitview_scene::SceneGraph;
use orbitview_tools::SceneInspector;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::hud::{Hud, HudSnapshot};

#[derive(Parser)]
#[command(name = "orbitview-desktop", about = "Orbit viewer for glTF models")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Model to load (overrides the config)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Lighting variant: directional or shadowed-point
    #[arg(long)]
    variant: Option<SceneVariant>,

    /// JSON viewer config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show the HUD at startup
    #[arg(long)]
    hud: bool,
}

/// GPU renderer plus the HUD drawn over each frame.
struct DesktopRenderer {
    gpu: WgpuRenderer,
    hud: Hud,
}

impl Renderer for DesktopRenderer {
    fn set_size(&mut self, width: u32, height: u32) {
        self.gpu.set_size(width, height);
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.gpu.set_pixel_ratio(ratio);
    }

    fn size(&self) -> (u32, u32) {
        self.gpu.size()
    }

    fn pixel_ratio(&self) -> f64 {
        self.gpu.pixel_ratio()
    }

    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Result<(), RenderError> {
        self.gpu.render_frame(scene, camera, Some(&mut self.hud))
    }
}

fn logical_size(size: PhysicalSize<u32>, scale_factor: f64) -> (u32, u32) {
    let logical: LogicalSize<f64> = size.to_logical(scale_factor);
    (logical.width.round() as u32, logical.height.round() as u32)
}

fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Middle => Some(PointerButton::Middle),
        MouseButton::Right => Some(PointerButton::Secondary),
        _ => None,
    }
}

fn wheel_steps(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(p) => p.y as f32,
    }
}

struct App {
    config: ViewerConfig,
    show_hud: bool,
    window: Option<Arc<Window>>,
    viewer: Option<Viewer<DesktopRenderer>>,
    pointer: PointerTracker,
    clock: Clock,
    timer: FrameTimer,
    last_stats: Option<FrameStats>,
}

impl App {
    fn new(config: ViewerConfig, show_hud: bool) -> Self {
        Self {
            config,
            show_hud,
            window: None,
            viewer: None,
            pointer: PointerTracker::new(),
            clock: Clock::new(),
            timer: FrameTimer::new(120),
            last_stats: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let scale = window.scale_factor();
        let (width, height) = logical_size(window.inner_size(), scale);
        let gpu = pollster::block_on(WgpuRenderer::new(
            window.clone(),
            renderer_settings(&self.config),
            width,
            height,
            scale,
        ))
        .context("initialize renderer")?;
        let hud = Hud::new(
            window.clone(),
            gpu.device(),
            gpu.surface_format(),
            self.show_hud,
        );

        let mut viewer = Viewer::new(
            self.config.clone(),
            DesktopRenderer { gpu, hud },
            Viewport::new(width, height, scale),
        );
        viewer.request_model();

        window.request_redraw();
        self.window = Some(window);
        self.viewer = Some(viewer);
        self.clock = Clock::new();
        Ok(())
    }

    fn sync_viewport(&mut self) {
        let (Some(window), Some(viewer)) = (&self.window, &mut self.viewer) else {
            return;
        };
        let scale = window.scale_factor();
        let (width, height) = logical_size(window.inner_size(), scale);
        viewer.on_resize(width, height, scale);
    }

    fn hud_snapshot(&self, viewer: &Viewer<DesktopRenderer>) -> HudSnapshot {
        let camera = viewer.camera();
        let gpu = &viewer.renderer().gpu;
        let average = self.timer.average().as_secs_f64();
        HudSnapshot {
            frame: self.last_stats.map_or(0, |s| s.frame),
            fps: self.timer.fps(),
            frame_ms: average * 1000.0,
            camera: camera.position,
            target: camera.target,
            variant: viewer.config().variant.to_string(),
            model: viewer.model_status().label(),
            scene: SceneInspector::summary(viewer.scene()).to_string(),
            backend: gpu.backend().to_string(),
            buffer: gpu.drawing_buffer_size(),
            pixel_ratio: gpu.pixel_ratio(),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(viewer) = self.viewer.as_ref() else {
            return;
        };
        let snapshot = self.hud_snapshot(viewer);
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        viewer.renderer_mut().hud.set_snapshot(snapshot);

        match viewer.tick(self.clock.elapsed()) {
            Ok(stats) => {
                if stats.frame > 1 {
                    self.timer.record_secs(stats.delta);
                }
                self.last_stats = Some(stats);
            }
            Err(EngineError::Render(RenderError::OutOfMemory)) => {
                tracing::error!("GPU out of memory, exiting");
                event_loop.exit();
                return;
            }
            Err(e) => tracing::warn!("frame skipped: {e}"),
        }

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            tracing::error!("no render target: {e:#}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(viewer) = &mut self.viewer {
            if viewer.renderer_mut().hud.on_window_event(&event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("close requested");
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                self.sync_viewport();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::F1),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                if let Some(viewer) = &mut self.viewer {
                    viewer.renderer_mut().hud.toggle();
                }
            }
            WindowEvent::MouseInput { button, state, .. } => {
                if let Some(button) = pointer_button(button) {
                    self.pointer
                        .button(button, state == ElementState::Pressed);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let Some(window) = &self.window else {
                    return;
                };
                let logical = position.to_logical::<f32>(window.scale_factor());
                if let (Some(action), Some(viewer)) =
                    (self.pointer.moved(logical.x, logical.y), &mut self.viewer)
                {
                    viewer.handle_action(action);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let (Some(action), Some(viewer)) =
                    (self.pointer.wheel(wheel_steps(delta)), &mut self.viewer)
                {
                    viewer.handle_action(action);
                }
            }
            WindowEvent::CursorLeft { .. } => self.pointer.left(),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

fn load_config(cli: &Cli) -> Result<ViewerConfig> {
    let mut config = match &cli.config {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    if let Some(model) = &cli.model {
        config.model_path = model.clone();
    }
    if let Some(variant) = cli.variant {
        config.variant = variant;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(&cli)?;
    tracing::info!(
        model = %config.model_path.display(),
        variant = %config.variant,
        "orbitview-desktop starting"
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config, cli.hud);
    event_loop.run_app(&mut app)?;

    Ok(())
}
