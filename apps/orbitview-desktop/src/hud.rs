use std::sync::Arc;

use egui::Context as EguiContext;
use glam::Vec3;
use orbitview_render_wgpu::{OverlayPass, OverlayTarget};
use winit::event::WindowEvent;
use winit::window::Window;

/// Values the HUD shows, captured before each frame.
#[derive(Debug, Clone, Default)]
pub struct HudSnapshot {
    pub frame: u64,
    pub fps: f64,
    pub frame_ms: f64,
    pub camera: Vec3,
    pub target: Vec3,
    pub variant: String,
    pub model: String,
    pub scene: String,
    pub backend: String,
    pub buffer: (u32, u32),
    pub pixel_ratio: f64,
}

/// egui overlay toggled with F1.
pub struct Hud {
    ctx: EguiContext,
    winit: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    window: Arc<Window>,
    visible: bool,
    snapshot: HudSnapshot,
    pending_free: Vec<egui::TextureId>,
}

impl Hud {
    pub fn new(
        window: Arc<Window>,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        visible: bool,
    ) -> Self {
        let ctx = EguiContext::default();
        let winit = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let renderer = egui_wgpu::Renderer::new(device, format, None, 1, false);
        Self {
            ctx,
            winit,
            renderer,
            window,
            visible,
            snapshot: HudSnapshot::default(),
            pending_free: Vec::new(),
        }
    }

    /// Feed a window event to egui. Returns whether egui consumed it.
    pub fn on_window_event(&mut self, event: &WindowEvent) -> bool {
        self.winit.on_window_event(&self.window, event).consumed
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        tracing::debug!(visible = self.visible, "HUD toggled");
    }

    pub fn set_snapshot(&mut self, snapshot: HudSnapshot) {
        self.snapshot = snapshot;
    }

    fn draw_ui(ctx: &EguiContext, s: &HudSnapshot) {
        egui::Window::new("orbitview")
            .anchor(egui::Align2::LEFT_TOP, [8.0, 8.0])
            .resizable(false)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.label(format!("Frame {}  {:.0} fps ({:.2} ms)", s.frame, s.fps, s.frame_ms));
                ui.label(format!(
                    "Camera: ({:.2}, {:.2}, {:.2})",
                    s.camera.x, s.camera.y, s.camera.z
                ));
                ui.label(format!(
                    "Target: ({:.2}, {:.2}, {:.2})",
                    s.target.x, s.target.y, s.target.z
                ));
                ui.separator();
                ui.label(format!("Lighting: {}", s.variant));
                ui.label(format!("Model: {}", s.model));
                ui.label(&s.scene);
                ui.separator();
                ui.label(format!(
                    "{} backend, buffer {}x{} @{:.2}x",
                    s.backend, s.buffer.0, s.buffer.1, s.pixel_ratio
                ));
                ui.small("F1: Toggle HUD | LMB: Orbit | RMB: Pan | Wheel/MMB: Zoom");
            });
    }
}

impl OverlayPass for Hud {
    fn draw(&mut self, target: OverlayTarget<'_>) {
        // Freed a frame late, once the commands that used them were submitted.
        for id in self.pending_free.drain(..) {
            self.renderer.free_texture(&id);
        }

        // Points map to drawing-buffer pixels at the clamped ratio, not the
        // window's native scale.
        let native = self.window.scale_factor();
        if native > 0.0 {
            self.ctx.set_zoom_factor((target.pixel_ratio / native) as f32);
        }

        let raw_input = self.winit.take_egui_input(&self.window);
        let visible = self.visible;
        let snapshot = &self.snapshot;
        let full_output = self.ctx.run(raw_input, |ctx| {
            if visible {
                Self::draw_ui(ctx, snapshot);
            }
        });
        self.winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: target.size_in_pixels,
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.renderer
                .update_texture(target.device, target.queue, *id, image_delta);
        }
        self.renderer.update_buffers(
            target.device,
            target.queue,
            target.encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = target
                .encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target.view,
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
            self.renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.pending_free = full_output.textures_delta.free;
    }
}
