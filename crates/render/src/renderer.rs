use std::fmt::Write as _;

use orbitview_scene::{NodeKind, SceneGraph};

use crate::settings::{clamp_pixel_ratio, drawing_buffer_size};
use crate::PerspectiveCamera;

/// Errors a renderer can report for a frame.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("render surface lost")]
    SurfaceLost,
    #[error("timed out acquiring the next surface frame")]
    SurfaceTimeout,
    #[error("GPU out of memory")]
    OutOfMemory,
    #[error("GPU device error: {0}")]
    Device(String),
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// Sizes are logical pixels; the drawing buffer is `size * pixel_ratio`.
/// A renderer reads the scene graph and camera and never mutates either.
pub trait Renderer {
    fn set_size(&mut self, width: u32, height: u32);

    /// Set the pixel ratio. Implementations clamp to `MAX_PIXEL_RATIO`.
    fn set_pixel_ratio(&mut self, ratio: f64);

    fn size(&self) -> (u32, u32);

    fn pixel_ratio(&self) -> f64;

    /// Draw one frame.
    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Result<(), RenderError>;
}

/// Text renderer for headless runs and tests.
///
/// Each frame becomes a human-readable dump of the scene and camera.
#[derive(Debug, Clone)]
pub struct DebugTextRenderer {
    width: u32,
    height: u32,
    pixel_ratio: f64,
    frames: u64,
    last_frame: String,
}

impl Default for DebugTextRenderer {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            pixel_ratio: 1.0,
            frames: 0,
            last_frame: String::new(),
        }
    }
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_frame(&self) -> &str {
        &self.last_frame
    }

    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        drawing_buffer_size(self.width, self.height, self.pixel_ratio)
    }
}

impl Renderer for DebugTextRenderer {
    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = clamp_pixel_ratio(ratio);
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    fn render(&mut self, scene: &SceneGraph, camera: &PerspectiveCamera) -> Result<(), RenderError> {
        self.frames += 1;
        let (bw, bh) = self.drawing_buffer_size();

        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame {} ({}x{} @{:.2}x -> {}x{}) ===",
            self.frames, self.width, self.height, self.pixel_ratio, bw, bh
        );
        let _ = writeln!(out, "Nodes: {}", scene.node_count());
        let (e, t) = (camera.position, camera.target);
        let _ = writeln!(
            out,
            "Camera: eye=({:.2}, {:.2}, {:.2}) target=({:.2}, {:.2}, {:.2}) fov={:.0} aspect={:.3}",
            e.x,
            e.y,
            e.z,
            t.x,
            t.y,
            t.z,
            camera.fov_degrees(),
            camera.aspect()
        );

        for (id, node) in scene.nodes() {
            let p = node.transform.position;
            let detail = match &node.kind {
                NodeKind::Mesh(mesh) => format!("mesh tris={}", mesh.geometry.triangle_count()),
                NodeKind::Light(light) => format!("light {:?} i={:.2}", light.kind, light.intensity),
                NodeKind::Camera => "camera".to_string(),
                NodeKind::Model(part) => format!("model meshes={}", part.mesh_count()),
            };
            let _ = writeln!(
                out,
                "  [{}] {} {} pos=({:.2}, {:.2}, {:.2})",
                id.0, node.name, detail, p.x, p.y, p.z
            );
        }

        self.last_frame = out;
        Ok(())
    }
}
