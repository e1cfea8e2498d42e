//! Rendering Adapter: renderer-agnostic interface plus the camera rig.
//!
//! # Invariants
//! - Renderers read the scene graph; they never mutate it.
//! - The camera's cached projection always matches its current aspect.
//! - Pixel ratio handed to a renderer is clamped to [`MAX_PIXEL_RATIO`].
//!
//! The trait keeps the frame loop independent of the GPU: the wgpu backend
//! and [`DebugTextRenderer`] are interchangeable behind it.

mod camera;
mod controls;
mod renderer;
mod settings;

pub use camera::PerspectiveCamera;
pub use controls::OrbitControls;
pub use renderer::{DebugTextRenderer, RenderError, Renderer};
pub use settings::{
    ColorSpace, MAX_PIXEL_RATIO, RendererSettings, ShadowFilter, clamp_pixel_ratio,
    drawing_buffer_size,
};

pub fn crate_info() -> &'static str {
    "orbitview-render v0.1.0"
}
