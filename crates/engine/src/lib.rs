//! Viewer engine: the one object that owns viewport, camera rig, scene,
//! renderer and model loader, driven by two host events.
//!
//! # Invariants
//! - `on_resize` keeps camera aspect, renderer size and pixel ratio in
//!   step with the viewport.
//! - Each `tick` updates the controls before it renders, and renders
//!   exactly once.
//! - A loaded model is attached at most once.

mod clock;
mod config;
mod setup;
mod viewer;
mod viewport;

pub use clock::{Clock, FrameTimer};
pub use config::{
    CameraConfig, ConfigError, ControlsConfig, ModelPlacement, PlaneConfig, SceneVariant,
    ViewerConfig, WindowConfig,
};
pub use setup::{AssembledScene, assemble_scene, place_model, renderer_settings};
pub use viewer::{FrameStats, ModelStatus, Viewer};
pub use viewport::Viewport;

use orbitview_render::RenderError;
use orbitview_scene::SceneError;

/// Errors surfaced by the viewer.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
}

pub fn crate_info() -> &'static str {
    "orbitview-engine v0.1.0"
}
