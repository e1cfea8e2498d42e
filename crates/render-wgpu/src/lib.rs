//! wgpu render backend for the viewer.
//!
//! Draws the scene graph's meshes with one light, an optional shadow map
//! pass and MSAA, then hands the frame to an optional overlay (the HUD).
//!
//! # Invariants
//! - The renderer never mutates the scene graph or camera.
//! - The drawing buffer is always `size * pixel_ratio` with the ratio
//!   clamped to 2.
//! - GPU mesh buffers live only while their draw key is in the scene.

mod gpu;
mod mesh;
mod shaders;
mod shadow;

pub use gpu::{OverlayPass, OverlayTarget, WgpuRenderer};
