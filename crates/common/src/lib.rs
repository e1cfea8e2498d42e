//! Shared types for the orbitview workspace.
//!
//! # Invariants
//! - Transforms compose as scale, then rotation, then translation.
//! - Colors are stored as sRGB components in `0..=1`.

pub mod types;

pub use types::{Color, ColorParseError, Transform};
