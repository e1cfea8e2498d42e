//! Input: host pointer events mapped to camera control actions.
//!
//! # Invariants
//! - Camera controllers consume actions, never raw window events.
//! - Only one button drives a drag at a time; the first pressed wins.

pub mod action;
pub mod pointer;

pub use action::ControlAction;
pub use pointer::{PointerButton, PointerTracker};

pub fn crate_info() -> &'static str {
    "orbitview-input v0.1.0"
}
