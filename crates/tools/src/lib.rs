//! Developer tooling: read-only inspection of scenes and loaded models.
//!
//! # Invariants
//! - Inspection never mutates what it inspects.

mod inspector;

pub use inspector::{ModelSummary, NodeInfo, SceneInspector, SceneSummary, model_summary};

pub fn crate_info() -> &'static str {
    "orbitview-tools v0.1.0"
}
