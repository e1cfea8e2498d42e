//! Model assets: glTF import and the asynchronous model loader.
//!
//! The viewer never blocks a frame on file IO. A load request returns a
//! handle at once; the decoded model arrives later as a completion.
//!
//! # Invariants
//! - Every request produces exactly one completion, unless its source
//!   deliberately holds the reply forever.
//! - Imported geometry is validated before it reaches the scene graph.

mod import;
mod loader;

use std::path::PathBuf;

use orbitview_scene::SceneError;

pub use import::import_gltf;
pub use loader::{
    AssetLoader, CompletionSender, DeferredSource, GltfSource, LoadCompletion, LoadHandle,
    LoadOutcome, ModelSource,
};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("glTF document has no scenes")]
    NoScene,
    #[error("invalid mesh data: {0}")]
    Geometry(#[from] SceneError),
    #[error("load of {} was abandoned before completing", .0.display())]
    Abandoned(PathBuf),
}

pub fn crate_info() -> &'static str {
    "orbitview-assets v0.1.0"
}
