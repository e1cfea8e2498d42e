//! Scene Graph: the set of renderable nodes composed for a frame.
//!
//! # Invariants
//! - Nodes are moved into the graph on attach; a node is never shared
//!   between graphs or attached twice.
//! - Iteration order is deterministic (sequential ids in a BTreeMap).
//! - Every attach/detach is recorded in the event log.

pub mod geometry;
pub mod graph;
pub mod node;

pub use geometry::Geometry;
pub use graph::{DrawItem, DrawKey, LightItem, SceneEvent, SceneGraph};
pub use node::{
    Light, LightKind, Material, MeshNode, ModelPart, NodeId, NodeKind, NodeKindTag, SceneNode,
    ShadingModel,
};

/// Errors from scene graph operations.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

pub fn crate_info() -> &'static str {
    "orbitview-scene v0.1.0"
}
