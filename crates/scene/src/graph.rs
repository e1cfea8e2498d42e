use glam::{Mat4, Vec3};
use orbitview_common::Transform;
use std::collections::BTreeMap;

use crate::node::{Light, MeshNode, ModelPart, NodeId, NodeKind, NodeKindTag, SceneNode};
use crate::SceneError;

/// A record of every structural change to the graph.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    Attached {
        id: NodeId,
        kind: NodeKindTag,
        name: String,
    },
    Detached {
        id: NodeId,
        kind: NodeKindTag,
        name: String,
    },
}

/// Stable identity of one drawable mesh across frames.
///
/// `index` is the mesh's position in the depth-first walk of its node, which
/// does not change while the node stays attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawKey {
    pub node: NodeId,
    pub index: usize,
}

/// A mesh flattened to world space, ready for a renderer.
#[derive(Debug, Clone, Copy)]
pub struct DrawItem<'a> {
    pub key: DrawKey,
    pub world: Mat4,
    pub mesh: &'a MeshNode,
}

/// A light with its world position resolved.
#[derive(Debug, Clone, Copy)]
pub struct LightItem<'a> {
    pub id: NodeId,
    pub position: Vec3,
    pub light: &'a Light,
}

/// The scene root.
///
/// Owns every attached node. Uses BTreeMap keyed by sequential ids so
/// iteration follows attach order on every platform.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, SceneNode>,
    next_id: u64,
    event_log: Vec<SceneEvent>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a node to the root. Returns its id.
    pub fn add(&mut self, node: SceneNode) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        tracing::debug!(?id, name = %node.name, kind = ?node.kind.tag(), "node attached");
        self.event_log.push(SceneEvent::Attached {
            id,
            kind: node.kind.tag(),
            name: node.name.clone(),
        });
        self.nodes.insert(id, node);
        id
    }

    /// Detach a node. Returns it if it was attached.
    pub fn remove(&mut self, id: NodeId) -> Option<SceneNode> {
        let node = self.nodes.remove(&id)?;
        self.event_log.push(SceneEvent::Detached {
            id,
            kind: node.kind.tag(),
            name: node.name.clone(),
        });
        Some(node)
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    pub fn set_transform(&mut self, id: NodeId, transform: Transform) -> Result<(), SceneError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(SceneError::NodeNotFound(id))?;
        node.transform = transform;
        Ok(())
    }

    /// Read-only access to all nodes in attach order.
    pub fn nodes(&self) -> &BTreeMap<NodeId, SceneNode> {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn count_of(&self, kind: NodeKindTag) -> usize {
        self.nodes
            .values()
            .filter(|n| n.kind.tag() == kind)
            .count()
    }

    /// The first attached model node, if any.
    pub fn model(&self) -> Option<(NodeId, &SceneNode)> {
        self.nodes
            .iter()
            .find(|(_, n)| matches!(n.kind, NodeKind::Model(_)))
            .map(|(id, n)| (*id, n))
    }

    pub fn has_model(&self) -> bool {
        self.model().is_some()
    }

    /// Model subtree of a model node.
    pub fn model_part(&self, id: NodeId) -> Option<&ModelPart> {
        match &self.nodes.get(&id)?.kind {
            NodeKind::Model(part) => Some(part),
            _ => None,
        }
    }

    pub fn lights(&self) -> impl Iterator<Item = LightItem<'_>> {
        self.nodes.iter().filter_map(|(id, node)| match &node.kind {
            NodeKind::Light(light) => Some(LightItem {
                id: *id,
                position: node.transform.position,
                light,
            }),
            _ => None,
        })
    }

    /// The first light that casts shadows.
    pub fn shadow_light(&self) -> Option<LightItem<'_>> {
        self.lights().find(|l| l.light.cast_shadow)
    }

    /// Flatten every mesh (plain meshes and model subtrees) to world space.
    pub fn draw_items(&self) -> Vec<DrawItem<'_>> {
        let mut items = Vec::new();
        for (id, node) in &self.nodes {
            let world = node.transform.matrix();
            match &node.kind {
                NodeKind::Mesh(mesh) => items.push(DrawItem {
                    key: DrawKey { node: *id, index: 0 },
                    world,
                    mesh,
                }),
                NodeKind::Model(part) => {
                    let mut index = 0;
                    flatten_part(*id, part, world, &mut index, &mut items);
                }
                NodeKind::Light(_) | NodeKind::Camera => {}
            }
        }
        items
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[SceneEvent] {
        &self.event_log
    }
}

fn flatten_part<'a>(
    node: NodeId,
    part: &'a ModelPart,
    parent: Mat4,
    index: &mut usize,
    out: &mut Vec<DrawItem<'a>>,
) {
    let world = parent * part.transform.matrix();
    for mesh in &part.meshes {
        out.push(DrawItem {
            key: DrawKey {
                node,
                index: *index,
            },
            world,
            mesh,
        });
        *index += 1;
    }
    for child in &part.children {
        flatten_part(node, child, world, index, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Geometry, Material};
    use orbitview_common::Color;
    use std::f32::consts::FRAC_PI_2;

    fn plane_node() -> SceneNode {
        SceneNode::new(
            "plane",
            NodeKind::Mesh(MeshNode::new(
                Geometry::plane(2.0, 2.0),
                Material::phong(Color::WHITE),
            )),
        )
    }

    fn light_node(cast_shadow: bool) -> SceneNode {
        let mut light = Light::directional(Color::WHITE, 1.0);
        if cast_shadow {
            light = light.with_shadow(256);
        }
        SceneNode::new("light", NodeKind::Light(light))
            .with_transform(Transform::from_position(Vec3::new(6.0, 6.0, 6.0)))
    }

    fn two_level_model() -> ModelPart {
        let mesh = MeshNode::new(Geometry::plane(1.0, 1.0), Material::default());
        ModelPart {
            meshes: vec![mesh.clone()],
            children: vec![ModelPart {
                transform: Transform::from_position(Vec3::new(1.0, 0.0, 0.0)),
                meshes: vec![mesh],
                ..ModelPart::default()
            }],
            ..ModelPart::default()
        }
    }

    #[test]
    fn graph_starts_empty() {
        let g = SceneGraph::new();
        assert_eq!(g.node_count(), 0);
        assert!(!g.has_model());
        assert!(g.draw_items().is_empty());
    }

    #[test]
    fn add_and_remove() {
        let mut g = SceneGraph::new();
        let id = g.add(plane_node());
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.get(id).unwrap().name, "plane");

        let node = g.remove(id);
        assert!(node.is_some());
        assert_eq!(g.node_count(), 0);
        assert!(g.remove(id).is_none());
    }

    #[test]
    fn ids_follow_attach_order() {
        let mut g = SceneGraph::new();
        let a = g.add(plane_node());
        let b = g.add(light_node(false));
        let c = g.add(SceneNode::new("camera", NodeKind::Camera));
        assert!(a < b && b < c);
        let keys: Vec<NodeId> = g.nodes().keys().copied().collect();
        assert_eq!(keys, vec![a, b, c]);
    }

    #[test]
    fn ids_are_not_reused_after_remove() {
        let mut g = SceneGraph::new();
        let a = g.add(plane_node());
        g.remove(a);
        let b = g.add(plane_node());
        assert_ne!(a, b);
    }

    #[test]
    fn events_are_recorded() {
        let mut g = SceneGraph::new();
        let id = g.add(plane_node());
        g.add(light_node(false));
        g.remove(id);
        assert_eq!(g.events().len(), 3);
        assert_eq!(
            g.events()[2],
            SceneEvent::Detached {
                id,
                kind: NodeKindTag::Mesh,
                name: "plane".into()
            }
        );
    }

    #[test]
    fn drain_events_clears_log() {
        let mut g = SceneGraph::new();
        g.add(plane_node());
        assert_eq!(g.drain_events().len(), 1);
        assert!(g.events().is_empty());
    }

    #[test]
    fn set_transform_unknown_node() {
        let mut g = SceneGraph::new();
        let err = g.set_transform(NodeId(99), Transform::default());
        assert!(matches!(err, Err(SceneError::NodeNotFound(NodeId(99)))));
    }

    #[test]
    fn count_by_kind() {
        let mut g = SceneGraph::new();
        g.add(plane_node());
        g.add(light_node(false));
        g.add(light_node(true));
        assert_eq!(g.count_of(NodeKindTag::Light), 2);
        assert_eq!(g.count_of(NodeKindTag::Mesh), 1);
        assert_eq!(g.count_of(NodeKindTag::Model), 0);
    }

    #[test]
    fn shadow_light_picks_caster() {
        let mut g = SceneGraph::new();
        g.add(light_node(false));
        assert!(g.shadow_light().is_none());
        let caster = g.add(light_node(true));
        let found = g.shadow_light().unwrap();
        assert_eq!(found.id, caster);
        assert_eq!(found.position, Vec3::new(6.0, 6.0, 6.0));
    }

    #[test]
    fn draw_items_flatten_model_hierarchy() {
        let mut g = SceneGraph::new();
        g.add(plane_node());
        let mut placement = Transform::default();
        placement.rotate_z(FRAC_PI_2);
        placement.set_uniform_scale(2.0);
        let model = g.add(
            SceneNode::new("model", NodeKind::Model(two_level_model())).with_transform(placement),
        );

        let items = g.draw_items();
        assert_eq!(items.len(), 3);

        let model_items: Vec<_> = items.iter().filter(|i| i.key.node == model).collect();
        assert_eq!(model_items.len(), 2);
        assert_eq!(model_items[0].key.index, 0);
        assert_eq!(model_items[1].key.index, 1);

        // Child offset (1,0,0) is scaled by 2 and rotated onto +Y.
        let origin = model_items[1].world.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn model_lookup() {
        let mut g = SceneGraph::new();
        g.add(plane_node());
        assert!(g.model().is_none());
        let id = g.add(SceneNode::new("model", NodeKind::Model(two_level_model())));
        assert_eq!(g.model().unwrap().0, id);
        assert_eq!(g.model_part(id).unwrap().mesh_count(), 2);
        assert!(g.model_part(NodeId(0)).is_none());
    }
}
