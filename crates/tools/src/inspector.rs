use glam::Vec3;
use orbitview_scene::{ModelPart, NodeId, NodeKindTag, SceneGraph};

/// Scene inspector for developer tooling.
///
/// Read-only queries against a scene graph for logging, the HUD and the
/// CLI.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the scene.
    pub fn summary(scene: &SceneGraph) -> SceneSummary {
        let mut summary = SceneSummary {
            node_count: scene.node_count(),
            meshes: scene.count_of(NodeKindTag::Mesh),
            lights: scene.count_of(NodeKindTag::Light),
            cameras: scene.count_of(NodeKindTag::Camera),
            models: scene.count_of(NodeKindTag::Model),
            draw_calls: 0,
            triangles: 0,
            shadow_casters: 0,
            pending_events: scene.events().len(),
        };
        for item in scene.draw_items() {
            summary.draw_calls += 1;
            summary.triangles += item.mesh.geometry.triangle_count();
            if item.mesh.cast_shadow {
                summary.shadow_casters += 1;
            }
        }
        summary
    }

    /// Describe one node.
    pub fn inspect_node(scene: &SceneGraph, id: NodeId) -> Option<NodeInfo> {
        scene.get(id).map(|node| {
            let t = &node.transform;
            let (axis, angle) = t.rotation.to_axis_angle();
            NodeInfo {
                id,
                name: node.name.clone(),
                kind: node.kind.tag(),
                position: t.position.to_array(),
                rotation_axis: axis.to_array(),
                rotation_degrees: angle.to_degrees(),
                scale: t.scale.to_array(),
            }
        })
    }

    /// List all node ids in attach order.
    pub fn list_nodes(scene: &SceneGraph) -> Vec<NodeId> {
        scene.nodes().keys().copied().collect()
    }
}

/// Summary of scene contents for the inspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneSummary {
    pub node_count: usize,
    pub meshes: usize,
    pub lights: usize,
    pub cameras: usize,
    pub models: usize,
    pub draw_calls: usize,
    pub triangles: usize,
    pub shadow_casters: usize,
    pub pending_events: usize,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: nodes={} meshes={} lights={} cameras={} models={} draws={} tris={} casters={}",
            self.node_count,
            self.meshes,
            self.lights,
            self.cameras,
            self.models,
            self.draw_calls,
            self.triangles,
            self.shadow_casters
        )
    }
}

/// Detailed info about a single node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKindTag,
    pub position: [f32; 3],
    pub rotation_axis: [f32; 3],
    pub rotation_degrees: f32,
    pub scale: [f32; 3],
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} ({:?}) pos=({:.2}, {:.2}, {:.2}) rot={:.1}deg scale=({:.2}, {:.2}, {:.2})",
            self.id.0,
            self.name,
            self.kind,
            self.position[0],
            self.position[1],
            self.position[2],
            self.rotation_degrees,
            self.scale[0],
            self.scale[1],
            self.scale[2],
        )
    }
}

/// Counts and bounds for a decoded model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSummary {
    pub name: Option<String>,
    pub parts: usize,
    pub meshes: usize,
    pub vertices: usize,
    pub triangles: usize,
    /// Local-space bounds of the raw mesh data, ignoring part transforms.
    pub bounds: Option<(Vec3, Vec3)>,
}

pub fn model_summary(model: &ModelPart) -> ModelSummary {
    let mut vertices = 0;
    let mut triangles = 0;
    let mut bounds: Option<(Vec3, Vec3)> = None;
    model.for_each_mesh(&mut |mesh| {
        vertices += mesh.geometry.vertex_count();
        triangles += mesh.geometry.triangle_count();
        if let Some((lo, hi)) = mesh.geometry.bounds() {
            bounds = Some(match bounds {
                Some((a, b)) => (a.min(lo), b.max(hi)),
                None => (lo, hi),
            });
        }
    });
    ModelSummary {
        name: model.name.clone(),
        parts: model.part_count(),
        meshes: model.mesh_count(),
        vertices,
        triangles,
        bounds,
    }
}

impl std::fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Model {}: parts={} meshes={} vertices={} triangles={}",
            self.name.as_deref().unwrap_or("<unnamed>"),
            self.parts,
            self.meshes,
            self.vertices,
            self.triangles
        )?;
        if let Some((lo, hi)) = self.bounds {
            write!(
                f,
                " bounds=({:.2}, {:.2}, {:.2})..({:.2}, {:.2}, {:.2})",
                lo.x, lo.y, lo.z, hi.x, hi.y, hi.z
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbitview_common::{Color, Transform};
    use orbitview_scene::{Geometry, Light, Material, MeshNode, NodeKind, SceneNode};

    fn scene_with_model() -> (SceneGraph, NodeId) {
        let mut scene = SceneGraph::new();
        scene.add(SceneNode::new("camera", NodeKind::Camera));
        scene.add(SceneNode::new(
            "ground",
            NodeKind::Mesh(MeshNode::new(
                Geometry::plane(100.0, 100.0),
                Material::phong(Color::WHITE),
            )),
        ));
        scene.add(SceneNode::new(
            "sun",
            NodeKind::Light(Light::directional(Color::WHITE, 1.0)),
        ));
        let mut mesh = MeshNode::new(Geometry::plane(1.0, 1.0), Material::default());
        mesh.cast_shadow = true;
        let model = ModelPart {
            name: Some("face".into()),
            meshes: vec![mesh.clone()],
            children: vec![ModelPart {
                meshes: vec![mesh],
                ..ModelPart::default()
            }],
            ..ModelPart::default()
        };
        let mut transform = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        transform.rotate_z(std::f32::consts::FRAC_PI_2);
        transform.set_uniform_scale(2.0);
        let id = scene.add(SceneNode::new("face", NodeKind::Model(model)).with_transform(transform));
        (scene, id)
    }

    #[test]
    fn summary_empty_scene() {
        let summary = SceneInspector::summary(&SceneGraph::new());
        assert_eq!(summary.node_count, 0);
        assert_eq!(summary.draw_calls, 0);
    }

    #[test]
    fn summary_counts_kinds_and_draws() {
        let (scene, _) = scene_with_model();
        let summary = SceneInspector::summary(&scene);
        assert_eq!(summary.node_count, 4);
        assert_eq!(summary.meshes, 1);
        assert_eq!(summary.lights, 1);
        assert_eq!(summary.cameras, 1);
        assert_eq!(summary.models, 1);
        assert_eq!(summary.draw_calls, 3);
        assert_eq!(summary.triangles, 6);
        assert_eq!(summary.shadow_casters, 2);
        assert_eq!(summary.pending_events, 4);
    }

    #[test]
    fn inspect_node_found() {
        let (scene, id) = scene_with_model();
        let info = SceneInspector::inspect_node(&scene, id).unwrap();
        assert_eq!(info.name, "face");
        assert_eq!(info.kind, NodeKindTag::Model);
        assert_eq!(info.position, [1.0, 2.0, 3.0]);
        assert!((info.rotation_degrees - 90.0).abs() < 1e-3);
        assert_eq!(info.scale, [2.0, 2.0, 2.0]);
        assert!(info.to_string().contains("rot=90.0deg"));
    }

    #[test]
    fn inspect_node_not_found() {
        let (scene, _) = scene_with_model();
        assert!(SceneInspector::inspect_node(&scene, NodeId(999)).is_none());
    }

    #[test]
    fn list_nodes_in_attach_order() {
        let (scene, id) = scene_with_model();
        let ids = SceneInspector::list_nodes(&scene);
        assert_eq!(ids.len(), 4);
        assert_eq!(ids.last(), Some(&id));
        let labels: Vec<_> = ids
            .iter()
            .filter_map(|id| scene.get(*id))
            .map(|n| n.kind.tag())
            .collect();
        assert_eq!(
            labels,
            [
                NodeKindTag::Camera,
                NodeKindTag::Mesh,
                NodeKindTag::Light,
                NodeKindTag::Model
            ]
        );
    }

    #[test]
    fn model_summary_counts() {
        let (scene, id) = scene_with_model();
        let model = scene.model_part(id).unwrap();
        let summary = model_summary(model);
        assert_eq!(summary.parts, 2);
        assert_eq!(summary.meshes, 2);
        assert_eq!(summary.vertices, 8);
        assert_eq!(summary.triangles, 4);
        let (lo, hi) = summary.bounds.unwrap();
        assert_eq!(lo, Vec3::new(-0.5, -0.5, 0.0));
        assert_eq!(hi, Vec3::new(0.5, 0.5, 0.0));
        assert!(summary.to_string().starts_with("Model face: parts=2"));
    }

    #[test]
    fn summary_display() {
        let (scene, _) = scene_with_model();
        let s = SceneInspector::summary(&scene).to_string();
        assert!(s.contains("nodes=4"));
        assert!(s.contains("casters=2"));
    }
}
