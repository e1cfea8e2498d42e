use glam::Vec3;
use orbitview_common::{Color, Transform};
use orbitview_render::{RendererSettings, ShadowFilter};
use orbitview_scene::{
    Geometry, Light, Material, MeshNode, ModelPart, NodeId, NodeKind, SceneGraph, SceneNode,
};

use crate::config::{SceneVariant, ViewerConfig};

const DIRECTIONAL_LIGHT_POSITION: Vec3 = Vec3::new(6.0, 6.0, 6.0);
const POINT_LIGHT_POSITION: Vec3 = Vec3::new(2.0, 3.0, 4.0);
const SHADOW_MAP_SIZE: u32 = 1024;

/// The startup scene plus the ids of the nodes created for it.
#[derive(Debug)]
pub struct AssembledScene {
    pub scene: SceneGraph,
    pub camera_node: NodeId,
    pub plane: NodeId,
    pub light: NodeId,
}

/// Build the static part of the scene: camera anchor, ground plane and the
/// variant's light. The model arrives later.
pub fn assemble_scene(config: &ViewerConfig) -> AssembledScene {
    let mut scene = SceneGraph::new();

    let camera_node = scene.add(
        SceneNode::new("camera", NodeKind::Camera)
            .with_transform(Transform::from_position(config.camera.position)),
    );

    let plane = scene.add(SceneNode::new(
        "ground",
        NodeKind::Mesh(ground_plane(config)),
    ));

    let (name, light, position) = match config.variant {
        SceneVariant::Directional => (
            "sun",
            Light::directional(Color::WHITE, 1.0),
            DIRECTIONAL_LIGHT_POSITION,
        ),
        SceneVariant::ShadowedPoint => (
            "lamp",
            Light::point(Color::WHITE, 3.0, 0.0, 2.0).with_shadow(SHADOW_MAP_SIZE),
            POINT_LIGHT_POSITION,
        ),
    };
    let light = scene.add(
        SceneNode::new(name, NodeKind::Light(light))
            .with_transform(Transform::from_position(position)),
    );

    tracing::debug!(variant = %config.variant, nodes = scene.node_count(), "scene assembled");
    AssembledScene {
        scene,
        camera_node,
        plane,
        light,
    }
}

fn ground_plane(config: &ViewerConfig) -> MeshNode {
    let size = config.plane.size;
    let geometry = Geometry::plane(size, size);
    match config.variant {
        SceneVariant::Directional => MeshNode::new(
            geometry,
            Material::phong(config.plane.color).with_depth_write(false),
        ),
        SceneVariant::ShadowedPoint => {
            let mut mesh = MeshNode::new(
                geometry,
                Material::standard(config.plane.color, 1.0, 0.0).with_depth_write(false),
            );
            mesh.receive_shadow = true;
            mesh
        }
    }
}

/// Renderer options implied by the config.
pub fn renderer_settings(config: &ViewerConfig) -> RendererSettings {
    let shadowed = config.variant.shadows();
    RendererSettings {
        antialias: config.antialias,
        shadows: shadowed.then_some(ShadowFilter::PcfSoft),
        physically_correct_lights: shadowed,
        ..RendererSettings::default()
    }
}

/// Wrap a loaded model in a scene node with the configured placement.
pub fn place_model(mut part: ModelPart, config: &ViewerConfig) -> SceneNode {
    if config.variant.shadows() {
        part.set_shadows(true, true);
    }
    let name = part.name.clone().unwrap_or_else(|| "model".to_string());
    let mut transform = Transform::default();
    transform.rotate_z(config.model.rotation_z_degrees.to_radians());
    transform.set_uniform_scale(config.model.scale);
    SceneNode::new(name, NodeKind::Model(part)).with_transform(transform)
}
