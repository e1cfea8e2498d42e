use orbitview_common::{Color, Transform};

use crate::Geometry;

/// Identifier of a node attached to a [`crate::SceneGraph`].
///
/// Allocated sequentially by the graph, so ids order by attach time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Discriminant of [`NodeKind`], for events and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKindTag {
    Mesh,
    Light,
    Camera,
    Model,
}

/// Surface shading parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShadingModel {
    /// Blinn-Phong with a specular exponent.
    Phong { shininess: f32 },
    /// Metallic-roughness, as imported from glTF.
    Standard { roughness: f32, metalness: f32 },
}

impl ShadingModel {
    /// Specular exponent used by the Blinn-Phong shader.
    pub fn shininess(&self) -> f32 {
        match *self {
            ShadingModel::Phong { shininess } => shininess,
            ShadingModel::Standard { roughness, .. } => {
                let r = roughness.clamp(0.04, 1.0);
                (2.0 / (r * r * r * r) - 2.0).clamp(1.0, 1024.0)
            }
        }
    }

    /// Specular weight in `0..=1`.
    pub fn specular_strength(&self) -> f32 {
        match *self {
            ShadingModel::Phong { .. } => 0.07,
            ShadingModel::Standard {
                roughness,
                metalness,
            } => (0.04 + 0.96 * metalness) * (1.0 - roughness.clamp(0.0, 1.0)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Color,
    pub shading: ShadingModel,
    /// Whether fragments of this material write depth. Large backdrops turn
    /// this off so they never occlude geometry lying in their plane.
    pub depth_write: bool,
}

impl Material {
    pub fn phong(color: Color) -> Self {
        Self {
            color,
            shading: ShadingModel::Phong { shininess: 30.0 },
            depth_write: true,
        }
    }

    pub fn standard(color: Color, roughness: f32, metalness: f32) -> Self {
        Self {
            color,
            shading: ShadingModel::Standard {
                roughness,
                metalness,
            },
            depth_write: true,
        }
    }

    pub fn with_depth_write(mut self, depth_write: bool) -> Self {
        self.depth_write = depth_write;
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::standard(Color::WHITE, 1.0, 0.0)
    }
}

/// Geometry plus material, with shadow participation flags.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    pub geometry: Geometry,
    pub material: Material,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl MeshNode {
    pub fn new(geometry: Geometry, material: Material) -> Self {
        Self {
            geometry,
            material,
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Parallel rays shining from the node position toward the origin.
    Directional,
    /// Omnidirectional light. A `distance` of 0 means unbounded range.
    Point { distance: f32, decay: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Color,
    pub intensity: f32,
    pub cast_shadow: bool,
    pub shadow_map_size: u32,
}

impl Light {
    pub fn directional(color: Color, intensity: f32) -> Self {
        Self {
            kind: LightKind::Directional,
            color,
            intensity,
            cast_shadow: false,
            shadow_map_size: 512,
        }
    }

    pub fn point(color: Color, intensity: f32, distance: f32, decay: f32) -> Self {
        Self {
            kind: LightKind::Point { distance, decay },
            color,
            intensity,
            cast_shadow: false,
            shadow_map_size: 512,
        }
    }

    pub fn with_shadow(mut self, map_size: u32) -> Self {
        self.cast_shadow = true;
        self.shadow_map_size = map_size.max(1);
        self
    }
}

/// One node of a loaded model, mirroring the source file's hierarchy.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelPart {
    pub name: Option<String>,
    pub transform: Transform,
    pub meshes: Vec<MeshNode>,
    pub children: Vec<ModelPart>,
}

impl ModelPart {
    /// Visit every mesh in this subtree, depth first.
    pub fn for_each_mesh<'a>(&'a self, f: &mut impl FnMut(&'a MeshNode)) {
        for mesh in &self.meshes {
            f(mesh);
        }
        for child in &self.children {
            child.for_each_mesh(f);
        }
    }

    pub fn for_each_mesh_mut(&mut self, f: &mut impl FnMut(&mut MeshNode)) {
        for mesh in &mut self.meshes {
            f(mesh);
        }
        for child in &mut self.children {
            child.for_each_mesh_mut(f);
        }
    }

    /// Number of parts in this subtree, including `self`.
    pub fn part_count(&self) -> usize {
        1 + self.children.iter().map(ModelPart::part_count).sum::<usize>()
    }

    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.for_each_mesh(&mut |_| count += 1);
        count
    }

    /// Set shadow flags on every mesh in the subtree.
    pub fn set_shadows(&mut self, cast: bool, receive: bool) {
        self.for_each_mesh_mut(&mut |mesh| {
            mesh.cast_shadow = cast;
            mesh.receive_shadow = receive;
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Mesh(MeshNode),
    Light(Light),
    /// Anchor tracking the viewing camera's position.
    Camera,
    Model(ModelPart),
}

impl NodeKind {
    pub fn tag(&self) -> NodeKindTag {
        match self {
            NodeKind::Mesh(_) => NodeKindTag::Mesh,
            NodeKind::Light(_) => NodeKindTag::Light,
            NodeKind::Camera => NodeKindTag::Camera,
            NodeKind::Model(_) => NodeKindTag::Model,
        }
    }
}

/// A node ready to be attached to a scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub kind: NodeKind,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            kind,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}
