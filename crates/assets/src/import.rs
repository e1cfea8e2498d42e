use std::path::Path;

use glam::{Quat, Vec3};
use orbitview_common::{Color, Transform};
use orbitview_scene::{Geometry, Material, MeshNode, ModelPart};

use crate::AssetError;

/// Import the default scene of a glTF file (`.gltf` or `.glb`).
///
/// The returned root part stands for the glTF scene itself (identity
/// transform); its children are the scene's root nodes with their local
/// transforms. Only triangle-list primitives are kept.
pub fn import_gltf(path: impl AsRef<Path>) -> Result<ModelPart, AssetError> {
    let path = path.as_ref();
    let _span = tracing::info_span!("import_gltf", path = %path.display()).entered();

    let (document, buffers, _images) = gltf::import(path)?;
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(AssetError::NoScene)?;

    let mut root = ModelPart {
        name: scene.name().map(str::to_owned),
        ..ModelPart::default()
    };
    for node in scene.nodes() {
        root.children.push(import_node(&node, &buffers)?);
    }

    tracing::info!(
        parts = root.part_count(),
        meshes = root.mesh_count(),
        "glTF scene imported"
    );
    Ok(root)
}

fn import_node(node: &gltf::Node<'_>, buffers: &[gltf::buffer::Data]) -> Result<ModelPart, AssetError> {
    let (translation, rotation, scale) = node.transform().decomposed();
    let transform = Transform {
        position: Vec3::from_array(translation),
        rotation: Quat::from_array(rotation),
        scale: Vec3::from_array(scale),
    };

    let mut meshes = Vec::new();
    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                tracing::debug!(mode = ?primitive.mode(), "skipping non-triangle primitive");
                continue;
            }
            let reader =
                primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
            let Some(positions) = reader.read_positions() else {
                tracing::debug!("skipping primitive without positions");
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            let normals = reader.read_normals().map(|n| n.collect());
            let indices = reader.read_indices().map(|i| i.into_u32().collect());

            let geometry = Geometry::new(positions, normals, indices)?;
            meshes.push(MeshNode::new(geometry, convert_material(&primitive.material())));
        }
    }

    let children = node
        .children()
        .map(|child| import_node(&child, buffers))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ModelPart {
        name: node.name().map(str::to_owned),
        transform,
        meshes,
        children,
    })
}

fn convert_material(material: &gltf::Material<'_>) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, _a] = pbr.base_color_factor();
    Material::standard(
        Color::from_linear([r, g, b]),
        pbr.roughness_factor(),
        pbr.metallic_factor(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use orbitview_scene::ShadingModel;

    #[test]
    fn import_preserves_hierarchy() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::write_triangle_model(dir.path());

        let model = import_gltf(&path).unwrap();
        assert_eq!(model.name.as_deref(), Some("face"));
        assert_eq!(model.transform, Transform::default());
        assert_eq!(model.children.len(), 1);

        let root = &model.children[0];
        assert_eq!(root.name.as_deref(), Some("root"));
        assert_eq!(root.meshes.len(), 1);
        assert_eq!(root.children.len(), 1);

        let child = &root.children[0];
        assert_eq!(child.transform.position, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(model.part_count(), 3);
        assert_eq!(model.mesh_count(), 2);
    }

    #[test]
    fn import_reads_geometry_and_material() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::write_triangle_model(dir.path());

        let model = import_gltf(&path).unwrap();
        let mesh = &model.children[0].meshes[0];
        assert_eq!(mesh.geometry.vertex_count(), 3);
        assert_eq!(mesh.geometry.triangle_count(), 1);
        assert_eq!(mesh.geometry.indices, vec![0, 1, 2]);
        // No normals in the file: computed from the face.
        assert_eq!(mesh.geometry.normals, vec![[0.0, 0.0, 1.0]; 3]);

        assert_eq!(mesh.material.color.to_hex(), "#ff0000");
        assert!(matches!(
            mesh.material.shading,
            ShadingModel::Standard { roughness, metalness } if roughness == 0.5 && metalness == 0.0
        ));
        assert!(!mesh.cast_shadow);
    }

    #[test]
    fn import_empty_scene_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::write_empty_model(dir.path());

        let model = import_gltf(&path).unwrap();
        assert_eq!(model.part_count(), 2);
        assert_eq!(model.mesh_count(), 0);
    }

    #[test]
    fn import_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = import_gltf(dir.path().join("missing.gltf")).unwrap_err();
        assert!(matches!(err, AssetError::Gltf(_)));
    }

    #[test]
    fn import_malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.gltf");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(import_gltf(&path).is_err());
    }
}
