use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};
use orbitview_scene::{DrawItem, DrawKey, Geometry};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x3,
        ],
    };
}

/// Interleave positions and normals into one vertex stream.
pub(crate) fn interleave(geometry: &Geometry) -> Vec<Vertex> {
    geometry
        .positions
        .iter()
        .zip(&geometry.normals)
        .map(|(position, normal)| Vertex {
            position: *position,
            normal: *normal,
        })
        .collect()
}

/// Buffers for one uploaded mesh.
pub(crate) struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    vertex_count: usize,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, geometry: &Geometry) -> Self {
        let vertices = interleave(geometry);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertex_buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_index_buffer"),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices.len() as u32,
            vertex_count: vertices.len(),
        }
    }

    fn matches(&self, geometry: &Geometry) -> bool {
        self.vertex_count == geometry.vertex_count() && self.index_count as usize == geometry.indices.len()
    }
}

/// GPU copies of scene meshes, keyed by draw key.
///
/// Synced once per frame: new keys are uploaded, keys that no longer appear
/// are released.
#[derive(Default)]
pub(crate) struct MeshCache {
    meshes: BTreeMap<DrawKey, GpuMesh>,
}

impl MeshCache {
    pub fn sync(&mut self, device: &wgpu::Device, items: &[DrawItem<'_>]) {
        let mut uploaded = 0;
        for item in items {
            let geometry = &item.mesh.geometry;
            if geometry.is_empty() {
                continue;
            }
            let stale = self
                .meshes
                .get(&item.key)
                .is_none_or(|mesh| !mesh.matches(geometry));
            if stale {
                self.meshes.insert(item.key, GpuMesh::upload(device, geometry));
                uploaded += 1;
            }
        }

        let before = self.meshes.len();
        let live = live_keys(items);
        self.meshes.retain(|key, _| live.contains(key));
        let released = before - self.meshes.len();

        if uploaded > 0 || released > 0 {
            tracing::debug!(uploaded, released, cached = self.meshes.len(), "mesh cache synced");
        }
    }

    pub fn get(&self, key: &DrawKey) -> Option<&GpuMesh> {
        self.meshes.get(key)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }
}

fn live_keys(items: &[DrawItem<'_>]) -> std::collections::BTreeSet<DrawKey> {
    items
        .iter()
        .filter(|item| !item.mesh.geometry.is_empty())
        .map(|item| item.key)
        .collect()
}
