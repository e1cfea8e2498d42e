use glam::Vec3;

use crate::SceneError;

/// Indexed triangle-list geometry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl Geometry {
    /// Build geometry, filling in whatever the source left out.
    ///
    /// Missing indices become `0..n`; missing normals are computed as smooth
    /// vertex normals.
    pub fn new(
        positions: Vec<[f32; 3]>,
        normals: Option<Vec<[f32; 3]>>,
        indices: Option<Vec<u32>>,
    ) -> Result<Self, SceneError> {
        let vertex_count = positions.len();
        let indices = indices.unwrap_or_else(|| (0..vertex_count as u32).collect());

        if indices.len() % 3 != 0 {
            return Err(SceneError::InvalidGeometry(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(SceneError::InvalidGeometry(format!(
                "index {bad} out of range for {vertex_count} vertices"
            )));
        }

        let mut geometry = Self {
            positions,
            normals: Vec::new(),
            indices,
        };
        match normals {
            Some(n) if n.len() == vertex_count => geometry.normals = n,
            Some(n) => {
                return Err(SceneError::InvalidGeometry(format!(
                    "{} normals for {vertex_count} vertices",
                    n.len()
                )));
            }
            None => geometry.compute_normals(),
        }
        Ok(geometry)
    }

    /// Flat quad in the XY plane, centered at the origin, facing +Z.
    pub fn plane(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        Self {
            positions: vec![
                [-hw, hh, 0.0],
                [hw, hh, 0.0],
                [-hw, -hh, 0.0],
                [hw, -hh, 0.0],
            ],
            normals: vec![[0.0, 0.0, 1.0]; 4],
            indices: vec![0, 2, 1, 2, 3, 1],
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Axis-aligned bounds of the vertex positions.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut iter = self.positions.iter().map(|p| Vec3::from_array(*p));
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    /// Recompute smooth vertex normals from triangle faces.
    pub fn compute_normals(&mut self) {
        let mut acc = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let pa = Vec3::from_array(self.positions[a]);
            let pb = Vec3::from_array(self.positions[b]);
            let pc = Vec3::from_array(self.positions[c]);
            // Area-weighted: the cross product length is twice the face area.
            let face = (pb - pa).cross(pc - pa);
            acc[a] += face;
            acc[b] += face;
            acc[c] += face;
        }
        self.normals = acc
            .into_iter()
            .map(|n| {
                let n = n.normalize_or_zero();
                let n = if n == Vec3::ZERO { Vec3::Z } else { n };
                n.to_array()
            })
            .collect();
    }
}
