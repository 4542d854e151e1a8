//! # Procedural Geometry
//!
//! Built-in shapes for objects created without a mesh file and for light
//! gizmos. Generators produce indexed [`GeometryData`]; the scene consumes
//! flat, non-indexed [`MeshData`] so indexed data is expanded once on
//! creation.
//!
//! ```rust
//! use vantage::gfx::geometry::PrimitiveKind;
//!
//! let cube = PrimitiveKind::Cube.mesh();
//! assert_eq!(cube.triangle_count(), 12);
//! ```

pub mod primitives;

pub use primitives::*;

use crate::gfx::scene::mesh::MeshData;

/// Indexed geometry straight out of a generator.
#[derive(Debug, Clone, Default)]
pub struct GeometryData {
    pub vertices: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub normals: Vec<[f32; 3]>,
    /// Counter-clockwise triangles
    pub indices: Vec<u32>,
}

impl GeometryData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Expands the index list into a flat triangle list, one vertex per index.
    pub fn to_mesh_data(&self) -> MeshData {
        let mut positions = Vec::with_capacity(self.indices.len() * 3);
        let mut normals = Vec::with_capacity(self.indices.len() * 3);
        let mut tex_coords = Vec::with_capacity(self.indices.len() * 2);

        for &index in &self.indices {
            let i = index as usize;
            positions.extend_from_slice(&self.vertices[i]);
            normals.extend_from_slice(&self.normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]));
            tex_coords.extend_from_slice(&self.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]));
        }

        // Whole triangles with parallel buffers by construction.
        MeshData::new(positions, normals, Some(tex_coords)).unwrap_or_default()
    }
}

/// Shapes the viewer can create without external mesh data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Cube,
    Sphere,
}

impl PrimitiveKind {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Cube => "Cube",
            PrimitiveKind::Sphere => "Sphere",
        }
    }

    pub fn geometry(self) -> GeometryData {
        match self {
            PrimitiveKind::Cube => generate_cube(),
            PrimitiveKind::Sphere => {
                generate_sphere(SPHERE_LONGITUDE_SEGMENTS, SPHERE_LATITUDE_SEGMENTS)
            }
        }
    }

    pub fn mesh(self) -> MeshData {
        self.geometry().to_mesh_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expansion_keeps_every_triangle() {
        let cube = PrimitiveKind::Cube.mesh();
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.vertex_count(), 36);
        assert_eq!(cube.normals().len(), cube.positions().len());
        assert_eq!(cube.tex_coords().map(<[f32]>::len), Some(72));
    }

    #[test]
    fn test_expanded_vertices_follow_indices() {
        let geometry = generate_cube();
        let mesh = geometry.to_mesh_data();
        let third = geometry.indices[2] as usize;
        assert_eq!(&mesh.positions()[6..9], &geometry.vertices[third]);
        assert_eq!(&mesh.normals()[6..9], &geometry.normals[third]);
    }

    #[test]
    fn test_sphere_mesh_is_not_empty() {
        let sphere = PrimitiveKind::Sphere.mesh();
        let expected = (SPHERE_LONGITUDE_SEGMENTS * SPHERE_LATITUDE_SEGMENTS * 2) as usize;
        assert_eq!(sphere.triangle_count(), expected);
    }
}
