//! Vertex and mesh storage.

/// Position, normal and texture coordinate. 32 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    /// Size of one vertex in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// How a mesh's vertices are assembled when drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshShape {
    /// Vertices are drawn in order, three per triangle.
    Arrays { vertex_count: u32 },
    /// Vertices are addressed through an index list.
    Indexed { vertex_count: u32, index_count: u32 },
}

impl MeshShape {
    /// Number of vertices the draw call submits.
    pub fn draw_count(&self) -> u32 {
        match *self {
            Self::Arrays { vertex_count } => vertex_count,
            Self::Indexed { index_count, .. } => index_count,
        }
    }
}

/// CPU-side mesh data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CpuMesh {
    label: Option<String>,
    vertices: Vec<Vertex>,
    indices: Option<Vec<u32>>,
}

impl CpuMesh {
    /// Create a non-indexed mesh.
    pub fn new(vertices: Vec<Vertex>) -> Self {
        Self {
            label: None,
            vertices,
            indices: None,
        }
    }

    /// Create an indexed mesh.
    pub fn indexed(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self {
            label: None,
            vertices,
            indices: Some(indices),
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get the debug label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Get the vertices.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Get the index list, if the mesh is indexed.
    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }

    /// Vertex bytes ready for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index bytes ready for upload, if indexed.
    pub fn index_bytes(&self) -> Option<&[u8]> {
        self.indices.as_deref().map(bytemuck::cast_slice)
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// The draw shape of this mesh.
    pub fn shape(&self) -> MeshShape {
        match &self.indices {
            Some(indices) => MeshShape::Indexed {
                vertex_count: self.vertex_count(),
                index_count: indices.len() as u32,
            },
            None => MeshShape::Arrays {
                vertex_count: self.vertex_count(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_size() {
        assert_eq!(Vertex::SIZE, 32);
    }

    #[test]
    fn test_shape() {
        let v = Vertex::default();
        let arrays = CpuMesh::new(vec![v; 3]);
        assert_eq!(arrays.shape(), MeshShape::Arrays { vertex_count: 3 });
        assert_eq!(arrays.shape().draw_count(), 3);
        assert!(arrays.index_bytes().is_none());

        let indexed = CpuMesh::indexed(vec![v; 4], vec![0, 1, 2, 2, 3, 0]).with_label("quad");
        assert_eq!(indexed.shape().draw_count(), 6);
        assert_eq!(indexed.index_bytes().map(<[u8]>::len), Some(24));
        assert_eq!(indexed.label(), Some("quad"));
    }
}
