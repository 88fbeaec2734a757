//! GPU mesh resource.

use std::sync::atomic::{AtomicU64, Ordering};

use lumina_core::mesh::MeshShape;

use crate::backend::GpuMesh;

static NEXT_MESH_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(u64);

/// Vertex (and optional index) data uploaded to the GPU.
pub struct Mesh {
    id: MeshId,
    label: Option<String>,
    shape: MeshShape,
    gpu: GpuMesh,
}

impl Mesh {
    pub(crate) fn new(label: Option<String>, shape: MeshShape, gpu: GpuMesh) -> Self {
        Self {
            id: MeshId(NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed)),
            label,
            shape,
            gpu,
        }
    }

    pub fn id(&self) -> MeshId {
        self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Whether the mesh draws as plain arrays or through an index list.
    pub fn shape(&self) -> MeshShape {
        self.shape
    }

    pub(crate) fn gpu_handle(&self) -> &GpuMesh {
        &self.gpu
    }
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("shape", &self.shape)
            .finish()
    }
}

static_assertions::assert_impl_all!(Mesh: Send, Sync);
