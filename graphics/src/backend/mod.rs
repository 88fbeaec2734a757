//! GPU backend abstraction layer.
//!
//! This module provides a trait-based abstraction for GPU backends,
//! allowing the renderer to work with different GPU APIs.
//!
//! # Available Backends
//!
//! - `dummy` (default): records what it is asked to do instead of drawing.
//!   The test suite inspects that record.
//! - `wgpu-backend`: Cross-platform backend using wgpu
//!
//! # Architecture
//!
//! Each backend implements the [`GpuBackend`] trait, which provides:
//! - Resource creation (textures, samplers, programs, meshes)
//! - Render graph execution
//! - Surface presentation
//! - Timer queries

#[cfg(feature = "wgpu-backend")]
mod wgpu_impl;

#[cfg(feature = "wgpu-backend")]
pub use wgpu_impl::WgpuBackend;

pub mod dummy;

use std::sync::Arc;

use lumina_core::mesh::CpuMesh;
use lumina_core::texture::CpuTexture;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::error::GraphicsError;
use crate::graph::{CompiledGraph, RenderGraph};
use crate::resources::ProgramKind;
use crate::types::{SamplerDescriptor, TextureDescriptor, TextureFormat};

/// Handle to a GPU texture resource.
pub enum GpuTexture {
    /// Dummy backend (no GPU allocation)
    Dummy,
    /// wgpu backend texture
    #[cfg(feature = "wgpu-backend")]
    Wgpu {
        texture: Arc<wgpu::Texture>,
        /// View over every layer and mip, used for sampling.
        view: Arc<wgpu::TextureView>,
    },
}

impl std::fmt::Debug for GpuTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dummy => write!(f, "GpuTexture::Dummy"),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu { texture, view } => f
                .debug_struct("GpuTexture::Wgpu")
                .field("texture", texture)
                .field("view", view)
                .finish(),
        }
    }
}

impl Clone for GpuTexture {
    fn clone(&self) -> Self {
        match self {
            Self::Dummy => Self::Dummy,
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu { texture, view } => Self::Wgpu {
                texture: texture.clone(),
                view: view.clone(),
            },
        }
    }
}

/// Handle to a GPU sampler resource.
pub enum GpuSampler {
    /// Dummy backend (no GPU allocation)
    Dummy,
    /// wgpu backend sampler
    #[cfg(feature = "wgpu-backend")]
    Wgpu(Arc<wgpu::Sampler>),
}

impl std::fmt::Debug for GpuSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dummy => write!(f, "GpuSampler::Dummy"),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(sampler) => f.debug_tuple("GpuSampler::Wgpu").field(sampler).finish(),
        }
    }
}

impl Clone for GpuSampler {
    fn clone(&self) -> Self {
        match self {
            Self::Dummy => Self::Dummy,
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(sampler) => Self::Wgpu(sampler.clone()),
        }
    }
}

/// Handle to a built shading program.
pub enum GpuProgram {
    /// Dummy backend, also used for programs that failed to build
    Dummy,
    /// wgpu backend shader module; pipelines are derived per target layout
    #[cfg(feature = "wgpu-backend")]
    Wgpu(Arc<wgpu::ShaderModule>),
}

impl std::fmt::Debug for GpuProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dummy => write!(f, "GpuProgram::Dummy"),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(module) => f.debug_tuple("GpuProgram::Wgpu").field(module).finish(),
        }
    }
}

impl Clone for GpuProgram {
    fn clone(&self) -> Self {
        match self {
            Self::Dummy => Self::Dummy,
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(module) => Self::Wgpu(module.clone()),
        }
    }
}

/// Handle to uploaded mesh buffers.
pub enum GpuMesh {
    /// Dummy backend (no GPU allocation)
    Dummy,
    /// wgpu backend vertex and optional index buffer
    #[cfg(feature = "wgpu-backend")]
    Wgpu {
        vertices: Arc<wgpu::Buffer>,
        indices: Option<Arc<wgpu::Buffer>>,
    },
}

impl std::fmt::Debug for GpuMesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dummy => write!(f, "GpuMesh::Dummy"),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu { vertices, indices } => f
                .debug_struct("GpuMesh::Wgpu")
                .field("vertices", vertices)
                .field("indexed", &indices.is_some())
                .finish(),
        }
    }
}

/// Handle to a GPU elapsed-time query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuQuery {
    /// Dummy backend query, timed with the CPU clock
    Dummy(u32),
    /// wgpu timestamp pair slot
    #[cfg(feature = "wgpu-backend")]
    Wgpu(u32),
}

/// A window the backend can present to.
pub trait SurfaceWindow: HasWindowHandle + HasDisplayHandle + Send + Sync {}

impl<T: HasWindowHandle + HasDisplayHandle + Send + Sync> SurfaceWindow for T {}

/// GPU backend trait for abstracting different GPU APIs.
pub trait GpuBackend: Send + Sync + 'static {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    /// Create a texture resource. Contents start zeroed.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<GpuTexture, GraphicsError>;

    /// Create a sampler resource.
    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<GpuSampler, GraphicsError>;

    /// Build the program of the given kind.
    fn create_program(&self, kind: ProgramKind) -> Result<GpuProgram, GraphicsError>;

    /// Upload mesh data.
    fn create_mesh(&self, mesh: &CpuMesh) -> Result<GpuMesh, GraphicsError>;

    /// Upload texel data into mip 0, layer 0 of a texture.
    fn write_texture(
        &self,
        texture: &GpuTexture,
        descriptor: &TextureDescriptor,
        data: &CpuTexture,
    ) -> Result<(), GraphicsError>;

    /// Execute a compiled render graph.
    ///
    /// Passes run in compiled order. Draws whose program is invalid are
    /// skipped.
    fn execute_graph(
        &self,
        graph: &RenderGraph,
        compiled: &CompiledGraph,
    ) -> Result<(), GraphicsError>;

    /// Start presenting to a window. Returns the surface color format.
    fn attach_surface(
        &self,
        window: Arc<dyn SurfaceWindow>,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<TextureFormat, GraphicsError>;

    /// Reconfigure the surface after a window resize.
    fn resize_surface(&self, width: u32, height: u32) -> Result<(), GraphicsError>;

    /// Show the surface image written by the last executed graph.
    fn present(&self) -> Result<(), GraphicsError>;

    /// Create an elapsed-time query.
    fn create_query(&self) -> Result<GpuQuery, GraphicsError>;

    /// Start timing. Work submitted after this call is measured.
    fn begin_query(&self, query: GpuQuery);

    /// Stop timing.
    fn end_query(&self, query: GpuQuery);

    /// Elapsed nanoseconds between begin and end, if the result is available.
    /// Never blocks.
    fn query_result(&self, query: GpuQuery) -> Option<u64>;
}

/// Which backend to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendType {
    /// The best backend compiled in, falling back to dummy.
    #[default]
    Auto,
    /// The recording backend.
    Dummy,
    /// The wgpu backend. Fails if the feature is not enabled.
    Wgpu,
}

impl std::str::FromStr for BackendType {
    type Err = GraphicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "dummy" => Ok(Self::Dummy),
            "wgpu" => Ok(Self::Wgpu),
            other => Err(GraphicsError::InvalidParameter(format!(
                "unknown backend '{other}'"
            ))),
        }
    }
}

/// Selects and creates the appropriate backend based on available features.
pub fn create_backend(backend_type: BackendType) -> Result<Arc<dyn GpuBackend>, GraphicsError> {
    match backend_type {
        BackendType::Dummy => {
            log::info!("Using dummy backend");
            Ok(Arc::new(dummy::DummyBackend::new()))
        }
        BackendType::Wgpu => {
            #[cfg(feature = "wgpu-backend")]
            {
                let backend = WgpuBackend::new()?;
                log::info!("Using wgpu backend");
                Ok(Arc::new(backend))
            }
            #[cfg(not(feature = "wgpu-backend"))]
            {
                Err(GraphicsError::InitializationFailed(
                    "wgpu backend not compiled in (enable the `wgpu-backend` feature)".to_string(),
                ))
            }
        }
        BackendType::Auto => {
            #[cfg(feature = "wgpu-backend")]
            {
                match WgpuBackend::new() {
                    Ok(backend) => {
                        log::info!("Using wgpu backend");
                        return Ok(Arc::new(backend));
                    }
                    Err(e) => {
                        log::warn!("Failed to create wgpu backend: {}", e);
                    }
                }
            }

            log::info!("Using dummy backend");
            Ok(Arc::new(dummy::DummyBackend::new()))
        }
    }
}

/// Check if a real GPU backend is available.
pub fn has_gpu_backend() -> bool {
    cfg!(feature = "wgpu-backend")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_type_from_str() {
        assert_eq!("Dummy".parse::<BackendType>().unwrap(), BackendType::Dummy);
        assert_eq!("auto".parse::<BackendType>().unwrap(), BackendType::Auto);
        assert!("vulkan".parse::<BackendType>().is_err());
    }

    #[test]
    fn test_create_dummy_backend() {
        let backend = create_backend(BackendType::Dummy).unwrap();
        assert_eq!(backend.name(), "Dummy Backend");
    }
}
