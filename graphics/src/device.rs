//! Graphics device.
//!
//! The [`GraphicsDevice`] is the main interface for creating GPU resources
//! and submitting recorded work. It is created by
//! [`GraphicsInstance::create_device`].

use std::sync::{Arc, Weak};

use lumina_core::mesh::CpuMesh;
use lumina_core::texture::CpuTexture;
use parking_lot::RwLock;

use crate::backend::{GpuBackend, SurfaceWindow};
use crate::error::GraphicsError;
use crate::graph::RenderGraph;
use crate::instance::GraphicsInstance;
use crate::resources::{Mesh, Program, ProgramKind, Sampler, Texture};
use crate::types::{SamplerDescriptor, TextureDescriptor, TextureDimension, TextureFormat};

/// Capabilities of a graphics device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceCapabilities {
    /// Maximum texture dimension.
    pub max_texture_dimension: u32,
    /// Maximum MSAA sample count.
    pub max_sample_count: u32,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            max_texture_dimension: 16384,
            max_sample_count: 8,
        }
    }
}

/// A graphics device for creating GPU resources.
///
/// # Thread Safety
///
/// `GraphicsDevice` is `Send + Sync` and can be safely shared across threads.
///
/// # Example
///
/// ```ignore
/// let instance = GraphicsInstance::new()?;
/// let device = instance.create_device()?;
///
/// let texture = device.create_texture(&TextureDescriptor::new_2d(
///     1200, 800,
///     TextureFormat::Rgba16Float,
///     TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
/// ))?;
/// let pbr = device.create_program(ProgramKind::Pbr)?;
/// ```
pub struct GraphicsDevice {
    instance: Arc<GraphicsInstance>,
    name: String,
    capabilities: DeviceCapabilities,
    surface_format: RwLock<Option<TextureFormat>>,
    // Track allocated resources (weak references for cleanup/debugging)
    textures: RwLock<Vec<Weak<Texture>>>,
    samplers: RwLock<Vec<Weak<Sampler>>>,
}

impl GraphicsDevice {
    /// Create a new graphics device (called by GraphicsInstance).
    pub(crate) fn new(instance: Arc<GraphicsInstance>, name: String) -> Self {
        Self {
            instance,
            name,
            capabilities: DeviceCapabilities::default(),
            surface_format: RwLock::new(None),
            textures: RwLock::new(Vec::new()),
            samplers: RwLock::new(Vec::new()),
        }
    }

    /// Get the parent instance.
    pub fn instance(&self) -> &Arc<GraphicsInstance> {
        &self.instance
    }

    /// Get the GPU backend.
    pub fn backend(&self) -> &Arc<dyn GpuBackend> {
        self.instance.backend()
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the device capabilities.
    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Check a texture descriptor against device limits.
    pub fn validate_texture(&self, descriptor: &TextureDescriptor) -> Result<(), GraphicsError> {
        let max_dim = self.capabilities.max_texture_dimension;
        if descriptor.size.width > max_dim || descriptor.size.height > max_dim {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture dimension exceeds maximum {max_dim}"
            )));
        }
        if descriptor.size.width == 0 || descriptor.size.height == 0 {
            return Err(GraphicsError::InvalidParameter(
                "texture dimensions cannot be zero".to_string(),
            ));
        }
        if descriptor.sample_count == 0
            || descriptor.sample_count > self.capabilities.max_sample_count
            || !descriptor.sample_count.is_power_of_two()
        {
            return Err(GraphicsError::InvalidParameter(format!(
                "unsupported sample count {}",
                descriptor.sample_count
            )));
        }
        if descriptor.sample_count > 1 && descriptor.mip_level_count > 1 {
            return Err(GraphicsError::InvalidParameter(
                "multisampled textures cannot have mip levels".to_string(),
            ));
        }
        if descriptor.dimension == TextureDimension::Cube
            && descriptor.size.width != descriptor.size.height
        {
            return Err(GraphicsError::InvalidParameter(
                "cube faces must be square".to_string(),
            ));
        }
        let max_mips = 32 - descriptor.size.width.max(descriptor.size.height).leading_zeros();
        if descriptor.mip_level_count == 0 || descriptor.mip_level_count > max_mips {
            return Err(GraphicsError::InvalidParameter(format!(
                "mip level count {} out of range (max {max_mips})",
                descriptor.mip_level_count
            )));
        }
        Ok(())
    }

    /// Create a GPU texture.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor is out of device limits or allocation fails.
    pub fn create_texture(
        self: &Arc<Self>,
        descriptor: &TextureDescriptor,
    ) -> Result<Arc<Texture>, GraphicsError> {
        self.validate_texture(descriptor)?;

        let gpu = self.backend().create_texture(descriptor)?;
        let texture = Arc::new(Texture::new(Arc::clone(self), descriptor.clone(), gpu));
        self.textures.write().push(Arc::downgrade(&texture));

        log::trace!(
            "GraphicsDevice: created texture {:?}, size={}x{}",
            descriptor.label,
            descriptor.size.width,
            descriptor.size.height
        );

        Ok(texture)
    }

    /// Create a texture sampler.
    pub fn create_sampler(
        self: &Arc<Self>,
        descriptor: &SamplerDescriptor,
    ) -> Result<Arc<Sampler>, GraphicsError> {
        let gpu = self.backend().create_sampler(descriptor)?;
        let sampler = Arc::new(Sampler::new(Arc::clone(self), descriptor.clone(), gpu));
        self.samplers.write().push(Arc::downgrade(&sampler));

        log::trace!("GraphicsDevice: created sampler {:?}", descriptor.label);

        Ok(sampler)
    }

    /// Build a shading program.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::ProgramBuildFailed`] if the backend rejects it.
    /// Callers that keep rendering through the failure substitute
    /// [`invalid_program`](Self::invalid_program).
    pub fn create_program(&self, kind: ProgramKind) -> Result<Arc<Program>, GraphicsError> {
        let gpu = self.backend().create_program(kind)?;
        log::trace!("GraphicsDevice: built program {}", kind.label());
        Ok(Arc::new(Program::new(kind, gpu)))
    }

    /// A program object that draws nothing.
    pub fn invalid_program(&self, kind: ProgramKind) -> Arc<Program> {
        Arc::new(Program::invalid(kind))
    }

    /// Upload a mesh.
    pub fn create_mesh(&self, mesh: &CpuMesh) -> Result<Arc<Mesh>, GraphicsError> {
        if mesh.vertex_count() == 0 {
            return Err(GraphicsError::InvalidParameter(
                "mesh has no vertices".to_string(),
            ));
        }
        let gpu = self.backend().create_mesh(mesh)?;
        Ok(Arc::new(Mesh::new(
            mesh.label().map(str::to_string),
            mesh.shape(),
            gpu,
        )))
    }

    /// Upload texel data into the base level of a 2D texture.
    pub fn write_texture(&self, texture: &Texture, data: &CpuTexture) -> Result<(), GraphicsError> {
        self.backend()
            .write_texture(&texture.gpu_handle(), &texture.descriptor(), data)
    }

    /// Compile and execute a recorded render graph.
    pub fn execute_graph(&self, graph: &RenderGraph) -> Result<(), GraphicsError> {
        let compiled = graph
            .compile()
            .map_err(|e| GraphicsError::Internal(e.to_string()))?;
        self.backend().execute_graph(graph, &compiled)
    }

    /// Start presenting to a window.
    pub fn attach_surface(
        &self,
        window: Arc<dyn SurfaceWindow>,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<TextureFormat, GraphicsError> {
        let format = self
            .backend()
            .attach_surface(window, width, height, vsync)?;
        *self.surface_format.write() = Some(format);
        log::info!("GraphicsDevice: surface attached ({width}x{height}, {format:?})");
        Ok(format)
    }

    /// Surface color format, if a surface is attached.
    pub fn surface_format(&self) -> Option<TextureFormat> {
        *self.surface_format.read()
    }

    /// Reconfigure the surface for a new window size.
    pub fn resize_surface(&self, width: u32, height: u32) -> Result<(), GraphicsError> {
        if self.surface_format().is_none() {
            return Ok(());
        }
        self.backend().resize_surface(width, height)
    }

    /// Present the last rendered surface image.
    pub fn present(&self) -> Result<(), GraphicsError> {
        self.backend().present()
    }

    /// Get the number of live textures created by this device.
    pub fn texture_count(&self) -> usize {
        self.textures
            .read()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Get the number of live samplers created by this device.
    pub fn sampler_count(&self) -> usize {
        self.samplers
            .read()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Clean up dead weak references to released resources.
    pub fn cleanup_dead_resources(&self) {
        self.textures.write().retain(|w| w.strong_count() > 0);
        self.samplers.write().retain(|w| w.strong_count() > 0);
    }
}

impl std::fmt::Debug for GraphicsDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsDevice")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

// Ensure GraphicsDevice is Send + Sync
static_assertions::assert_impl_all!(GraphicsDevice: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dummy::DummyBackend;
    use crate::types::TextureUsage;

    fn create_test_device() -> (Arc<DummyBackend>, Arc<GraphicsDevice>) {
        let backend = Arc::new(DummyBackend::new());
        let instance = GraphicsInstance::with_backend(backend.clone());
        (backend, instance.create_device().unwrap())
    }

    #[test]
    fn test_create_texture() {
        let (_, device) = create_test_device();
        let texture = device
            .create_texture(&TextureDescriptor::new_2d(
                512,
                512,
                TextureFormat::Rg16Float,
                TextureUsage::TEXTURE_BINDING,
            ))
            .unwrap();
        assert_eq!(texture.width(), 512);
        assert_eq!(device.texture_count(), 1);
    }

    #[test]
    fn test_texture_validation() {
        let (_, device) = create_test_device();
        let usage = TextureUsage::RENDER_ATTACHMENT;
        let zero = TextureDescriptor::new_2d(0, 512, TextureFormat::Rgba8Unorm, usage);
        assert!(device.create_texture(&zero).is_err());

        let too_many_mips =
            TextureDescriptor::new_cube(128, TextureFormat::Rgba16Float, usage).with_mip_levels(9);
        assert!(device.create_texture(&too_many_mips).is_err());

        let prefilter =
            TextureDescriptor::new_cube(128, TextureFormat::Rgba16Float, usage).with_mip_levels(5);
        assert!(device.create_texture(&prefilter).is_ok());

        let odd_samples = TextureDescriptor::new_2d(64, 64, TextureFormat::Rgba8Unorm, usage)
            .with_sample_count(3);
        assert!(device.create_texture(&odd_samples).is_err());
    }

    #[test]
    fn test_failed_program_build_is_an_error() {
        let (backend, device) = create_test_device();
        backend.fail_program(ProgramKind::Prefilter);
        assert!(matches!(
            device.create_program(ProgramKind::Prefilter),
            Err(GraphicsError::ProgramBuildFailed(_))
        ));
        assert!(!device.invalid_program(ProgramKind::Prefilter).is_valid());
        assert!(device.create_program(ProgramKind::Pbr).unwrap().is_valid());
    }

    #[test]
    fn test_write_texture_checks_size() {
        let (backend, device) = create_test_device();
        let texture = device
            .create_texture(&TextureDescriptor::new_2d(
                64,
                32,
                TextureFormat::Rgba16Float,
                TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
            ))
            .unwrap();
        device
            .write_texture(&texture, &CpuTexture::placeholder(64, 32))
            .unwrap();
        assert!(
            device
                .write_texture(&texture, &CpuTexture::placeholder(32, 32))
                .is_err()
        );
        assert_eq!(backend.upload_count(), 1);
    }

    #[test]
    fn test_resource_cleanup() {
        let (_, device) = create_test_device();
        {
            let _sampler = device.create_sampler(&SamplerDescriptor::linear()).unwrap();
            assert_eq!(device.sampler_count(), 1);
        }
        device.cleanup_dead_resources();
        assert_eq!(device.sampler_count(), 0);
    }
}
