//! GPU texture resource.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::backend::GpuTexture;
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::types::{Extent3d, TextureDescriptor, TextureDimension, TextureFormat};

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a texture.
///
/// The id survives [`Texture::respecify`], so anything keyed by it (bindings,
/// recorded subresource writes) stays valid across a window resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(u64);

impl TextureId {
    fn next() -> Self {
        Self(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "texture#{}", self.0)
    }
}

/// A GPU texture resource.
///
/// Textures are created by [`GraphicsDevice::create_texture`] and are
/// reference-counted. The storage behind a texture can be re-specified in
/// place; the `Arc<Texture>` and its [`TextureId`] stay the same.
///
/// # Example
///
/// ```ignore
/// let texture = device.create_texture(&TextureDescriptor::new_2d(
///     1200, 800,
///     TextureFormat::Rgba16Float,
///     TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
/// ))?;
/// texture.respecify(1920, 1080, 1)?;
/// assert_eq!(texture.width(), 1920);
/// ```
pub struct Texture {
    id: TextureId,
    device: Arc<GraphicsDevice>,
    descriptor: RwLock<TextureDescriptor>,
    gpu: RwLock<GpuTexture>,
}

impl Texture {
    /// Create a new texture (called by GraphicsDevice).
    pub(crate) fn new(
        device: Arc<GraphicsDevice>,
        descriptor: TextureDescriptor,
        gpu: GpuTexture,
    ) -> Self {
        Self {
            id: TextureId::next(),
            device,
            descriptor: RwLock::new(descriptor),
            gpu: RwLock::new(gpu),
        }
    }

    /// Get the stable texture id.
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Get the parent device.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    /// Get a copy of the current texture descriptor.
    pub fn descriptor(&self) -> TextureDescriptor {
        self.descriptor.read().clone()
    }

    /// Get the texture size.
    pub fn size(&self) -> Extent3d {
        self.descriptor.read().size
    }

    /// Get the texture width.
    pub fn width(&self) -> u32 {
        self.descriptor.read().size.width
    }

    /// Get the texture height.
    pub fn height(&self) -> u32 {
        self.descriptor.read().size.height
    }

    /// Get the texture format.
    pub fn format(&self) -> TextureFormat {
        self.descriptor.read().format
    }

    /// Get the texture dimension.
    pub fn dimension(&self) -> TextureDimension {
        self.descriptor.read().dimension
    }

    /// Get the mip level count.
    pub fn mip_level_count(&self) -> u32 {
        self.descriptor.read().mip_level_count
    }

    /// Get the sample count.
    pub fn sample_count(&self) -> u32 {
        self.descriptor.read().sample_count
    }

    /// Size of one layer at a mip level.
    pub fn mip_size(&self, mip_level: u32) -> (u32, u32) {
        self.descriptor.read().mip_size(mip_level)
    }

    /// Get the texture label, if set.
    pub fn label(&self) -> Option<String> {
        self.descriptor.read().label.clone()
    }

    /// Backend handle for the current storage.
    pub(crate) fn gpu_handle(&self) -> GpuTexture {
        self.gpu.read().clone()
    }

    /// Re-specify the storage with a new size and sample count.
    ///
    /// Contents are discarded and the new storage is zero-initialized. Format,
    /// mip count and usage are kept. Calling this with the current size and
    /// sample count is a no-op.
    pub fn respecify(
        &self,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Result<(), GraphicsError> {
        let mut descriptor = self.descriptor();
        if descriptor.size.width == width
            && descriptor.size.height == height
            && descriptor.sample_count == sample_count
        {
            return Ok(());
        }
        descriptor.size.width = width;
        descriptor.size.height = height;
        descriptor.sample_count = sample_count;

        self.device.validate_texture(&descriptor)?;
        let gpu = self.device.backend().create_texture(&descriptor)?;

        log::trace!(
            "Texture {:?}: respecified to {}x{} ({} samples)",
            descriptor.label,
            width,
            height,
            sample_count
        );
        *self.gpu.write() = gpu;
        *self.descriptor.write() = descriptor;
        Ok(())
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let descriptor = self.descriptor.read();
        f.debug_struct("Texture")
            .field("id", &self.id)
            .field("label", &descriptor.label)
            .field("size", &descriptor.size)
            .field("format", &descriptor.format)
            .field("dimension", &descriptor.dimension)
            .finish()
    }
}

// Ensure Texture is Send + Sync
static_assertions::assert_impl_all!(Texture: Send, Sync);

#[cfg(test)]
mod tests {
    use crate::instance::GraphicsInstance;
    use crate::types::{TextureDescriptor, TextureFormat, TextureUsage};

    #[test]
    fn test_texture_creation() {
        let instance = GraphicsInstance::new().unwrap();
        let device = instance.create_device().unwrap();

        let texture = device
            .create_texture(
                &TextureDescriptor::new_2d(
                    1200,
                    800,
                    TextureFormat::Rgba16Float,
                    TextureUsage::RENDER_ATTACHMENT,
                )
                .with_label("scene_color"),
            )
            .unwrap();

        assert_eq!(texture.width(), 1200);
        assert_eq!(texture.height(), 800);
        assert_eq!(texture.format(), TextureFormat::Rgba16Float);
        assert_eq!(texture.label().as_deref(), Some("scene_color"));
    }

    #[test]
    fn test_respecify_keeps_identity() {
        let instance = GraphicsInstance::new().unwrap();
        let device = instance.create_device().unwrap();

        let texture = device
            .create_texture(&TextureDescriptor::new_2d(
                64,
                64,
                TextureFormat::Rgba8Unorm,
                TextureUsage::RENDER_ATTACHMENT,
            ))
            .unwrap();
        let id = texture.id();

        texture.respecify(128, 32, 4).unwrap();
        assert_eq!(texture.id(), id);
        assert_eq!((texture.width(), texture.height()), (128, 32));
        assert_eq!(texture.sample_count(), 4);
        assert_eq!(texture.format(), TextureFormat::Rgba8Unorm);

        assert!(texture.respecify(0, 32, 1).is_err());
        assert_eq!(texture.width(), 128);
    }
}
