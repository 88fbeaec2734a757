//! GPU sampler resource.

use std::sync::Arc;

use crate::backend::GpuSampler;
use crate::device::GraphicsDevice;
use crate::types::SamplerDescriptor;

/// A texture sampler.
pub struct Sampler {
    device: Arc<GraphicsDevice>,
    descriptor: SamplerDescriptor,
    gpu: GpuSampler,
}

impl Sampler {
    /// Create a new sampler (called by GraphicsDevice).
    pub(crate) fn new(
        device: Arc<GraphicsDevice>,
        descriptor: SamplerDescriptor,
        gpu: GpuSampler,
    ) -> Self {
        Self {
            device,
            descriptor,
            gpu,
        }
    }

    /// Get the parent device.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    /// Get the sampler descriptor.
    pub fn descriptor(&self) -> &SamplerDescriptor {
        &self.descriptor
    }

    /// Get the sampler label, if set.
    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }

    pub(crate) fn gpu_handle(&self) -> &GpuSampler {
        &self.gpu
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler")
            .field("label", &self.descriptor.label)
            .field("min_filter", &self.descriptor.min_filter)
            .finish()
    }
}

static_assertions::assert_impl_all!(Sampler: Send, Sync);
