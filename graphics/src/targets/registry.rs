//! Target allocation, resizing and completeness checking.

use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::GraphicsError;
use crate::types::{SamplerDescriptor, TextureDescriptor, TextureUsage};

use super::{OffscreenTarget, TargetId, TargetSize, TargetSpec, check_config};

/// Owns every offscreen target and keeps window-sized ones in step with the
/// window.
///
/// Resizing re-specifies attachment storage in place, so texture and target
/// ids handed out earlier stay valid.
pub struct RenderTargetRegistry {
    device: Arc<GraphicsDevice>,
    diagnostics: Arc<Diagnostics>,
    window_size: (u32, u32),
    targets: Vec<OffscreenTarget>,
}

impl RenderTargetRegistry {
    pub fn new(
        device: Arc<GraphicsDevice>,
        diagnostics: Arc<Diagnostics>,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            device,
            diagnostics,
            window_size: (window_width, window_height),
            targets: Vec::new(),
        }
    }

    pub fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }

    /// Create zero-initialized storage for every attachment of `spec` and
    /// register it as one target.
    pub fn allocate(&mut self, spec: TargetSpec) -> Result<TargetId, GraphicsError> {
        let (width, height) = match spec.size {
            TargetSize::Window => self.window_size,
            TargetSize::Fixed(w, h) => (w, h),
        };
        let usage = if spec.sample_count > 1 {
            TextureUsage::RENDER_ATTACHMENT | TextureUsage::COPY_SRC
        } else {
            TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING
        };

        let mut color = Vec::with_capacity(spec.color.len());
        let mut samplers = Vec::with_capacity(spec.color.len());
        for attachment in &spec.color {
            let descriptor = TextureDescriptor::new_2d(width, height, attachment.format, usage)
                .with_sample_count(spec.sample_count)
                .with_label(format!("{}.{}", spec.label, attachment.label));
            color.push(self.device.create_texture(&descriptor)?);
            samplers.push(
                self.device.create_sampler(
                    &SamplerDescriptor::with_filter(attachment.filter)
                        .with_address_mode(attachment.address)
                        .with_label(format!("{}.{}", spec.label, attachment.label)),
                )?,
            );
        }
        let depth = match spec.depth {
            Some(format) => {
                let descriptor = TextureDescriptor::new_2d(
                    width,
                    height,
                    format,
                    TextureUsage::RENDER_ATTACHMENT,
                )
                .with_sample_count(spec.sample_count)
                .with_label(format!("{}.depth", spec.label));
                Some(self.device.create_texture(&descriptor)?)
            }
            None => None,
        };

        let id = TargetId(self.targets.len() as u32);
        log::debug!(
            "RenderTargetRegistry: allocated '{}' {}x{} ({} color, depth={}, samples={})",
            spec.label,
            width,
            height,
            color.len(),
            depth.is_some(),
            spec.sample_count
        );
        self.targets.push(OffscreenTarget {
            id,
            spec,
            color,
            samplers,
            depth,
        });
        self.check(id);
        Ok(id)
    }

    /// Get a target.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not allocated by this registry.
    pub fn get(&self, id: TargetId) -> &OffscreenTarget {
        &self.targets[id.0 as usize]
    }

    /// Number of allocated targets.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Re-specify every attachment of a target at a new size.
    pub fn resize(&mut self, id: TargetId, width: u32, height: u32) -> Result<(), GraphicsError> {
        let target = &mut self.targets[id.0 as usize];
        let samples = target.spec.sample_count;
        for texture in target.color.iter().chain(target.depth.iter()) {
            texture.respecify(width, height, samples)?;
        }
        if let TargetSize::Fixed(..) = target.spec.size {
            target.spec.size = TargetSize::Fixed(width, height);
        }
        self.check(id);
        Ok(())
    }

    /// Re-specify only the depth attachment of a target.
    ///
    /// Used by cube captures, where the color attachment is a face of a cube
    /// texture and the target only provides the matching depth buffer.
    pub fn resize_depth(
        &mut self,
        id: TargetId,
        width: u32,
        height: u32,
    ) -> Result<(), GraphicsError> {
        let target = &self.targets[id.0 as usize];
        if let Some(depth) = &target.depth {
            depth.respecify(width, height, target.spec.sample_count)?;
        }
        Ok(())
    }

    /// Resize every window-sized target. A zero dimension is ignored.
    pub fn resize_all(&mut self, width: u32, height: u32) -> Result<(), GraphicsError> {
        if width == 0 || height == 0 {
            log::debug!("RenderTargetRegistry: ignoring resize to {width}x{height}");
            return Ok(());
        }
        self.window_size = (width, height);
        let window_targets: Vec<TargetId> = self
            .targets
            .iter()
            .filter(|t| t.spec.size == TargetSize::Window)
            .map(|t| t.id)
            .collect();
        for id in window_targets {
            self.resize(id, width, height)?;
        }
        Ok(())
    }

    /// Change the sample count of every attachment of a target.
    pub fn set_sample_count(&mut self, id: TargetId, samples: u32) -> Result<(), GraphicsError> {
        let target = &mut self.targets[id.0 as usize];
        if target.spec.sample_count == samples {
            return Ok(());
        }
        let (width, height) = target.size();
        for texture in target.color.iter().chain(target.depth.iter()) {
            texture.respecify(width, height, samples)?;
        }
        target.spec.sample_count = samples;
        self.check(id);
        Ok(())
    }

    /// Run the completeness check on a target, reporting a failure.
    pub fn check(&self, id: TargetId) -> bool {
        let target = self.get(id);
        match check_config(&target.config()) {
            Ok(()) => true,
            Err(reason) => {
                self.diagnostics.report(
                    DiagnosticKind::IncompleteTarget,
                    format!("target '{}': {reason}", target.label()),
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for RenderTargetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderTargetRegistry")
            .field("window_size", &self.window_size)
            .field("targets", &self.targets.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::GraphicsInstance;
    use crate::targets::AttachmentSpec;
    use crate::types::TextureFormat;

    fn registry() -> RenderTargetRegistry {
        let device = GraphicsInstance::new().unwrap().create_device().unwrap();
        RenderTargetRegistry::new(device, Arc::new(Diagnostics::default()), 1200, 800)
    }

    fn scene_spec() -> TargetSpec {
        TargetSpec::new("scene", TargetSize::Window)
            .with_color(AttachmentSpec::new("hdr", TextureFormat::Rgba16Float))
            .with_color(AttachmentSpec::new("bright", TextureFormat::Rgba16Float))
            .with_depth(TextureFormat::Depth32Float)
    }

    #[test]
    fn test_resize_keeps_ids() {
        let mut registry = registry();
        let scene = registry.allocate(scene_spec()).unwrap();
        let lut = registry
            .allocate(
                TargetSpec::new("lut", TargetSize::Fixed(512, 512))
                    .with_color(AttachmentSpec::new("lut", TextureFormat::Rg16Float)),
            )
            .unwrap();
        let color_id = registry.get(scene).color(0).id();

        registry.resize_all(1920, 1080).unwrap();
        assert_eq!(registry.get(scene).size(), (1920, 1080));
        assert_eq!(registry.get(scene).color(0).id(), color_id);
        assert_eq!(registry.get(scene).depth().unwrap().width(), 1920);
        assert_eq!(registry.get(lut).size(), (512, 512));

        registry.resize_all(0, 1080).unwrap();
        assert_eq!(registry.window_size(), (1920, 1080));
        assert_eq!(registry.diagnostics().count(), 0);
    }

    #[test]
    fn test_set_sample_count() {
        let mut registry = registry();
        let msaa = registry
            .allocate(scene_spec().with_sample_count(4))
            .unwrap();
        assert_eq!(registry.get(msaa).color(1).sample_count(), 4);

        registry.set_sample_count(msaa, 8).unwrap();
        assert_eq!(registry.get(msaa).sample_count(), 8);
        assert_eq!(registry.get(msaa).depth().unwrap().sample_count(), 8);
        assert!(registry.check(msaa));
    }

    #[test]
    fn test_depth_only_target() {
        let mut registry = registry();
        let scratch = registry
            .allocate(
                TargetSpec::new("capture", TargetSize::Fixed(1024, 1024))
                    .with_depth(TextureFormat::Depth32Float),
            )
            .unwrap();
        registry.resize_depth(scratch, 32, 32).unwrap();
        assert_eq!(registry.get(scratch).size(), (32, 32));
        assert!(registry.check(scratch));
    }
}
