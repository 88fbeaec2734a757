//! Offscreen render targets.
//!
//! A target is a named bundle of attachment textures (colors plus an optional
//! depth buffer) that is allocated, resized and completeness-checked as one
//! unit. The [`RenderTargetRegistry`] owns every target the renderer uses.

mod registry;

use std::fmt;
use std::sync::Arc;

use crate::graph::{
    ColorAttachment, DepthStencilAttachment, RenderTargetConfig, TextureBinding,
};
use crate::resources::{Sampler, Texture};
use crate::types::{AddressMode, FilterMode, TextureFormat};

pub use registry::RenderTargetRegistry;

/// Identifier of a target inside its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(pub(crate) u32);

/// How a target is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSize {
    /// Follows the window; re-specified on every window resize.
    Window,
    /// Fixed size; only changed by an explicit resize.
    Fixed(u32, u32),
}

/// One color attachment of a target.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentSpec {
    pub label: String,
    pub format: TextureFormat,
    pub filter: FilterMode,
    pub address: AddressMode,
}

impl AttachmentSpec {
    /// Linear-filtered, clamped attachment.
    pub fn new(label: impl Into<String>, format: TextureFormat) -> Self {
        Self {
            label: label.into(),
            format,
            filter: FilterMode::Linear,
            address: AddressMode::ClampToEdge,
        }
    }

    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }
}

/// Declaration of a target.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSpec {
    pub label: String,
    pub size: TargetSize,
    pub color: Vec<AttachmentSpec>,
    /// Depth attachment format, if the target has one.
    pub depth: Option<TextureFormat>,
    pub sample_count: u32,
}

impl TargetSpec {
    pub fn new(label: impl Into<String>, size: TargetSize) -> Self {
        Self {
            label: label.into(),
            size,
            color: Vec::new(),
            depth: None,
            sample_count: 1,
        }
    }

    pub fn with_color(mut self, attachment: AttachmentSpec) -> Self {
        self.color.push(attachment);
        self
    }

    pub fn with_depth(mut self, format: TextureFormat) -> Self {
        self.depth = Some(format);
        self
    }

    pub fn with_sample_count(mut self, count: u32) -> Self {
        self.sample_count = count;
        self
    }
}

/// An allocated target.
#[derive(Debug)]
pub struct OffscreenTarget {
    pub(crate) id: TargetId,
    pub(crate) spec: TargetSpec,
    pub(crate) color: Vec<Arc<Texture>>,
    pub(crate) samplers: Vec<Arc<Sampler>>,
    pub(crate) depth: Option<Arc<Texture>>,
}

impl OffscreenTarget {
    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.spec.label
    }

    pub fn spec(&self) -> &TargetSpec {
        &self.spec
    }

    /// Color attachment texture.
    ///
    /// # Panics
    ///
    /// Panics if the target declares fewer than `index + 1` color attachments.
    pub fn color(&self, index: usize) -> &Arc<Texture> {
        &self.color[index]
    }

    pub fn color_count(&self) -> usize {
        self.color.len()
    }

    pub fn depth(&self) -> Option<&Arc<Texture>> {
        self.depth.as_ref()
    }

    /// Color attachment paired with the sampler its spec asked for.
    ///
    /// # Panics
    ///
    /// Panics if the target declares fewer than `index + 1` color attachments.
    pub fn binding(&self, index: usize) -> TextureBinding {
        TextureBinding::new(self.color[index].clone(), self.samplers[index].clone())
    }

    /// Current size, taken from the first attachment.
    pub fn size(&self) -> (u32, u32) {
        self.color
            .first()
            .or(self.depth.as_ref())
            .map(|t| (t.width(), t.height()))
            .unwrap_or((0, 0))
    }

    pub fn sample_count(&self) -> u32 {
        self.spec.sample_count
    }

    /// Attachment set writing every attachment of this target, loading
    /// previous contents.
    pub fn config(&self) -> RenderTargetConfig {
        let mut config = RenderTargetConfig::new();
        for texture in &self.color {
            config = config.with_color(ColorAttachment::from_texture(texture.clone()));
        }
        if let Some(depth) = &self.depth {
            config = config.with_depth_stencil(DepthStencilAttachment::from_texture(depth.clone()));
        }
        config
    }
}

/// Why an attachment set cannot be rendered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Incompleteness {
    /// Neither color nor depth attachments.
    NoAttachments,
    /// An attachment has zero width or height.
    ZeroSize,
    /// Attachments differ in size.
    SizeMismatch,
    /// Attachments differ in sample count.
    SampleCountMismatch,
    /// A color slot holds a depth format, or the depth slot a color format.
    FormatMismatch,
}

impl fmt::Display for Incompleteness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::NoAttachments => "no attachments",
            Self::ZeroSize => "zero-sized attachment",
            Self::SizeMismatch => "attachment sizes differ",
            Self::SampleCountMismatch => "attachment sample counts differ",
            Self::FormatMismatch => "attachment format does not fit its slot",
        };
        f.write_str(reason)
    }
}

/// Completeness check for an attachment set.
pub fn check_config(config: &RenderTargetConfig) -> Result<(), Incompleteness> {
    if !config.has_attachments() {
        return Err(Incompleteness::NoAttachments);
    }
    if config
        .color_attachments
        .iter()
        .any(|a| a.target.format().is_depth())
    {
        return Err(Incompleteness::FormatMismatch);
    }
    if let Some(depth) = &config.depth_stencil_attachment
        && !depth.target.format().is_depth()
    {
        return Err(Incompleteness::FormatMismatch);
    }

    let targets = config
        .color_attachments
        .iter()
        .map(|a| &a.target)
        .chain(config.depth_stencil_attachment.iter().map(|d| &d.target));

    let mut expected: Option<((u32, u32), u32)> = None;
    for target in targets {
        let size = target.size();
        if size.0 == 0 || size.1 == 0 {
            return Err(Incompleteness::ZeroSize);
        }
        let samples = target.sample_count();
        match expected {
            None => expected = Some((size, samples)),
            Some((s, _)) if s != size => return Err(Incompleteness::SizeMismatch),
            Some((_, n)) if n != samples => return Err(Incompleteness::SampleCountMismatch),
            Some(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::GraphicsInstance;
    use crate::types::{TextureDescriptor, TextureUsage};

    fn texture(
        device: &Arc<crate::GraphicsDevice>,
        size: u32,
        format: TextureFormat,
        samples: u32,
    ) -> Arc<Texture> {
        device
            .create_texture(
                &TextureDescriptor::new_2d(size, size, format, TextureUsage::RENDER_ATTACHMENT)
                    .with_sample_count(samples),
            )
            .unwrap()
    }

    #[test]
    fn test_check_config() {
        let device = GraphicsInstance::new().unwrap().create_device().unwrap();
        let color = texture(&device, 64, TextureFormat::Rgba16Float, 1);
        let depth = texture(&device, 64, TextureFormat::Depth32Float, 1);
        let small_depth = texture(&device, 32, TextureFormat::Depth32Float, 1);
        let msaa_depth = texture(&device, 64, TextureFormat::Depth32Float, 4);

        assert_eq!(
            check_config(&RenderTargetConfig::new()),
            Err(Incompleteness::NoAttachments)
        );

        let complete = RenderTargetConfig::new()
            .with_color(ColorAttachment::from_texture(color.clone()))
            .with_depth_stencil(DepthStencilAttachment::from_texture(depth.clone()));
        assert_eq!(check_config(&complete), Ok(()));

        let mismatched = RenderTargetConfig::new()
            .with_color(ColorAttachment::from_texture(color.clone()))
            .with_depth_stencil(DepthStencilAttachment::from_texture(small_depth));
        assert_eq!(check_config(&mismatched), Err(Incompleteness::SizeMismatch));

        let samples = RenderTargetConfig::new()
            .with_color(ColorAttachment::from_texture(color.clone()))
            .with_depth_stencil(DepthStencilAttachment::from_texture(msaa_depth));
        assert_eq!(
            check_config(&samples),
            Err(Incompleteness::SampleCountMismatch)
        );

        let swapped = RenderTargetConfig::new()
            .with_color(ColorAttachment::from_texture(depth))
            .with_depth_stencil(DepthStencilAttachment::from_texture(color));
        assert_eq!(check_config(&swapped), Err(Incompleteness::FormatMismatch));
    }
}
