//! Render target types for render passes.
//!
//! This module defines the types used to configure render targets (color and depth
//! attachments) for graphics passes.

use std::sync::Arc;

use crate::resources::{Texture, TextureId};
use crate::types::{ClearValue, TextureFormat};

/// Operation to perform when loading an attachment at the start of a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LoadOp {
    /// Clear the attachment with a specified value.
    Clear(ClearValue),
    /// Load the existing contents of the attachment.
    #[default]
    Load,
    /// Don't care about the existing contents (may be undefined).
    DontCare,
}

impl LoadOp {
    /// Create a clear operation with a color value.
    pub fn clear_color(rgba: [f32; 4]) -> Self {
        Self::Clear(ClearValue::from_rgba(rgba))
    }

    /// Create a clear operation with a depth value.
    pub fn clear_depth(depth: f32) -> Self {
        Self::Clear(ClearValue::depth(depth))
    }

    pub fn is_clear(&self) -> bool {
        matches!(self, Self::Clear(_))
    }
}

/// Operation to perform when storing an attachment at the end of a render pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StoreOp {
    /// Store the attachment contents for later use.
    #[default]
    Store,
    /// Don't care about the contents after the pass (may be discarded).
    DontCare,
}

/// A render target that can be rendered to.
///
/// Either one layer and mip of a texture, or the window surface.
#[derive(Debug, Clone)]
pub enum RenderTarget {
    /// Render to a texture subresource.
    Texture {
        /// The texture to render to.
        texture: Arc<Texture>,
        /// Mip level to render to (default: 0).
        mip_level: u32,
        /// Array layer to render to (cube face for cube textures).
        array_layer: u32,
    },
    /// Render to the current window surface image.
    Surface {
        /// The format of the surface texture.
        format: TextureFormat,
        /// Width of the surface.
        width: u32,
        /// Height of the surface.
        height: u32,
    },
}

impl RenderTarget {
    /// Create a render target from a texture.
    pub fn from_texture(texture: Arc<Texture>) -> Self {
        Self::Texture {
            texture,
            mip_level: 0,
            array_layer: 0,
        }
    }

    /// Target one face of a cube texture at a mip level.
    pub fn from_cube_face(texture: Arc<Texture>, face: u32, mip_level: u32) -> Self {
        Self::Texture {
            texture,
            mip_level,
            array_layer: face,
        }
    }

    /// Create a render target for the window surface.
    pub fn surface(format: TextureFormat, width: u32, height: u32) -> Self {
        Self::Surface {
            format,
            width,
            height,
        }
    }

    /// Get the format of the render target.
    pub fn format(&self) -> TextureFormat {
        match self {
            Self::Texture { texture, .. } => texture.format(),
            Self::Surface { format, .. } => *format,
        }
    }

    /// Size of the targeted subresource.
    pub fn size(&self) -> (u32, u32) {
        match self {
            Self::Texture {
                texture, mip_level, ..
            } => texture.mip_size(*mip_level),
            Self::Surface { width, height, .. } => (*width, *height),
        }
    }

    /// Sample count of the target.
    pub fn sample_count(&self) -> u32 {
        match self {
            Self::Texture { texture, .. } => texture.sample_count(),
            Self::Surface { .. } => 1,
        }
    }

    /// Id of the targeted texture, `None` for the surface.
    pub fn texture_id(&self) -> Option<TextureId> {
        match self {
            Self::Texture { texture, .. } => Some(texture.id()),
            Self::Surface { .. } => None,
        }
    }
}

/// A color attachment for a render pass.
#[derive(Debug, Clone)]
pub struct ColorAttachment {
    /// The render target.
    pub target: RenderTarget,
    /// Operation when loading the attachment.
    pub load_op: LoadOp,
    /// Operation when storing the attachment.
    pub store_op: StoreOp,
}

impl ColorAttachment {
    /// Create a new color attachment.
    pub fn new(target: RenderTarget) -> Self {
        Self {
            target,
            load_op: LoadOp::default(),
            store_op: StoreOp::default(),
        }
    }

    /// Create a color attachment from a texture.
    pub fn from_texture(texture: Arc<Texture>) -> Self {
        Self::new(RenderTarget::from_texture(texture))
    }

    /// Set the load operation.
    pub fn with_load_op(mut self, load_op: LoadOp) -> Self {
        self.load_op = load_op;
        self
    }

    /// Set a clear color.
    pub fn with_clear_color(mut self, rgba: [f32; 4]) -> Self {
        self.load_op = LoadOp::clear_color(rgba);
        self
    }
}

/// A depth attachment for a render pass.
#[derive(Debug, Clone)]
pub struct DepthStencilAttachment {
    /// The render target (must be a depth format).
    pub target: RenderTarget,
    /// Operation when loading the depth component.
    pub depth_load_op: LoadOp,
    /// Operation when storing the depth component.
    pub depth_store_op: StoreOp,
}

impl DepthStencilAttachment {
    /// Create a new depth attachment.
    pub fn new(target: RenderTarget) -> Self {
        Self {
            target,
            depth_load_op: LoadOp::default(),
            depth_store_op: StoreOp::default(),
        }
    }

    /// Create a depth attachment from a texture.
    pub fn from_texture(texture: Arc<Texture>) -> Self {
        Self::new(RenderTarget::from_texture(texture))
    }

    /// Clear depth to a specific value.
    pub fn with_clear_depth(mut self, depth: f32) -> Self {
        self.depth_load_op = LoadOp::clear_depth(depth);
        self
    }
}

/// Configuration for render pass targets.
///
/// This describes what the render pass will render to.
#[derive(Debug, Clone, Default)]
pub struct RenderTargetConfig {
    /// Color attachments for the render pass.
    pub color_attachments: Vec<ColorAttachment>,
    /// Optional depth attachment.
    pub depth_stencil_attachment: Option<DepthStencilAttachment>,
}

impl RenderTargetConfig {
    /// Create a new empty render target configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a color attachment.
    pub fn with_color(mut self, attachment: ColorAttachment) -> Self {
        self.color_attachments.push(attachment);
        self
    }

    /// Set the depth attachment.
    pub fn with_depth_stencil(mut self, attachment: DepthStencilAttachment) -> Self {
        self.depth_stencil_attachment = Some(attachment);
        self
    }

    /// Get the render area dimensions.
    ///
    /// Returns the dimensions of the first color attachment, or the depth attachment
    /// if no color attachments are present.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        if let Some(color) = self.color_attachments.first() {
            return Some(color.target.size());
        }
        self.depth_stencil_attachment
            .as_ref()
            .map(|depth| depth.target.size())
    }

    /// Check if this config has any attachments.
    pub fn has_attachments(&self) -> bool {
        !self.color_attachments.is_empty() || self.depth_stencil_attachment.is_some()
    }

    /// Set every attachment to clear on load.
    pub fn set_clear(&mut self, color: [f32; 4], depth: f32) {
        for attachment in &mut self.color_attachments {
            attachment.load_op = LoadOp::clear_color(color);
        }
        if let Some(depth_attachment) = &mut self.depth_stencil_attachment {
            depth_attachment.depth_load_op = LoadOp::clear_depth(depth);
        }
    }

    /// Set every attachment to load its previous contents.
    pub fn set_load(&mut self) {
        for attachment in &mut self.color_attachments {
            attachment.load_op = LoadOp::Load;
        }
        if let Some(depth_attachment) = &mut self.depth_stencil_attachment {
            depth_attachment.depth_load_op = LoadOp::Load;
        }
    }
}
