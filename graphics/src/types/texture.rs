//! Texture types and descriptors.

use super::Extent3d;
use bitflags::bitflags;

/// Texture format enumeration.
///
/// Only the formats the renderer actually allocates are listed. `Rgb16Float`
/// is the three-channel HDR format cube maps are declared with; backends
/// without a native three-channel float format store it as `Rgba16Float`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum TextureFormat {
    /// 8-bit RGBA channels, unsigned normalized.
    #[default]
    Rgba8Unorm,
    /// 8-bit RGBA channels, sRGB.
    Rgba8UnormSrgb,
    /// 8-bit BGRA channels, unsigned normalized.
    Bgra8Unorm,
    /// 8-bit BGRA channels, sRGB.
    Bgra8UnormSrgb,
    /// 16-bit RG channels, float.
    Rg16Float,
    /// 16-bit RGB channels, float.
    Rgb16Float,
    /// 16-bit RGBA channels, float.
    Rgba16Float,
    /// 32-bit RGBA channels, float.
    Rgba32Float,
    /// 24-bit depth.
    Depth24Plus,
    /// 32-bit depth, float.
    Depth32Float,
}

impl TextureFormat {
    /// Returns true if this is a depth format.
    pub fn is_depth(&self) -> bool {
        matches!(self, Self::Depth24Plus | Self::Depth32Float)
    }

    /// Returns true for floating-point color formats.
    pub fn is_float(&self) -> bool {
        matches!(
            self,
            Self::Rg16Float | Self::Rgb16Float | Self::Rgba16Float | Self::Rgba32Float
        )
    }

    /// Returns the size in bytes per pixel.
    pub fn block_size(&self) -> u32 {
        match self {
            Self::Rg16Float
            | Self::Rgba8Unorm
            | Self::Rgba8UnormSrgb
            | Self::Bgra8Unorm
            | Self::Bgra8UnormSrgb
            | Self::Depth24Plus
            | Self::Depth32Float => 4,
            Self::Rgb16Float => 6,
            Self::Rgba16Float => 8,
            Self::Rgba32Float => 16,
        }
    }
}

/// Shape of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureDimension {
    /// Single 2D image.
    #[default]
    D2,
    /// Six square faces addressed by direction.
    Cube,
}

bitflags! {
    /// Usage flags for textures.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// Texture can be copied from.
        const COPY_SRC = 1 << 0;
        /// Texture can be copied to.
        const COPY_DST = 1 << 1;
        /// Texture can be sampled in a shader.
        const TEXTURE_BINDING = 1 << 2;
        /// Texture can be used as a render attachment.
        const RENDER_ATTACHMENT = 1 << 3;
    }
}

impl Default for TextureUsage {
    fn default() -> Self {
        Self::empty()
    }
}

/// Descriptor for creating a texture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    /// Debug label for the texture.
    pub label: Option<String>,
    /// Size of the texture. Cubes use `depth = 6`.
    pub size: Extent3d,
    /// Mip level count.
    pub mip_level_count: u32,
    /// Sample count for multisampling.
    pub sample_count: u32,
    /// Texture format.
    pub format: TextureFormat,
    /// Usage flags.
    pub usage: TextureUsage,
    /// 2D or cube.
    pub dimension: TextureDimension,
}

impl TextureDescriptor {
    /// Create a new 2D texture descriptor.
    pub fn new_2d(width: u32, height: u32, format: TextureFormat, usage: TextureUsage) -> Self {
        Self {
            label: None,
            size: Extent3d::new_2d(width, height),
            mip_level_count: 1,
            sample_count: 1,
            format,
            usage,
            dimension: TextureDimension::D2,
        }
    }

    /// Create a new cube texture descriptor with square faces.
    pub fn new_cube(face_size: u32, format: TextureFormat, usage: TextureUsage) -> Self {
        Self {
            label: None,
            size: Extent3d::new_3d(face_size, face_size, 6),
            mip_level_count: 1,
            sample_count: 1,
            format,
            usage,
            dimension: TextureDimension::Cube,
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the mip level count.
    pub fn with_mip_levels(mut self, count: u32) -> Self {
        self.mip_level_count = count;
        self
    }

    /// Set the sample count for multisampling.
    pub fn with_sample_count(mut self, count: u32) -> Self {
        self.sample_count = count;
        self
    }

    /// Number of array layers (6 for cubes).
    pub fn layer_count(&self) -> u32 {
        match self.dimension {
            TextureDimension::D2 => 1,
            TextureDimension::Cube => 6,
        }
    }

    /// Size of one layer at the given mip level.
    pub fn mip_size(&self, mip_level: u32) -> (u32, u32) {
        (
            (self.size.width >> mip_level).max(1),
            (self.size.height >> mip_level).max(1),
        )
    }
}

impl Default for TextureDescriptor {
    fn default() -> Self {
        Self::new_2d(0, 0, TextureFormat::default(), TextureUsage::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_descriptor() {
        let desc = TextureDescriptor::new_cube(
            128,
            TextureFormat::Rgb16Float,
            TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
        )
        .with_mip_levels(5);

        assert_eq!(desc.layer_count(), 6);
        assert_eq!(desc.mip_size(0), (128, 128));
        assert_eq!(desc.mip_size(4), (8, 8));
        assert_eq!(desc.mip_size(10), (1, 1));
    }

    #[test]
    fn test_format_properties() {
        assert!(TextureFormat::Depth24Plus.is_depth());
        assert!(!TextureFormat::Rgba16Float.is_depth());
        assert!(TextureFormat::Rg16Float.is_float());
        assert_eq!(TextureFormat::Rgba16Float.block_size(), 8);
    }
}
