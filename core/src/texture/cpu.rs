//! Decoded pixel storage.

use half::f16;

/// Pixel layout of a [`CpuTexture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexelFormat {
    /// Four half-float channels.
    Rgba16Float,
    /// Four 8-bit normalized channels.
    Rgba8Unorm,
}

impl TexelFormat {
    /// Bytes per texel.
    pub fn block_size(self) -> u32 {
        match self {
            Self::Rgba16Float => 8,
            Self::Rgba8Unorm => 4,
        }
    }
}

/// CPU-side texture data ready for upload.
///
/// HDR sources are stored as packed half floats, which is what the
/// equirectangular source texture on the GPU expects.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuTexture {
    /// Optional debug name.
    pub name: Option<String>,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Texel layout of `data`.
    pub format: TexelFormat,
    /// Raw texel bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// True if this texture stands in for an asset that failed to load.
    pub placeholder: bool,
}

impl CpuTexture {
    /// Create a texture from raw bytes.
    pub fn new(width: u32, height: u32, format: TexelFormat, data: Vec<u8>) -> Self {
        debug_assert_eq!(
            data.len(),
            (width * height * format.block_size()) as usize,
            "texel data size does not match {width}x{height} {format:?}"
        );
        Self {
            name: None,
            width,
            height,
            format,
            data,
            placeholder: false,
        }
    }

    /// Pack RGBA f32 texels into half floats.
    pub fn from_rgba32f(width: u32, height: u32, texels: &[f32]) -> Self {
        let packed: Vec<f16> = texels.iter().map(|&v| f16::from_f32(v)).collect();
        Self::new(
            width,
            height,
            TexelFormat::Rgba16Float,
            bytemuck::cast_slice(&packed).to_vec(),
        )
    }

    /// A zero-filled texture used in place of an asset that could not be loaded.
    pub fn placeholder(width: u32, height: u32) -> Self {
        let format = TexelFormat::Rgba16Float;
        let mut texture = Self::new(
            width,
            height,
            format,
            vec![0; (width * height * format.block_size()) as usize],
        );
        texture.placeholder = true;
        texture.name = Some("placeholder".to_string());
        texture
    }

    /// Set the debug name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Bytes per row of texels.
    pub fn bytes_per_row(&self) -> u32 {
        self.width * self.format.block_size()
    }

    /// Read back one texel as f32 RGBA. Intended for tests and debugging.
    pub fn texel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y * self.width + x) * self.format.block_size()) as usize;
        let bytes = &self.data[offset..offset + self.format.block_size() as usize];
        Some(match self.format {
            TexelFormat::Rgba16Float => {
                let halfs: &[f16] = bytemuck::cast_slice(bytes);
                [
                    halfs[0].to_f32(),
                    halfs[1].to_f32(),
                    halfs[2].to_f32(),
                    halfs[3].to_f32(),
                ]
            }
            TexelFormat::Rgba8Unorm => [
                bytes[0] as f32 / 255.0,
                bytes[1] as f32 / 255.0,
                bytes[2] as f32 / 255.0,
                bytes[3] as f32 / 255.0,
            ],
        })
    }
}
