//! Radiance HDR loading for equirectangular environment maps.

use std::fmt;
use std::path::Path;

use super::CpuTexture;

/// Errors raised while loading a texture from disk.
#[derive(Debug)]
pub enum TextureLoadError {
    /// The file could not be read.
    Io(std::io::Error),
    /// The file was read but could not be decoded.
    Decode(String),
}

impl fmt::Display for TextureLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read image: {err}"),
            Self::Decode(msg) => write!(f, "failed to decode HDR image: {msg}"),
        }
    }
}

impl std::error::Error for TextureLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Decode(_) => None,
        }
    }
}

impl From<std::io::Error> for TextureLoadError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Load an equirectangular HDR image from disk.
pub fn load_equirect_hdr(path: impl AsRef<Path>) -> Result<CpuTexture, TextureLoadError> {
    let path = path.as_ref();
    log::info!("Loading HDR environment from {}", path.display());
    let bytes = std::fs::read(path)?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "environment".to_string());
    Ok(load_equirect_hdr_from_memory(&bytes)?.with_name(name))
}

/// Decode an equirectangular HDR image already in memory.
pub fn load_equirect_hdr_from_memory(bytes: &[u8]) -> Result<CpuTexture, TextureLoadError> {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Hdr)
        .map_err(|e| TextureLoadError::Decode(e.to_string()))?;

    let width = img.width();
    let height = img.height();
    log::info!("HDR image: {}x{}", width, height);

    let rgba = img.to_rgba32f().into_raw();
    Ok(CpuTexture::from_rgba32f(width, height, &rgba))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_equirect_hdr("does/not/exist.hdr").unwrap_err();
        assert!(matches!(err, TextureLoadError::Io(_)));
        assert!(err.to_string().starts_with("failed to read image"));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let err = load_equirect_hdr_from_memory(b"not an hdr").unwrap_err();
        assert!(matches!(err, TextureLoadError::Decode(_)));
    }

    #[test]
    fn test_decodes_minimal_radiance_file() {
        // 2x1 flat (uncompressed) RGBE scanline.
        let mut bytes = b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y 1 +X 2\n".to_vec();
        bytes.extend_from_slice(&[128, 128, 128, 129, 0, 0, 0, 0]);
        let texture = load_equirect_hdr_from_memory(&bytes).unwrap();
        assert_eq!((texture.width, texture.height), (2, 1));
        let texel = texture.texel(0, 0).unwrap();
        assert!((texel[0] - 1.0).abs() < 0.01);
        assert_eq!(texture.texel(1, 0).unwrap()[0], 0.0);
    }
}
