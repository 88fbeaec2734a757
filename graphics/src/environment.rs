//! Environment map sources.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lumina_core::texture::{CpuTexture, TexelFormat, load_equirect_hdr};

use crate::device::GraphicsDevice;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::GraphicsError;
use crate::resources::Texture;
use crate::types::{TextureDescriptor, TextureFormat, TextureUsage};

/// Size of the stand-in used when an environment cannot be loaded.
pub const PLACEHOLDER_SIZE: (u32, u32) = (64, 32);

/// An ordered list of equirectangular HDR files, decoded and uploaded on
/// first use.
#[derive(Debug, Default)]
pub struct EnvironmentLibrary {
    paths: Vec<PathBuf>,
    loaded: HashMap<usize, Arc<Texture>>,
}

impl EnvironmentLibrary {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
            loaded: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn path(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }

    /// Index after `index`, wrapping around.
    pub fn next_index(&self, index: usize) -> usize {
        if self.paths.is_empty() {
            0
        } else {
            (index + 1) % self.paths.len()
        }
    }

    /// Index before `index`, wrapping around.
    pub fn previous_index(&self, index: usize) -> usize {
        match self.paths.len() {
            0 => 0,
            len => (index + len - 1) % len,
        }
    }

    /// The uploaded equirectangular texture for `index`.
    ///
    /// A missing index, an undecodable file or an image the device cannot
    /// hold is reported as an [`AssetLoad`](DiagnosticKind::AssetLoad)
    /// diagnostic and a zeroed placeholder is returned instead.
    pub fn texture(
        &mut self,
        index: usize,
        device: &Arc<GraphicsDevice>,
        diagnostics: &Diagnostics,
    ) -> Result<Arc<Texture>, GraphicsError> {
        if let Some(texture) = self.loaded.get(&index) {
            return Ok(texture.clone());
        }

        let image = match self.paths.get(index) {
            Some(path) => load_equirect_hdr(path).unwrap_or_else(|err| {
                diagnostics.report(
                    DiagnosticKind::AssetLoad,
                    format!("environment '{}': {err}", path.display()),
                );
                CpuTexture::placeholder(PLACEHOLDER_SIZE.0, PLACEHOLDER_SIZE.1)
            }),
            None => {
                diagnostics.report(
                    DiagnosticKind::AssetLoad,
                    format!("no environment at index {index} ({} available)", self.len()),
                );
                CpuTexture::placeholder(PLACEHOLDER_SIZE.0, PLACEHOLDER_SIZE.1)
            }
        };

        let texture = match upload(device, &image) {
            Ok(texture) => texture,
            Err(err) => {
                diagnostics.report(
                    DiagnosticKind::AssetLoad,
                    format!(
                        "environment {index} ({}x{}) rejected by the device: {err}",
                        image.width, image.height
                    ),
                );
                upload(
                    device,
                    &CpuTexture::placeholder(PLACEHOLDER_SIZE.0, PLACEHOLDER_SIZE.1),
                )?
            }
        };
        self.loaded.insert(index, texture.clone());
        Ok(texture)
    }
}

fn upload(device: &Arc<GraphicsDevice>, image: &CpuTexture) -> Result<Arc<Texture>, GraphicsError> {
    let format = match image.format {
        TexelFormat::Rgba16Float => TextureFormat::Rgba16Float,
        TexelFormat::Rgba8Unorm => TextureFormat::Rgba8Unorm,
    };
    let mut descriptor = TextureDescriptor::new_2d(
        image.width,
        image.height,
        format,
        TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
    );
    if let Some(name) = &image.name {
        descriptor = descriptor.with_label(format!("equirect.{name}"));
    }
    let texture = device.create_texture(&descriptor)?;
    device.write_texture(&texture, image)?;
    Ok(texture)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::GraphicsInstance;

    #[test]
    fn test_missing_file_yields_placeholder() {
        let device = GraphicsInstance::new().unwrap().create_device().unwrap();
        let diagnostics = Diagnostics::default();
        let mut library = EnvironmentLibrary::new([PathBuf::from("does/not/exist.hdr")]);

        let texture = library.texture(0, &device, &diagnostics).unwrap();
        assert_eq!((texture.width(), texture.height()), PLACEHOLDER_SIZE);
        assert_eq!(diagnostics.count_of(DiagnosticKind::AssetLoad), 1);

        // Cached: no second report.
        let again = library.texture(0, &device, &diagnostics).unwrap();
        assert_eq!(again.id(), texture.id());
        assert_eq!(diagnostics.count(), 1);
    }

    #[test]
    fn test_index_wrapping() {
        let library = EnvironmentLibrary::new(["a.hdr", "b.hdr", "c.hdr"].map(PathBuf::from));
        assert_eq!(library.next_index(2), 0);
        assert_eq!(library.previous_index(0), 2);
        assert_eq!(EnvironmentLibrary::default().next_index(4), 0);
    }
}
