//! Window surface handling for the wgpu backend.

use std::sync::Arc;

use crate::error::GraphicsError;
use crate::types::TextureFormat;

use super::super::SurfaceWindow;
use super::WgpuBackend;
use super::conversion::surface_format;

/// A configured surface and the image acquired for the current frame.
pub(super) struct SurfaceState {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    current: Option<wgpu::SurfaceTexture>,
}

impl SurfaceState {
    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if (self.config.width, self.config.height) == (width, height) {
            return;
        }
        self.current = None;
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(device, &self.config);
        log::debug!("wgpu: surface reconfigured to {width}x{height}");
    }

    /// View of this frame's surface image, acquiring it if needed.
    ///
    /// Returns `None` when no image is available this frame; writes to the
    /// surface are then dropped.
    pub fn acquire(
        &mut self,
        device: &wgpu::Device,
    ) -> Result<Option<wgpu::TextureView>, GraphicsError> {
        if self.current.is_none() {
            match self.surface.get_current_texture() {
                Ok(texture) => {
                    if texture.suboptimal {
                        log::debug!("wgpu: suboptimal surface image");
                    }
                    self.current = Some(texture);
                }
                Err(wgpu::SurfaceError::Outdated) => {
                    log::debug!("wgpu: surface outdated, reconfiguring");
                    self.surface.configure(device, &self.config);
                    return Ok(None);
                }
                Err(wgpu::SurfaceError::Timeout) => {
                    log::warn!("wgpu: timed out acquiring surface image");
                    return Ok(None);
                }
                Err(wgpu::SurfaceError::Lost) => return Err(GraphicsError::SurfaceLost),
                Err(e) => {
                    return Err(GraphicsError::Internal(format!(
                        "acquiring surface image: {e}"
                    )));
                }
            }
        }
        Ok(self.current.as_ref().map(|texture| {
            texture
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default())
        }))
    }

    pub fn present(&mut self) {
        if let Some(texture) = self.current.take() {
            texture.present();
        }
    }
}

impl WgpuBackend {
    pub(super) fn attach_surface_impl(
        &self,
        window: Arc<dyn SurfaceWindow>,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<TextureFormat, GraphicsError> {
        let surface = self.instance.create_surface(window).map_err(|e| {
            GraphicsError::InitializationFailed(format!("Surface creation failed: {e}"))
        })?;

        let capabilities = surface.get_capabilities(&self.adapter);
        let (wgpu_format, format) = capabilities
            .formats
            .iter()
            .filter(|f| f.is_srgb())
            .chain(capabilities.formats.iter())
            .find_map(|&f| surface_format(f).map(|ours| (f, ours)))
            .ok_or_else(|| {
                GraphicsError::InitializationFailed(format!(
                    "no usable surface format in {:?}",
                    capabilities.formats
                ))
            })?;

        let present_mode = if vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        let alpha_mode = capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: wgpu_format,
            width: width.max(1),
            height: height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&self.device, &config);
        log::info!("wgpu: surface {width}x{height} {wgpu_format:?} ({present_mode:?})");

        *self.surface.lock() = Some(SurfaceState {
            surface,
            config,
            current: None,
        });
        Ok(format)
    }
}
