//! Resource creation for the wgpu backend.

use std::sync::Arc;

use lumina_core::mesh::CpuMesh;
use lumina_core::texture::{CpuTexture, TexelFormat};
use wgpu::util::DeviceExt;

use crate::error::GraphicsError;
use crate::types::{SamplerDescriptor, TextureDescriptor, TextureDimension};

use super::super::{GpuMesh, GpuSampler, GpuTexture};
use super::WgpuBackend;
use super::conversion::{
    convert_address_mode, convert_filter_mode, convert_mipmap_filter_mode, convert_texture_format,
    convert_texture_usage, convert_view_dimension,
};

/// Black 1x1 textures bound at declared units that have nothing bound.
pub(super) struct Fallbacks {
    pub d2: wgpu::TextureView,
    pub cube: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Fallbacks {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let black = |label: &str, layers: u32, dimension: wgpu::TextureViewDimension| {
            let texture = device.create_texture_with_data(
                queue,
                &wgpu::TextureDescriptor {
                    label: Some(label),
                    size: wgpu::Extent3d {
                        width: 1,
                        height: 1,
                        depth_or_array_layers: layers,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: wgpu::TextureFormat::Rgba8Unorm,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING,
                    view_formats: &[],
                },
                wgpu::util::TextureDataOrder::LayerMajor,
                &vec![0, 0, 0, 255].repeat(layers as usize),
            );
            texture.create_view(&wgpu::TextureViewDescriptor {
                dimension: Some(dimension),
                ..Default::default()
            })
        };

        Self {
            d2: black("fallback_2d", 1, wgpu::TextureViewDimension::D2),
            cube: black("fallback_cube", 6, wgpu::TextureViewDimension::Cube),
            sampler: device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("fallback"),
                ..Default::default()
            }),
        }
    }

    pub fn view(&self, dimension: TextureDimension) -> &wgpu::TextureView {
        match dimension {
            TextureDimension::D2 => &self.d2,
            TextureDimension::Cube => &self.cube,
        }
    }
}

impl WgpuBackend {
    pub(super) fn create_texture_impl(
        &self,
        descriptor: &TextureDescriptor,
    ) -> Result<GpuTexture, GraphicsError> {
        let format = convert_texture_format(descriptor.format);
        let usage = convert_texture_usage(descriptor.usage);

        let layers = match descriptor.dimension {
            TextureDimension::D2 => 1,
            TextureDimension::Cube => 6,
        };

        let sample_count = descriptor.sample_count.min(self.max_samples);
        if sample_count != descriptor.sample_count {
            log::warn!(
                "wgpu: {:?} asked for {}x MSAA, using {}x",
                descriptor.label,
                descriptor.sample_count,
                sample_count
            );
        }

        let limit = self.device.limits().max_texture_dimension_2d;
        if descriptor.size.width > limit || descriptor.size.height > limit {
            return Err(GraphicsError::ResourceCreationFailed(format!(
                "{:?}: {}x{} exceeds the device limit of {limit}",
                descriptor.label, descriptor.size.width, descriptor.size.height
            )));
        }

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: descriptor.label.as_deref(),
            size: wgpu::Extent3d {
                width: descriptor.size.width,
                height: descriptor.size.height,
                depth_or_array_layers: layers,
            },
            mip_level_count: descriptor.mip_level_count,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: descriptor.label.as_deref(),
            dimension: Some(convert_view_dimension(descriptor.dimension)),
            ..Default::default()
        });

        Ok(GpuTexture::Wgpu {
            texture: Arc::new(texture),
            view: Arc::new(view),
        })
    }

    pub(super) fn create_sampler_impl(&self, descriptor: &SamplerDescriptor) -> GpuSampler {
        let address_mode = convert_address_mode(descriptor.address_mode);
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: descriptor.label.as_deref(),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: convert_filter_mode(descriptor.mag_filter),
            min_filter: convert_filter_mode(descriptor.min_filter),
            mipmap_filter: convert_mipmap_filter_mode(descriptor.mipmap_filter),
            lod_min_clamp: descriptor.lod_min_clamp,
            lod_max_clamp: descriptor.lod_max_clamp,
            compare: None,
            anisotropy_clamp: 1,
            border_color: None,
        });
        GpuSampler::Wgpu(Arc::new(sampler))
    }

    pub(super) fn create_mesh_impl(&self, mesh: &CpuMesh) -> GpuMesh {
        let label = mesh.label();
        let vertices = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label,
                contents: mesh.vertex_bytes(),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let indices = mesh.index_bytes().map(|bytes| {
            Arc::new(
                self.device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label,
                        contents: bytes,
                        usage: wgpu::BufferUsages::INDEX,
                    }),
            )
        });
        GpuMesh::Wgpu {
            vertices: Arc::new(vertices),
            indices,
        }
    }

    pub(super) fn write_texture_impl(
        &self,
        texture: &GpuTexture,
        descriptor: &TextureDescriptor,
        data: &CpuTexture,
    ) -> Result<(), GraphicsError> {
        let GpuTexture::Wgpu {
            texture: wgpu_texture,
            ..
        } = texture
        else {
            return Err(GraphicsError::InvalidParameter(
                "texture was not created by the wgpu backend".to_string(),
            ));
        };

        let (width, height) = descriptor.mip_size(0);
        if (data.width, data.height) != (width, height) {
            return Err(GraphicsError::InvalidParameter(format!(
                "upload of {}x{} into {}x{} texture",
                data.width, data.height, width, height
            )));
        }

        let expected = match data.format {
            TexelFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
            TexelFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        };
        if wgpu_texture.format().remove_srgb_suffix() != expected {
            return Err(GraphicsError::InvalidParameter(format!(
                "{:?} texels cannot be uploaded into a {:?} texture",
                data.format,
                wgpu_texture.format()
            )));
        }

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: wgpu_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(data.bytes_per_row()),
                rows_per_image: Some(data.height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        log::trace!("wgpu: uploaded {}x{} texels into {:?}", width, height, descriptor.label);
        Ok(())
    }
}
