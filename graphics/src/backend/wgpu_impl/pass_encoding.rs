//! Pass encoding for the wgpu backend.
//!
//! A graph is encoded into one command buffer. Uniform blocks of every draw
//! are written up front into one buffer and selected per draw with a
//! dynamic offset.

use std::num::NonZeroU64;

use wgpu::util::DeviceExt;

use crate::error::GraphicsError;
use crate::graph::{
    CompiledGraph, DrawCommand, DrawKind, GraphicsPass, Pass, RenderGraph, RenderTarget,
    TransferOperation, TransferPass,
};
use crate::resources::ProgramKind;
use crate::shaders;
use crate::uniforms::DrawUniforms;

use super::super::{GpuMesh, GpuProgram, GpuSampler, GpuTexture};
use super::WgpuBackend;
use super::conversion::{convert_depth_load_op, convert_load_op, convert_store_op};
use super::pipelines::TargetLayout;

/// Uniform buffer of one graph.
struct UniformUpload {
    bind_group: wgpu::BindGroup,
    stride: u64,
}

/// An attachment view with the format and sample count it was created from.
struct AttachmentView {
    view: wgpu::TextureView,
    format: wgpu::TextureFormat,
    samples: u32,
}

/// View of one mip level of one layer, for use as an attachment.
fn subresource_view(texture: &wgpu::Texture, mip_level: u32, layer: u32) -> wgpu::TextureView {
    texture.create_view(&wgpu::TextureViewDescriptor {
        label: None,
        dimension: Some(wgpu::TextureViewDimension::D2),
        base_mip_level: mip_level,
        mip_level_count: Some(1),
        base_array_layer: layer,
        array_layer_count: Some(1),
        ..Default::default()
    })
}

fn targets_surface(pass: &GraphicsPass) -> bool {
    pass.render_targets().is_some_and(|config| {
        config
            .color_attachments
            .iter()
            .any(|a| matches!(a.target, RenderTarget::Surface { .. }))
    })
}

impl WgpuBackend {
    pub(super) fn execute_graph_impl(
        &self,
        graph: &RenderGraph,
        compiled: &CompiledGraph,
    ) -> Result<(), GraphicsError> {
        let passes: Vec<&Pass> = compiled
            .pass_order()
            .iter()
            .map(|handle| graph.pass(*handle))
            .collect();

        let uniforms = self.upload_uniforms(&passes);

        let surface_view = if passes
            .iter()
            .filter_map(|pass| pass.as_graphics())
            .any(targets_surface)
        {
            let mut surface = self.surface.lock();
            match surface.as_mut() {
                Some(state) => state
                    .acquire(&self.device)?
                    .map(|view| (view, state.format())),
                None => {
                    log::warn!("wgpu: graph writes the surface but none is attached");
                    None
                }
            }
        } else {
            None
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("RenderGraph Encoder"),
            });

        let mut draw_index = 0u64;
        for pass in passes {
            match pass {
                Pass::Graphics(graphics) => self.encode_graphics_pass(
                    &mut encoder,
                    graphics,
                    uniforms.as_ref(),
                    surface_view.as_ref(),
                    &mut draw_index,
                ),
                Pass::Transfer(transfer) => self.encode_transfer_pass(&mut encoder, transfer),
            }
        }

        let submission = self.queue.submit(std::iter::once(encoder.finish()));
        self.wait_for(submission)
    }

    fn upload_uniforms(&self, passes: &[&Pass]) -> Option<UniformUpload> {
        let draws: Vec<&DrawUniforms> = passes
            .iter()
            .filter_map(|pass| pass.as_graphics())
            .flat_map(|pass| pass.draw_commands().iter().map(|draw| &draw.uniforms))
            .collect();
        if draws.is_empty() {
            return None;
        }

        let stride = self.uniform_stride;
        let mut contents = vec![0u8; draws.len() * stride as usize];
        for (index, uniforms) in draws.iter().enumerate() {
            let offset = index * stride as usize;
            contents[offset..offset + DrawUniforms::SIZE]
                .copy_from_slice(bytemuck::bytes_of(*uniforms));
        }

        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("draw_uniforms"),
                contents: &contents,
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw_uniforms"),
            layout: &self.layouts.uniforms,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(DrawUniforms::SIZE as u64),
                }),
            }],
        });
        Some(UniformUpload { bind_group, stride })
    }

    fn attachment_view(
        target: &RenderTarget,
        surface: Option<&(wgpu::TextureView, wgpu::TextureFormat)>,
    ) -> Option<AttachmentView> {
        match target {
            RenderTarget::Texture {
                texture,
                mip_level,
                array_layer,
            } => {
                let GpuTexture::Wgpu { texture, .. } = texture.gpu_handle() else {
                    return None;
                };
                Some(AttachmentView {
                    view: subresource_view(&texture, *mip_level, *array_layer),
                    format: texture.format(),
                    samples: texture.sample_count(),
                })
            }
            RenderTarget::Surface { .. } => surface.map(|(view, format)| AttachmentView {
                view: view.clone(),
                format: *format,
                samples: 1,
            }),
        }
    }

    fn encode_graphics_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pass: &GraphicsPass,
        uniforms: Option<&UniformUpload>,
        surface: Option<&(wgpu::TextureView, wgpu::TextureFormat)>,
        draw_index: &mut u64,
    ) {
        let first_draw = *draw_index;
        *draw_index += pass.draw_commands().len() as u64;

        let Some(config) = pass.render_targets() else {
            return;
        };
        let clears = config.color_attachments.iter().any(|a| a.load_op.is_clear())
            || config
                .depth_stencil_attachment
                .as_ref()
                .is_some_and(|d| d.depth_load_op.is_clear());
        if !clears && !pass.has_draws() {
            return;
        }

        let mut colors = Vec::with_capacity(config.color_attachments.len());
        for attachment in &config.color_attachments {
            let Some(view) = Self::attachment_view(&attachment.target, surface) else {
                log::debug!("wgpu: pass '{}' has no view for an attachment, skipped", pass.name());
                return;
            };
            colors.push((view, attachment));
        }
        let depth = match &config.depth_stencil_attachment {
            Some(attachment) => match Self::attachment_view(&attachment.target, None) {
                Some(view) => Some((view, attachment)),
                None => return,
            },
            None => None,
        };

        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = colors
            .iter()
            .map(|(view, attachment)| {
                Some(wgpu::RenderPassColorAttachment {
                    view: &view.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: convert_load_op(&attachment.load_op),
                        store: convert_store_op(&attachment.store_op),
                    },
                    depth_slice: None,
                })
            })
            .collect();
        let depth_stencil_attachment =
            depth
                .as_ref()
                .map(|(view, attachment)| wgpu::RenderPassDepthStencilAttachment {
                    view: &view.view,
                    depth_ops: Some(wgpu::Operations {
                        load: convert_depth_load_op(&attachment.depth_load_op),
                        store: convert_store_op(&attachment.depth_store_op),
                    }),
                    stencil_ops: None,
                });

        let layout = TargetLayout {
            colors: colors.iter().map(|(view, _)| view.format).collect(),
            depth: depth.as_ref().map(|(view, _)| view.format),
            samples: colors
                .first()
                .map(|(view, _)| view.samples)
                .or_else(|| depth.as_ref().map(|(view, _)| view.samples))
                .unwrap_or(1),
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(pass.name()),
            color_attachments: &color_attachments,
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if let Some(vp) = pass.viewport() {
            render_pass.set_viewport(vp.x, vp.y, vp.width, vp.height, vp.min_depth, vp.max_depth);
        } else if let Some((width, height)) = config.dimensions() {
            render_pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
        }

        let Some(uniforms) = uniforms else {
            return;
        };
        for (offset, draw) in pass.draw_commands().iter().enumerate() {
            let dynamic_offset = (first_draw + offset as u64) * uniforms.stride;
            self.encode_draw(&mut render_pass, draw, &layout, uniforms, dynamic_offset);
        }
    }

    fn encode_draw(
        &self,
        render_pass: &mut wgpu::RenderPass<'_>,
        draw: &DrawCommand,
        layout: &TargetLayout,
        uniforms: &UniformUpload,
        dynamic_offset: u64,
    ) {
        let kind = draw.program.kind();
        if !draw.program.is_valid() {
            log::trace!("wgpu: skipping draw with invalid program {}", kind.label());
            return;
        }
        let GpuProgram::Wgpu(module) = draw.program.gpu_handle() else {
            return;
        };

        let Some(pipeline) =
            self.pipelines
                .get_or_create(&self.device, &self.layouts, &draw.program, module, layout)
        else {
            return;
        };

        render_pass.set_pipeline(&pipeline);
        render_pass.set_bind_group(
            shaders::UNIFORM_GROUP,
            &uniforms.bind_group,
            &[dynamic_offset as u32],
        );
        if let Some(textures) = self.texture_bind_group(kind, draw) {
            render_pass.set_bind_group(shaders::TEXTURE_GROUP, &textures, &[]);
        }

        let instances = 0..draw.instance_count;
        match &draw.kind {
            DrawKind::Mesh(mesh) => {
                let GpuMesh::Wgpu { vertices, indices } = mesh.gpu_handle() else {
                    return;
                };
                render_pass.set_vertex_buffer(0, vertices.slice(..));
                match indices {
                    Some(indices) => {
                        render_pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                        render_pass.draw_indexed(0..draw.kind.vertex_count(), 0, instances);
                    }
                    None => render_pass.draw(0..draw.kind.vertex_count(), instances),
                }
            }
            DrawKind::UnitCube | DrawKind::FullscreenQuad => {
                render_pass.draw(0..draw.kind.vertex_count(), instances);
            }
        }
    }

    /// Group 1 bind group of a draw. Declared units with nothing bound read
    /// a black fallback.
    fn texture_bind_group(&self, kind: ProgramKind, draw: &DrawCommand) -> Option<wgpu::BindGroup> {
        let layout = self.layouts.textures(kind)?;
        let slots = kind.texture_slots();

        let bound: Vec<(Option<GpuTexture>, Option<GpuSampler>)> = slots
            .iter()
            .map(|slot| match draw.texture_at(slot.unit) {
                Some(binding) if binding.texture.dimension() == slot.dimension => (
                    Some(binding.texture.gpu_handle()),
                    Some(binding.sampler.gpu_handle().clone()),
                ),
                Some(binding) => {
                    log::warn!(
                        "wgpu: {} unit {} expects {:?}, got {:?}",
                        kind.label(),
                        slot.unit,
                        slot.dimension,
                        binding.texture.dimension()
                    );
                    (None, None)
                }
                None => (None, None),
            })
            .collect();

        let mut entries = Vec::with_capacity(slots.len() * 2);
        for (slot, (texture, sampler)) in slots.iter().zip(&bound) {
            let view = match texture {
                Some(GpuTexture::Wgpu { view, .. }) => view.as_ref(),
                _ => self.fallbacks.view(slot.dimension),
            };
            let sampler = match sampler {
                Some(GpuSampler::Wgpu(sampler)) => sampler.as_ref(),
                _ => &self.fallbacks.sampler,
            };
            entries.push(wgpu::BindGroupEntry {
                binding: shaders::texture_binding(slot.unit),
                resource: wgpu::BindingResource::TextureView(view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: shaders::sampler_binding(slot.unit),
                resource: wgpu::BindingResource::Sampler(sampler),
            });
        }

        Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(kind.label()),
            layout,
            entries: &entries,
        }))
    }

    fn encode_transfer_pass(&self, encoder: &mut wgpu::CommandEncoder, pass: &TransferPass) {
        for operation in pass.operations() {
            let TransferOperation::Resolve { src, dst } = operation;
            let (GpuTexture::Wgpu { texture: src, .. }, GpuTexture::Wgpu { texture: dst, .. }) =
                (src.gpu_handle(), dst.gpu_handle())
            else {
                continue;
            };
            if src.sample_count() == 1 {
                log::warn!("wgpu: resolve source in '{}' is not multisampled", pass.name());
                continue;
            }

            let src_view = subresource_view(&src, 0, 0);
            let dst_view = subresource_view(&dst, 0, 0);
            let _resolve = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(pass.name()),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &src_view,
                    resolve_target: Some(&dst_view),
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }
    }
}
