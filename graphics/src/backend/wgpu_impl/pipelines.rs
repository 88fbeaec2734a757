//! Bind group layouts and render pipelines for the program catalogue.
//!
//! Every program shares the uniform layout at group 0. Programs with texture
//! inputs get their own group 1 layout built from their texture slots.
//! Render pipelines depend on the attachments of the pass they run in, so
//! they are created on first use and cached per attachment layout.

use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::resources::{Program, ProgramId, ProgramKind, VertexInput};
use crate::shaders::{self, FRAGMENT_ENTRY, VERTEX_ENTRY};
use crate::uniforms::DrawUniforms;

use super::conversion::{convert_compare_function, convert_view_dimension};

const MESH_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

/// Bytes between consecutive mesh vertices.
pub(super) const MESH_STRIDE: u64 = 32;

/// Layouts shared by every program plus one texture layout per kind.
pub(super) struct ProgramLayouts {
    pub uniforms: wgpu::BindGroupLayout,
    textures: HashMap<ProgramKind, wgpu::BindGroupLayout>,
    pipelines: HashMap<ProgramKind, wgpu::PipelineLayout>,
}

impl ProgramLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniforms = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw_uniforms"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(DrawUniforms::SIZE as u64),
                },
                count: None,
            }],
        });

        let mut textures = HashMap::new();
        let mut pipelines = HashMap::new();
        for kind in ProgramKind::ALL {
            let texture_layout = Self::texture_layout(device, kind);
            let pipeline_layout = {
                let mut groups = vec![&uniforms];
                if let Some(layout) = &texture_layout {
                    groups.push(layout);
                }
                device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some(kind.label()),
                    bind_group_layouts: &groups,
                    immediate_size: 0,
                })
            };
            if let Some(layout) = texture_layout {
                textures.insert(kind, layout);
            }
            pipelines.insert(kind, pipeline_layout);
        }

        Self {
            uniforms,
            textures,
            pipelines,
        }
    }

    fn texture_layout(device: &wgpu::Device, kind: ProgramKind) -> Option<wgpu::BindGroupLayout> {
        let slots = kind.texture_slots();
        if slots.is_empty() {
            return None;
        }
        let entries: Vec<wgpu::BindGroupLayoutEntry> = slots
            .iter()
            .flat_map(|slot| {
                [
                    wgpu::BindGroupLayoutEntry {
                        binding: shaders::texture_binding(slot.unit),
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: convert_view_dimension(slot.dimension),
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: shaders::sampler_binding(slot.unit),
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ]
            })
            .collect();
        Some(
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(kind.label()),
                entries: &entries,
            }),
        )
    }

    /// Group 1 layout of a program, `None` if it samples nothing.
    pub fn textures(&self, kind: ProgramKind) -> Option<&wgpu::BindGroupLayout> {
        self.textures.get(&kind)
    }

    fn pipeline_layout(&self, kind: ProgramKind) -> Option<&wgpu::PipelineLayout> {
        self.pipelines.get(&kind)
    }
}

/// Attachment formats and sample count of a pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) struct TargetLayout {
    pub colors: Vec<wgpu::TextureFormat>,
    pub depth: Option<wgpu::TextureFormat>,
    pub samples: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramId,
    layout: TargetLayout,
}

#[derive(Default)]
pub(super) struct PipelineCache {
    pipelines: Mutex<HashMap<PipelineKey, Arc<wgpu::RenderPipeline>>>,
}

impl PipelineCache {
    /// Get the pipeline for a program in an attachment layout, building it
    /// on first use.
    pub fn get_or_create(
        &self,
        device: &wgpu::Device,
        layouts: &ProgramLayouts,
        program: &Program,
        module: &wgpu::ShaderModule,
        target: &TargetLayout,
    ) -> Option<Arc<wgpu::RenderPipeline>> {
        let kind = program.kind();
        let key = PipelineKey {
            program: program.id(),
            layout: target.clone(),
        };
        let mut pipelines = self.pipelines.lock();
        if let Some(pipeline) = pipelines.get(&key) {
            return Some(pipeline.clone());
        }

        let layout = layouts.pipeline_layout(kind)?;
        let pipeline = Arc::new(build_pipeline(device, layout, kind, module, target));
        log::debug!(
            "wgpu: built {} pipeline for {:?} / {:?} ({}x)",
            kind.label(),
            target.colors,
            target.depth,
            target.samples
        );
        pipelines.insert(key, pipeline.clone());
        Some(pipeline)
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    kind: ProgramKind,
    module: &wgpu::ShaderModule,
    target: &TargetLayout,
) -> wgpu::RenderPipeline {
    let mesh_layout = [wgpu::VertexBufferLayout {
        array_stride: MESH_STRIDE,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &MESH_ATTRIBUTES,
    }];
    let buffers: &[wgpu::VertexBufferLayout] = match kind.vertex_input() {
        VertexInput::Mesh => &mesh_layout,
        VertexInput::UnitCube | VertexInput::FullscreenQuad => &[],
    };

    // Attachments past the program's outputs stay untouched.
    let targets: Vec<Option<wgpu::ColorTargetState>> = target
        .colors
        .iter()
        .enumerate()
        .map(|(index, &format)| {
            Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: if (index as u32) < kind.color_outputs() {
                    wgpu::ColorWrites::ALL
                } else {
                    wgpu::ColorWrites::empty()
                },
            })
        })
        .collect();

    let depth_stencil = target.depth.map(|format| {
        let (depth_compare, depth_write_enabled) = match kind.depth_compare() {
            Some(compare) => (convert_compare_function(compare), kind.writes_depth()),
            None => (wgpu::CompareFunction::Always, false),
        };
        wgpu::DepthStencilState {
            format,
            depth_write_enabled,
            depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(kind.label()),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some(VERTEX_ENTRY),
            buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some(FRAGMENT_ENTRY),
            targets: &targets,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil,
        multisample: wgpu::MultisampleState {
            count: target.samples,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_layout_matches_vertex() {
        assert_eq!(
            MESH_STRIDE as usize,
            std::mem::size_of::<lumina_core::mesh::Vertex>()
        );
        let last = MESH_ATTRIBUTES[2];
        assert_eq!(last.offset + last.format.size(), MESH_STRIDE);
    }
}
