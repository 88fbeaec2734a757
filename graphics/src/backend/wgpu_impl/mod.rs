//! wgpu GPU backend implementation.
//!
//! This backend uses wgpu for cross-platform GPU access, supporting
//! Vulkan, Metal, DX12, and WebGPU. Programs are WGSL modules from
//! [`shaders`](crate::shaders); render pipelines are derived from them per
//! attachment layout and cached.

pub(crate) mod conversion;
mod pass_encoding;
mod pipelines;
mod resources;
mod surface;
mod timer;

use std::sync::Arc;

use lumina_core::mesh::CpuMesh;
use lumina_core::texture::CpuTexture;
use parking_lot::Mutex;

use crate::error::GraphicsError;
use crate::graph::{CompiledGraph, RenderGraph};
use crate::resources::ProgramKind;
use crate::shaders;
use crate::types::{SamplerDescriptor, TextureDescriptor, TextureFormat};
use crate::uniforms::DrawUniforms;

use super::{GpuBackend, GpuMesh, GpuProgram, GpuQuery, GpuSampler, GpuTexture, SurfaceWindow};
use pipelines::ProgramLayouts;
use resources::Fallbacks;
use surface::SurfaceState;
use timer::TimerQueries;

/// Sample counts tried, highest first, when a target asks for multisampling.
const SAMPLE_COUNTS: [u32; 4] = [8, 4, 2, 1];

/// wgpu-based GPU backend.
pub struct WgpuBackend {
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    layouts: ProgramLayouts,
    pipelines: pipelines::PipelineCache,
    fallbacks: Fallbacks,
    /// Distance between consecutive draws in the per-graph uniform buffer.
    uniform_stride: u64,
    /// Highest sample count every renderable format supports.
    max_samples: u32,
    surface: Mutex<Option<SurfaceState>>,
    timer: TimerQueries,
}

impl std::fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("adapter", &self.adapter.get_info().name)
            .field("max_samples", &self.max_samples)
            .finish()
    }
}

impl WgpuBackend {
    /// Create a new wgpu backend.
    ///
    /// `WGPU_BACKEND` restricts the native API and the wgpu debug variables
    /// (`WGPU_VALIDATION`, `WGPU_DEBUG`) are honored.
    pub fn new() -> Result<Self, GraphicsError> {
        let backends = wgpu::Backends::from_env().unwrap_or(wgpu::Backends::all());
        let flags = wgpu::InstanceFlags::from_build_config().with_env();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            flags,
            backend_options: wgpu::BackendOptions::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| {
            GraphicsError::InitializationFailed(format!("No compatible GPU adapter: {e}"))
        })?;

        log::info!("wgpu adapter: {:?}", adapter.get_info());

        let wanted = wgpu::Features::TIMESTAMP_QUERY
            | wgpu::Features::TIMESTAMP_QUERY_INSIDE_ENCODERS
            | wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;
        let required_features = adapter.features() & wanted;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Lumina Device"),
            required_features,
            required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| {
            GraphicsError::InitializationFailed(format!("Device creation failed: {e}"))
        })?;

        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let uniform_stride = (DrawUniforms::SIZE as u64).div_ceil(alignment) * alignment;
        let max_samples = Self::max_common_samples(&adapter, required_features);
        log::debug!("wgpu: uniform stride {uniform_stride} bytes, up to {max_samples}x MSAA");

        let layouts = ProgramLayouts::new(&device);
        let fallbacks = Fallbacks::new(&device, &queue);
        let timer = TimerQueries::new(&device, &queue, required_features);

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            layouts,
            pipelines: pipelines::PipelineCache::default(),
            fallbacks,
            uniform_stride,
            max_samples,
            surface: Mutex::new(None),
            timer,
        })
    }

    fn max_common_samples(adapter: &wgpu::Adapter, features: wgpu::Features) -> u32 {
        if !features.contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES) {
            return 4;
        }
        let formats = [
            wgpu::TextureFormat::Rgba16Float,
            wgpu::TextureFormat::Depth24Plus,
        ];
        SAMPLE_COUNTS
            .into_iter()
            .find(|&count| {
                formats.iter().all(|&format| {
                    adapter
                        .get_texture_format_features(format)
                        .flags
                        .sample_count_supported(count)
                })
            })
            .unwrap_or(1)
    }

    /// Get the wgpu instance.
    pub fn instance(&self) -> &wgpu::Instance {
        &self.instance
    }

    /// Get the wgpu adapter.
    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    /// Get the wgpu device.
    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    /// Get the wgpu queue.
    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    /// Block until the given submission finished.
    fn wait_for(&self, submission: wgpu::SubmissionIndex) -> Result<(), GraphicsError> {
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: Some(submission),
                timeout: Some(std::time::Duration::from_secs(10)),
            })
            .map(|_| ())
            .map_err(|_| GraphicsError::DeviceLost)
    }
}

impl GpuBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "wgpu Backend"
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<GpuTexture, GraphicsError> {
        self.create_texture_impl(descriptor)
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<GpuSampler, GraphicsError> {
        Ok(self.create_sampler_impl(descriptor))
    }

    fn create_program(&self, kind: ProgramKind) -> Result<GpuProgram, GraphicsError> {
        shaders::validate(kind)?;
        let source = shaders::source(kind);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(kind.label()),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
        log::debug!("wgpu: built program {}", kind.label());
        Ok(GpuProgram::Wgpu(Arc::new(module)))
    }

    fn create_mesh(&self, mesh: &CpuMesh) -> Result<GpuMesh, GraphicsError> {
        Ok(self.create_mesh_impl(mesh))
    }

    fn write_texture(
        &self,
        texture: &GpuTexture,
        descriptor: &TextureDescriptor,
        data: &CpuTexture,
    ) -> Result<(), GraphicsError> {
        self.write_texture_impl(texture, descriptor, data)
    }

    fn execute_graph(
        &self,
        graph: &RenderGraph,
        compiled: &CompiledGraph,
    ) -> Result<(), GraphicsError> {
        self.execute_graph_impl(graph, compiled)
    }

    fn attach_surface(
        &self,
        window: Arc<dyn SurfaceWindow>,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<TextureFormat, GraphicsError> {
        self.attach_surface_impl(window, width, height, vsync)
    }

    fn resize_surface(&self, width: u32, height: u32) -> Result<(), GraphicsError> {
        if let Some(state) = self.surface.lock().as_mut() {
            state.resize(&self.device, width, height);
        }
        Ok(())
    }

    fn present(&self) -> Result<(), GraphicsError> {
        if let Some(state) = self.surface.lock().as_mut() {
            state.present();
        }
        Ok(())
    }

    fn create_query(&self) -> Result<GpuQuery, GraphicsError> {
        Ok(GpuQuery::Wgpu(self.timer.create()))
    }

    fn begin_query(&self, query: GpuQuery) {
        if let GpuQuery::Wgpu(slot) = query {
            self.timer.begin(&self.device, &self.queue, slot);
        }
    }

    fn end_query(&self, query: GpuQuery) {
        if let GpuQuery::Wgpu(slot) = query {
            self.timer.end(&self.device, &self.queue, slot);
        }
    }

    fn query_result(&self, query: GpuQuery) -> Option<u64> {
        match query {
            GpuQuery::Wgpu(slot) => self.timer.result(&self.device, slot),
            GpuQuery::Dummy(_) => None,
        }
    }
}

static_assertions::assert_impl_all!(WgpuBackend: Send, Sync);
