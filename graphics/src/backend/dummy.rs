//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't perform actual GPU operations. It keeps a trace of
//! every executed pass (targets written, programs run, textures bound at each
//! unit) so the frame and precomputation orchestration can be checked
//! without GPU hardware.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use lumina_core::mesh::CpuMesh;
use lumina_core::texture::CpuTexture;
use parking_lot::Mutex;

use crate::error::GraphicsError;
use crate::graph::{
    CompiledGraph, DrawCommand, GraphicsPass, Pass, RenderGraph, RenderTarget, TransferOperation,
};
use crate::resources::{ProgramKind, TextureId};
use crate::types::{SamplerDescriptor, TextureDescriptor, TextureFormat, Viewport};
use crate::uniforms::DrawUniforms;

use super::{GpuBackend, GpuMesh, GpuProgram, GpuQuery, GpuSampler, GpuTexture, SurfaceWindow};

/// Something a pass wrote to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteTarget {
    /// One mip level of one layer of a texture.
    Texture(Subresource),
    /// The window surface.
    Surface,
}

/// A single (texture, mip, layer) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subresource {
    pub texture: TextureId,
    pub mip: u32,
    pub layer: u32,
}

/// Kind of an executed pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutedPassKind {
    Graphics,
    Transfer,
}

/// One draw as the backend saw it.
#[derive(Debug, Clone)]
pub struct ExecutedDraw {
    pub program: ProgramKind,
    /// Label of the submitted geometry.
    pub geometry: String,
    /// Texture bound at each unit, sorted by unit.
    pub units: Vec<(u32, TextureId)>,
    pub uniforms: DrawUniforms,
}

impl ExecutedDraw {
    /// Texture bound at a unit, if any.
    pub fn unit(&self, unit: u32) -> Option<TextureId> {
        self.units.iter().find(|(u, _)| *u == unit).map(|(_, t)| *t)
    }
}

/// One pass as the backend executed it.
#[derive(Debug, Clone)]
pub struct ExecutedPass {
    pub name: String,
    pub kind: ExecutedPassKind,
    /// Attachments (or resolve destinations) written.
    pub writes: Vec<WriteTarget>,
    /// Draws that ran. Draws with an invalid program are not listed.
    pub draws: Vec<ExecutedDraw>,
    /// Viewport the pass rasterized into. `None` for transfers and for
    /// graphics passes that cover their full target.
    pub viewport: Option<Viewport>,
    /// Size of the bound depth attachment.
    pub depth_size: Option<(u32, u32)>,
}

impl ExecutedPass {
    /// Whether the pass wrote the given texture at any subresource.
    pub fn writes_texture(&self, texture: TextureId) -> bool {
        self.writes
            .iter()
            .any(|w| matches!(w, WriteTarget::Texture(s) if s.texture == texture))
    }

    pub fn writes_surface(&self) -> bool {
        self.writes.contains(&WriteTarget::Surface)
    }
}

#[derive(Debug, Default)]
struct QueryState {
    started: Option<Instant>,
    elapsed: Option<u64>,
}

#[derive(Debug, Default)]
struct DummyState {
    trace: Vec<ExecutedPass>,
    written: HashMap<TextureId, BTreeSet<(u32, u32)>>,
    failing_programs: HashSet<ProgramKind>,
    failing_submissions: bool,
    skipped_draws: usize,
    uploads: usize,
    presented: u64,
    surface: Option<(u32, u32)>,
    queries: Vec<QueryState>,
}

/// Dummy GPU backend.
#[derive(Debug, Default)]
pub struct DummyBackend {
    state: Mutex<DummyState>,
}

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later build of `kind` fail.
    pub fn fail_program(&self, kind: ProgramKind) {
        self.state.lock().failing_programs.insert(kind);
    }

    /// Make graph submissions fail until called again with `false`.
    pub fn fail_submissions(&self, fail: bool) {
        self.state.lock().failing_submissions = fail;
    }

    /// Every pass executed since the last [`take_trace`](Self::take_trace).
    pub fn trace(&self) -> Vec<ExecutedPass> {
        self.state.lock().trace.clone()
    }

    /// Drain the executed pass trace.
    pub fn take_trace(&self) -> Vec<ExecutedPass> {
        std::mem::take(&mut self.state.lock().trace)
    }

    /// Every (mip, layer) of a texture written so far.
    pub fn written_subresources(&self, texture: TextureId) -> BTreeSet<(u32, u32)> {
        self.state
            .lock()
            .written
            .get(&texture)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of draws dropped because their program was invalid.
    pub fn skipped_draws(&self) -> usize {
        self.state.lock().skipped_draws
    }

    /// Number of CPU texture uploads.
    pub fn upload_count(&self) -> usize {
        self.state.lock().uploads
    }

    /// Number of presented frames.
    pub fn presented_frames(&self) -> u64 {
        self.state.lock().presented
    }

    /// Current surface size, if a surface is attached.
    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.state.lock().surface
    }

    fn record_target(state: &mut DummyState, target: &RenderTarget, writes: &mut Vec<WriteTarget>) {
        let write = match target {
            RenderTarget::Texture {
                texture,
                mip_level,
                array_layer,
            } => {
                state
                    .written
                    .entry(texture.id())
                    .or_default()
                    .insert((*mip_level, *array_layer));
                WriteTarget::Texture(Subresource {
                    texture: texture.id(),
                    mip: *mip_level,
                    layer: *array_layer,
                })
            }
            RenderTarget::Surface { .. } => WriteTarget::Surface,
        };
        if !writes.contains(&write) {
            writes.push(write);
        }
    }

    fn execute_draw(state: &mut DummyState, draw: &DrawCommand) -> Option<ExecutedDraw> {
        if !draw.program.is_valid() {
            state.skipped_draws += 1;
            log::trace!(
                "DummyBackend: skipping draw with invalid program {}",
                draw.program.kind().label()
            );
            return None;
        }
        Some(ExecutedDraw {
            program: draw.program.kind(),
            geometry: draw.kind.label().to_string(),
            units: draw
                .textures
                .iter()
                .map(|(unit, binding)| (*unit, binding.texture.id()))
                .collect(),
            uniforms: draw.uniforms,
        })
    }

    fn execute_graphics_pass(state: &mut DummyState, pass: &GraphicsPass) -> ExecutedPass {
        let draws: Vec<ExecutedDraw> = pass
            .draw_commands()
            .iter()
            .filter_map(|draw| Self::execute_draw(state, draw))
            .collect();

        let mut writes = Vec::new();
        let depth_size = pass
            .render_targets()
            .and_then(|config| config.depth_stencil_attachment.as_ref())
            .map(|depth| depth.target.size());
        if let Some(config) = pass.render_targets() {
            let clears = config.color_attachments.iter().any(|a| a.load_op.is_clear())
                || config
                    .depth_stencil_attachment
                    .as_ref()
                    .is_some_and(|d| d.depth_load_op.is_clear());
            if clears || !draws.is_empty() {
                for attachment in &config.color_attachments {
                    Self::record_target(state, &attachment.target, &mut writes);
                }
                if let Some(depth) = &config.depth_stencil_attachment {
                    Self::record_target(state, &depth.target, &mut writes);
                }
            }
        }

        ExecutedPass {
            name: pass.name().to_string(),
            kind: ExecutedPassKind::Graphics,
            writes,
            draws,
            viewport: pass.viewport(),
            depth_size,
        }
    }
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy Backend"
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<GpuTexture, GraphicsError> {
        log::trace!(
            "DummyBackend: creating texture {:?} ({}x{}x{})",
            descriptor.label,
            descriptor.size.width,
            descriptor.size.height,
            descriptor.size.depth
        );
        Ok(GpuTexture::Dummy)
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<GpuSampler, GraphicsError> {
        log::trace!("DummyBackend: creating sampler {:?}", descriptor.label);
        Ok(GpuSampler::Dummy)
    }

    fn create_program(&self, kind: ProgramKind) -> Result<GpuProgram, GraphicsError> {
        if self.state.lock().failing_programs.contains(&kind) {
            return Err(GraphicsError::ProgramBuildFailed(kind.label().to_string()));
        }
        log::trace!("DummyBackend: building program {}", kind.label());
        Ok(GpuProgram::Dummy)
    }

    fn create_mesh(&self, mesh: &CpuMesh) -> Result<GpuMesh, GraphicsError> {
        log::trace!(
            "DummyBackend: uploading mesh {:?} ({} vertices)",
            mesh.label(),
            mesh.vertex_count()
        );
        Ok(GpuMesh::Dummy)
    }

    fn write_texture(
        &self,
        _texture: &GpuTexture,
        descriptor: &TextureDescriptor,
        data: &CpuTexture,
    ) -> Result<(), GraphicsError> {
        let (width, height) = descriptor.mip_size(0);
        if (data.width, data.height) != (width, height) {
            return Err(GraphicsError::InvalidParameter(format!(
                "upload of {}x{} into {}x{} texture",
                data.width, data.height, width, height
            )));
        }
        self.state.lock().uploads += 1;
        Ok(())
    }

    fn execute_graph(
        &self,
        graph: &RenderGraph,
        compiled: &CompiledGraph,
    ) -> Result<(), GraphicsError> {
        log::trace!(
            "DummyBackend: executing graph with {} passes",
            compiled.pass_order().len()
        );

        let mut state = self.state.lock();
        if state.failing_submissions {
            return Err(GraphicsError::Internal(
                "graph submission rejected".to_string(),
            ));
        }
        for handle in compiled.pass_order() {
            let executed = match graph.pass(*handle) {
                Pass::Graphics(pass) => Self::execute_graphics_pass(&mut state, pass),
                Pass::Transfer(pass) => {
                    let mut writes = Vec::new();
                    for operation in pass.operations() {
                        let TransferOperation::Resolve { dst, .. } = operation;
                        Self::record_target(
                            &mut state,
                            &RenderTarget::from_texture(Arc::clone(dst)),
                            &mut writes,
                        );
                    }
                    ExecutedPass {
                        name: pass.name().to_string(),
                        kind: ExecutedPassKind::Transfer,
                        writes,
                        draws: Vec::new(),
                        viewport: None,
                        depth_size: None,
                    }
                }
            };
            state.trace.push(executed);
        }
        Ok(())
    }

    fn attach_surface(
        &self,
        _window: Arc<dyn SurfaceWindow>,
        width: u32,
        height: u32,
        _vsync: bool,
    ) -> Result<TextureFormat, GraphicsError> {
        self.state.lock().surface = Some((width, height));
        Ok(TextureFormat::Bgra8UnormSrgb)
    }

    fn resize_surface(&self, width: u32, height: u32) -> Result<(), GraphicsError> {
        let mut state = self.state.lock();
        if state.surface.is_some() {
            state.surface = Some((width, height));
        }
        Ok(())
    }

    fn present(&self) -> Result<(), GraphicsError> {
        self.state.lock().presented += 1;
        Ok(())
    }

    fn create_query(&self) -> Result<GpuQuery, GraphicsError> {
        let mut state = self.state.lock();
        state.queries.push(QueryState::default());
        Ok(GpuQuery::Dummy(state.queries.len() as u32 - 1))
    }

    fn begin_query(&self, query: GpuQuery) {
        if let GpuQuery::Dummy(index) = query
            && let Some(q) = self.state.lock().queries.get_mut(index as usize)
        {
            q.started = Some(Instant::now());
            q.elapsed = None;
        }
    }

    fn end_query(&self, query: GpuQuery) {
        if let GpuQuery::Dummy(index) = query
            && let Some(q) = self.state.lock().queries.get_mut(index as usize)
            && let Some(started) = q.started.take()
        {
            q.elapsed = Some(started.elapsed().as_nanos() as u64);
        }
    }

    fn query_result(&self, query: GpuQuery) -> Option<u64> {
        match query {
            GpuQuery::Dummy(index) => self
                .state
                .lock()
                .queries
                .get(index as usize)
                .and_then(|q| q.elapsed),
            #[cfg(feature = "wgpu-backend")]
            GpuQuery::Wgpu(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failing_program() {
        let backend = DummyBackend::new();
        assert!(backend.create_program(ProgramKind::Composite).is_ok());
        backend.fail_program(ProgramKind::Composite);
        assert!(backend.create_program(ProgramKind::Composite).is_err());
        assert!(backend.create_program(ProgramKind::Fxaa).is_ok());
    }

    #[test]
    fn test_query_available_after_end() {
        let backend = DummyBackend::new();
        let query = backend.create_query().unwrap();
        assert_eq!(backend.query_result(query), None);
        backend.begin_query(query);
        assert_eq!(backend.query_result(query), None);
        backend.end_query(query);
        assert!(backend.query_result(query).is_some());
    }

    #[test]
    fn test_present_counts_frames() {
        let backend = DummyBackend::new();
        backend.present().unwrap();
        backend.present().unwrap();
        assert_eq!(backend.presented_frames(), 2);
    }
}
