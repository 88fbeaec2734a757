//! Scoped command recording.
//!
//! [`CommandRecorder`] offers a bind-then-draw interface over the render
//! graph: bind a target, set a viewport, bind textures to units, clear and
//! draw. Each bind returns a guard that derefs to the recorder and puts the
//! previous binding back when dropped, so no binding outlives the scope that
//! made it.
//!
//! ```ignore
//! let mut recorder = CommandRecorder::new(diagnostics);
//! {
//!     let mut target = recorder.bind_target("scene", scene.config());
//!     let mut viewport = target.set_viewport(Viewport::from_dimensions(1200, 800));
//!     viewport.clear([0.1, 0.1, 0.1, 1.0], 1.0);
//!     let mut units = viewport.bind_texture(5, irradiance);
//!     units.draw(&pbr, DrawKind::Mesh(sphere), uniforms);
//! }
//! let graph = recorder.finish();
//! ```

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::device::GraphicsDevice;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::GraphicsError;
use crate::graph::{
    ColorAttachment, DrawCommand, DrawKind, GraphicsPass, PassHandle, RenderGraph,
    RenderTargetConfig, TextureBinding, TransferOperation, TransferPass,
};
use crate::resources::{Program, Texture};
use crate::targets::check_config;
use crate::types::Viewport;
use crate::uniforms::DrawUniforms;

/// Number of texture units.
pub const MAX_TEXTURE_UNITS: usize = 8;

#[derive(Debug, Clone)]
struct BoundTarget {
    label: String,
    config: RenderTargetConfig,
}

#[derive(Debug, Default)]
struct BindState {
    target: Option<BoundTarget>,
    viewport: Option<Viewport>,
    units: [Option<TextureBinding>; MAX_TEXTURE_UNITS],
}

/// Records bind/clear/draw calls into a [`RenderGraph`].
pub struct CommandRecorder {
    graph: RenderGraph,
    state: BindState,
    open: Option<GraphicsPass>,
    last_pass: Option<PassHandle>,
    diagnostics: Arc<Diagnostics>,
}

impl CommandRecorder {
    pub fn new(diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            graph: RenderGraph::new(),
            state: BindState::default(),
            open: None,
            last_pass: None,
            diagnostics,
        }
    }

    /// Bind an attachment set as the current render target.
    ///
    /// The set is completeness-checked; an incomplete set is reported and
    /// stays bound.
    pub fn bind_target(
        &mut self,
        label: impl Into<String>,
        config: RenderTargetConfig,
    ) -> TargetGuard<'_> {
        self.end_pass();
        let bound = BoundTarget {
            label: label.into(),
            config,
        };
        self.check_bound(&bound);
        let previous = self.state.target.replace(bound);
        TargetGuard {
            recorder: self,
            previous,
        }
    }

    /// Replace (or append) a color attachment of the bound target.
    pub fn attach_color(&mut self, index: usize, attachment: ColorAttachment) {
        self.end_pass();
        let Some(bound) = self.state.target.as_mut() else {
            self.diagnostics.report(
                DiagnosticKind::IncompleteTarget,
                "color attachment without a bound target",
            );
            return;
        };
        let colors = &mut bound.config.color_attachments;
        if index < colors.len() {
            colors[index] = attachment;
        } else {
            colors.push(attachment);
        }
        let bound = bound.clone();
        self.check_bound(&bound);
    }

    /// Set the viewport for subsequent passes.
    pub fn set_viewport(&mut self, viewport: Viewport) -> ViewportGuard<'_> {
        self.end_pass();
        let previous = self.state.viewport.replace(viewport);
        ViewportGuard {
            recorder: self,
            previous,
        }
    }

    /// Bind a texture at a unit for subsequent draws.
    ///
    /// # Panics
    ///
    /// Panics if `unit` is not below [`MAX_TEXTURE_UNITS`].
    pub fn bind_texture(&mut self, unit: u32, binding: TextureBinding) -> TextureGuard<'_> {
        self.bind_textures(&[(unit, binding)])
    }

    /// Bind several textures at once; one guard restores all of them.
    ///
    /// # Panics
    ///
    /// Panics if a unit is not below [`MAX_TEXTURE_UNITS`].
    pub fn bind_textures(&mut self, bindings: &[(u32, TextureBinding)]) -> TextureGuard<'_> {
        let previous = bindings
            .iter()
            .map(|(unit, binding)| {
                let old = self.state.units[*unit as usize].replace(binding.clone());
                (*unit, old)
            })
            .collect();
        TextureGuard {
            recorder: self,
            previous,
        }
    }

    /// Start a new named pass on the bound target and viewport.
    pub fn begin_pass(&mut self, name: impl Into<String>) {
        self.end_pass();
        let mut pass = GraphicsPass::new(name.into());
        if let Some(bound) = &self.state.target {
            let mut config = bound.config.clone();
            config.set_load();
            pass.set_render_targets(config);
        }
        if let Some(viewport) = self.state.viewport {
            pass.set_viewport(viewport);
        }
        self.open = Some(pass);
    }

    /// Clear every attachment of the bound target.
    pub fn clear(&mut self, color: [f32; 4], depth: f32) {
        let name = match &self.open {
            Some(pass) if pass.has_draws() => Some(pass.name().to_string()),
            Some(_) => None,
            None => Some(self.default_pass_name()),
        };
        if let Some(name) = name {
            self.begin_pass(name);
        }
        if let Some(config) = self.open.as_mut().and_then(|p| p.render_targets_mut()) {
            config.set_clear(color, depth);
        }
    }

    /// Record a draw with the currently bound texture units.
    pub fn draw(&mut self, program: &Arc<Program>, kind: DrawKind, uniforms: DrawUniforms) {
        if self.open.is_none() {
            let name = self.default_pass_name();
            self.begin_pass(name);
        }
        let textures = self
            .state
            .units
            .iter()
            .enumerate()
            .filter_map(|(unit, binding)| binding.clone().map(|b| (unit as u32, b)))
            .collect();
        let command = DrawCommand::new(Arc::clone(program), kind, uniforms).with_textures(textures);
        if let Some(pass) = self.open.as_mut() {
            pass.add_draw_command(command);
        }
    }

    /// Resolve multisampled textures into single-sampled ones.
    pub fn resolve(&mut self, name: impl Into<String>, pairs: &[(Arc<Texture>, Arc<Texture>)]) {
        self.end_pass();
        let mut pass = TransferPass::new(name.into());
        for (src, dst) in pairs {
            pass.add_operation(TransferOperation::Resolve {
                src: Arc::clone(src),
                dst: Arc::clone(dst),
            });
        }
        if pass.has_transfers() {
            let handle = self.graph.add_transfer_pass(pass);
            self.chain(handle);
        }
    }

    /// Close the open pass, if any.
    pub fn end_pass(&mut self) {
        let Some(pass) = self.open.take() else {
            return;
        };
        let clears = pass.render_targets().is_some_and(|c| {
            c.color_attachments.iter().any(|a| a.load_op.is_clear())
                || c.depth_stencil_attachment
                    .as_ref()
                    .is_some_and(|d| d.depth_load_op.is_clear())
        });
        if !pass.has_draws() && !clears {
            return;
        }
        if !pass.has_render_targets() {
            self.diagnostics.report(
                DiagnosticKind::IncompleteTarget,
                format!("pass '{}' has no attachments", pass.name()),
            );
        }
        let handle = self.graph.add_graphics_pass(pass);
        self.chain(handle);
    }

    /// Execute everything recorded so far and start a fresh graph.
    ///
    /// Bindings are kept. Needed before an attachment is re-specified, since
    /// recorded passes refer to the storage current at execution time.
    pub fn submit(&mut self, device: &GraphicsDevice) -> Result<(), GraphicsError> {
        self.end_pass();
        self.last_pass = None;
        let graph = std::mem::take(&mut self.graph);
        if graph.pass_count() == 0 {
            return Ok(());
        }
        device.execute_graph(&graph)
    }

    /// Label of the bound target.
    pub fn bound_target(&self) -> Option<&str> {
        self.state.target.as_ref().map(|t| t.label.as_str())
    }

    /// Attachment set of the bound target.
    pub fn bound_config(&self) -> Option<&RenderTargetConfig> {
        self.state.target.as_ref().map(|t| &t.config)
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.state.viewport
    }

    /// Texture bound at a unit.
    pub fn texture_at(&self, unit: u32) -> Option<&TextureBinding> {
        self.state.units.get(unit as usize).and_then(Option::as_ref)
    }

    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }

    /// Passes recorded so far, not counting the open one.
    pub fn pass_count(&self) -> usize {
        self.graph.pass_count()
    }

    /// Close the open pass and hand over the graph.
    pub fn finish(mut self) -> RenderGraph {
        self.end_pass();
        std::mem::take(&mut self.graph)
    }

    fn chain(&mut self, handle: PassHandle) {
        if let Some(previous) = self.last_pass.replace(handle) {
            self.graph.add_dependency(handle, previous);
        }
    }

    fn default_pass_name(&self) -> String {
        self.bound_target().unwrap_or("unbound").to_string()
    }

    fn check_bound(&self, bound: &BoundTarget) {
        if let Err(reason) = check_config(&bound.config) {
            self.diagnostics.report(
                DiagnosticKind::IncompleteTarget,
                format!("target '{}': {reason}", bound.label),
            );
        }
    }
}

impl std::fmt::Debug for CommandRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRecorder")
            .field("bound_target", &self.bound_target())
            .field("viewport", &self.state.viewport)
            .field("passes", &self.graph.pass_count())
            .finish()
    }
}

/// Restores the previous render target on drop.
pub struct TargetGuard<'a> {
    recorder: &'a mut CommandRecorder,
    previous: Option<BoundTarget>,
}

impl Drop for TargetGuard<'_> {
    fn drop(&mut self) {
        self.recorder.end_pass();
        self.recorder.state.target = self.previous.take();
    }
}

/// Restores the previous viewport on drop.
pub struct ViewportGuard<'a> {
    recorder: &'a mut CommandRecorder,
    previous: Option<Viewport>,
}

impl Drop for ViewportGuard<'_> {
    fn drop(&mut self) {
        self.recorder.end_pass();
        self.recorder.state.viewport = self.previous.take();
    }
}

/// Restores the previous bindings of texture units on drop.
pub struct TextureGuard<'a> {
    recorder: &'a mut CommandRecorder,
    previous: Vec<(u32, Option<TextureBinding>)>,
}

impl Drop for TextureGuard<'_> {
    fn drop(&mut self) {
        for (unit, binding) in self.previous.drain(..).rev() {
            self.recorder.state.units[unit as usize] = binding;
        }
    }
}

macro_rules! deref_to_recorder {
    ($($guard:ident),*) => {$(
        impl Deref for $guard<'_> {
            type Target = CommandRecorder;

            fn deref(&self) -> &CommandRecorder {
                self.recorder
            }
        }

        impl DerefMut for $guard<'_> {
            fn deref_mut(&mut self) -> &mut CommandRecorder {
                self.recorder
            }
        }
    )*};
}

deref_to_recorder!(TargetGuard, ViewportGuard, TextureGuard);
