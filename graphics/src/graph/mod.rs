//! Render graph infrastructure.
//!
//! A [`RenderGraph`] is the recorded form of a batch of GPU work: an ordered
//! set of graphics and transfer passes with explicit dependencies. Graphs are
//! usually produced by a [`CommandRecorder`](crate::recorder::CommandRecorder)
//! and handed to [`GraphicsDevice::execute_graph`](crate::GraphicsDevice::execute_graph).
//!
//! # Example
//!
//! ```ignore
//! use lumina_graphics::{RenderGraph, GraphicsPass, ColorAttachment, RenderTargetConfig};
//!
//! let mut graph = RenderGraph::new();
//!
//! // Create and configure pass before adding
//! let mut pass = GraphicsPass::new("composite".into());
//! pass.set_render_targets(
//!     RenderTargetConfig::new()
//!         .with_color(ColorAttachment::new(surface).with_clear_color([0.0, 0.0, 0.0, 1.0]))
//! );
//! let handle = graph.add_graphics_pass(pass);
//! ```

mod pass;
mod target;
mod transfer;

pub use pass::{DrawCommand, DrawKind, GraphicsPass, Pass, TextureBinding};
pub use target::{
    ColorAttachment, DepthStencilAttachment, LoadOp, RenderTarget, RenderTargetConfig, StoreOp,
};
pub use transfer::{TransferOperation, TransferPass};

/// Handle to a pass in the render graph.
///
/// `PassHandle` is `Copy` and cheap to pass around. It is only valid within
/// the `RenderGraph` that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassHandle(u32);

impl PassHandle {
    fn new(index: u32) -> Self {
        Self(index)
    }

    /// Index of the pass in [`RenderGraph::passes`].
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The render graph describes a batch of rendering operations.
///
/// # Construction
///
/// ```ignore
/// let mut graph = RenderGraph::new();
/// let geometry = graph.add_graphics_pass(GraphicsPass::new("geometry".into()));
/// let resolve = graph.add_transfer_pass(TransferPass::new("resolve".into()));
/// graph.add_dependency(resolve, geometry);
/// let compiled = graph.compile()?;
/// ```
#[derive(Debug, Default)]
pub struct RenderGraph {
    /// All passes in the graph.
    passes: Vec<Pass>,
    /// Dependency edges stored as (dependent, dependency) pairs.
    edges: Vec<(PassHandle, PassHandle)>,
}

impl RenderGraph {
    /// Create a new empty render graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a graphics pass to the graph.
    pub fn add_graphics_pass(&mut self, pass: GraphicsPass) -> PassHandle {
        self.add_pass(Pass::Graphics(pass))
    }

    /// Add a transfer pass to the graph.
    pub fn add_transfer_pass(&mut self, pass: TransferPass) -> PassHandle {
        self.add_pass(Pass::Transfer(pass))
    }

    fn add_pass(&mut self, pass: Pass) -> PassHandle {
        let index = self.passes.len() as u32;
        self.passes.push(pass);
        PassHandle::new(index)
    }

    /// Add a dependency between passes.
    ///
    /// The `dependent` pass will execute after the `dependency` pass.
    pub fn add_dependency(&mut self, dependent: PassHandle, dependency: PassHandle) {
        assert!(
            dependent.index() < self.passes.len(),
            "Invalid dependent handle"
        );
        assert!(
            dependency.index() < self.passes.len(),
            "Invalid dependency handle"
        );
        assert!(dependent != dependency, "Pass cannot depend on itself");

        let exists = self
            .edges
            .iter()
            .any(|&(d, dep)| d == dependent && dep == dependency);
        if !exists {
            self.edges.push((dependent, dependency));
        }
    }

    /// Get dependencies of a pass.
    pub fn dependencies(&self, handle: PassHandle) -> impl Iterator<Item = PassHandle> + '_ {
        self.edges
            .iter()
            .filter(move |&&(dependent, _)| dependent == handle)
            .map(|&(_, dependency)| dependency)
    }

    /// Get the number of dependencies for a pass.
    pub fn dependency_count(&self, handle: PassHandle) -> usize {
        self.dependencies(handle).count()
    }

    /// Get all passes in the graph.
    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    /// Get a pass by handle.
    pub fn pass(&self, handle: PassHandle) -> &Pass {
        &self.passes[handle.index()]
    }

    /// Get the number of passes in the graph.
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Compile the graph for execution.
    ///
    /// Orders passes topologically. Among passes that are ready at the same
    /// time, the one added first runs first, so a graph without edges runs in
    /// insertion order.
    pub fn compile(&self) -> Result<CompiledGraph, GraphError> {
        let count = self.passes.len();
        let mut remaining = vec![0usize; count];
        for &(dependent, _) in &self.edges {
            remaining[dependent.index()] += 1;
        }

        let mut ready: std::collections::BTreeSet<PassHandle> = (0..count as u32)
            .map(PassHandle::new)
            .filter(|h| remaining[h.index()] == 0)
            .collect();
        let mut pass_order = Vec::with_capacity(count);

        while let Some(handle) = ready.pop_first() {
            pass_order.push(handle);
            for &(dependent, dependency) in &self.edges {
                if dependency == handle {
                    remaining[dependent.index()] -= 1;
                    if remaining[dependent.index()] == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        if pass_order.len() != count {
            return Err(GraphError::CyclicDependency);
        }
        Ok(CompiledGraph { pass_order })
    }

    /// Clear all passes from the graph.
    pub fn clear(&mut self) {
        self.passes.clear();
        self.edges.clear();
    }
}

/// A compiled render graph ready for execution.
#[derive(Debug)]
pub struct CompiledGraph {
    /// Pass execution order as handles.
    pass_order: Vec<PassHandle>,
}

impl CompiledGraph {
    /// Get the pass execution order as handles.
    pub fn pass_order(&self) -> &[PassHandle] {
        &self.pass_order
    }
}

/// Errors that can occur during graph construction or compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The graph contains a cycle.
    CyclicDependency,
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CyclicDependency => write!(f, "render graph contains cyclic dependency"),
        }
    }
}

impl std::error::Error for GraphError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_passes() {
        let mut graph = RenderGraph::new();
        graph.add_graphics_pass(GraphicsPass::new("geometry".into()));
        graph.add_transfer_pass(TransferPass::new("resolve".into()));
        assert_eq!(graph.pass_count(), 2);
        assert!(graph.passes()[0].is_graphics());
        assert_eq!(graph.passes()[1].name(), "resolve");
        assert!(graph.passes()[1].as_transfer().is_some());

        graph.clear();
        assert_eq!(graph.pass_count(), 0);
    }

    #[test]
    fn test_compile_respects_dependencies() {
        let mut graph = RenderGraph::new();
        let composite = graph.add_graphics_pass(GraphicsPass::new("composite".into()));
        let geometry = graph.add_graphics_pass(GraphicsPass::new("geometry".into()));
        let resolve = graph.add_transfer_pass(TransferPass::new("resolve".into()));
        graph.add_dependency(resolve, geometry);
        graph.add_dependency(composite, resolve);

        assert_eq!(graph.dependency_count(composite), 1);
        let compiled = graph.compile().unwrap();
        assert_eq!(compiled.pass_order(), &[geometry, resolve, composite]);
    }

    #[test]
    fn test_compile_without_edges_keeps_insertion_order() {
        let mut graph = RenderGraph::new();
        let a = graph.add_graphics_pass(GraphicsPass::new("a".into()));
        let b = graph.add_graphics_pass(GraphicsPass::new("b".into()));
        assert_eq!(graph.compile().unwrap().pass_order(), &[a, b]);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut graph = RenderGraph::new();
        let a = graph.add_graphics_pass(GraphicsPass::new("a".into()));
        let b = graph.add_graphics_pass(GraphicsPass::new("b".into()));
        graph.add_dependency(a, b);
        graph.add_dependency(b, a);
        assert_eq!(graph.compile().unwrap_err(), GraphError::CyclicDependency);
    }
}
