//! # Lumina Graphics
//!
//! Physically based renderer with image-based lighting, built around a
//! recorded render graph.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`IblPipeline`] - Environment projection, irradiance convolution,
//!   specular prefiltering and the BRDF lookup table
//! - [`Renderer`] - Per-frame pass orchestration (G-buffer, forward shading,
//!   MSAA resolve, bloom, tone mapping, FXAA)
//! - [`RenderTargetRegistry`] - Offscreen targets re-specified in place on resize
//! - [`CommandRecorder`] - Bind-then-draw recording with scoped guards
//! - [`Diagnostics`] - Log-and-continue failure reporting
//! - [`shaders`] - WGSL sources of the program catalogue, validated with naga
//! - Backends: wgpu (feature `wgpu-backend`) and Dummy (records what it runs)
//!
//! ## Example
//!
//! ```ignore
//! use lumina_graphics::{GraphicsInstance, Renderer, RenderSettings, FrameState, Scene};
//!
//! let device = GraphicsInstance::new()?.create_device()?;
//! let diagnostics = Arc::new(Diagnostics::default());
//! let mut renderer = Renderer::new(device.clone(), diagnostics, 1200, 800, environments)?;
//! let scene = Scene::demo(&device)?;
//! let report = renderer.render_frame(
//!     &RenderSettings::default(),
//!     &FrameState::new(1200, 800),
//!     &scene,
//!     &mut NoOverlay,
//! )?;
//! ```

pub mod backend;
pub mod capture;
pub mod device;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod frame;
pub mod graph;
pub mod ibl;
pub mod instance;
pub mod post;
pub mod programs;
pub mod recorder;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod settings;
pub mod shaders;
pub mod targets;
pub mod timer;
pub mod types;
pub mod uniforms;

// Re-export main types for convenience
pub use backend::dummy::DummyBackend;
pub use backend::{BackendType, GpuBackend, SurfaceWindow};
pub use capture::{CaptureViewSet, EnvironmentCapture};
pub use device::{DeviceCapabilities, GraphicsDevice};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, FailurePolicy};
pub use environment::EnvironmentLibrary;
pub use error::GraphicsError;
pub use frame::FrameState;
pub use graph::{
    ColorAttachment, DepthStencilAttachment, DrawKind, GraphicsPass, LoadOp, Pass, PassHandle,
    RenderGraph, RenderTarget, RenderTargetConfig, StoreOp, TextureBinding, TransferPass,
};
pub use ibl::IblPipeline;
pub use instance::GraphicsInstance;
pub use post::{AntiAliasing, PostProcessFlags};
pub use programs::ProgramSet;
pub use recorder::CommandRecorder;
pub use renderer::{FrameReport, FrameStage, NoOverlay, Overlay, Renderer};
pub use resources::{Mesh, Program, ProgramKind, Sampler, Texture, TextureId};
pub use scene::{Material, Scene};
pub use settings::{DeferredView, RenderSettings};
pub use targets::{RenderTargetRegistry, TargetId, TargetSpec};
pub use timer::GpuTimer;
pub use types::{
    Extent3d, SamplerDescriptor, TextureDescriptor, TextureDimension, TextureFormat, TextureUsage,
    Viewport,
};
pub use uniforms::DrawUniforms;

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_render_graph_creation() {
        let graph = RenderGraph::new();
        assert!(graph.passes().is_empty());
    }

    #[test]
    fn test_dummy_backend() {
        let backend = DummyBackend::new();
        assert_eq!(backend.name(), "Dummy Backend");
    }
}
