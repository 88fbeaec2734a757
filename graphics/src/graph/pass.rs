//! Render pass types.

use std::sync::Arc;

use crate::resources::{Mesh, Program, Sampler, Texture};
use crate::types::Viewport;
use crate::uniforms::DrawUniforms;

use super::target::RenderTargetConfig;
use super::transfer::TransferPass;

/// A pass in the render graph.
#[derive(Debug)]
pub enum Pass {
    /// Graphics pass (vertex/fragment programs, rasterization).
    Graphics(GraphicsPass),
    /// Transfer pass (resolve and copy operations).
    Transfer(TransferPass),
}

impl Pass {
    /// Get the pass name.
    pub fn name(&self) -> &str {
        match self {
            Pass::Graphics(p) => p.name(),
            Pass::Transfer(p) => p.name(),
        }
    }

    /// Get this pass as a graphics pass, if it is one.
    pub fn as_graphics(&self) -> Option<&GraphicsPass> {
        if let Pass::Graphics(p) = self {
            Some(p)
        } else {
            None
        }
    }

    /// Get this pass as a transfer pass, if it is one.
    pub fn as_transfer(&self) -> Option<&TransferPass> {
        if let Pass::Transfer(p) = self {
            Some(p)
        } else {
            None
        }
    }

    /// Check if this is a graphics pass.
    pub fn is_graphics(&self) -> bool {
        matches!(self, Pass::Graphics(_))
    }

    /// Check if this is a transfer pass.
    pub fn is_transfer(&self) -> bool {
        matches!(self, Pass::Transfer(_))
    }
}

// ============================================================================
// Draw Command
// ============================================================================

/// What geometry a draw submits.
#[derive(Debug, Clone)]
pub enum DrawKind {
    /// An uploaded mesh, drawn as arrays or through its index list.
    Mesh(Arc<Mesh>),
    /// The 36-vertex unit cube used for cube captures and the backdrop.
    UnitCube,
    /// A quad covering the whole viewport.
    FullscreenQuad,
}

impl DrawKind {
    /// Number of vertices (or indices) the draw submits.
    pub fn vertex_count(&self) -> u32 {
        match self {
            Self::Mesh(mesh) => mesh.shape().draw_count(),
            Self::UnitCube => 36,
            Self::FullscreenQuad => 6,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Mesh(mesh) => mesh.label().unwrap_or("mesh"),
            Self::UnitCube => "unit_cube",
            Self::FullscreenQuad => "fullscreen_quad",
        }
    }
}

/// A texture bound at a unit together with the sampler that reads it.
#[derive(Debug, Clone)]
pub struct TextureBinding {
    pub texture: Arc<Texture>,
    pub sampler: Arc<Sampler>,
}

impl TextureBinding {
    pub fn new(texture: Arc<Texture>, sampler: Arc<Sampler>) -> Self {
        Self { texture, sampler }
    }
}

/// A draw command: program, geometry, uniforms and the texture units that
/// were bound when it was recorded.
#[derive(Debug, Clone)]
pub struct DrawCommand {
    /// The program to run.
    pub program: Arc<Program>,
    /// The geometry to submit.
    pub kind: DrawKind,
    /// Uniform values.
    pub uniforms: DrawUniforms,
    /// Bound textures, sorted by unit.
    pub textures: Vec<(u32, TextureBinding)>,
    /// Number of instances to draw (default 1).
    pub instance_count: u32,
}

impl DrawCommand {
    /// Create a new draw command.
    pub fn new(program: Arc<Program>, kind: DrawKind, uniforms: DrawUniforms) -> Self {
        Self {
            program,
            kind,
            uniforms,
            textures: Vec::new(),
            instance_count: 1,
        }
    }

    /// Set the bound textures.
    pub fn with_textures(mut self, mut textures: Vec<(u32, TextureBinding)>) -> Self {
        textures.sort_by_key(|(unit, _)| *unit);
        self.textures = textures;
        self
    }

    /// Set the number of instances to draw.
    pub fn with_instance_count(mut self, count: u32) -> Self {
        self.instance_count = count;
        self
    }

    /// Texture bound at a unit, if any.
    pub fn texture_at(&self, unit: u32) -> Option<&TextureBinding> {
        self.textures
            .iter()
            .find(|(u, _)| *u == unit)
            .map(|(_, binding)| binding)
    }
}

// ============================================================================
// Graphics Pass
// ============================================================================

/// A graphics pass for rasterization work.
///
/// A graphics pass has one attachment set, one viewport and an ordered list
/// of draws.
#[derive(Debug)]
pub struct GraphicsPass {
    name: String,
    render_targets: Option<RenderTargetConfig>,
    viewport: Option<Viewport>,
    draw_commands: Vec<DrawCommand>,
}

impl GraphicsPass {
    /// Create a new graphics pass.
    pub fn new(name: String) -> Self {
        Self {
            name,
            render_targets: None,
            viewport: None,
            draw_commands: Vec::new(),
        }
    }

    /// Get the pass name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the render target configuration.
    pub fn render_targets(&self) -> Option<&RenderTargetConfig> {
        self.render_targets.as_ref()
    }

    /// Set the render target configuration.
    pub fn set_render_targets(&mut self, config: RenderTargetConfig) {
        self.render_targets = Some(config);
    }

    /// Get mutable access to the render target configuration.
    pub fn render_targets_mut(&mut self) -> Option<&mut RenderTargetConfig> {
        self.render_targets.as_mut()
    }

    /// Check if this pass has render targets configured.
    pub fn has_render_targets(&self) -> bool {
        self.render_targets
            .as_ref()
            .map(|c| c.has_attachments())
            .unwrap_or(false)
    }

    /// Get the viewport. `None` covers the whole render area.
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Set the viewport.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = Some(viewport);
    }

    /// Add a pre-built draw command.
    pub fn add_draw_command(&mut self, command: DrawCommand) {
        self.draw_commands.push(command);
    }

    /// Get all draw commands.
    pub fn draw_commands(&self) -> &[DrawCommand] {
        &self.draw_commands
    }

    /// Check if this pass has any draw commands.
    pub fn has_draws(&self) -> bool {
        !self.draw_commands.is_empty()
    }
}
