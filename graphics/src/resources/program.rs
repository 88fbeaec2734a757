//! Shading programs.
//!
//! The renderer treats shading code as a fixed catalogue: every program it
//! runs is one [`ProgramKind`], and each kind declares the contract the
//! backend has to honor (vertex source, texture units, color outputs, depth
//! state). What the program computes lives in the backend.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::backend::GpuProgram;
use crate::ibl::{BRDF_LUT_UNIT, IRRADIANCE_UNIT, PREFILTER_UNIT};
use crate::types::{CompareFunction, TextureDimension};

static NEXT_PROGRAM_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(u64);

/// Every shading program the renderer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProgramKind {
    /// Samples an equirectangular map by direction to fill a cube face.
    EquirectToCube,
    /// Cosine-weighted hemisphere convolution of the environment cube.
    IrradianceConvolution,
    /// GGX-filtered environment at a roughness level.
    Prefilter,
    /// Split-sum BRDF scale/bias table.
    BrdfIntegration,
    /// Forward PBR shading with image-based lighting.
    Pbr,
    /// Writes position, normal and albedo/specular to the G-buffer.
    GeometryBuffer,
    /// Full-screen lighting (or debug view) from the G-buffer.
    DeferredCombine,
    /// Environment cube drawn behind everything at the far plane.
    Background,
    /// Flat-colored marker at a light's position.
    LightIndicator,
    /// One direction of a separable Gaussian blur.
    BloomBlur,
    /// Tone-mapping, exposure, gamma and bloom combine.
    Composite,
    /// Approximate anti-aliasing on the final image.
    Fxaa,
}

/// Where a program's vertices come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexInput {
    /// A mesh vertex buffer with the standard [`Vertex`](lumina_core::mesh::Vertex) layout.
    Mesh,
    /// 36 procedural vertices of the unit cube.
    UnitCube,
    /// 6 procedural vertices covering the viewport.
    FullscreenQuad,
}

/// A texture input of a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureSlot {
    /// Texture unit the input is bound at.
    pub unit: u32,
    /// Expected texture shape.
    pub dimension: TextureDimension,
}

const fn slot_2d(unit: u32) -> TextureSlot {
    TextureSlot {
        unit,
        dimension: TextureDimension::D2,
    }
}

const fn slot_cube(unit: u32) -> TextureSlot {
    TextureSlot {
        unit,
        dimension: TextureDimension::Cube,
    }
}

const IBL_SLOTS: [TextureSlot; 3] = [
    slot_cube(IRRADIANCE_UNIT),
    slot_cube(PREFILTER_UNIT),
    slot_2d(BRDF_LUT_UNIT),
];

const DEFERRED_SLOTS: [TextureSlot; 6] = [
    slot_2d(0),
    slot_2d(1),
    slot_2d(2),
    slot_cube(IRRADIANCE_UNIT),
    slot_cube(PREFILTER_UNIT),
    slot_2d(BRDF_LUT_UNIT),
];

impl ProgramKind {
    pub const ALL: [Self; 12] = [
        Self::EquirectToCube,
        Self::IrradianceConvolution,
        Self::Prefilter,
        Self::BrdfIntegration,
        Self::Pbr,
        Self::GeometryBuffer,
        Self::DeferredCombine,
        Self::Background,
        Self::LightIndicator,
        Self::BloomBlur,
        Self::Composite,
        Self::Fxaa,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::EquirectToCube => "equirect_to_cube",
            Self::IrradianceConvolution => "irradiance_convolution",
            Self::Prefilter => "prefilter",
            Self::BrdfIntegration => "brdf_integration",
            Self::Pbr => "pbr",
            Self::GeometryBuffer => "geometry_buffer",
            Self::DeferredCombine => "deferred_combine",
            Self::Background => "background",
            Self::LightIndicator => "light_indicator",
            Self::BloomBlur => "bloom_blur",
            Self::Composite => "composite",
            Self::Fxaa => "fxaa",
        }
    }

    pub fn vertex_input(self) -> VertexInput {
        match self {
            Self::Pbr | Self::GeometryBuffer | Self::LightIndicator => VertexInput::Mesh,
            Self::EquirectToCube
            | Self::IrradianceConvolution
            | Self::Prefilter
            | Self::Background => VertexInput::UnitCube,
            Self::BrdfIntegration
            | Self::DeferredCombine
            | Self::BloomBlur
            | Self::Composite
            | Self::Fxaa => VertexInput::FullscreenQuad,
        }
    }

    /// Texture inputs, in binding order.
    pub fn texture_slots(self) -> &'static [TextureSlot] {
        const EQUIRECT: [TextureSlot; 1] = [slot_2d(0)];
        const CUBE_SOURCE: [TextureSlot; 1] = [slot_cube(0)];
        const ONE_2D: [TextureSlot; 1] = [slot_2d(0)];
        const COMPOSITE: [TextureSlot; 2] = [slot_2d(0), slot_2d(1)];

        match self {
            Self::EquirectToCube => &EQUIRECT,
            Self::IrradianceConvolution | Self::Prefilter | Self::Background => &CUBE_SOURCE,
            Self::BrdfIntegration | Self::GeometryBuffer | Self::LightIndicator => &[],
            Self::Pbr => &IBL_SLOTS,
            Self::DeferredCombine => &DEFERRED_SLOTS,
            Self::BloomBlur | Self::Fxaa => &ONE_2D,
            Self::Composite => &COMPOSITE,
        }
    }

    /// Number of color attachments the program writes.
    pub fn color_outputs(self) -> u32 {
        match self {
            Self::GeometryBuffer => 3,
            Self::Pbr | Self::DeferredCombine | Self::Background | Self::LightIndicator => 2,
            _ => 1,
        }
    }

    /// Depth test used when the pass has a depth attachment. `None` disables
    /// the test.
    pub fn depth_compare(self) -> Option<CompareFunction> {
        match self {
            Self::Background => Some(CompareFunction::LessEqual),
            Self::DeferredCombine => Some(CompareFunction::Always),
            Self::Pbr
            | Self::GeometryBuffer
            | Self::LightIndicator
            | Self::EquirectToCube
            | Self::IrradianceConvolution
            | Self::Prefilter => Some(CompareFunction::Less),
            Self::BrdfIntegration | Self::BloomBlur | Self::Composite | Self::Fxaa => None,
        }
    }

    /// Whether the program writes depth.
    pub fn writes_depth(self) -> bool {
        !matches!(self, Self::Background) && self.depth_compare().is_some()
    }
}

/// A built shading program.
///
/// A program whose build failed is still a valid object: it is flagged
/// invalid and every draw using it is skipped by the backend.
pub struct Program {
    id: ProgramId,
    kind: ProgramKind,
    gpu: GpuProgram,
    valid: bool,
}

impl Program {
    pub(crate) fn new(kind: ProgramKind, gpu: GpuProgram) -> Self {
        Self {
            id: ProgramId(NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed)),
            kind,
            gpu,
            valid: true,
        }
    }

    /// A stand-in for a program that failed to build. Draws nothing.
    pub(crate) fn invalid(kind: ProgramKind) -> Self {
        Self {
            id: ProgramId(NEXT_PROGRAM_ID.fetch_add(1, Ordering::Relaxed)),
            kind,
            gpu: GpuProgram::Dummy,
            valid: false,
        }
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn kind(&self) -> ProgramKind {
        self.kind
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub(crate) fn gpu_handle(&self) -> &GpuProgram {
        &self.gpu
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("kind", &self.kind)
            .field("valid", &self.valid)
            .finish()
    }
}

static_assertions::assert_impl_all!(Program: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pbr_samples_ibl_units() {
        let units: Vec<u32> = ProgramKind::Pbr
            .texture_slots()
            .iter()
            .map(|s| s.unit)
            .collect();
        assert_eq!(units, vec![5, 6, 7]);
    }

    #[test]
    fn test_background_depth_state() {
        assert_eq!(
            ProgramKind::Background.depth_compare(),
            Some(CompareFunction::LessEqual)
        );
        assert!(!ProgramKind::Background.writes_depth());
        assert!(ProgramKind::Pbr.writes_depth());
        assert!(!ProgramKind::Composite.writes_depth());
    }

    #[test]
    fn test_labels_are_unique() {
        let mut labels: Vec<_> = ProgramKind::ALL.iter().map(|k| k.label()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), ProgramKind::ALL.len());
    }
}
