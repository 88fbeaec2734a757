//! WGSL sources of the shading programs.
//!
//! A program's source is the shared prelude, the lighting library for the
//! lit programs, and the program's own body. Binding conventions:
//!
//! - group 0, binding 0: the per-draw [`DrawUniforms`](crate::DrawUniforms)
//!   block, bound with a dynamic offset
//! - group 1: texture unit `u` at binding `2u`, its sampler at `2u + 1`
//!
//! Sources are validated with naga before any backend sees them, so a
//! broken program is reported as a build failure instead of a device error.

use crate::error::GraphicsError;
use crate::resources::ProgramKind;

const COMMON: &str = include_str!("../shaders/common.wgsl");
const LIGHTING: &str = include_str!("../shaders/lighting.wgsl");

const EQUIRECT_TO_CUBE: &str = include_str!("../shaders/equirect_to_cube.wgsl");
const IRRADIANCE_CONVOLUTION: &str = include_str!("../shaders/irradiance_convolution.wgsl");
const PREFILTER: &str = include_str!("../shaders/prefilter.wgsl");
const BRDF_INTEGRATION: &str = include_str!("../shaders/brdf_integration.wgsl");
const PBR: &str = include_str!("../shaders/pbr.wgsl");
const GEOMETRY_BUFFER: &str = include_str!("../shaders/geometry_buffer.wgsl");
const DEFERRED_COMBINE: &str = include_str!("../shaders/deferred_combine.wgsl");
const BACKGROUND: &str = include_str!("../shaders/background.wgsl");
const LIGHT_INDICATOR: &str = include_str!("../shaders/light_indicator.wgsl");
const BLOOM_BLUR: &str = include_str!("../shaders/bloom_blur.wgsl");
const COMPOSITE: &str = include_str!("../shaders/composite.wgsl");
const FXAA: &str = include_str!("../shaders/fxaa.wgsl");

/// Bind group of the uniform block.
pub const UNIFORM_GROUP: u32 = 0;
/// Bind group of the texture units.
pub const TEXTURE_GROUP: u32 = 1;
/// Vertex entry point of every program.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Fragment entry point of every program.
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Binding of the texture at `unit`.
pub const fn texture_binding(unit: u32) -> u32 {
    unit * 2
}

/// Binding of the sampler at `unit`.
pub const fn sampler_binding(unit: u32) -> u32 {
    unit * 2 + 1
}

fn body(kind: ProgramKind) -> &'static str {
    match kind {
        ProgramKind::EquirectToCube => EQUIRECT_TO_CUBE,
        ProgramKind::IrradianceConvolution => IRRADIANCE_CONVOLUTION,
        ProgramKind::Prefilter => PREFILTER,
        ProgramKind::BrdfIntegration => BRDF_INTEGRATION,
        ProgramKind::Pbr => PBR,
        ProgramKind::GeometryBuffer => GEOMETRY_BUFFER,
        ProgramKind::DeferredCombine => DEFERRED_COMBINE,
        ProgramKind::Background => BACKGROUND,
        ProgramKind::LightIndicator => LIGHT_INDICATOR,
        ProgramKind::BloomBlur => BLOOM_BLUR,
        ProgramKind::Composite => COMPOSITE,
        ProgramKind::Fxaa => FXAA,
    }
}

fn uses_lighting(kind: ProgramKind) -> bool {
    matches!(kind, ProgramKind::Pbr | ProgramKind::DeferredCombine)
}

/// Full WGSL source of a program.
pub fn source(kind: ProgramKind) -> String {
    let lighting = if uses_lighting(kind) { LIGHTING } else { "" };
    format!("{COMMON}\n{lighting}\n{}", body(kind))
}

/// Parse and validate a program's source.
pub fn validate(kind: ProgramKind) -> Result<naga::Module, GraphicsError> {
    let source = source(kind);
    let module = naga::front::wgsl::parse_str(&source).map_err(|err| {
        GraphicsError::ProgramBuildFailed(format!(
            "{}: {}",
            kind.label(),
            err.emit_to_string(&source)
        ))
    })?;
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    )
    .validate(&module)
    .map_err(|err| {
        GraphicsError::ProgramBuildFailed(format!(
            "{}: {}",
            kind.label(),
            err.emit_to_string(&source)
        ))
    })?;
    log::trace!("shaders: validated {} ({} bytes)", kind.label(), source.len());
    Ok(module)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn texture_group_bindings(module: &naga::Module) -> BTreeSet<u32> {
        module
            .global_variables
            .iter()
            .filter_map(|(_, var)| var.binding.as_ref())
            .filter(|binding| binding.group == TEXTURE_GROUP)
            .map(|binding| binding.binding)
            .collect()
    }

    fn fragment_outputs(module: &naga::Module) -> usize {
        let entry = module
            .entry_points
            .iter()
            .find(|ep| ep.name == FRAGMENT_ENTRY)
            .unwrap();
        let result = entry.function.result.as_ref().unwrap();
        match &module.types[result.ty].inner {
            naga::TypeInner::Struct { members, .. } => members
                .iter()
                .filter(|m| matches!(m.binding, Some(naga::Binding::Location { .. })))
                .count(),
            _ => usize::from(matches!(
                result.binding,
                Some(naga::Binding::Location { .. })
            )),
        }
    }

    #[test]
    fn test_every_program_validates() {
        for kind in ProgramKind::ALL {
            if let Err(err) = validate(kind) {
                panic!("{err}");
            }
        }
    }

    #[test]
    fn test_bindings_follow_texture_slots() {
        for kind in ProgramKind::ALL {
            let module = validate(kind).unwrap();
            let expected: BTreeSet<u32> = kind
                .texture_slots()
                .iter()
                .flat_map(|slot| [texture_binding(slot.unit), sampler_binding(slot.unit)])
                .collect();
            assert_eq!(texture_group_bindings(&module), expected, "{}", kind.label());
        }
    }

    #[test]
    fn test_fragment_outputs_match_color_outputs() {
        for kind in ProgramKind::ALL {
            let module = validate(kind).unwrap();
            assert_eq!(
                fragment_outputs(&module),
                kind.color_outputs() as usize,
                "{}",
                kind.label()
            );
        }
    }

    #[test]
    fn test_entry_points() {
        let module = validate(ProgramKind::Composite).unwrap();
        let names: Vec<&str> = module.entry_points.iter().map(|ep| ep.name.as_str()).collect();
        assert_eq!(names, vec![VERTEX_ENTRY, FRAGMENT_ENTRY]);
    }
}
