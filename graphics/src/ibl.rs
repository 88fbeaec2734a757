//! Image-based lighting precomputation.
//!
//! Turns an equirectangular HDR environment into the three inputs the PBR
//! programs sample:
//!
//! 1. the environment is projected onto a cube,
//! 2. the cube is convolved into a small irradiance cube,
//! 3. the cube is prefiltered into a mip chain, one roughness per level,
//!
//! plus a split-sum BRDF table that does not depend on the environment and
//! is baked once.

use std::sync::Arc;

use crate::capture::EnvironmentCapture;
use crate::device::GraphicsDevice;
use crate::diagnostics::Diagnostics;
use crate::environment::EnvironmentLibrary;
use crate::error::GraphicsError;
use crate::graph::{DrawKind, TextureBinding};
use crate::programs::ProgramSet;
use crate::recorder::CommandRecorder;
use crate::resources::{ProgramKind, Sampler, Texture};
use crate::targets::{AttachmentSpec, RenderTargetRegistry, TargetId, TargetSize, TargetSpec};
use crate::types::{SamplerDescriptor, TextureDescriptor, TextureFormat, TextureUsage, Viewport};
use crate::uniforms::DrawUniforms;

/// Face size of the projected environment cube.
pub const ENVIRONMENT_SIZE: u32 = 1024;
/// Face size of the irradiance cube.
pub const IRRADIANCE_SIZE: u32 = 32;
/// Face size of the prefiltered cube's base level.
pub const PREFILTER_SIZE: u32 = 128;
/// Mip levels of the prefiltered cube. Level `m` holds roughness
/// `m / (PREFILTER_MIP_LEVELS - 1)`.
pub const PREFILTER_MIP_LEVELS: u32 = 5;
/// Size of the BRDF lookup table.
pub const BRDF_LUT_SIZE: u32 = 512;

/// Texture unit of the irradiance cube.
pub const IRRADIANCE_UNIT: u32 = 5;
/// Texture unit of the prefiltered cube.
pub const PREFILTER_UNIT: u32 = 6;
/// Texture unit of the BRDF lookup table.
pub const BRDF_LUT_UNIT: u32 = 7;

/// Format of every IBL cube.
pub const CUBE_FORMAT: TextureFormat = TextureFormat::Rgb16Float;

/// Roughness the prefilter program convolves for at `mip`.
pub fn prefilter_roughness(mip: u32) -> f32 {
    mip as f32 / (PREFILTER_MIP_LEVELS - 1) as f32
}

/// Owns the IBL textures and regenerates them when the environment changes.
pub struct IblPipeline {
    device: Arc<GraphicsDevice>,
    capture: EnvironmentCapture,
    environment: Arc<Texture>,
    irradiance: Arc<Texture>,
    prefilter: Arc<Texture>,
    lut: TargetId,
    cube_sampler: Arc<Sampler>,
    equirect_sampler: Arc<Sampler>,
    active: Option<usize>,
    run_count: usize,
    lut_bake_count: usize,
}

impl IblPipeline {
    /// Allocate the cubes, the LUT target and the capture scratch target.
    /// Nothing is rendered until [`process`](Self::process).
    pub fn new(
        device: Arc<GraphicsDevice>,
        registry: &mut RenderTargetRegistry,
    ) -> Result<Self, GraphicsError> {
        let usage = TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING;
        let environment = device.create_texture(
            &TextureDescriptor::new_cube(ENVIRONMENT_SIZE, CUBE_FORMAT, usage)
                .with_label("ibl.environment"),
        )?;
        let irradiance = device.create_texture(
            &TextureDescriptor::new_cube(IRRADIANCE_SIZE, CUBE_FORMAT, usage)
                .with_label("ibl.irradiance"),
        )?;
        let prefilter = device.create_texture(
            &TextureDescriptor::new_cube(PREFILTER_SIZE, CUBE_FORMAT, usage)
                .with_mip_levels(PREFILTER_MIP_LEVELS)
                .with_label("ibl.prefilter"),
        )?;
        let lut = registry.allocate(
            TargetSpec::new("brdf_lut", TargetSize::Fixed(BRDF_LUT_SIZE, BRDF_LUT_SIZE))
                .with_color(AttachmentSpec::new("color", TextureFormat::Rg16Float)),
        )?;
        let cube_sampler =
            device.create_sampler(&SamplerDescriptor::linear().with_label("ibl.cube"))?;
        let equirect_sampler =
            device.create_sampler(&SamplerDescriptor::linear().with_label("ibl.equirect"))?;
        let capture = EnvironmentCapture::new(registry, ENVIRONMENT_SIZE)?;

        Ok(Self {
            device,
            capture,
            environment,
            irradiance,
            prefilter,
            lut,
            cube_sampler,
            equirect_sampler,
            active: None,
            run_count: 0,
            lut_bake_count: 0,
        })
    }

    /// Regenerate every environment-dependent texture from environment
    /// `index`, baking the BRDF table first if it has never been baked.
    ///
    /// Projection, irradiance and prefiltering run strictly in that order and
    /// are submitted before this returns.
    pub fn process(
        &mut self,
        recorder: &mut CommandRecorder,
        registry: &mut RenderTargetRegistry,
        programs: &ProgramSet,
        library: &mut EnvironmentLibrary,
        diagnostics: &Diagnostics,
        index: usize,
    ) -> Result<(), GraphicsError> {
        log::info!(
            "IblPipeline: processing environment {} ({})",
            index,
            library
                .path(index)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<missing>".to_string())
        );

        if self.lut_bake_count == 0 {
            self.bake_lut(recorder, registry, programs)?;
        }

        let equirect = library.texture(index, &self.device, diagnostics)?;
        self.capture.capture_cube(
            &self.device,
            recorder,
            registry,
            &programs[ProgramKind::EquirectToCube],
            &[(0, TextureBinding::new(equirect, self.equirect_sampler.clone()))],
            &self.environment,
            0,
            DrawUniforms::new(),
        )?;

        let environment = [(0, self.cube_binding(&self.environment))];
        self.capture.capture_cube(
            &self.device,
            recorder,
            registry,
            &programs[ProgramKind::IrradianceConvolution],
            &environment,
            &self.irradiance,
            0,
            DrawUniforms::new(),
        )?;

        for mip in 0..PREFILTER_MIP_LEVELS {
            self.capture.capture_cube(
                &self.device,
                recorder,
                registry,
                &programs[ProgramKind::Prefilter],
                &environment,
                &self.prefilter,
                mip,
                DrawUniforms::new().with_roughness(prefilter_roughness(mip)),
            )?;
        }

        self.active = Some(index);
        self.run_count += 1;
        Ok(())
    }

    /// Run [`process`](Self::process) if `index` is not the environment the
    /// textures currently hold. Returns whether it ran.
    pub fn ensure(
        &mut self,
        recorder: &mut CommandRecorder,
        registry: &mut RenderTargetRegistry,
        programs: &ProgramSet,
        library: &mut EnvironmentLibrary,
        diagnostics: &Diagnostics,
        index: usize,
    ) -> Result<bool, GraphicsError> {
        if self.active == Some(index) {
            return Ok(false);
        }
        self.process(recorder, registry, programs, library, diagnostics, index)?;
        Ok(true)
    }

    fn bake_lut(
        &mut self,
        recorder: &mut CommandRecorder,
        registry: &RenderTargetRegistry,
        programs: &ProgramSet,
    ) -> Result<(), GraphicsError> {
        log::debug!("IblPipeline: baking BRDF lookup table");
        {
            let mut viewport =
                recorder.set_viewport(Viewport::from_dimensions(BRDF_LUT_SIZE, BRDF_LUT_SIZE));
            let mut bound = viewport.bind_target("brdf_lut", registry.get(self.lut).config());
            bound.begin_pass("brdf_lut");
            bound.clear([0.0, 0.0, 0.0, 1.0], 1.0);
            bound.draw(
                &programs[ProgramKind::BrdfIntegration],
                DrawKind::FullscreenQuad,
                DrawUniforms::new(),
            );
        }
        recorder.submit(&self.device)?;
        self.lut_bake_count += 1;
        Ok(())
    }

    fn cube_binding(&self, texture: &Arc<Texture>) -> TextureBinding {
        TextureBinding::new(texture.clone(), self.cube_sampler.clone())
    }

    /// Irradiance, prefilter and BRDF table at their fixed units.
    pub fn bindings(&self, registry: &RenderTargetRegistry) -> [(u32, TextureBinding); 3] {
        [
            (IRRADIANCE_UNIT, self.cube_binding(&self.irradiance)),
            (PREFILTER_UNIT, self.cube_binding(&self.prefilter)),
            (BRDF_LUT_UNIT, registry.get(self.lut).binding(0)),
        ]
    }

    /// The projected environment cube, for drawing the backdrop.
    pub fn environment_binding(&self) -> TextureBinding {
        self.cube_binding(&self.environment)
    }

    pub fn environment(&self) -> &Arc<Texture> {
        &self.environment
    }

    pub fn irradiance(&self) -> &Arc<Texture> {
        &self.irradiance
    }

    pub fn prefilter(&self) -> &Arc<Texture> {
        &self.prefilter
    }

    pub fn lut<'a>(&self, registry: &'a RenderTargetRegistry) -> &'a Arc<Texture> {
        registry.get(self.lut).color(0)
    }

    /// Environment index the textures were last generated from.
    pub fn active_environment(&self) -> Option<usize> {
        self.active
    }

    /// How many times the environment-dependent steps have run.
    pub fn run_count(&self) -> usize {
        self.run_count
    }

    /// How many times the BRDF table has been baked. Never more than one.
    pub fn lut_bake_count(&self) -> usize {
        self.lut_bake_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefilter_roughness_spans_zero_to_one() {
        assert_eq!(prefilter_roughness(0), 0.0);
        assert_eq!(prefilter_roughness(2), 0.5);
        assert_eq!(prefilter_roughness(PREFILTER_MIP_LEVELS - 1), 1.0);
    }

    #[test]
    fn test_prefilter_chain_reaches_eight_texels() {
        assert_eq!(PREFILTER_SIZE >> (PREFILTER_MIP_LEVELS - 1), 8);
    }
}
