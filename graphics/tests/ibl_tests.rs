//! IBL precomputation tests.
//!
//! These check which cube subresources the pipeline writes, that the BRDF
//! table is baked exactly once, and that the pipeline only re-runs when the
//! selected environment changes.

mod common;

use std::collections::BTreeSet;
use std::path::PathBuf;

use rstest::rstest;

use common::{HEIGHT, TestContext, WIDTH, write_sized_hdr_fixture};
use lumina_graphics::backend::dummy::{ExecutedPass, WriteTarget};
use lumina_graphics::ibl::{
    BRDF_LUT_UNIT, IRRADIANCE_UNIT, PREFILTER_MIP_LEVELS, PREFILTER_SIZE, PREFILTER_UNIT,
    prefilter_roughness,
};
use lumina_graphics::{DiagnosticKind, ProgramKind, RenderSettings, TextureId};

fn subresources_written(trace: &[ExecutedPass], texture: TextureId) -> BTreeSet<(u32, u32)> {
    trace
        .iter()
        .flat_map(|pass| pass.writes.iter())
        .filter_map(|write| match write {
            WriteTarget::Texture(s) if s.texture == texture => {
                Some((s.mip, s.layer))
            }
            _ => None,
        })
        .collect()
}

fn all_faces(mips: u32) -> BTreeSet<(u32, u32)> {
    (0..mips)
        .flat_map(|mip| (0..6).map(move |face| (mip, face)))
        .collect()
}

#[test]
fn test_first_frame_runs_pipeline_once() {
    let mut ctx = TestContext::new();
    let report = ctx.render(&RenderSettings::default());

    assert_eq!(report.ibl_runs, 1);
    assert_eq!(ctx.renderer.ibl().run_count(), 1);
    assert_eq!(ctx.renderer.ibl().lut_bake_count(), 1);
    assert_eq!(ctx.renderer.ibl().active_environment(), Some(0));

    let trace = ctx.take_trace();
    let ibl = ctx.renderer.ibl();
    assert_eq!(subresources_written(&trace, ibl.environment().id()), all_faces(1));
    assert_eq!(subresources_written(&trace, ibl.irradiance().id()), all_faces(1));
    assert_eq!(
        subresources_written(&trace, ibl.prefilter().id()),
        all_faces(PREFILTER_MIP_LEVELS)
    );
    let lut = ibl.lut(ctx.renderer.registry()).id();
    assert_eq!(subresources_written(&trace, lut), BTreeSet::from([(0, 0)]));
}

#[test]
fn test_steps_run_in_order() {
    let mut ctx = TestContext::new();
    ctx.render(&RenderSettings::default());
    let trace = ctx.take_trace();

    let programs: Vec<ProgramKind> = trace
        .iter()
        .flat_map(|pass| pass.draws.iter().map(|d| d.program))
        .collect();
    let last = |kind: ProgramKind| programs.iter().rposition(|&p| p == kind).unwrap();
    let first = |kind: ProgramKind| programs.iter().position(|&p| p == kind).unwrap();

    assert!(first(ProgramKind::BrdfIntegration) < first(ProgramKind::EquirectToCube));
    assert!(last(ProgramKind::EquirectToCube) < first(ProgramKind::IrradianceConvolution));
    assert!(last(ProgramKind::IrradianceConvolution) < first(ProgramKind::Prefilter));
    assert!(last(ProgramKind::Prefilter) < first(ProgramKind::Pbr));
    assert_eq!(
        programs
            .iter()
            .filter(|&&p| p == ProgramKind::Prefilter)
            .count(),
        (PREFILTER_MIP_LEVELS * 6) as usize
    );
}

#[test]
fn test_prefilter_roughness_per_mip() {
    let mut ctx = TestContext::new();
    ctx.render(&RenderSettings::default());
    let trace = ctx.take_trace();
    let prefilter = ctx.renderer.ibl().prefilter().id();

    for pass in trace.iter().filter(|p| p.writes_texture(prefilter)) {
        let WriteTarget::Texture(sub) = pass.writes[0] else {
            panic!("prefilter pass {} wrote the surface", pass.name);
        };
        assert_eq!(pass.draws.len(), 1);
        assert_eq!(pass.draws[0].uniforms.roughness(), prefilter_roughness(sub.mip));
    }
}

#[rstest]
#[case::next(1)]
#[case::back_to_first(0)]
fn test_swap_regenerates_everything_but_lut(#[case] second: usize) {
    let mut ctx = TestContext::new();
    let mut settings = RenderSettings {
        environment_index: if second == 0 { 1 } else { 0 },
        ..Default::default()
    };
    ctx.render(&settings);
    ctx.take_trace();

    settings.environment_index = second;
    let report = ctx.render(&settings);
    assert_eq!(report.ibl_runs, 1);

    let trace = ctx.take_trace();
    let ibl = ctx.renderer.ibl();
    assert_eq!(
        subresources_written(&trace, ibl.prefilter().id()),
        all_faces(PREFILTER_MIP_LEVELS)
    );
    assert_eq!(subresources_written(&trace, ibl.irradiance().id()), all_faces(1));
    let lut = ibl.lut(ctx.renderer.registry()).id();
    assert!(subresources_written(&trace, lut).is_empty());
    assert_eq!(ibl.lut_bake_count(), 1);
    assert_eq!(ibl.run_count(), 2);
    assert_eq!(ibl.active_environment(), Some(second));
}

#[test]
fn test_no_rerun_until_index_changes() {
    let mut ctx = TestContext::new();
    let settings = RenderSettings::default();
    ctx.render(&settings);

    for _ in 0..3 {
        let report = ctx.render(&settings);
        assert_eq!(report.ibl_runs, 0);
    }
    assert_eq!(ctx.renderer.ibl().run_count(), 1);

    let trace = ctx.take_trace();
    let ibl = ctx.renderer.ibl();
    let prefilter_writes = trace
        .iter()
        .filter(|p| p.writes_texture(ibl.prefilter().id()))
        .count();
    assert_eq!(prefilter_writes, (PREFILTER_MIP_LEVELS * 6) as usize);
}

#[test]
fn test_frames_sample_ibl_units() {
    let mut ctx = TestContext::new();
    ctx.render(&RenderSettings::default());
    ctx.take_trace();
    ctx.render(&RenderSettings::default());

    let trace = ctx.take_trace();
    let ibl = ctx.renderer.ibl();
    let lut = ibl.lut(ctx.renderer.registry()).id();
    let pbr: Vec<_> = trace
        .iter()
        .flat_map(|p| p.draws.iter())
        .filter(|d| d.program == ProgramKind::Pbr)
        .collect();

    assert_eq!(pbr.len(), ctx.scene.visible().count());
    for draw in pbr {
        assert_eq!(draw.unit(IRRADIANCE_UNIT), Some(ibl.irradiance().id()));
        assert_eq!(draw.unit(PREFILTER_UNIT), Some(ibl.prefilter().id()));
        assert_eq!(draw.unit(BRDF_LUT_UNIT), Some(lut));
    }
}

#[test]
fn test_missing_environment_uses_placeholder() {
    let mut ctx = TestContext::builder()
        .environments(vec![PathBuf::from("does/not/exist.hdr")])
        .build();
    let report = ctx.render(&RenderSettings::default());

    assert_eq!(report.ibl_runs, 1);
    assert_eq!(ctx.diagnostics.count_of(DiagnosticKind::AssetLoad), 1);
    let trace = ctx.take_trace();
    assert_eq!(
        subresources_written(&trace, ctx.renderer.ibl().prefilter().id()),
        all_faces(PREFILTER_MIP_LEVELS)
    );
}

#[test]
fn test_oversized_environment_uses_placeholder() {
    // One texel wider than the device allows.
    let path = write_sized_hdr_fixture(16385, 1);
    let mut ctx = TestContext::builder()
        .environments(vec![path.clone()])
        .build();
    let report = ctx.render(&RenderSettings::default());

    assert_eq!(report.ibl_runs, 1);
    assert_eq!(ctx.diagnostics.count_of(DiagnosticKind::AssetLoad), 1);
    assert_eq!(ctx.diagnostics.aborts(), 0);
    assert_eq!(ctx.backend.presented_frames(), 1);
    let trace = ctx.take_trace();
    assert_eq!(
        subresources_written(&trace, ctx.renderer.ibl().prefilter().id()),
        all_faces(PREFILTER_MIP_LEVELS)
    );

    drop(ctx);
    assert!(!path.exists());
}

#[test]
fn test_capture_viewport_follows_mip_size() {
    let mut ctx = TestContext::new();
    ctx.render(&RenderSettings::default());
    let trace = ctx.take_trace();

    for mip in 0..PREFILTER_MIP_LEVELS {
        let face = PREFILTER_SIZE >> mip;
        let prefix = format!("capture.prefilter.mip{mip}.");
        let passes: Vec<_> = trace
            .iter()
            .filter(|pass| pass.name.starts_with(&prefix))
            .collect();
        assert_eq!(passes.len(), 6, "mip {mip}");
        for pass in passes {
            assert_eq!(pass.viewport.map(|v| v.size()), Some((face, face)), "{}", pass.name);
            assert_eq!(pass.depth_size, Some((face, face)), "{}", pass.name);
        }
    }

    let geometry = trace
        .iter()
        .find(|pass| pass.name == "geometry")
        .expect("frame records a geometry pass");
    assert_eq!(geometry.viewport.map(|v| v.size()), Some((WIDTH, HEIGHT)));
}
