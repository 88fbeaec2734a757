//! Frame orchestration tests.
//!
//! Each test renders frames on the recording backend and checks the stage
//! list the renderer reports against the passes the backend executed.

mod common;

use std::path::PathBuf;

use rstest::rstest;

use common::{HEIGHT, TestContext, WIDTH, pass_names};
use lumina_graphics::backend::dummy::ExecutedPassKind;
use lumina_graphics::post::{BLOOM_ITERATIONS, BlurSource};
use lumina_graphics::{
    AntiAliasing, DeferredView, DiagnosticKind, FrameStage, PostProcessFlags, ProgramKind,
    RenderSettings,
};

fn bloom_settings() -> RenderSettings {
    let mut settings = RenderSettings::default();
    settings.post_flags.set_flag(PostProcessFlags::BLOOM);
    settings
}

#[test]
fn test_forward_stage_order() {
    let mut ctx = TestContext::new();
    let report = ctx.render(&bloom_settings());

    let mut expected = vec![
        FrameStage::BeginGeometryTarget,
        FrameStage::ForwardGeometry,
        FrameStage::EnvironmentBackdrop,
        FrameStage::LightIndicator,
        FrameStage::ResolveMultisample,
        FrameStage::BeginPostProcessTarget,
    ];
    expected.extend([FrameStage::BloomBlur; BLOOM_ITERATIONS]);
    expected.extend([
        FrameStage::Composite,
        FrameStage::DebugOverlay,
        FrameStage::Present,
    ]);
    assert_eq!(report.stages, expected);
    assert_eq!(ctx.backend.presented_frames(), 1);
}

#[rstest]
#[case::none(AntiAliasing::None, 0)]
#[case::msaa4(AntiAliasing::Msaa { samples: 4 }, 1)]
#[case::msaa8(AntiAliasing::Msaa { samples: 8 }, 1)]
#[case::fxaa(AntiAliasing::Fxaa, 0)]
fn test_resolve_runs_once_between_geometry_and_post(
    #[case] anti_aliasing: AntiAliasing,
    #[case] resolves: usize,
) {
    let mut ctx = TestContext::new();
    let settings = RenderSettings {
        anti_aliasing,
        ..Default::default()
    };
    ctx.render(&settings);
    ctx.take_trace();
    let report = ctx.render(&settings);
    let trace = ctx.take_trace();

    assert_eq!(report.count(FrameStage::ResolveMultisample), resolves);
    let transfers: Vec<_> = trace
        .iter()
        .enumerate()
        .filter(|(_, p)| p.kind == ExecutedPassKind::Transfer)
        .collect();
    assert_eq!(transfers.len(), resolves);

    if let Some((index, resolve)) = transfers.first() {
        let names = pass_names(&trace);
        let geometry = names.iter().position(|&n| n == "geometry").unwrap();
        let composite = names.iter().position(|&n| n == "composite").unwrap();
        assert!(geometry < *index && *index < composite);

        let scene = ctx.renderer.registry().get(ctx.renderer.targets().scene);
        assert!(resolve.writes_texture(scene.color(0).id()));
        assert!(resolve.writes_texture(scene.color(1).id()));

        let msaa = ctx.renderer.registry().get(ctx.renderer.targets().scene_msaa);
        assert_eq!(msaa.sample_count(), anti_aliasing.sample_count());
        assert!(trace[geometry].writes_texture(msaa.color(0).id()));
    }
}

#[test]
fn test_bloom_alternates_ten_times_and_ends_on_second_buffer() {
    let mut ctx = TestContext::new();
    ctx.render(&bloom_settings());
    ctx.take_trace();
    let report = ctx.render(&bloom_settings());
    let trace = ctx.take_trace();

    assert_eq!(report.bloom_steps.len(), BLOOM_ITERATIONS);
    assert_eq!(report.count(FrameStage::BloomBlur), BLOOM_ITERATIONS);
    for (i, step) in report.bloom_steps.iter().enumerate() {
        assert_eq!(step.horizontal, i % 2 == 0);
        assert_eq!(step.write, usize::from(i % 2 == 0));
    }
    assert_eq!(report.bloom_steps[0].read, BlurSource::BrightPass);
    assert_eq!(report.bloom_steps[1].read, BlurSource::PingPong(1));

    let registry = ctx.renderer.registry();
    let targets = ctx.renderer.targets();
    let scene = registry.get(targets.scene);
    let pingpong = targets.pingpong.map(|id| registry.get(id).color(0).id());

    let blurs: Vec<_> = trace.iter().filter(|p| p.name.starts_with("bloom.")).collect();
    assert_eq!(blurs.len(), BLOOM_ITERATIONS);
    assert_eq!(blurs[0].draws[0].unit(0), Some(scene.color(1).id()));
    for (i, blur) in blurs.iter().enumerate() {
        let horizontal = i % 2 == 0;
        assert!(blur.writes_texture(pingpong[usize::from(horizontal)]));
        assert_eq!(blur.draws[0].uniforms.horizontal(), horizontal);
        if i > 0 {
            assert_eq!(blur.draws[0].unit(0), Some(pingpong[usize::from(!horizontal)]));
        }
    }

    let composite = trace.iter().find(|p| p.name == "composite").unwrap();
    let draw = &composite.draws[0];
    assert_eq!(draw.unit(0), Some(scene.color(0).id()));
    assert_eq!(draw.unit(1), Some(pingpong[1]));
}

#[test]
fn test_composite_without_bloom_reads_scene_only() {
    let mut ctx = TestContext::new();
    let report = ctx.render(&RenderSettings::default());
    let trace = ctx.take_trace();

    assert!(report.bloom_steps.is_empty());
    let composite = trace.iter().find(|p| p.name == "composite").unwrap();
    assert_eq!(composite.draws[0].units.len(), 1);
}

#[rstest]
#[case::none(AntiAliasing::None, false)]
#[case::fxaa(AntiAliasing::Fxaa, true)]
fn test_fxaa_routes_through_post(#[case] anti_aliasing: AntiAliasing, #[case] uses_post: bool) {
    let mut ctx = TestContext::new();
    let settings = RenderSettings {
        anti_aliasing,
        ..Default::default()
    };
    let report = ctx.render(&settings);
    let trace = ctx.take_trace();

    let registry = ctx.renderer.registry();
    let post = registry.get(ctx.renderer.targets().post).color(0).id();
    let output = registry.get(ctx.renderer.targets().output).color(0).id();
    let composite = trace.iter().find(|p| p.name == "composite").unwrap();

    assert_eq!(report.count(FrameStage::Fxaa), usize::from(uses_post));
    if uses_post {
        assert!(composite.writes_texture(post));
        let fxaa = trace.iter().find(|p| p.name == "fxaa").unwrap();
        assert_eq!(fxaa.draws[0].unit(0), Some(post));
        assert!(fxaa.writes_texture(output));
    } else {
        assert!(composite.writes_texture(output));
        assert!(trace.iter().all(|p| p.name != "fxaa"));
    }
}

#[rstest]
#[case::position(DeferredView::Position)]
#[case::combined(DeferredView::Combined)]
fn test_deferred_replaces_forward_geometry(#[case] view: DeferredView) {
    let mut ctx = TestContext::new();
    let settings = RenderSettings {
        deferred: true,
        deferred_view: view,
        ..Default::default()
    };
    let report = ctx.render(&settings);
    let trace = ctx.take_trace();

    assert_eq!(report.stages[0], FrameStage::GeometryBuffer);
    assert_eq!(report.count(FrameStage::CombineGBuffer), 1);
    assert_eq!(report.count(FrameStage::ForwardGeometry), 0);

    let registry = ctx.renderer.registry();
    let gbuffer = registry.get(ctx.renderer.targets().gbuffer);
    let fill = trace.iter().find(|p| p.name == "geometry_buffer").unwrap();
    for attachment in 0..3 {
        assert!(fill.writes_texture(gbuffer.color(attachment).id()));
    }
    assert_eq!(fill.draws.len(), ctx.scene.visible().count());

    let combine = trace
        .iter()
        .flat_map(|p| p.draws.iter())
        .find(|d| d.program == ProgramKind::DeferredCombine)
        .unwrap();
    for unit in 0..3 {
        assert_eq!(combine.unit(unit), Some(gbuffer.color(unit as usize).id()));
    }
    assert_eq!(combine.uniforms.switches[2], view.index());
}

#[test]
fn test_resize_round_trip_keeps_identity() {
    let mut ctx = TestContext::new();
    let targets = *ctx.renderer.targets();
    let scene_color = ctx.renderer.registry().get(targets.scene).color(0).clone();
    let id = scene_color.id();

    ctx.renderer.resize(1920, 1080).unwrap();
    assert_eq!((scene_color.width(), scene_color.height()), (1920, 1080));
    ctx.renderer.resize(0, 0).unwrap();
    assert_eq!(ctx.renderer.size(), (1920, 1080));
    ctx.renderer.resize(WIDTH, HEIGHT).unwrap();

    let registry = ctx.renderer.registry();
    for target in [
        targets.scene,
        targets.scene_msaa,
        targets.gbuffer,
        targets.pingpong[0],
        targets.pingpong[1],
        targets.post,
    ] {
        let target = registry.get(target);
        assert_eq!(target.size(), (WIDTH, HEIGHT), "{}", target.label());
        for i in 0..target.color_count() {
            let color = target.color(i);
            assert_eq!((color.width(), color.height()), (WIDTH, HEIGHT));
        }
        if let Some(depth) = target.depth() {
            assert_eq!((depth.width(), depth.height()), (WIDTH, HEIGHT));
        }
    }
    assert_eq!(registry.get(targets.scene).color(0).id(), id);

    // Fixed-size targets are untouched.
    let lut = ctx.renderer.ibl().lut(registry);
    assert_eq!((lut.width(), lut.height()), (512, 512));

    ctx.render(&RenderSettings::default());
    assert_eq!(ctx.diagnostics.count(), 0);
}

#[test]
fn test_failures_are_logged_and_frames_continue() {
    let mut ctx = TestContext::builder()
        .environments(vec![PathBuf::from("does/not/exist.hdr")])
        .failing_program(ProgramKind::Prefilter)
        .failing_program(ProgramKind::Composite)
        .build();
    assert_eq!(ctx.diagnostics.count_of(DiagnosticKind::ProgramBuild), 2);

    let mut settings = bloom_settings();
    for _ in 0..3 {
        let report = ctx.render(&settings);
        assert_eq!(report.stages.last(), Some(&FrameStage::Present));
    }
    settings.environment_index = 1;
    let report = ctx.render(&settings);
    assert_eq!(report.ibl_runs, 1);
    assert_eq!(report.diagnostics, 1);

    assert_eq!(ctx.diagnostics.count_of(DiagnosticKind::AssetLoad), 2);
    assert_eq!(ctx.diagnostics.count(), 4);
    assert_eq!(ctx.diagnostics.aborts(), 0);
    assert_eq!(ctx.backend.presented_frames(), 4);
    assert!(ctx.backend.skipped_draws() > 0);
}

#[test]
fn test_clean_run_reports_nothing() {
    let mut ctx = TestContext::new();
    for _ in 0..2 {
        let report = ctx.render(&bloom_settings());
        assert_eq!(report.diagnostics, 0);
    }
    assert_eq!(ctx.backend.skipped_draws(), 0);
    assert_eq!(ctx.diagnostics.count(), 0);
}

#[test]
fn test_gpu_time_is_read_one_frame_late() {
    let mut ctx = TestContext::new();
    let settings = RenderSettings::default();
    assert_eq!(ctx.render(&settings).gpu_time, None);
    assert!(ctx.render(&settings).gpu_time.is_some());
}

#[test]
fn test_rejected_submission_aborts_one_frame() {
    let mut ctx = TestContext::new();
    let settings = RenderSettings::default();
    ctx.render(&settings);

    ctx.backend.fail_submissions(true);
    let result = ctx.renderer.render_frame(
        &settings,
        &ctx.frame,
        &ctx.scene,
        &mut lumina_graphics::NoOverlay,
    );
    assert!(result.is_err());
    assert_eq!(ctx.diagnostics.aborts(), 1);
    assert_eq!(ctx.diagnostics.count(), 0);
    assert_eq!(ctx.backend.presented_frames(), 1);

    ctx.backend.fail_submissions(false);
    let report = ctx.render(&settings);
    assert_eq!(report.ibl_runs, 0);
    assert!(report.gpu_time.is_some());
    assert!(ctx.render(&settings).gpu_time.is_some());
    assert_eq!(ctx.diagnostics.aborts(), 1);
    assert_eq!(ctx.backend.presented_frames(), 3);
}

#[test]
fn test_hidden_backdrop_and_indicator() {
    let mut ctx = TestContext::new();
    let settings = RenderSettings {
        show_backdrop: false,
        show_light_indicator: false,
        ..Default::default()
    };
    let report = ctx.render(&settings);
    let trace = ctx.take_trace();

    assert_eq!(report.count(FrameStage::EnvironmentBackdrop), 0);
    assert_eq!(report.count(FrameStage::LightIndicator), 0);
    assert!(
        trace
            .iter()
            .flat_map(|p| p.draws.iter())
            .all(|d| d.program != ProgramKind::Background)
    );
}
