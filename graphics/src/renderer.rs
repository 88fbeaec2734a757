//! Per-frame pass orchestration.
//!
//! [`Renderer`] owns every GPU resource the demo needs and turns a
//! [`RenderSettings`] + [`FrameState`] + [`Scene`] into one submitted frame:
//!
//! ```text
//! [GeometryBuffer] → BeginGeometryTarget → ForwardGeometry | CombineGBuffer
//! → [EnvironmentBackdrop] → [LightIndicator] → [ResolveMultisample]
//! → BeginPostProcessTarget → [BloomBlur ×10] → Composite → [Fxaa]
//! → DebugOverlay → Present
//! ```
//!
//! Failures the frame can survive are reported to [`Diagnostics`] and the
//! frame carries on.

use std::sync::Arc;

use glam::{Mat4, Vec3};
use lumina_core::mesh::generate_cube;

use crate::device::GraphicsDevice;
use crate::diagnostics::Diagnostics;
use crate::environment::EnvironmentLibrary;
use crate::error::GraphicsError;
use crate::frame::FrameState;
use crate::graph::{ColorAttachment, DrawKind, RenderTarget, RenderTargetConfig};
use crate::ibl::IblPipeline;
use crate::post::{
    BLOOM_RESULT_BUFFER, BlurSource, BlurStep, PostProcessFlags, bloom_schedule,
};
use crate::programs::ProgramSet;
use crate::recorder::CommandRecorder;
use crate::resources::{Mesh, ProgramKind};
use crate::scene::{Scene, SceneObject};
use crate::settings::RenderSettings;
use crate::targets::{AttachmentSpec, RenderTargetRegistry, TargetId, TargetSize, TargetSpec};
use crate::timer::GpuTimer;
use crate::types::{FilterMode, TextureFormat, Viewport};
use crate::uniforms::DrawUniforms;

/// Depth format of every window-sized target.
pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// Scale of the light indicator cube.
const INDICATOR_SCALE: f32 = 0.1;

/// Color the composite and FXAA passes clear to.
const POST_CLEAR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// A step of the frame, in the order it was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameStage {
    GeometryBuffer,
    BeginGeometryTarget,
    ForwardGeometry,
    CombineGBuffer,
    EnvironmentBackdrop,
    LightIndicator,
    ResolveMultisample,
    BeginPostProcessTarget,
    BloomBlur,
    Composite,
    Fxaa,
    DebugOverlay,
    Present,
}

/// What a frame did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub stages: Vec<FrameStage>,
    pub bloom_steps: Vec<BlurStep>,
    /// IBL regenerations triggered by this frame (0 or 1).
    pub ibl_runs: usize,
    /// Latest available GPU frame time in nanoseconds, a frame or more old.
    pub gpu_time: Option<u64>,
    /// Diagnostics reported while recording this frame.
    pub diagnostics: usize,
}

impl FrameReport {
    /// Number of times a stage ran.
    pub fn count(&self, stage: FrameStage) -> usize {
        self.stages.iter().filter(|&&s| s == stage).count()
    }

    /// Position of the first occurrence of a stage.
    pub fn position(&self, stage: FrameStage) -> Option<usize> {
        self.stages.iter().position(|&s| s == stage)
    }
}

/// Debug UI drawn on top of the final image.
///
/// The recorder is bound to the output target when this is called.
pub trait Overlay {
    fn record(&mut self, _recorder: &mut CommandRecorder, _settings: &RenderSettings) {}
}

/// Draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOverlay;

impl Overlay for NoOverlay {}

/// The window-sized targets.
#[derive(Debug, Clone, Copy)]
pub struct FrameTargets {
    /// HDR color + bright pass, single-sampled.
    pub scene: TargetId,
    /// Same layout as `scene`, multisampled.
    pub scene_msaa: TargetId,
    /// Position, normal, albedo + specular.
    pub gbuffer: TargetId,
    pub pingpong: [TargetId; 2],
    /// Composite output read by FXAA.
    pub post: TargetId,
    /// Stand-in for the window surface when none is attached.
    pub output: TargetId,
}

impl FrameTargets {
    fn allocate(registry: &mut RenderTargetRegistry, msaa_samples: u32) -> Result<Self, GraphicsError> {
        let scene_spec = |label: &str| {
            TargetSpec::new(label, TargetSize::Window)
                .with_color(AttachmentSpec::new("color", TextureFormat::Rgba16Float))
                .with_color(AttachmentSpec::new("bright", TextureFormat::Rgba16Float))
                .with_depth(DEPTH_FORMAT)
        };
        let single = |label: &str, format| {
            TargetSpec::new(label, TargetSize::Window).with_color(AttachmentSpec::new("color", format))
        };

        let scene = registry.allocate(scene_spec("scene"))?;
        let scene_msaa =
            registry.allocate(scene_spec("scene_msaa").with_sample_count(msaa_samples))?;
        let gbuffer = registry.allocate(
            TargetSpec::new("gbuffer", TargetSize::Window)
                .with_color(
                    AttachmentSpec::new("position", TextureFormat::Rgba16Float)
                        .with_filter(FilterMode::Nearest),
                )
                .with_color(
                    AttachmentSpec::new("normal", TextureFormat::Rgba16Float)
                        .with_filter(FilterMode::Nearest),
                )
                .with_color(
                    AttachmentSpec::new("albedo_spec", TextureFormat::Rgba8Unorm)
                        .with_filter(FilterMode::Nearest),
                )
                .with_depth(DEPTH_FORMAT),
        )?;
        let pingpong = [
            registry.allocate(single("pingpong0", TextureFormat::Rgba16Float))?,
            registry.allocate(single("pingpong1", TextureFormat::Rgba16Float))?,
        ];
        let post = registry.allocate(single("post", TextureFormat::Rgba16Float))?;
        let output = registry.allocate(single("output", TextureFormat::Rgba8Unorm))?;

        Ok(Self {
            scene,
            scene_msaa,
            gbuffer,
            pingpong,
            post,
            output,
        })
    }
}

/// Owns the GPU state of the demo and records frames.
pub struct Renderer {
    device: Arc<GraphicsDevice>,
    diagnostics: Arc<Diagnostics>,
    recorder: CommandRecorder,
    registry: RenderTargetRegistry,
    programs: ProgramSet,
    ibl: IblPipeline,
    environments: EnvironmentLibrary,
    timer: GpuTimer,
    targets: FrameTargets,
    indicator: Arc<Mesh>,
    frame_index: u64,
}

impl Renderer {
    /// Build programs and allocate every target for a `width`×`height`
    /// window. The environment lighting is generated by the first frame.
    pub fn new(
        device: Arc<GraphicsDevice>,
        diagnostics: Arc<Diagnostics>,
        width: u32,
        height: u32,
        environments: EnvironmentLibrary,
    ) -> Result<Self, GraphicsError> {
        log::info!(
            "Renderer: initializing {}x{} on {} ({} environments)",
            width,
            height,
            device.name(),
            environments.len()
        );
        let mut registry =
            RenderTargetRegistry::new(device.clone(), diagnostics.clone(), width, height);
        let programs = ProgramSet::build(&device, &diagnostics);
        let ibl = IblPipeline::new(device.clone(), &mut registry)?;
        let targets = FrameTargets::allocate(
            &mut registry,
            RenderSettings::default().anti_aliasing.sample_count().max(2),
        )?;
        let timer = GpuTimer::new(device.backend().as_ref())?;
        let indicator = device.create_mesh(&generate_cube().with_label("light_indicator"))?;

        Ok(Self {
            recorder: CommandRecorder::new(diagnostics.clone()),
            device,
            diagnostics,
            registry,
            programs,
            ibl,
            environments,
            timer,
            targets,
            indicator,
            frame_index: 0,
        })
    }

    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }

    pub fn registry(&self) -> &RenderTargetRegistry {
        &self.registry
    }

    pub fn targets(&self) -> &FrameTargets {
        &self.targets
    }

    pub fn ibl(&self) -> &IblPipeline {
        &self.ibl
    }

    pub fn programs(&self) -> &ProgramSet {
        &self.programs
    }

    pub fn environments(&self) -> &EnvironmentLibrary {
        &self.environments
    }

    /// Current window size.
    pub fn size(&self) -> (u32, u32) {
        self.registry.window_size()
    }

    /// Number of frames rendered.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Re-specify every window-sized target and the surface. Zero sizes are
    /// ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), GraphicsError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        log::info!("Renderer: resize to {width}x{height}");
        self.registry.resize_all(width, height)?;
        self.device.resize_surface(width, height)
    }

    /// Generate the IBL textures for `index` now instead of on the next
    /// frame. Returns whether anything ran.
    pub fn prepare_environment(&mut self, index: usize) -> Result<bool, GraphicsError> {
        self.ibl.ensure(
            &mut self.recorder,
            &mut self.registry,
            &self.programs,
            &mut self.environments,
            &self.diagnostics,
            index,
        )
    }

    /// Record, submit and present one frame.
    ///
    /// An error means the frame was not presented; it is counted in
    /// [`Diagnostics::aborts`].
    pub fn render_frame(
        &mut self,
        settings: &RenderSettings,
        frame: &FrameState,
        scene: &Scene,
        overlay: &mut dyn Overlay,
    ) -> Result<FrameReport, GraphicsError> {
        let result = self.record_frame(settings, frame, scene, overlay);
        if let Err(err) = &result {
            self.diagnostics
                .record_abort(format_args!("frame {}: {err}", self.frame_index));
        }
        result
    }

    fn record_frame(
        &mut self,
        settings: &RenderSettings,
        frame: &FrameState,
        scene: &Scene,
        overlay: &mut dyn Overlay,
    ) -> Result<FrameReport, GraphicsError> {
        let reported_before = self.diagnostics.count();

        let ibl_runs = usize::from(self.prepare_environment(settings.environment_index)?);

        let samples = settings.anti_aliasing.sample_count();
        let msaa = samples > 1;
        if msaa {
            self.registry
                .set_sample_count(self.targets.scene_msaa, samples)?;
        }

        // Environment regeneration is not part of the frame time.
        let gpu_time = self.timer.begin_frame(self.device.backend().as_ref());
        let fxaa = matches!(settings.anti_aliasing, crate::post::AntiAliasing::Fxaa);
        let bloom = settings.post_flags.has(PostProcessFlags::BLOOM);

        let (width, height) = self.registry.window_size();
        let output = self.output_config(width, height);
        let ibl_bindings = self.ibl.bindings(&self.registry);
        let base = DrawUniforms::new()
            .with_view(frame.view)
            .with_projection(frame.projection)
            .with_camera_position(frame.camera_position)
            .with_lights(scene.light_block(frame.camera_position, frame.camera_front));

        let programs = &self.programs;
        let registry = &self.registry;
        let targets = self.targets;
        let geometry = if msaa { targets.scene_msaa } else { targets.scene };

        let mut report = FrameReport {
            ibl_runs,
            gpu_time,
            ..Default::default()
        };
        let stages = &mut report.stages;

        {
            let mut recorder = self
                .recorder
                .set_viewport(Viewport::from_dimensions(width, height));
            {
                let mut units = recorder.bind_textures(&ibl_bindings);

                if settings.deferred {
                    stages.push(FrameStage::GeometryBuffer);
                    let mut gbuffer =
                        units.bind_target("gbuffer", registry.get(targets.gbuffer).config());
                    gbuffer.begin_pass("geometry_buffer");
                    gbuffer.clear([0.0; 4], 1.0);
                    for object in scene.visible() {
                        gbuffer.draw(
                            &programs[ProgramKind::GeometryBuffer],
                            DrawKind::Mesh(object.mesh.clone()),
                            object_uniforms(base, frame, object),
                        );
                    }
                }

                stages.push(FrameStage::BeginGeometryTarget);
                {
                    let target = registry.get(geometry);
                    let mut bound = units.bind_target(target.label(), target.config());
                    bound.begin_pass("geometry");
                    bound.clear(settings.clear_color, 1.0);

                    if settings.deferred {
                        stages.push(FrameStage::CombineGBuffer);
                        let gbuffer = registry.get(targets.gbuffer);
                        let mut inputs = bound.bind_textures(&[
                            (0, gbuffer.binding(0)),
                            (1, gbuffer.binding(1)),
                            (2, gbuffer.binding(2)),
                        ]);
                        inputs.draw(
                            &programs[ProgramKind::DeferredCombine],
                            DrawKind::FullscreenQuad,
                            base.with_deferred_view(settings.deferred_view.index()),
                        );
                    } else {
                        stages.push(FrameStage::ForwardGeometry);
                        for object in scene.visible() {
                            bound.draw(
                                &programs[ProgramKind::Pbr],
                                DrawKind::Mesh(object.mesh.clone()),
                                object_uniforms(base, frame, object),
                            );
                        }
                    }

                    if settings.show_backdrop {
                        stages.push(FrameStage::EnvironmentBackdrop);
                        let mut environment = bound.bind_texture(0, self.ibl.environment_binding());
                        environment.draw(
                            &programs[ProgramKind::Background],
                            DrawKind::UnitCube,
                            base,
                        );
                    }

                    if settings.show_light_indicator && scene.point.enabled {
                        stages.push(FrameStage::LightIndicator);
                        let point = &scene.point;
                        let mut uniforms = base.with_model(
                            Mat4::from_translation(point.position)
                                * Mat4::from_scale(Vec3::splat(INDICATOR_SCALE)),
                        );
                        uniforms.albedo = (point.color * point.intensity).extend(1.0).to_array();
                        bound.draw(
                            &programs[ProgramKind::LightIndicator],
                            DrawKind::Mesh(self.indicator.clone()),
                            uniforms,
                        );
                    }
                }
            }

            if msaa {
                stages.push(FrameStage::ResolveMultisample);
                let source = registry.get(targets.scene_msaa);
                let resolved = registry.get(targets.scene);
                recorder.resolve(
                    "resolve_multisample",
                    &[
                        (source.color(0).clone(), resolved.color(0).clone()),
                        (source.color(1).clone(), resolved.color(1).clone()),
                    ],
                );
            }

            stages.push(FrameStage::BeginPostProcessTarget);
            if bloom {
                for step in bloom_schedule() {
                    stages.push(FrameStage::BloomBlur);
                    let source = match step.read {
                        BlurSource::BrightPass => registry.get(targets.scene).binding(1),
                        BlurSource::PingPong(index) => {
                            registry.get(targets.pingpong[index]).binding(0)
                        }
                    };
                    let destination = registry.get(targets.pingpong[step.write]);
                    let mut bound = recorder.bind_target(destination.label(), destination.config());
                    let mut input = bound.bind_texture(0, source);
                    input.begin_pass(format!("bloom.{}", step.iteration));
                    input.draw(
                        &programs[ProgramKind::BloomBlur],
                        DrawKind::FullscreenQuad,
                        DrawUniforms::new().with_horizontal(step.horizontal),
                    );
                    report.bloom_steps.push(step);
                }
            }

            stages.push(FrameStage::Composite);
            {
                let mut inputs = vec![(0, registry.get(targets.scene).binding(0))];
                if bloom {
                    inputs.push((1, registry.get(targets.pingpong[BLOOM_RESULT_BUFFER]).binding(0)));
                }
                let (label, config) = if fxaa {
                    ("post", registry.get(targets.post).config())
                } else {
                    ("output", output.clone())
                };
                let mut bound = recorder.bind_target(label, config);
                let mut inputs = bound.bind_textures(&inputs);
                inputs.begin_pass("composite");
                inputs.clear(POST_CLEAR, 1.0);
                inputs.draw(
                    &programs[ProgramKind::Composite],
                    DrawKind::FullscreenQuad,
                    DrawUniforms::new()
                        .with_post_flags(settings.post_flags.bits())
                        .with_tone_mapping(settings.exposure, settings.gamma),
                );
            }

            if fxaa {
                stages.push(FrameStage::Fxaa);
                let mut bound = recorder.bind_target("output", output.clone());
                let mut input = bound.bind_texture(0, registry.get(targets.post).binding(0));
                input.begin_pass("fxaa");
                input.clear(POST_CLEAR, 1.0);
                input.draw(
                    &programs[ProgramKind::Fxaa],
                    DrawKind::FullscreenQuad,
                    DrawUniforms::new(),
                );
            }

            stages.push(FrameStage::DebugOverlay);
            let mut bound = recorder.bind_target("output", output);
            bound.begin_pass("overlay");
            overlay.record(&mut bound, settings);
        }

        report.stages.push(FrameStage::Present);
        let submitted = self.recorder.submit(&self.device);
        self.timer.end_frame(self.device.backend().as_ref());
        submitted?;
        self.device.present()?;
        self.frame_index += 1;

        report.diagnostics = self.diagnostics.count() - reported_before;
        log::trace!(
            "Renderer: frame {} ({} stages, {} diagnostics)",
            self.frame_index,
            report.stages.len(),
            report.diagnostics
        );
        Ok(report)
    }

    /// The window surface if one is attached, the offscreen output otherwise.
    fn output_config(&self, width: u32, height: u32) -> RenderTargetConfig {
        match self.device.surface_format() {
            Some(format) => RenderTargetConfig::new()
                .with_color(ColorAttachment::new(RenderTarget::surface(format, width, height))),
            None => self.registry.get(self.targets.output).config(),
        }
    }
}

fn object_uniforms(base: DrawUniforms, frame: &FrameState, object: &SceneObject) -> DrawUniforms {
    object
        .material
        .apply(base.with_model(frame.model * object.transform))
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("device", &self.device.name())
            .field("size", &self.size())
            .field("frame_index", &self.frame_index)
            .finish()
    }
}
