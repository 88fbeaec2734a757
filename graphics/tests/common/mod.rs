//! Shared setup for the orchestration tests.
//!
//! Every test runs against the recording [`DummyBackend`] and inspects the
//! trace of executed passes.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use lumina_graphics::backend::dummy::ExecutedPass;
use lumina_graphics::{
    Diagnostics, DummyBackend, EnvironmentLibrary, FailurePolicy, FrameReport, FrameState,
    GraphicsDevice, GraphicsInstance, NoOverlay, ProgramKind, RenderSettings, Renderer, Scene,
};

pub const WIDTH: u32 = 1200;
pub const HEIGHT: u32 = 800;

const FIXTURE_PREFIX: &str = "lumina-test-";

static NEXT_FIXTURE: AtomicU32 = AtomicU32::new(0);

/// Write a tiny valid Radiance HDR file and return its path.
pub fn write_hdr_fixture() -> PathBuf {
    write_sized_hdr_fixture(2, 1)
}

/// Write a valid uncompressed Radiance HDR file of the given size.
///
/// The file lives in the temp dir until the [`TestContext`] that renders it
/// is dropped.
#[allow(dead_code)]
pub fn write_sized_hdr_fixture(width: u32, height: u32) -> PathBuf {
    let mut bytes =
        format!("#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y {height} +X {width}\n").into_bytes();
    for i in 0..width * height {
        let level = if i % 2 == 0 { 128 } else { 64 };
        bytes.extend_from_slice(&[level, level, level, 129]);
    }
    let path = std::env::temp_dir().join(format!(
        "{FIXTURE_PREFIX}{}-{}.hdr",
        std::process::id(),
        NEXT_FIXTURE.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::write(&path, bytes).expect("write HDR fixture");
    path
}

fn is_fixture(path: &Path) -> bool {
    path.parent() == Some(std::env::temp_dir().as_path())
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(FIXTURE_PREFIX))
}

/// A renderer on a recording backend plus the demo scene.
pub struct TestContext {
    pub backend: Arc<DummyBackend>,
    pub device: Arc<GraphicsDevice>,
    pub diagnostics: Arc<Diagnostics>,
    pub renderer: Renderer,
    pub scene: Scene,
    pub frame: FrameState,
    fixtures: Vec<PathBuf>,
}

impl Drop for TestContext {
    fn drop(&mut self) {
        for path in &self.fixtures {
            let _ = std::fs::remove_file(path);
        }
    }
}

impl TestContext {
    /// Two decodable environments and every program building.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> TestContextBuilder {
        TestContextBuilder::default()
    }

    /// Render one frame with no overlay.
    pub fn render(&mut self, settings: &RenderSettings) -> FrameReport {
        self.renderer
            .render_frame(settings, &self.frame, &self.scene, &mut NoOverlay)
            .expect("frame should complete")
    }

    /// Passes executed since the last call.
    pub fn take_trace(&self) -> Vec<ExecutedPass> {
        self.backend.take_trace()
    }
}

#[derive(Default)]
pub struct TestContextBuilder {
    environments: Option<Vec<PathBuf>>,
    failing: Vec<ProgramKind>,
}

impl TestContextBuilder {
    pub fn environments(mut self, paths: Vec<PathBuf>) -> Self {
        self.environments = Some(paths);
        self
    }

    pub fn failing_program(mut self, kind: ProgramKind) -> Self {
        self.failing.push(kind);
        self
    }

    pub fn build(self) -> TestContext {
        let _ = env_logger::builder().is_test(true).try_init();

        let backend = Arc::new(DummyBackend::new());
        for kind in &self.failing {
            backend.fail_program(*kind);
        }
        let device = GraphicsInstance::with_backend(backend.clone())
            .create_device()
            .expect("dummy device");
        let diagnostics = Arc::new(Diagnostics::new(FailurePolicy::Permissive));
        let paths = self
            .environments
            .unwrap_or_else(|| vec![write_hdr_fixture(), write_hdr_fixture()]);
        let fixtures = paths.iter().filter(|p| is_fixture(p)).cloned().collect();
        let renderer = Renderer::new(
            device.clone(),
            diagnostics.clone(),
            WIDTH,
            HEIGHT,
            EnvironmentLibrary::new(paths),
        )
        .expect("renderer");
        let scene = Scene::demo(&device).expect("demo scene");

        TestContext {
            backend,
            device,
            diagnostics,
            renderer,
            scene,
            frame: FrameState::new(WIDTH, HEIGHT),
            fixtures,
        }
    }
}

/// Names of the passes in a trace, in execution order.
#[allow(dead_code)]
pub fn pass_names(trace: &[ExecutedPass]) -> Vec<&str> {
    trace.iter().map(|p| p.name.as_str()).collect()
}
