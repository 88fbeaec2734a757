//! Application context.

use std::path::PathBuf;
use std::sync::Arc;

use lumina_core::input::InputState;
use lumina_core::time::DeltaTime;
use lumina_graphics::{
    Diagnostics, EnvironmentLibrary, GraphicsDevice, GraphicsError, GraphicsInstance,
    TextureFormat,
};

use crate::args::AppArgs;

/// Application context providing access to graphics resources.
///
/// This context is available during all application callbacks and provides
/// access to the graphics device, window dimensions, input state and frame
/// timing.
pub struct AppContext {
    pub(crate) instance: Arc<GraphicsInstance>,
    pub(crate) device: Arc<GraphicsDevice>,
    pub(crate) diagnostics: Arc<Diagnostics>,
    /// Current window width in physical pixels.
    pub(crate) width: u32,
    /// Current window height in physical pixels.
    pub(crate) height: u32,
    /// Current scale factor (DPI scaling).
    pub(crate) scale_factor: f64,
    pub(crate) time: DeltaTime,
    pub(crate) input: InputState,
    pub(crate) headless: bool,
    pub(crate) environments: Vec<PathBuf>,
    pub(crate) exit_requested: bool,
}

impl AppContext {
    /// Create the graphics instance and device selected by `args`.
    ///
    /// No surface is attached; windowed runs attach one once the window
    /// exists.
    pub fn new(args: &impl AppArgs) -> Result<Self, GraphicsError> {
        let instance = GraphicsInstance::with_backend_type(args.backend())?;
        let device = instance.create_device()?;
        log::info!("Graphics device: {}", device.name());

        Ok(Self {
            instance,
            device,
            diagnostics: Arc::new(Diagnostics::new(args.failure_policy())),
            width: args.window_width().max(1),
            height: args.window_height().max(1),
            scale_factor: 1.0,
            time: DeltaTime::new(),
            input: InputState::new(),
            headless: args.headless(),
            environments: args.environments().to_vec(),
            exit_requested: false,
        })
    }

    /// Get the graphics instance.
    pub fn instance(&self) -> &Arc<GraphicsInstance> {
        &self.instance
    }

    /// Get the graphics device.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    /// Shared diagnostic sink, configured with the selected failure policy.
    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }

    /// Environment maps given on the command line.
    pub fn environment_library(&self) -> EnvironmentLibrary {
        EnvironmentLibrary::new(self.environments.iter().cloned())
    }

    /// Get the current window width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the current window height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the window aspect ratio.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Get the current scale factor (DPI scaling).
    ///
    /// This is the ratio between physical pixels and logical pixels.
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Number of frames started so far.
    pub fn frame_number(&self) -> u64 {
        self.time.frame()
    }

    /// Get the delta time since last frame in seconds.
    pub fn delta_time(&self) -> f32 {
        self.time.seconds()
    }

    /// Get the elapsed time since application start in seconds.
    pub fn elapsed_time(&self) -> f32 {
        self.time.elapsed().as_secs_f32()
    }

    /// Held keys and buttons.
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Whether the run has no window.
    pub fn is_headless(&self) -> bool {
        self.headless
    }

    /// Format of the attached surface, `None` when headless.
    pub fn surface_format(&self) -> Option<TextureFormat> {
        self.device.surface_format()
    }

    /// Ask the application to exit after the current callback.
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Advance the frame clock. Headless runs step a fixed 60 Hz interval so
    /// the animation does not depend on how fast frames are produced.
    pub(crate) fn tick(&mut self) {
        if self.headless {
            self.time.advance(std::time::Duration::from_secs_f64(1.0 / 60.0));
        } else {
            self.time.tick();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::DefaultAppArgs;
    use lumina_graphics::BackendType;

    fn headless_context() -> AppContext {
        let args = DefaultAppArgs::default()
            .with_backend(BackendType::Dummy)
            .with_headless(true)
            .with_size(640, 0)
            .with_environment("a.hdr")
            .with_environment("b.hdr");
        AppContext::new(&args).unwrap()
    }

    #[test]
    fn test_zero_height_is_clamped() {
        let ctx = headless_context();
        assert_eq!((ctx.width(), ctx.height()), (640, 1));
        assert_eq!(ctx.aspect_ratio(), 640.0);
    }

    #[test]
    fn test_headless_clock_is_fixed_step() {
        let mut ctx = headless_context();
        ctx.tick();
        ctx.tick();
        assert_eq!(ctx.frame_number(), 2);
        assert!((ctx.delta_time() - 1.0 / 60.0).abs() < 1e-6);
        assert!((ctx.elapsed_time() - 2.0 / 60.0).abs() < 1e-5);
        assert_eq!(ctx.surface_format(), None);
    }

    #[test]
    fn test_environment_library_keeps_cli_order() {
        let ctx = headless_context();
        let library = ctx.environment_library();
        assert_eq!(library.len(), 2);
        assert_eq!(
            library.path(1).map(|p| p.to_string_lossy().into_owned()),
            Some("b.hdr".to_string())
        );
    }

    #[test]
    fn test_request_exit() {
        let mut ctx = headless_context();
        assert!(!ctx.exit_requested());
        ctx.request_exit();
        assert!(ctx.exit_requested());
    }
}
