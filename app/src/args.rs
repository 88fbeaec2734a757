//! Command line arguments trait and default implementation.
//!
//! Uses clap for CLI parsing with:
//! - Help text (`--help`)
//! - Validation and clear error messages
//! - A repeatable `--env` list of environment maps

use std::path::PathBuf;

use lumina_graphics::{BackendType, FailurePolicy};

/// Trait for parsing command line arguments.
///
/// Implement this trait to customize how your application handles
/// command line arguments. Every method except [`parse`](Self::parse) has a
/// default, so only the options you need have to be overridden.
///
/// # Example
///
/// ```ignore
/// use lumina_app::AppArgs;
///
/// struct FixedArgs;
///
/// impl AppArgs for FixedArgs {
///     fn parse() -> Self {
///         Self
///     }
///
///     fn max_frames(&self) -> Option<u64> {
///         Some(10)
///     }
/// }
/// ```
pub trait AppArgs: Sized {
    /// Parse command line arguments.
    fn parse() -> Self;

    /// Get the graphics backend to use.
    ///
    /// Default: `BackendType::Auto` (best backend compiled in)
    fn backend(&self) -> BackendType {
        BackendType::Auto
    }

    /// Get the initial window width.
    ///
    /// Default: 1200
    fn window_width(&self) -> u32 {
        1200
    }

    /// Get the initial window height.
    ///
    /// Default: 800
    fn window_height(&self) -> u32 {
        800
    }

    /// Get the window title.
    fn window_title(&self) -> &str {
        "Lumina"
    }

    /// Get whether VSync is enabled.
    ///
    /// Default: true
    fn vsync(&self) -> bool {
        true
    }

    /// Get the maximum number of frames to process before auto-exit.
    ///
    /// Default: `None` (run until the window closes)
    fn max_frames(&self) -> Option<u64> {
        None
    }

    /// Run the frame loop without creating a window.
    fn headless(&self) -> bool {
        false
    }

    /// How rendering failures are treated.
    ///
    /// Default: `FailurePolicy::Permissive` (log and continue)
    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::Permissive
    }

    /// Equirectangular HDR images to light the scene with, in cycling order.
    fn environments(&self) -> &[PathBuf] {
        &[]
    }
}

/// Graphics backend selection for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CliBackend {
    /// Use wgpu when compiled in, otherwise the recording backend.
    #[default]
    Auto,
    /// Cross-platform backend via wgpu.
    Wgpu,
    /// Records the work it is given without drawing. Useful in CI.
    Dummy,
}

impl From<CliBackend> for BackendType {
    fn from(cli: CliBackend) -> Self {
        match cli {
            CliBackend::Auto => BackendType::Auto,
            CliBackend::Wgpu => BackendType::Wgpu,
            CliBackend::Dummy => BackendType::Dummy,
        }
    }
}

/// Default command line arguments implementation.
///
/// # Examples
///
/// ```bash
/// # Show help
/// ./pbr_ibl --help
///
/// # Cycle between two environments
/// ./pbr_ibl --env hdr/newport_loft.hdr --env hdr/arches.hdr
///
/// # Render 10 frames without a window and fail on any diagnostic
/// ./pbr_ibl --headless --backend dummy --max-frames 10 --strict
/// ```
#[derive(Debug, Clone)]
pub struct DefaultAppArgs {
    backend: BackendType,
    width: u32,
    height: u32,
    title: String,
    vsync: bool,
    max_frames: Option<u64>,
    headless: bool,
    strict: bool,
    environments: Vec<PathBuf>,
}

impl Default for DefaultAppArgs {
    fn default() -> Self {
        Self {
            backend: BackendType::Auto,
            width: 1200,
            height: 800,
            title: "Lumina".to_string(),
            vsync: true,
            max_frames: None,
            headless: false,
            strict: false,
            environments: Vec::new(),
        }
    }
}

impl DefaultAppArgs {
    /// Create new default args with a custom title.
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the window size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the graphics backend.
    pub fn with_backend(mut self, backend: BackendType) -> Self {
        self.backend = backend;
        self
    }

    /// Set the maximum number of frames.
    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    /// Run without a window.
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Append an environment map.
    pub fn with_environment(mut self, path: impl Into<PathBuf>) -> Self {
        self.environments.push(path.into());
        self
    }

    /// Replace the window title, keeping everything else.
    pub fn with_title_str(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Parse from an explicit argument list. The first item is the program
    /// name.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        use clap::Parser;
        native::ClapArgs::try_parse_from(args).map(Into::into)
    }
}

mod native {
    use super::*;
    use clap::Parser;

    /// Lumina application arguments.
    #[derive(Parser, Debug)]
    #[command(
        name = "Lumina",
        about = "Physically based renderer with image-based lighting",
        long_about = "Renders a PBR scene lit by an HDR environment map.\n\n\
            Each environment is projected to a cubemap, convolved into an\n\
            irradiance map and prefiltered per roughness level the first time\n\
            it is shown. Cycle environments with N / P.\n\
            \n\
            EXAMPLES:\n\
              # Window with the wgpu backend\n\
              ./pbr_ibl --backend wgpu --env hdr/newport_loft.hdr\n\
            \n\
              # Headless smoke test\n\
              ./pbr_ibl --headless --backend dummy --max-frames 10",
        version
    )]
    pub(super) struct ClapArgs {
        /// Graphics backend to use.
        #[arg(long, default_value = "auto", value_enum)]
        pub backend: CliBackend,

        /// Initial window width in pixels.
        #[arg(long, default_value = "1200")]
        pub width: u32,

        /// Initial window height in pixels.
        #[arg(long, default_value = "800")]
        pub height: u32,

        /// Disable vertical sync (may cause tearing).
        #[arg(long)]
        pub no_vsync: bool,

        /// Exit after rendering N frames (useful for testing).
        #[arg(long)]
        pub max_frames: Option<u64>,

        /// Render offscreen without opening a window.
        #[arg(long)]
        pub headless: bool,

        /// Panic on the first rendering diagnostic (debug builds only).
        #[arg(long)]
        pub strict: bool,

        /// Equirectangular HDR environment map. Repeat to add more.
        #[arg(long = "env", value_name = "PATH")]
        pub environments: Vec<PathBuf>,
    }

    impl From<ClapArgs> for DefaultAppArgs {
        fn from(args: ClapArgs) -> Self {
            if args.environments.is_empty() {
                log::warn!("no --env given, the scene will be lit by a placeholder environment");
            }
            if args.headless && args.max_frames.is_none() {
                log::info!("--headless without --max-frames renders a single frame");
            }

            Self {
                backend: args.backend.into(),
                width: args.width,
                height: args.height,
                title: "Lumina".to_string(),
                vsync: !args.no_vsync,
                max_frames: args.max_frames,
                headless: args.headless,
                strict: args.strict,
                environments: args.environments,
            }
        }
    }
}

impl AppArgs for DefaultAppArgs {
    fn parse() -> Self {
        use clap::Parser;
        native::ClapArgs::parse().into()
    }

    fn backend(&self) -> BackendType {
        self.backend
    }

    fn window_width(&self) -> u32 {
        self.width
    }

    fn window_height(&self) -> u32 {
        self.height
    }

    fn window_title(&self) -> &str {
        &self.title
    }

    fn vsync(&self) -> bool {
        self.vsync
    }

    fn max_frames(&self) -> Option<u64> {
        self.max_frames
    }

    fn headless(&self) -> bool {
        self.headless
    }

    fn failure_policy(&self) -> FailurePolicy {
        if self.strict {
            FailurePolicy::Strict
        } else {
            FailurePolicy::Permissive
        }
    }

    fn environments(&self) -> &[PathBuf] {
        &self.environments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let args = DefaultAppArgs::try_parse_from(["pbr_ibl"]).unwrap();
        assert_eq!(args.backend(), BackendType::Auto);
        assert_eq!((args.window_width(), args.window_height()), (1200, 800));
        assert!(args.vsync());
        assert!(!args.headless());
        assert_eq!(args.max_frames(), None);
        assert_eq!(args.failure_policy(), FailurePolicy::Permissive);
        assert!(args.environments().is_empty());
    }

    #[test]
    fn test_repeated_env_keeps_order() {
        let args = DefaultAppArgs::try_parse_from([
            "pbr_ibl", "--env", "a.hdr", "--env", "b.hdr", "--env", "c.hdr",
        ])
        .unwrap();
        let names: Vec<_> = args
            .environments()
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.hdr", "b.hdr", "c.hdr"]);
    }

    #[test]
    fn test_headless_strict_run() {
        let args = DefaultAppArgs::try_parse_from([
            "pbr_ibl",
            "--headless",
            "--strict",
            "--backend",
            "dummy",
            "--max-frames",
            "10",
            "--width",
            "640",
            "--height",
            "480",
            "--no-vsync",
        ])
        .unwrap();
        assert!(args.headless());
        assert_eq!(args.failure_policy(), FailurePolicy::Strict);
        assert_eq!(args.backend(), BackendType::Dummy);
        assert_eq!(args.max_frames(), Some(10));
        assert_eq!((args.window_width(), args.window_height()), (640, 480));
        assert!(!args.vsync());
    }

    #[rstest]
    #[case("auto", BackendType::Auto)]
    #[case("wgpu", BackendType::Wgpu)]
    #[case("dummy", BackendType::Dummy)]
    fn test_backend_names(#[case] name: &str, #[case] expected: BackendType) {
        let args = DefaultAppArgs::try_parse_from(["pbr_ibl", "--backend", name]).unwrap();
        assert_eq!(args.backend(), expected);
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(DefaultAppArgs::try_parse_from(["pbr_ibl", "--backend", "vulkan"]).is_err());
    }

    #[test]
    fn test_builder() {
        let args = DefaultAppArgs::with_title("demo")
            .with_size(320, 200)
            .with_backend(BackendType::Dummy)
            .with_max_frames(3)
            .with_headless(true)
            .with_environment("sky.hdr");
        assert_eq!(args.window_title(), "demo");
        assert_eq!(args.max_frames(), Some(3));
        assert!(args.headless());
        assert_eq!(args.environments().len(), 1);
    }
}
