//! Main application struct and event loop.

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use crate::args::AppArgs;
use crate::context::AppContext;
use crate::handler::AppHandler;
use crate::input::{map_winit_button, map_winit_key};

/// Main application struct that manages the window and graphics.
///
/// The `App` struct is generic over:
/// - `H`: The handler type that implements [`AppHandler`]
/// - `A`: The arguments type that implements [`AppArgs`]
///
/// # Example
///
/// ```ignore
/// use lumina_app::{App, AppArgs, AppContext, AppHandler, DefaultAppArgs};
///
/// struct MyApp;
///
/// impl AppHandler for MyApp {
///     fn on_draw(&mut self, ctx: &mut AppContext) -> Result<(), GraphicsError> {
///         Ok(())
///     }
/// }
///
/// fn main() {
///     App::run(MyApp, DefaultAppArgs::parse());
/// }
/// ```
pub struct App<H, A>
where
    H: AppHandler,
    A: AppArgs,
{
    handler: H,
    args: A,
    window: Option<Arc<Window>>,
    context: Option<AppContext>,
    running: bool,
    initialized: bool,
    shut_down: bool,
}

impl<H, A> App<H, A>
where
    H: AppHandler + 'static,
    A: AppArgs + 'static,
{
    /// Create a new application.
    pub fn new(handler: H, args: A) -> Self {
        Self {
            handler,
            args,
            window: None,
            context: None,
            running: true,
            initialized: false,
            shut_down: false,
        }
    }

    /// Run the application with the given handler and arguments.
    ///
    /// This is the main entry point. It initializes logging, then either
    /// opens a window and runs the event loop or, with `--headless`, drives
    /// the handler directly.
    pub fn run(handler: H, args: A) {
        // Initialize logging
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

        lumina_core::init();
        crate::init();

        let mut app = Self::new(handler, args);
        if app.args.headless() {
            app.run_headless();
            return;
        }

        let event_loop = match EventLoop::new() {
            Ok(event_loop) => event_loop,
            Err(e) => {
                log::error!("Failed to create event loop: {}", e);
                return;
            }
        };
        if let Err(e) = event_loop.run_app(&mut app) {
            log::error!("Event loop error: {}", e);
        }
    }

    /// Drive the handler without a window until `max_frames` (one frame if
    /// unset) or until the handler asks to stop.
    pub fn run_headless(&mut self) {
        let mut ctx = match AppContext::new(&self.args) {
            Ok(ctx) => ctx,
            Err(e) => {
                log::error!("Failed to initialize graphics: {}", e);
                return;
            }
        };
        log::info!("Running headless at {}x{}", ctx.width, ctx.height);

        if let Err(e) = self.handler.on_init(&mut ctx) {
            log::error!("Initialization failed: {}", e);
            return;
        }
        self.initialized = true;
        self.context = Some(ctx);

        let max_frames = self.args.max_frames().unwrap_or(1);
        while self.running && self.frame_number() < max_frames {
            self.render_frame();
        }
        self.shutdown();
    }

    fn frame_number(&self) -> u64 {
        self.context.as_ref().map_or(0, AppContext::frame_number)
    }

    /// Create the device and attach the window surface.
    fn init_graphics(&mut self, window: Arc<Window>) -> bool {
        let mut ctx = match AppContext::new(&self.args) {
            Ok(ctx) => ctx,
            Err(e) => {
                log::error!("Failed to initialize graphics: {}", e);
                return false;
            }
        };

        let physical_size = window.inner_size();
        ctx.width = physical_size.width.max(1);
        ctx.height = physical_size.height.max(1);
        ctx.scale_factor = window.scale_factor();

        let surface_format =
            match ctx
                .device
                .attach_surface(window, ctx.width, ctx.height, self.args.vsync())
            {
                Ok(format) => format,
                Err(e) => {
                    log::error!("Failed to create surface: {}", e);
                    return false;
                }
            };

        log::info!(
            "Graphics initialized: {} ({}x{} physical, scale_factor={}, format={:?})",
            ctx.device.name(),
            ctx.width,
            ctx.height,
            ctx.scale_factor,
            surface_format
        );

        self.context = Some(ctx);
        true
    }

    /// Reconfigure the surface and notify the handler of a resize.
    fn apply_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let Some(ctx) = &mut self.context else {
            return;
        };
        if ctx.width == width && ctx.height == height {
            return;
        }

        ctx.width = width;
        ctx.height = height;
        if let Err(e) = ctx.device.resize_surface(width, height) {
            log::error!("Failed to reconfigure surface: {}", e);
        }
        self.handler.on_resize(ctx);
    }

    /// Update and draw one frame.
    fn render_frame(&mut self) {
        let Some(ctx) = &mut self.context else {
            return;
        };
        ctx.tick();

        if !self.handler.on_update(ctx) || ctx.exit_requested {
            self.running = false;
            return;
        }

        if let Err(e) = self.handler.on_draw(ctx) {
            log::error!("Frame {} failed: {}", ctx.frame_number(), e);
            self.running = false;
            return;
        }

        if let Some(max_frames) = self.args.max_frames()
            && ctx.frame_number() >= max_frames
        {
            log::info!("Reached max frames limit ({}), exiting", max_frames);
            self.running = false;
        }
    }

    fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        if let Some(ctx) = &mut self.context {
            self.handler.on_shutdown(ctx);
            log::info!(
                "Shut down after {} frames ({:.1}s)",
                ctx.frame_number(),
                ctx.elapsed_time()
            );
        }
    }

    fn stop(&mut self, event_loop: &ActiveEventLoop) {
        self.running = false;
        self.shutdown();
        event_loop.exit();
    }
}

impl<H, A> ApplicationHandler for App<H, A>
where
    H: AppHandler + 'static,
    A: AppArgs + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title(self.args.window_title())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.args.window_width(),
                self.args.window_height(),
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };
        log::info!("Window created");
        self.window = Some(window.clone());

        if !self.init_graphics(window) {
            event_loop.exit();
            return;
        }

        if let Some(ctx) = &mut self.context
            && let Err(e) = self.handler.on_init(ctx)
        {
            log::error!("Initialization failed: {}", e);
            event_loop.exit();
            return;
        }
        self.initialized = true;
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                self.stop(event_loop);
            }

            WindowEvent::Resized(size) => {
                self.apply_resize(size.width, size.height);
            }

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let Some(ctx) = &mut self.context {
                    ctx.scale_factor = scale_factor;
                    log::info!("Scale factor changed to {}", scale_factor);
                }
            }

            WindowEvent::Focused(false) => {
                if let Some(ctx) = &mut self.context {
                    ctx.input.release_all();
                }
            }

            WindowEvent::CursorLeft { .. } => {
                if let Some(ctx) = &mut self.context {
                    ctx.input.forget_cursor();
                }
            }

            WindowEvent::RedrawRequested => {
                if self.initialized && self.running {
                    self.render_frame();
                }

                if !self.running {
                    self.stop(event_loop);
                } else if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(code) = event.physical_key else {
                    return;
                };
                let Some(key) = map_winit_key(code) else {
                    return;
                };
                if let Some(ctx) = &mut self.context {
                    let pressed = event.state == ElementState::Pressed;
                    ctx.input.set_key(key, pressed);
                    self.handler.on_key(ctx, key, pressed, event.repeat);
                    if ctx.exit_requested {
                        self.stop(event_loop);
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                if let Some(ctx) = &mut self.context {
                    let offset = ctx.input.move_cursor(position.x, position.y);
                    self.handler.on_mouse_move(ctx, position.x, position.y);
                    if let Some((dx, dy)) = offset {
                        self.handler.on_mouse_motion(ctx, dx, dy);
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let Some(button) = map_winit_button(button) else {
                    return;
                };
                if let Some(ctx) = &mut self.context {
                    let pressed = state == ElementState::Pressed;
                    ctx.input.set_button(button, pressed);
                    self.handler.on_mouse_button(ctx, button, pressed);
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::DefaultAppArgs;
    use lumina_core::input::KeyCode;
    use lumina_graphics::{BackendType, GraphicsError};

    #[derive(Default)]
    struct Recorder {
        inits: u32,
        updates: u32,
        draws: u32,
        shutdowns: u32,
        stop_after: Option<u32>,
        fail_draw: bool,
    }

    impl AppHandler for Recorder {
        fn on_init(&mut self, _ctx: &mut AppContext) -> Result<(), GraphicsError> {
            self.inits += 1;
            Ok(())
        }

        fn on_update(&mut self, _ctx: &mut AppContext) -> bool {
            self.updates += 1;
            self.stop_after.is_none_or(|n| self.updates <= n)
        }

        fn on_draw(&mut self, _ctx: &mut AppContext) -> Result<(), GraphicsError> {
            self.draws += 1;
            if self.fail_draw {
                return Err(GraphicsError::SurfaceLost);
            }
            Ok(())
        }

        fn on_key(&mut self, ctx: &mut AppContext, key: KeyCode, pressed: bool, _repeat: bool) {
            if key == KeyCode::Escape && pressed {
                ctx.request_exit();
            }
        }

        fn on_shutdown(&mut self, _ctx: &mut AppContext) {
            self.shutdowns += 1;
        }
    }

    fn headless_args() -> DefaultAppArgs {
        DefaultAppArgs::default()
            .with_backend(BackendType::Dummy)
            .with_headless(true)
    }

    #[test]
    fn test_headless_runs_max_frames() {
        let mut app = App::new(Recorder::default(), headless_args().with_max_frames(5));
        app.run_headless();
        assert_eq!(app.handler.inits, 1);
        assert_eq!(app.handler.draws, 5);
        assert_eq!(app.handler.shutdowns, 1);
        assert_eq!(app.frame_number(), 5);
    }

    #[test]
    fn test_headless_defaults_to_one_frame() {
        let mut app = App::new(Recorder::default(), headless_args());
        app.run_headless();
        assert_eq!(app.handler.draws, 1);
    }

    #[test]
    fn test_update_returning_false_stops_before_draw() {
        let handler = Recorder {
            stop_after: Some(2),
            ..Default::default()
        };
        let mut app = App::new(handler, headless_args().with_max_frames(10));
        app.run_headless();
        assert_eq!(app.handler.updates, 3);
        assert_eq!(app.handler.draws, 2);
        assert_eq!(app.handler.shutdowns, 1);
    }

    #[test]
    fn test_draw_error_ends_run() {
        let handler = Recorder {
            fail_draw: true,
            ..Default::default()
        };
        let mut app = App::new(handler, headless_args().with_max_frames(10));
        app.run_headless();
        assert_eq!(app.handler.draws, 1);
        assert_eq!(app.handler.shutdowns, 1);
    }

    #[test]
    fn test_shutdown_runs_once() {
        let mut app = App::new(Recorder::default(), headless_args());
        app.run_headless();
        app.shutdown();
        assert_eq!(app.handler.shutdowns, 1);
    }
}
