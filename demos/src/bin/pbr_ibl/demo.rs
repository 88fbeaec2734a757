//! PBR IBL Demo application.

use lumina_app::{AppContext, AppHandler, KeyCode, MouseButton};
use lumina_graphics::{FrameState, GraphicsError, NoOverlay, RenderSettings, Renderer, Scene};

use crate::camera::{FlyCamera, Movement};
use crate::controls::{Command, apply_key};

/// Frames between GPU timing log lines.
const TIMING_LOG_INTERVAL: u64 = 300;

/// Everything created once the device exists.
struct Loaded {
    renderer: Renderer,
    scene: Scene,
    frame: FrameState,
}

/// The main PBR IBL demo application.
pub struct PbrIblDemo {
    camera: FlyCamera,
    settings: RenderSettings,
    /// Mouse look is active while the left button is held.
    looking: bool,
    loaded: Option<Loaded>,
}

impl PbrIblDemo {
    pub fn new() -> Self {
        Self {
            camera: FlyCamera::default(),
            settings: RenderSettings::default(),
            looking: false,
            loaded: None,
        }
    }

    fn movement(ctx: &AppContext) -> Movement {
        let input = ctx.input();
        Movement {
            forward: input.is_pressed(KeyCode::W),
            backward: input.is_pressed(KeyCode::S),
            left: input.is_pressed(KeyCode::A),
            right: input.is_pressed(KeyCode::D),
            fast: input.shift(),
            slow: input.ctrl(),
        }
    }
}

impl Default for PbrIblDemo {
    fn default() -> Self {
        Self::new()
    }
}

impl AppHandler for PbrIblDemo {
    fn on_init(&mut self, ctx: &mut AppContext) -> Result<(), GraphicsError> {
        let (width, height) = (ctx.width(), ctx.height());
        let mut renderer = Renderer::new(
            ctx.device().clone(),
            ctx.diagnostics().clone(),
            width,
            height,
            ctx.environment_library(),
        )?;
        let scene = Scene::demo(ctx.device())?;

        // Bake the first environment before the window shows anything.
        renderer.prepare_environment(self.settings.environment_index)?;

        log::info!(
            "PBR IBL demo ready: {} environments, {}x{}",
            renderer.environments().len(),
            width,
            height
        );
        self.loaded = Some(Loaded {
            renderer,
            scene,
            frame: FrameState::new(width, height),
        });
        Ok(())
    }

    fn on_resize(&mut self, ctx: &mut AppContext) {
        let Some(loaded) = &mut self.loaded else {
            return;
        };
        if let Err(e) = loaded.renderer.resize(ctx.width(), ctx.height()) {
            log::error!("Resize to {}x{} failed: {}", ctx.width(), ctx.height(), e);
        }
        loaded.frame.resize(ctx.width(), ctx.height());
    }

    fn on_update(&mut self, ctx: &mut AppContext) -> bool {
        let dt = ctx.delta_time();
        self.camera.travel(Self::movement(ctx), dt);

        if let Some(loaded) = &mut self.loaded {
            if self.settings.rotate {
                loaded
                    .frame
                    .advance_rotation(self.settings.rotation_speed, dt);
            }
            loaded.frame.set_camera(
                self.camera.position,
                self.camera.front(),
                self.camera.view(),
            );
        }
        true
    }

    fn on_draw(&mut self, _ctx: &mut AppContext) -> Result<(), GraphicsError> {
        let Some(loaded) = &mut self.loaded else {
            return Ok(());
        };
        let report = loaded.renderer.render_frame(
            &self.settings,
            &loaded.frame,
            &loaded.scene,
            &mut NoOverlay,
        )?;

        if report.ibl_runs > 0 {
            log::info!(
                "Regenerated lighting for environment {}",
                self.settings.environment_index
            );
        }
        if report.diagnostics > 0 {
            log::warn!(
                "Frame {} reported {} diagnostics",
                loaded.renderer.frame_index(),
                report.diagnostics
            );
        }
        if loaded.renderer.frame_index() % TIMING_LOG_INTERVAL == 0
            && let Some(nanos) = report.gpu_time
        {
            log::info!("GPU frame time: {:.2} ms", nanos as f64 / 1.0e6);
        }
        Ok(())
    }

    fn on_key(&mut self, ctx: &mut AppContext, key: KeyCode, pressed: bool, repeat: bool) {
        if !pressed || repeat {
            return;
        }
        let Some(loaded) = &self.loaded else {
            return;
        };

        match apply_key(&mut self.settings, loaded.renderer.environments(), key) {
            Some(Command::Exit) => ctx.request_exit(),
            Some(Command::SwitchEnvironment) => {
                let index = self.settings.environment_index;
                log::info!(
                    "Switching to environment {} ({:?})",
                    index,
                    loaded.renderer.environments().path(index)
                );
            }
            Some(Command::Changed) => log::debug!("Settings: {:?}", self.settings),
            None => {}
        }
    }

    fn on_mouse_button(&mut self, _ctx: &mut AppContext, button: MouseButton, pressed: bool) {
        if button == MouseButton::Left {
            self.looking = pressed;
        }
    }

    fn on_mouse_motion(&mut self, _ctx: &mut AppContext, dx: f64, dy: f64) {
        if self.looking {
            self.camera.look(dx, dy);
        }
    }

    fn on_shutdown(&mut self, _ctx: &mut AppContext) {
        if let Some(loaded) = &self.loaded {
            log::info!(
                "PBR IBL demo rendered {} frames, {} diagnostics",
                loaded.renderer.frame_index(),
                loaded.renderer.diagnostics().count()
            );
        }
    }
}
