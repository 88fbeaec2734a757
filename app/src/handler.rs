//! Application handler trait.

use lumina_core::input::{KeyCode, MouseButton};
use lumina_graphics::GraphicsError;

use crate::context::AppContext;

/// Trait for handling application events and draw requests.
///
/// # Lifecycle
///
/// 1. `on_init` - Called once when the device (and window, if any) exist
/// 2. `on_resize` - Called when the window is resized
/// 3. `on_update` - Called every frame before drawing
/// 4. `on_draw` - Called every frame to render
/// 5. `on_shutdown` - Called when the application is closing
///
/// Headless runs skip the window events but call the same lifecycle hooks.
///
/// # Example
///
/// ```ignore
/// use lumina_app::{AppContext, AppHandler};
/// use lumina_graphics::GraphicsError;
///
/// struct MyApp {
///     frame_count: u64,
/// }
///
/// impl AppHandler for MyApp {
///     fn on_draw(&mut self, ctx: &mut AppContext) -> Result<(), GraphicsError> {
///         self.frame_count += 1;
///         Ok(())
///     }
/// }
/// ```
pub trait AppHandler {
    /// Called once when the application initializes.
    ///
    /// Use this to create GPU resources, load assets, etc. An error ends the
    /// run before the first frame.
    fn on_init(&mut self, _ctx: &mut AppContext) -> Result<(), GraphicsError> {
        Ok(())
    }

    /// Called when the window is resized to a non-zero size.
    ///
    /// The new size is available in `ctx.width()` and `ctx.height()`.
    fn on_resize(&mut self, _ctx: &mut AppContext) {}

    /// Called every frame before drawing.
    ///
    /// Returns `true` to continue running, `false` to exit.
    fn on_update(&mut self, _ctx: &mut AppContext) -> bool {
        true
    }

    /// Called every frame to render and present.
    ///
    /// An error is logged and ends the run.
    fn on_draw(&mut self, ctx: &mut AppContext) -> Result<(), GraphicsError>;

    /// Called when a mapped key is pressed or released. `repeat` is set for
    /// auto-repeat presses of a key that is already held.
    fn on_key(&mut self, _ctx: &mut AppContext, _key: KeyCode, _pressed: bool, _repeat: bool) {}

    /// Called when the cursor moves, with its position in physical pixels.
    fn on_mouse_move(&mut self, _ctx: &mut AppContext, _x: f64, _y: f64) {}

    /// Called after `on_mouse_move` with the offset from the previous cursor
    /// position. Not called for the first position after the cursor enters
    /// the window or focus returns.
    fn on_mouse_motion(&mut self, _ctx: &mut AppContext, _dx: f64, _dy: f64) {}

    /// Called when a mouse button is pressed or released.
    fn on_mouse_button(&mut self, _ctx: &mut AppContext, _button: MouseButton, _pressed: bool) {}

    /// Called when the application is closing.
    fn on_shutdown(&mut self, _ctx: &mut AppContext) {}
}
