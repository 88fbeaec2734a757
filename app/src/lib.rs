//! # Lumina App
//!
//! Application shell for Lumina: window creation, the event loop, input
//! forwarding and a headless frame loop for CI.
//!
//! ## Overview
//!
//! - [`AppHandler`] - Trait for handling window events and draw requests
//! - [`AppArgs`] - Trait for parsing command line arguments
//! - [`App`] - Main application struct that manages the window and graphics
//!
//! ## Example
//!
//! ```ignore
//! use lumina_app::{App, AppArgs, AppContext, AppHandler, DefaultAppArgs};
//!
//! struct MyApp;
//!
//! impl AppHandler for MyApp {
//!     fn on_draw(&mut self, ctx: &mut AppContext) -> Result<(), GraphicsError> {
//!         Ok(())
//!     }
//! }
//!
//! fn main() {
//!     App::run(MyApp, DefaultAppArgs::parse());
//! }
//! ```

mod app;
mod args;
mod context;
mod handler;
mod input;

pub use app::App;
pub use args::{AppArgs, CliBackend, DefaultAppArgs};
pub use context::AppContext;
pub use handler::AppHandler;
pub use lumina_core::input::{InputState, KeyCode, MouseButton};

/// App library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the app version.
pub fn init() {
    log::info!("Lumina App v{} initialized", VERSION);
}
