//! # Lumina Core
//!
//! CPU-side building blocks for the Lumina renderer: decoded textures,
//! mesh data and generators, input state and frame timing. Nothing here
//! touches the GPU.

pub mod input;
pub mod mesh;
pub mod texture;
pub mod time;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the core version. Called once by the application shell.
pub fn init() {
    log::info!("Lumina Core v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
