//! # Lumina Demos
//!
//! Demo scenes showcasing the Lumina renderer.
//!
//! ## Available Demos
//!
//! - `pbr_ibl` - PBR scene lit by HDR environment maps, with a fly camera,
//!   deferred and forward paths, bloom, tone mapping and anti-aliasing
//!   toggles

/// Demos library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
