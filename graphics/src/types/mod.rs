//! Common types and descriptors for graphics resources.
//!
//! This module contains format enums, usage flags, and descriptor structs
//! used throughout the graphics system.

mod common;
mod sampler;
mod texture;

pub use common::{ClearValue, Extent3d, Viewport};
pub use sampler::SamplerDescriptor;
pub use texture::{TextureDescriptor, TextureDimension, TextureFormat, TextureUsage};

pub use lumina_core::texture::{AddressMode, CompareFunction, FilterMode};
