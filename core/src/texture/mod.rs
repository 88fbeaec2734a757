//! CPU-side texture types.
//!
//! Provides [`CpuTexture`] for holding decoded pixel data before upload,
//! the [`load_equirect_hdr`] loader for Radiance `.hdr` environment maps,
//! and the [`FilterMode`] / [`AddressMode`] / [`CompareFunction`] enums
//! shared between CPU and GPU code.

mod cpu;
mod hdr;
mod sampling;

pub use cpu::{CpuTexture, TexelFormat};
pub use hdr::{TextureLoadError, load_equirect_hdr, load_equirect_hdr_from_memory};
pub use sampling::{AddressMode, CompareFunction, FilterMode};
