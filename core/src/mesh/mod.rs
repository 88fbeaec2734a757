//! CPU-side mesh types and generators.
//!
//! - [`Vertex`] - The single vertex layout every lit mesh uses
//! - [`CpuMesh`] - Vertices plus an optional index list
//! - [`generators`] - Procedural shapes for the demo scene

mod data;
pub mod generators;

pub use data::{CpuMesh, MeshShape, Vertex};
pub use generators::{generate_cube, generate_plane, generate_sphere};
