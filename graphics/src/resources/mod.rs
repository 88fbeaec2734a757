//! GPU resource types.
//!
//! Resources are created by [`GraphicsDevice`](crate::GraphicsDevice) and are
//! reference-counted. Each one holds a strong reference to its device.

mod mesh;
mod program;
mod sampler;
mod texture;

pub use mesh::{Mesh, MeshId};
pub use program::{Program, ProgramId, ProgramKind, TextureSlot, VertexInput};
pub use sampler::Sampler;
pub use texture::{Texture, TextureId};
