//! CPU meshing crate: face culling, shading and per-group vertex streams for one chunk.
#![forbid(unsafe_code)]

mod build;
pub mod constants;
pub mod cull;
mod emit;
pub mod face;
mod mesh_build;
mod neighbors;
mod packet;
pub mod shade;

pub use build::ChunkMesher;
pub use emit::BuildSink;
pub use face::{Axis, Face};
pub use mesh_build::MeshBuild;
pub use neighbors::ChunkNeighborhood;
pub use packet::MeshPacket;
