//! Chunked block storage, dirty tracking and reference world generators.
#![forbid(unsafe_code)]

mod chunk;
mod coord;
pub mod generation;
mod world;

pub use chunk::{CHUNK_MASK, CHUNK_SHIFT, CHUNK_SIZE, CHUNK_VOLUME, Chunk};
pub use coord::ChunkCoord;
pub use world::{World, WorldConfig};
