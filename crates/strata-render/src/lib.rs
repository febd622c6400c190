//! GPU side of chunk streaming: backend seam, shared quad index, per-chunk buffers and culling.
#![deny(unsafe_code)]

mod backend;
mod buffer;
mod chunk_render;
mod headless;
mod quad_index;
#[cfg(feature = "raylib")]
mod raylib_backend;
pub mod visibility;

pub use backend::{BufferId, BufferUsage, GpuBackend, GpuError};
pub use buffer::GpuBuffer;
pub use chunk_render::{ChunkRender, DrawStats, RenderTable};
pub use headless::{DrawCall, HeadlessBackend, HeadlessCounters, VertexBufferInfo};
pub use quad_index::{INDICES_PER_QUAD, MAX_QUADS_U16, QuadIndex, quad_indices};
#[cfg(feature = "raylib")]
pub use raylib_backend::RaylibBackend;
pub use visibility::VisibilityCuller;
