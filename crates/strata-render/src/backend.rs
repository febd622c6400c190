use strata_blocks::RenderGroup;
use strata_geom::Mat4;

pub type BufferId = u32;

/// Upload hint: `Static` for first builds, `Stream` for chunks that keep being edited.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BufferUsage {
    Static,
    Stream,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GpuError {
    #[error("GPU allocation of {bytes} bytes for {what} failed")]
    Allocation { what: &'static str, bytes: usize },
    #[error("unknown GPU buffer {0}")]
    UnknownBuffer(BufferId),
    #[error("update of {len} floats overflows buffer {id} of {capacity} floats")]
    Overflow {
        id: BufferId,
        len: usize,
        capacity: usize,
    },
}

/// The graphics calls the chunk pipeline needs. Vertex data is the interleaved
/// `x, y, z, shade, u, v` layout; quads are drawn through a shared `u16` index buffer.
pub trait GpuBackend {
    fn create_index_buffer(&mut self, indices: &[u16]) -> Result<BufferId, GpuError>;

    fn create_vertex_buffer(&mut self, data: &[f32], usage: BufferUsage)
    -> Result<BufferId, GpuError>;

    /// Overwrites the start of an existing vertex buffer; `data` must fit its capacity.
    fn update_vertex_buffer(&mut self, id: BufferId, data: &[f32]) -> Result<(), GpuError>;

    fn delete_vertex_buffer(&mut self, id: BufferId);

    fn delete_index_buffer(&mut self, id: BufferId);

    fn draw_quads(
        &mut self,
        vertex: BufferId,
        index: BufferId,
        quad_count: usize,
        group: RenderGroup,
    );

    /// Called once per frame before any `draw_quads`.
    fn begin_frame(&mut self, _view_proj: &Mat4) {}

    /// Called once per frame after the last `draw_quads`.
    fn end_frame(&mut self) {}
}
