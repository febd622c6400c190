use hashbrown::HashMap;
use strata_blocks::RenderGroup;
use strata_geom::Mat4;

use crate::backend::{BufferId, BufferUsage, GpuBackend, GpuError};

#[derive(Clone, Debug, PartialEq)]
pub struct VertexBufferInfo {
    pub len: usize,
    pub capacity: usize,
    pub usage: BufferUsage,
    pub updates: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawCall {
    pub vertex: BufferId,
    pub index: BufferId,
    pub quads: usize,
    pub group: RenderGroup,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeadlessCounters {
    pub vertex_created: usize,
    pub vertex_updated: usize,
    pub vertex_deleted: usize,
    pub index_created: usize,
    pub index_deleted: usize,
    pub frames: usize,
}

/// Bookkeeping-only backend: tracks live buffers and records draw calls.
///
/// Deleting an unknown id is counted as an invalid delete, which makes double frees visible
/// to tests. `vertex_budget` (in floats) simulates running out of GPU memory.
#[derive(Default)]
pub struct HeadlessBackend {
    next_id: BufferId,
    vertex: HashMap<BufferId, VertexBufferInfo>,
    index: HashMap<BufferId, usize>,
    draws: Vec<DrawCall>,
    counters: HeadlessCounters,
    invalid_deletes: usize,
    vertex_budget: Option<usize>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails vertex allocations once the live total would exceed `floats`.
    pub fn with_vertex_budget(floats: usize) -> Self {
        Self {
            vertex_budget: Some(floats),
            ..Self::default()
        }
    }

    fn alloc_id(&mut self) -> BufferId {
        self.next_id += 1;
        self.next_id
    }

    pub fn live_vertex_buffers(&self) -> usize {
        self.vertex.len()
    }

    pub fn live_index_buffers(&self) -> usize {
        self.index.len()
    }

    pub fn vertex_buffer(&self, id: BufferId) -> Option<&VertexBufferInfo> {
        self.vertex.get(&id)
    }

    pub fn live_vertex_floats(&self) -> usize {
        self.vertex.values().map(|v| v.capacity).sum()
    }

    pub fn counters(&self) -> HeadlessCounters {
        self.counters
    }

    pub fn invalid_deletes(&self) -> usize {
        self.invalid_deletes
    }

    /// Draw calls since the last `begin_frame`.
    pub fn draws(&self) -> &[DrawCall] {
        &self.draws
    }
}

impl GpuBackend for HeadlessBackend {
    fn create_index_buffer(&mut self, indices: &[u16]) -> Result<BufferId, GpuError> {
        let id = self.alloc_id();
        self.index.insert(id, indices.len());
        self.counters.index_created += 1;
        Ok(id)
    }

    fn create_vertex_buffer(
        &mut self,
        data: &[f32],
        usage: BufferUsage,
    ) -> Result<BufferId, GpuError> {
        if let Some(budget) = self.vertex_budget {
            if self.live_vertex_floats() + data.len() > budget {
                return Err(GpuError::Allocation {
                    what: "vertex buffer",
                    bytes: std::mem::size_of_val(data),
                });
            }
        }
        let id = self.alloc_id();
        self.vertex.insert(
            id,
            VertexBufferInfo {
                len: data.len(),
                capacity: data.len(),
                usage,
                updates: 0,
            },
        );
        self.counters.vertex_created += 1;
        Ok(id)
    }

    fn update_vertex_buffer(&mut self, id: BufferId, data: &[f32]) -> Result<(), GpuError> {
        let info = self.vertex.get_mut(&id).ok_or(GpuError::UnknownBuffer(id))?;
        if data.len() > info.capacity {
            return Err(GpuError::Overflow {
                id,
                len: data.len(),
                capacity: info.capacity,
            });
        }
        info.len = data.len();
        info.updates += 1;
        self.counters.vertex_updated += 1;
        Ok(())
    }

    fn delete_vertex_buffer(&mut self, id: BufferId) {
        if self.vertex.remove(&id).is_some() {
            self.counters.vertex_deleted += 1;
        } else {
            self.invalid_deletes += 1;
        }
    }

    fn delete_index_buffer(&mut self, id: BufferId) {
        if self.index.remove(&id).is_some() {
            self.counters.index_deleted += 1;
        } else {
            self.invalid_deletes += 1;
        }
    }

    fn draw_quads(
        &mut self,
        vertex: BufferId,
        index: BufferId,
        quad_count: usize,
        group: RenderGroup,
    ) {
        debug_assert!(self.vertex.contains_key(&vertex), "draw of dead buffer {vertex}");
        self.draws.push(DrawCall {
            vertex,
            index,
            quads: quad_count,
            group,
        });
    }

    fn begin_frame(&mut self, _view_proj: &Mat4) {
        self.draws.clear();
        self.counters.frames += 1;
    }
}
