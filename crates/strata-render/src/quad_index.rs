use crate::backend::{BufferId, GpuBackend, GpuError};

/// Largest quad count a `u16` index buffer can address (4 vertices per quad).
pub const MAX_QUADS_U16: usize = 16384;
pub const INDICES_PER_QUAD: usize = 6;

/// Index pattern `(v, v+1, v+2, v+2, v+3, v)` for `quads` quads.
pub fn quad_indices(quads: usize) -> Vec<u16> {
    let quads = quads.min(MAX_QUADS_U16);
    let mut out = Vec::with_capacity(quads * INDICES_PER_QUAD);
    for q in 0..quads {
        let v = (q * 4) as u16;
        out.extend_from_slice(&[v, v + 1, v + 2, v + 2, v + 3, v]);
    }
    out
}

/// The one index buffer shared by every chunk draw.
pub struct QuadIndex {
    id: BufferId,
    max_quads: usize,
    disposed: bool,
}

impl QuadIndex {
    pub fn new(backend: &mut dyn GpuBackend, max_quads: usize) -> Result<Self, GpuError> {
        let max_quads = max_quads.clamp(1, MAX_QUADS_U16);
        let id = backend.create_index_buffer(&quad_indices(max_quads))?;
        log::debug!("quad index buffer {id}: {max_quads} quads");
        Ok(Self {
            id,
            max_quads,
            disposed: false,
        })
    }

    #[inline]
    pub fn id(&self) -> BufferId {
        self.id
    }

    #[inline]
    pub fn max_quads(&self) -> usize {
        self.max_quads
    }

    #[inline]
    pub fn index_count(quads: usize) -> usize {
        quads * INDICES_PER_QUAD
    }

    pub fn dispose(&mut self, backend: &mut dyn GpuBackend) {
        if self.disposed {
            return;
        }
        backend.delete_index_buffer(self.id);
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}
