use crate::backend::{BufferId, BufferUsage, GpuBackend, GpuError};

/// One uploaded vertex buffer. Must be disposed explicitly; dropping a live buffer is a leak.
#[derive(Debug)]
pub struct GpuBuffer {
    id: BufferId,
    quads: usize,
    capacity: usize,
    usage: BufferUsage,
    disposed: bool,
}

impl GpuBuffer {
    pub fn upload(
        backend: &mut dyn GpuBackend,
        data: &[f32],
        quads: usize,
        usage: BufferUsage,
    ) -> Result<Self, GpuError> {
        let id = backend.create_vertex_buffer(data, usage)?;
        Ok(Self {
            id,
            quads,
            capacity: data.len(),
            usage,
            disposed: false,
        })
    }

    /// Rewrites the buffer in place; the caller checks [`fits`](Self::fits) first.
    pub fn update(
        &mut self,
        backend: &mut dyn GpuBackend,
        data: &[f32],
        quads: usize,
    ) -> Result<(), GpuError> {
        backend.update_vertex_buffer(self.id, data)?;
        self.quads = quads;
        Ok(())
    }

    #[inline]
    pub fn fits(&self, len: usize) -> bool {
        !self.disposed && len <= self.capacity
    }

    #[inline]
    pub fn id(&self) -> BufferId {
        self.id
    }

    #[inline]
    pub fn quads(&self) -> usize {
        self.quads
    }

    #[inline]
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Releases the GPU buffer. A second call is a bookkeeping bug; it is logged and ignored.
    pub fn dispose(&mut self, backend: &mut dyn GpuBackend) {
        if self.disposed {
            log::error!("GPU buffer {} disposed twice", self.id);
            return;
        }
        backend.delete_vertex_buffer(self.id);
        self.disposed = true;
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        if !self.disposed {
            log::error!(
                "GPU buffer {} dropped without dispose ({} quads leaked)",
                self.id,
                self.quads
            );
        }
    }
}
