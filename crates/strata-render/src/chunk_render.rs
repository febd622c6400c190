use hashbrown::HashMap;
use strata_blocks::RenderGroup;
use strata_geom::Frustum;
use strata_mesh_cpu::{MeshBuild, MeshPacket};
use strata_world::ChunkCoord;

use crate::backend::{BufferUsage, GpuBackend, GpuError};
use crate::buffer::GpuBuffer;
use crate::quad_index::QuadIndex;
use crate::visibility::VisibilityCuller;

/// GPU geometry of one chunk: per group, one buffer per `max_quads` slice.
pub struct ChunkRender {
    pub coord: ChunkCoord,
    parts: [Vec<GpuBuffer>; RenderGroup::COUNT],
}

impl ChunkRender {
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            parts: Default::default(),
        }
    }

    #[inline]
    pub fn parts(&self, group: RenderGroup) -> &[GpuBuffer] {
        &self.parts[group.index()]
    }

    pub fn quad_count(&self) -> usize {
        self.parts.iter().flatten().map(GpuBuffer::quads).sum()
    }

    pub fn buffer_count(&self) -> usize {
        self.parts.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.iter().all(Vec::is_empty)
    }

    /// Replaces one group's geometry.
    ///
    /// With `stream` set (the record already held geometry) buffers upload as `Stream` and
    /// existing ones are overwritten in place when the new slice fits; otherwise fresh buffers
    /// replace the old, which are disposed. An empty stream removes the group.
    pub fn upload_group(
        &mut self,
        backend: &mut dyn GpuBackend,
        group: RenderGroup,
        mesh: &MeshBuild,
        stream: bool,
        max_quads: usize,
    ) -> Result<(), GpuError> {
        let max_quads = max_quads.max(1);
        let total = mesh.quad_count();
        let slices = total.div_ceil(max_quads);
        let usage = if stream {
            BufferUsage::Stream
        } else {
            BufferUsage::Static
        };
        let mut old = std::mem::take(&mut self.parts[group.index()]).into_iter();
        let mut fresh = Vec::with_capacity(slices);
        let mut result = Ok(());
        for i in 0..slices {
            let first = i * max_quads;
            let quads = (total - first).min(max_quads);
            let data = mesh.quad_slice(first, quads);
            let mut prev = old.next();
            if let Some(buf) = prev.as_mut().filter(|b| stream && b.fits(data.len())) {
                if let Err(e) = buf.update(backend, data, quads) {
                    result = Err(e);
                    fresh.extend(prev);
                    break;
                }
                fresh.extend(prev);
                continue;
            }
            if let Some(mut stale) = prev {
                stale.dispose(backend);
            }
            match GpuBuffer::upload(backend, data, quads, usage) {
                Ok(buf) => fresh.push(buf),
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        for mut stale in old {
            stale.dispose(backend);
        }
        self.parts[group.index()] = fresh;
        result
    }

    /// Uploads every group of `packet`; empty groups are removed.
    pub fn upload_packet(
        &mut self,
        backend: &mut dyn GpuBackend,
        packet: &MeshPacket,
        max_quads: usize,
    ) -> Result<(), GpuError> {
        // A record re-created after eviction starts over as static geometry.
        let stream = !self.is_empty();
        for group in RenderGroup::ALL {
            self.upload_group(backend, group, packet.group(group), stream, max_quads)?;
        }
        Ok(())
    }

    pub fn dispose(&mut self, backend: &mut dyn GpuBackend) {
        for part in &mut self.parts {
            for mut buf in part.drain(..) {
                buf.dispose(backend);
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub visible_chunks: usize,
    pub culled_chunks: usize,
    pub draw_calls: usize,
    pub quads: usize,
}

/// Live chunk geometry keyed by chunk coordinate.
#[derive(Default)]
pub struct RenderTable {
    map: HashMap<ChunkCoord, ChunkRender>,
}

impl RenderTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[inline]
    pub fn contains(&self, c: ChunkCoord) -> bool {
        self.map.contains_key(&c)
    }

    pub fn get(&self, c: ChunkCoord) -> Option<&ChunkRender> {
        self.map.get(&c)
    }

    pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.map.keys().copied()
    }

    /// Uploads a built packet, creating the record on first use. A chunk whose packet is
    /// entirely empty loses its record.
    pub fn upload(
        &mut self,
        backend: &mut dyn GpuBackend,
        packet: &MeshPacket,
        max_quads: usize,
    ) -> Result<(), GpuError> {
        let entry = self
            .map
            .entry(packet.coord)
            .or_insert_with(|| ChunkRender::new(packet.coord));
        let result = entry.upload_packet(backend, packet, max_quads);
        if entry.is_empty() {
            self.map.remove(&packet.coord);
        }
        result
    }

    /// Disposes and removes one record. Returns false if the chunk had none.
    pub fn evict(&mut self, backend: &mut dyn GpuBackend, c: ChunkCoord) -> bool {
        match self.map.remove(&c) {
            Some(mut render) => {
                render.dispose(backend);
                true
            }
            None => false,
        }
    }

    /// Disposes and removes every record matching `pred`; returns the removed coordinates.
    pub fn evict_where(
        &mut self,
        backend: &mut dyn GpuBackend,
        mut pred: impl FnMut(ChunkCoord) -> bool,
    ) -> Vec<ChunkCoord> {
        let doomed: Vec<ChunkCoord> = self.map.keys().copied().filter(|&c| pred(c)).collect();
        for &c in &doomed {
            self.evict(backend, c);
        }
        doomed
    }

    /// Draws visible chunks: every terrain part first, then plants, then liquids.
    pub fn draw(
        &self,
        backend: &mut dyn GpuBackend,
        index: &QuadIndex,
        frustum: &Frustum,
        culler: &VisibilityCuller,
    ) -> DrawStats {
        let mut stats = DrawStats::default();
        for (pass, group) in RenderGroup::ALL.into_iter().enumerate() {
            for render in self.map.values() {
                let visible = culler.is_visible(frustum, render.coord);
                if pass == 0 {
                    if visible {
                        stats.visible_chunks += 1;
                    } else {
                        stats.culled_chunks += 1;
                    }
                }
                if !visible {
                    continue;
                }
                for buf in render.parts(group) {
                    backend.draw_quads(buf.id(), index.id(), buf.quads(), group);
                    stats.draw_calls += 1;
                    stats.quads += buf.quads();
                }
            }
        }
        stats
    }

    pub fn dispose_all(&mut self, backend: &mut dyn GpuBackend) {
        for (_, mut render) in self.map.drain() {
            render.dispose(backend);
        }
    }
}
