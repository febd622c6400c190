use std::sync::OnceLock;

use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::Deserialize;
use strata_blocks::{AIR, BlockId};

use crate::chunk::{CHUNK_MASK, CHUNK_SHIFT, Chunk};
use crate::coord::ChunkCoord;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WorldConfig {
    pub chunks_x: u32,
    pub chunks_y: u32,
    pub chunks_z: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunks_x: 16,
            chunks_y: 8,
            chunks_z: 16,
        }
    }
}

const FACE_OFFSETS: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

/// Finite block volume split into lazily created chunks.
///
/// Chunks live in a flat arena addressed by chunk coordinate and are never removed, so block
/// data survives geometry eviction. Shared as `Arc<World>` between the main thread and workers.
pub struct World {
    pub chunks_x: i32,
    pub chunks_y: i32,
    pub chunks_z: i32,
    slots: Box<[OnceLock<Chunk>]>,
    dirty_tx: Sender<ChunkCoord>,
    dirty_rx: Receiver<ChunkCoord>,
}

impl World {
    pub fn new(cfg: WorldConfig) -> Self {
        let chunks_x = cfg.chunks_x.max(1) as i32;
        let chunks_y = cfg.chunks_y.max(1) as i32;
        let chunks_z = cfg.chunks_z.max(1) as i32;
        let n = (chunks_x * chunks_y * chunks_z) as usize;
        let slots = (0..n).map(|_| OnceLock::new()).collect();
        let (dirty_tx, dirty_rx) = unbounded();
        log::debug!("world {chunks_x}x{chunks_y}x{chunks_z} chunks ({n} slots)");
        Self {
            chunks_x,
            chunks_y,
            chunks_z,
            slots,
            dirty_tx,
            dirty_rx,
        }
    }

    #[inline]
    pub fn size_x(&self) -> i32 {
        self.chunks_x << CHUNK_SHIFT
    }

    #[inline]
    pub fn size_y(&self) -> i32 {
        self.chunks_y << CHUNK_SHIFT
    }

    #[inline]
    pub fn size_z(&self) -> i32 {
        self.chunks_z << CHUNK_SHIFT
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0 && y >= 0 && z >= 0 && x < self.size_x() && y < self.size_y() && z < self.size_z()
    }

    #[inline]
    pub fn in_bounds_chunk(&self, c: ChunkCoord) -> bool {
        c.cx >= 0
            && c.cy >= 0
            && c.cz >= 0
            && c.cx < self.chunks_x
            && c.cy < self.chunks_y
            && c.cz < self.chunks_z
    }

    #[inline]
    fn slot_index(&self, c: ChunkCoord) -> Option<usize> {
        if !self.in_bounds_chunk(c) {
            return None;
        }
        Some(((c.cy * self.chunks_z + c.cz) * self.chunks_x + c.cx) as usize)
    }

    /// Existing chunk at `c`, if any.
    #[inline]
    pub fn chunk(&self, c: ChunkCoord) -> Option<&Chunk> {
        self.slot_index(c).and_then(|i| self.slots[i].get())
    }

    /// Creates the chunk on first use; `None` outside the world.
    pub fn ensure_chunk(&self, c: ChunkCoord) -> Option<&Chunk> {
        let i = self.slot_index(c)?;
        Some(self.slots[i].get_or_init(|| Chunk::new(c)))
    }

    #[inline]
    pub fn chunk_exists(&self, c: ChunkCoord) -> bool {
        self.chunk(c).is_some()
    }

    pub fn loaded_chunks(&self) -> impl Iterator<Item = &Chunk> + '_ {
        self.slots.iter().filter_map(|s| s.get())
    }

    /// Block at world coordinates; air outside the world or in chunks that do not exist.
    #[inline]
    pub fn get(&self, x: i32, y: i32, z: i32) -> BlockId {
        if !self.in_bounds(x, y, z) {
            return AIR;
        }
        match self.chunk(ChunkCoord::of_block(x, y, z)) {
            Some(chunk) => {
                let (lx, ly, lz) = ChunkCoord::local(x, y, z);
                chunk.get_local(lx, ly, lz)
            }
            None => AIR,
        }
    }

    /// Writes a block and dirties the chunks whose geometry depends on it.
    /// Returns false (and marks nothing) outside the world.
    pub fn set(&self, x: i32, y: i32, z: i32, id: BlockId) -> bool {
        let owner = ChunkCoord::of_block(x, y, z);
        let created = self.in_bounds(x, y, z) && !self.chunk_exists(owner);
        if !self.set_raw(x, y, z, id) {
            return false;
        }
        self.mark_block_dirty(x, y, z);
        if created {
            // Neighbours meshed while this chunk was missing skipped their faces toward it.
            for (dx, dy, dz) in FACE_OFFSETS {
                self.mark_dirty(owner.offset(dx, dy, dz));
            }
        }
        true
    }

    /// Writes a block without dirty marking; used by generators before streaming starts.
    pub fn set_raw(&self, x: i32, y: i32, z: i32, id: BlockId) -> bool {
        if !self.in_bounds(x, y, z) {
            return false;
        }
        let Some(chunk) = self.ensure_chunk(ChunkCoord::of_block(x, y, z)) else {
            return false;
        };
        let (lx, ly, lz) = ChunkCoord::local(x, y, z);
        chunk.set_local(lx, ly, lz, id);
        true
    }

    /// The owning chunk plus the face neighbour on every axis where the block sits on the
    /// chunk border. Only in-bounds coordinates are returned.
    pub fn affected_chunks(&self, x: i32, y: i32, z: i32) -> Vec<ChunkCoord> {
        let mut out = Vec::with_capacity(4);
        if !self.in_bounds(x, y, z) {
            return out;
        }
        let owner = ChunkCoord::of_block(x, y, z);
        out.push(owner);
        let local = [x & CHUNK_MASK, y & CHUNK_MASK, z & CHUNK_MASK];
        for (axis, &l) in local.iter().enumerate() {
            let step = if l == 0 {
                -1
            } else if l == CHUNK_MASK {
                1
            } else {
                continue;
            };
            let mut d = [0; 3];
            d[axis] = step;
            let n = owner.offset(d[0], d[1], d[2]);
            if self.in_bounds_chunk(n) {
                out.push(n);
            }
        }
        out
    }

    /// Dirty-propagates an edit at world coordinates; no-op outside the world.
    pub fn mark_block_dirty(&self, x: i32, y: i32, z: i32) {
        for c in self.affected_chunks(x, y, z) {
            self.mark_dirty(c);
        }
    }

    /// Marks an existing chunk dirty and announces it once per clean→dirty transition.
    /// Missing chunks are skipped: they are still unbuilt.
    pub fn mark_dirty(&self, c: ChunkCoord) -> bool {
        let Some(chunk) = self.chunk(c) else {
            return false;
        };
        if chunk.mark_dirty() {
            let _ = self.dirty_tx.send(c);
            true
        } else {
            false
        }
    }

    /// Receiver of clean→dirty transitions, in order.
    pub fn dirty_events(&self) -> Receiver<ChunkCoord> {
        self.dirty_rx.clone()
    }
}
