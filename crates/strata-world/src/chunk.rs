use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use strata_blocks::{AIR, BlockId};

use crate::coord::ChunkCoord;

pub const CHUNK_SHIFT: u32 = 4;
pub const CHUNK_SIZE: usize = 1 << CHUNK_SHIFT;
pub const CHUNK_MASK: i32 = CHUNK_SIZE as i32 - 1;
pub const CHUNK_VOLUME: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE;

/// A 16³ block volume.
///
/// Block ids are atomics so the main thread can edit while a mesher reads; a build may see a
/// slightly stale mix, which the edit's dirty mark corrects on the next rebuild.
pub struct Chunk {
    coord: ChunkCoord,
    blocks: Box<[AtomicU8]>,
    non_air: AtomicU32,
    dirty: AtomicBool,
    new: AtomicBool,
    safe: AtomicBool,
    builds: AtomicU32,
}

impl Chunk {
    pub fn new(coord: ChunkCoord) -> Self {
        let blocks = (0..CHUNK_VOLUME).map(|_| AtomicU8::new(AIR)).collect();
        Self {
            coord,
            blocks,
            non_air: AtomicU32::new(0),
            dirty: AtomicBool::new(false),
            new: AtomicBool::new(true),
            safe: AtomicBool::new(true),
            builds: AtomicU32::new(0),
        }
    }

    #[inline]
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    #[inline]
    pub const fn idx(x: usize, y: usize, z: usize) -> usize {
        (y << (2 * CHUNK_SHIFT)) | (z << CHUNK_SHIFT) | x
    }

    #[inline]
    pub fn get_local(&self, x: usize, y: usize, z: usize) -> BlockId {
        self.blocks[Self::idx(x, y, z)].load(Ordering::Relaxed)
    }

    /// Writes a block and returns the previous id.
    pub fn set_local(&self, x: usize, y: usize, z: usize, id: BlockId) -> BlockId {
        let old = self.blocks[Self::idx(x, y, z)].swap(id, Ordering::Relaxed);
        if old == AIR && id != AIR {
            self.non_air.fetch_add(1, Ordering::Relaxed);
        } else if old != AIR && id == AIR {
            self.non_air.fetch_sub(1, Ordering::Relaxed);
        }
        old
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.non_air.load(Ordering::Relaxed) == 0
    }

    pub fn non_air_count(&self) -> u32 {
        self.non_air.load(Ordering::Relaxed)
    }

    /// Sets the dirty flag; returns true when it was previously clear.
    #[inline]
    pub fn mark_dirty(&self) -> bool {
        !self.dirty.swap(true, Ordering::AcqRel)
    }

    /// Clears the dirty flag; returns whether it was set.
    #[inline]
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_new(&self) -> bool {
        self.new.load(Ordering::Acquire)
    }

    /// Clears the new flag; returns whether it was set.
    #[inline]
    pub fn take_new(&self) -> bool {
        self.new.swap(false, Ordering::AcqRel)
    }

    /// Returns the chunk to the unbuilt state; nothing can be in flight for it any more.
    pub fn reset_new(&self) {
        self.new.store(true, Ordering::Release);
        self.safe.store(true, Ordering::Release);
    }

    /// Called before the chunk is handed to a worker.
    #[inline]
    pub fn begin_build(&self) {
        self.safe.store(false, Ordering::Release);
    }

    /// Called by the worker once the chunk's packet is completely written.
    #[inline]
    pub fn publish_build(&self) {
        self.builds.fetch_add(1, Ordering::Relaxed);
        self.safe.store(true, Ordering::Release);
    }

    /// Releases a build that produced nothing usable; the build counter is left alone.
    #[inline]
    pub fn abort_build(&self) {
        self.safe.store(true, Ordering::Release);
    }

    /// True when no build is writing geometry for this chunk.
    #[inline]
    pub fn is_safe_to_read(&self) -> bool {
        self.safe.load(Ordering::Acquire)
    }

    /// Completed builds so far.
    pub fn build_count(&self) -> u32 {
        self.builds.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("coord", &self.coord)
            .field("non_air", &self.non_air_count())
            .field("dirty", &self.is_dirty())
            .field("new", &self.is_new())
            .field("safe", &self.is_safe_to_read())
            .finish()
    }
}
