use strata_blocks::{BlockId, BlockRegistry, BlockType};
use strata_world::{CHUNK_SIZE, Chunk, ChunkCoord, World};

use crate::face::Face;

const SIZE: i32 = CHUNK_SIZE as i32;

/// A chunk plus its 26 neighbours, resolved once per build.
///
/// Lookups take chunk-local coordinates in `-1..=16` (anything within one chunk of the centre
/// works). `None` means the block lives in a chunk that does not exist or lies outside the world.
pub struct ChunkNeighborhood<'a> {
    reg: &'a BlockRegistry,
    coord: ChunkCoord,
    chunks: [Option<&'a Chunk>; 27],
}

impl<'a> ChunkNeighborhood<'a> {
    pub fn new(world: &'a World, reg: &'a BlockRegistry, coord: ChunkCoord) -> Self {
        let mut chunks = [None; 27];
        for dy in -1..=1 {
            for dz in -1..=1 {
                for dx in -1..=1 {
                    chunks[Self::slot(dx, dy, dz)] = world.chunk(coord.offset(dx, dy, dz));
                }
            }
        }
        Self { reg, coord, chunks }
    }

    #[inline]
    fn slot(dx: i32, dy: i32, dz: i32) -> usize {
        (((dy + 1) * 3 + (dz + 1)) * 3 + (dx + 1)) as usize
    }

    #[inline]
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    #[inline]
    pub fn center(&self) -> Option<&'a Chunk> {
        self.chunks[Self::slot(0, 0, 0)]
    }

    /// True if the face-adjacent chunk in direction `face` exists.
    pub fn loaded(&self, face: Face) -> bool {
        let (dx, dy, dz) = face.delta();
        self.chunks[Self::slot(dx, dy, dz)].is_some()
    }

    #[inline]
    pub fn block(&self, lx: i32, ly: i32, lz: i32) -> Option<BlockId> {
        let (cx, cy, cz) = (lx.div_euclid(SIZE), ly.div_euclid(SIZE), lz.div_euclid(SIZE));
        if !(-1..=1).contains(&cx) || !(-1..=1).contains(&cy) || !(-1..=1).contains(&cz) {
            return None;
        }
        let chunk = self.chunks[Self::slot(cx, cy, cz)]?;
        Some(chunk.get_local(
            lx.rem_euclid(SIZE) as usize,
            ly.rem_euclid(SIZE) as usize,
            lz.rem_euclid(SIZE) as usize,
        ))
    }

    /// Block type at a local coordinate; `None` for unloaded space.
    #[inline]
    pub fn block_type(&self, lx: i32, ly: i32, lz: i32) -> Option<&'a BlockType> {
        self.block(lx, ly, lz).map(|id| self.reg.resolve(id))
    }

    /// Occlusion test for shading: unloaded space counts as air.
    #[inline]
    pub fn is_solid(&self, lx: i32, ly: i32, lz: i32) -> bool {
        self.block(lx, ly, lz).is_some_and(|id| self.reg.is_solid(id))
    }
}
