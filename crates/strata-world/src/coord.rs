use serde::{Deserialize, Serialize};

use crate::chunk::{CHUNK_MASK, CHUNK_SHIFT};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cy: i32, cz: i32) -> Self {
        Self { cx, cy, cz }
    }

    /// Chunk containing the block at world coordinates.
    #[inline]
    pub const fn of_block(x: i32, y: i32, z: i32) -> Self {
        Self {
            cx: x >> CHUNK_SHIFT,
            cy: y >> CHUNK_SHIFT,
            cz: z >> CHUNK_SHIFT,
        }
    }

    /// Chunk containing a world-space position.
    #[inline]
    pub fn of_position(x: f32, y: f32, z: f32) -> Self {
        Self::of_block(x.floor() as i32, y.floor() as i32, z.floor() as i32)
    }

    /// Block coordinates inside its chunk.
    #[inline]
    pub const fn local(x: i32, y: i32, z: i32) -> (usize, usize, usize) {
        (
            (x & CHUNK_MASK) as usize,
            (y & CHUNK_MASK) as usize,
            (z & CHUNK_MASK) as usize,
        )
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cy: self.cy + dy,
            cz: self.cz + dz,
        }
    }

    /// World block coordinate of this chunk's minimum corner.
    #[inline]
    pub const fn origin(self) -> (i32, i32, i32) {
        (
            self.cx << CHUNK_SHIFT,
            self.cy << CHUNK_SHIFT,
            self.cz << CHUNK_SHIFT,
        )
    }

    /// Chebyshev (L-infinity) distance in chunks.
    #[inline]
    pub fn chebyshev(self, other: ChunkCoord) -> i32 {
        let dx = (self.cx - other.cx).abs();
        let dy = (self.cy - other.cy).abs();
        let dz = (self.cz - other.cz).abs();
        dx.max(dy).max(dz)
    }

    #[inline]
    pub fn distance_sq(self, other: ChunkCoord) -> i64 {
        let dx = i64::from(self.cx - other.cx);
        let dy = i64::from(self.cy - other.cy);
        let dz = i64::from(self.cz - other.cz);
        dx * dx + dy * dy + dz * dz
    }

    /// Visits every coordinate at exactly Chebyshev distance `ring` from `self`.
    pub fn for_each_in_ring(self, ring: i32, mut f: impl FnMut(ChunkCoord)) {
        if ring <= 0 {
            f(self);
            return;
        }
        for dy in -ring..=ring {
            for dz in -ring..=ring {
                let on_shell = dy.abs() == ring || dz.abs() == ring;
                if on_shell {
                    for dx in -ring..=ring {
                        f(self.offset(dx, dy, dz));
                    }
                } else {
                    f(self.offset(-ring, dy, dz));
                    f(self.offset(ring, dy, dz));
                }
            }
        }
    }
}

impl From<(i32, i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

impl From<ChunkCoord> for (i32, i32, i32) {
    fn from(value: ChunkCoord) -> Self {
        (value.cx, value.cy, value.cz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_sizes_match_shell_volume() {
        let c = ChunkCoord::new(3, -2, 7);
        for ring in 0..5 {
            let mut n = 0;
            c.for_each_in_ring(ring, |p| {
                assert_eq!(c.chebyshev(p), ring);
                n += 1;
            });
            let side = 2 * ring + 1;
            let inner = (2 * ring - 1).max(0);
            assert_eq!(n, side * side * side - inner * inner * inner);
        }
    }

    #[test]
    fn negative_blocks_floor_into_chunks() {
        assert_eq!(ChunkCoord::of_block(-1, 0, 16), ChunkCoord::new(-1, 0, 1));
        assert_eq!(ChunkCoord::local(-1, 0, 17), (15, 0, 1));
    }
}
