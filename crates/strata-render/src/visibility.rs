use strata_geom::{Frustum, Plane, Vec3};
use strata_world::{CHUNK_SIZE, ChunkCoord};

const HALF: f32 = CHUNK_SIZE as f32 * 0.5;

/// Conservative chunk-vs-frustum test using each plane's projected box radius.
#[derive(Clone, Copy, Debug)]
pub struct VisibilityCuller {
    pub skip_near_far: bool,
}

impl Default for VisibilityCuller {
    fn default() -> Self {
        Self {
            skip_near_far: true,
        }
    }
}

impl VisibilityCuller {
    pub fn new(skip_near_far: bool) -> Self {
        Self { skip_near_far }
    }

    pub fn is_visible(&self, frustum: &Frustum, c: ChunkCoord) -> bool {
        let planes: &[Plane] = if self.skip_near_far {
            frustum.side_planes()
        } else {
            &frustum.planes
        };
        let center = chunk_center(c);
        planes.iter().all(|p| {
            let n = p.normal;
            let r = HALF * (n.x.abs() + n.y.abs() + n.z.abs());
            p.distance(center) >= -r
        })
    }
}

#[inline]
pub fn chunk_center(c: ChunkCoord) -> Vec3 {
    let (x, y, z) = c.origin();
    Vec3::new(x as f32 + HALF, y as f32 + HALF, z as f32 + HALF)
}
