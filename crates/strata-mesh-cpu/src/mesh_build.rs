use strata_geom::Vec3;

use crate::constants::{FLOATS_PER_QUAD, VERTEX_STRIDE, VERTS_PER_QUAD};

/// Interleaved vertex stream: `x, y, z, shade, u, v` per vertex, four vertices per quad.
/// Indices are implicit (one shared quad index buffer on the GPU side).
#[derive(Default, Clone, Debug)]
pub struct MeshBuild {
    pub verts: Vec<f32>,
}

impl MeshBuild {
    /// Clears the stream but retains capacity for reuse across builds.
    #[inline]
    pub fn clear_keep_capacity(&mut self) {
        self.verts.clear();
    }

    /// Pre-reserve capacity for approximately `n_quads` quads worth of data.
    #[inline]
    pub fn reserve_quads(&mut self, n_quads: usize) {
        self.verts.reserve(n_quads * FLOATS_PER_QUAD);
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.verts.len() / FLOATS_PER_QUAD
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.verts.len() / VERTEX_STRIDE
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.verts.is_empty()
    }

    /// Vertex data for quads `[first, first + count)`.
    pub fn quad_slice(&self, first: usize, count: usize) -> &[f32] {
        let start = (first * FLOATS_PER_QUAD).min(self.verts.len());
        let end = ((first + count) * FLOATS_PER_QUAD).min(self.verts.len());
        &self.verts[start..end]
    }

    /// Appends a quad with per-vertex shade and UVs.
    ///
    /// Corners are given in order around the quad; if their winding disagrees with `n` the
    /// quad is flipped so it stays front-facing along the normal.
    pub fn add_quad(
        &mut self,
        mut vs: [Vec3; VERTS_PER_QUAD],
        n: Vec3,
        mut shades: [f32; VERTS_PER_QUAD],
        mut uvs: [(f32, f32); VERTS_PER_QUAD],
    ) {
        let e1 = vs[1] - vs[0];
        let e2 = vs[2] - vs[0];
        if e1.cross(e2).dot(n) < 0.0 {
            vs.swap(1, 3);
            shades.swap(1, 3);
            uvs.swap(1, 3);
        }
        for i in 0..VERTS_PER_QUAD {
            self.verts.extend_from_slice(&[
                vs[i].x, vs[i].y, vs[i].z, shades[i], uvs[i].0, uvs[i].1,
            ]);
        }
    }

    /// Vertex `i` as `(position, shade, uv)`.
    pub fn vertex(&self, i: usize) -> Option<(Vec3, f32, (f32, f32))> {
        let v = self.verts.get(i * VERTEX_STRIDE..(i + 1) * VERTEX_STRIDE)?;
        Some((Vec3::new(v[0], v[1], v[2]), v[3], (v[4], v[5])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_quad_flips_to_match_normal() {
        let mut mb = MeshBuild::default();
        // Clockwise when seen from +Y.
        let vs = [
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 0.0),
        ];
        mb.add_quad(vs, Vec3::UP, [1.0; 4], [(0.0, 0.0); 4]);
        assert_eq!(mb.quad_count(), 1);
        let (p0, ..) = mb.vertex(0).unwrap();
        let (p1, ..) = mb.vertex(1).unwrap();
        let (p2, ..) = mb.vertex(2).unwrap();
        assert!((p1 - p0).cross(p2 - p0).dot(Vec3::UP) > 0.0);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut mb = MeshBuild::default();
        mb.reserve_quads(8);
        let cap = mb.verts.capacity();
        mb.add_quad([Vec3::ZERO; 4], Vec3::UP, [1.0; 4], [(0.0, 0.0); 4]);
        mb.clear_keep_capacity();
        assert!(mb.is_empty());
        assert_eq!(mb.verts.capacity(), cap);
    }
}
