use strata_blocks::{AtlasRegion, RenderGroup};
use strata_geom::Vec3;

use crate::constants::{INITIAL_QUAD_CAP, PLANT_SHADE_BOTTOM, PLANT_SHADE_TOP};
use crate::face::Face;
use crate::mesh_build::MeshBuild;
use crate::packet::MeshPacket;

/// Per-group output of the mesher.
pub trait BuildSink {
    fn get_build_mut(&mut self, group: RenderGroup) -> &mut MeshBuild;
}

impl BuildSink for [MeshBuild; RenderGroup::COUNT] {
    #[inline]
    fn get_build_mut(&mut self, group: RenderGroup) -> &mut MeshBuild {
        let mb = &mut self[group.index()];
        if mb.verts.capacity() == 0 {
            mb.reserve_quads(INITIAL_QUAD_CAP);
        }
        mb
    }
}

impl BuildSink for MeshPacket {
    #[inline]
    fn get_build_mut(&mut self, group: RenderGroup) -> &mut MeshBuild {
        self.groups.get_build_mut(group)
    }
}

/// Corners of a box face in plane order `(0,0), (1,0), (1,1), (0,1)` over the face's `(u, v)`
/// axes, in block-local unit space.
pub(crate) fn face_corners(face: Face, min: [f32; 3], max: [f32; 3]) -> [[f32; 3]; 4] {
    let (ua, va) = face.plane_axes();
    let a = face.axis() as usize;
    let fixed = if face.is_positive() { max[a] } else { min[a] };
    let mut out = [[0.0f32; 3]; 4];
    for (i, (cu, cv)) in [(0, 0), (1, 0), (1, 1), (0, 1)].into_iter().enumerate() {
        let p = &mut out[i];
        p[a] = fixed;
        p[ua as usize] = if cu == 0 { min[ua as usize] } else { max[ua as usize] };
        p[va as usize] = if cv == 0 { min[va as usize] } else { max[va as usize] };
    }
    out
}

/// Emits one face of the box `[min, max]` placed at block `origin`.
pub(crate) fn emit_box_face(
    builds: &mut impl BuildSink,
    group: RenderGroup,
    face: Face,
    origin: Vec3,
    min: [f32; 3],
    max: [f32; 3],
    shades: [f32; 4],
    region: AtlasRegion,
) {
    let corners = face_corners(face, min, max);
    let mut vs = [Vec3::ZERO; 4];
    let mut uvs = [(0.0, 0.0); 4];
    for i in 0..4 {
        let local = Vec3::new(corners[i][0], corners[i][1], corners[i][2]);
        let (s, t) = face.tex_coords(local);
        uvs[i] = region.remap(s, t);
        vs[i] = origin + local;
    }
    builds
        .get_build_mut(group)
        .add_quad(vs, face.normal(), shades, uvs);
}

/// Emits the two diagonal quads of a cross plant at block `origin`.
pub(crate) fn emit_cross(builds: &mut impl BuildSink, origin: Vec3, region: AtlasRegion) {
    let mb = builds.get_build_mut(RenderGroup::Plant);
    let diagonals = [
        ((0.0, 0.0), (1.0, 1.0)),
        ((1.0, 0.0), (0.0, 1.0)),
    ];
    for ((x0, z0), (x1, z1)) in diagonals {
        let vs = [
            origin + Vec3::new(x0, 0.0, z0),
            origin + Vec3::new(x1, 0.0, z1),
            origin + Vec3::new(x1, 1.0, z1),
            origin + Vec3::new(x0, 1.0, z0),
        ];
        // Normal derived from the corners so the winding check never flips.
        let n = (vs[1] - vs[0]).cross(vs[3] - vs[0]);
        let shades = [
            PLANT_SHADE_BOTTOM,
            PLANT_SHADE_BOTTOM,
            PLANT_SHADE_TOP,
            PLANT_SHADE_TOP,
        ];
        let uvs = [
            region.remap(0.0, 1.0),
            region.remap(1.0, 1.0),
            region.remap(1.0, 0.0),
            region.remap(0.0, 0.0),
        ];
        mb.add_quad(vs, n, shades, uvs);
    }
}
