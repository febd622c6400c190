use crate::constants::{AO_FACTOR, SHADE_BOTTOM, SHADE_EAST_WEST, SHADE_NORTH_SOUTH, SHADE_TOP};
use crate::face::Face;
use crate::neighbors::ChunkNeighborhood;

#[inline]
pub fn base_shade(face: Face) -> f32 {
    match face {
        Face::PosY => SHADE_TOP,
        Face::NegY => SHADE_BOTTOM,
        Face::PosZ | Face::NegZ => SHADE_NORTH_SOUTH,
        Face::PosX | Face::NegX => SHADE_EAST_WEST,
    }
}

/// Corner shades of `face` of the block at local `(x, y, z)`, in plane order
/// `(0,0), (1,0), (1,1), (0,1)`.
///
/// Samples the layer one block out along the normal: each solid edge neighbour darkens its two
/// corners; a solid diagonal darkens its corner only if no edge neighbour already did.
pub fn corner_ao(view: &ChunkNeighborhood<'_>, x: i32, y: i32, z: i32, face: Face) -> [f32; 4] {
    let base = base_shade(face);
    let (dx, dy, dz) = face.delta();
    let (ua, va) = face.plane_axes();
    let (ux, uy, uz) = ua.unit();
    let (vx, vy, vz) = va.unit();
    let (px, py, pz) = (x + dx, y + dy, z + dz);
    let solid = |su: i32, sv: i32| {
        view.is_solid(
            px + ux * su + vx * sv,
            py + uy * su + vy * sv,
            pz + uz * su + vz * sv,
        )
    };

    let mut c = [base; 4];
    if solid(-1, 0) {
        c[0] *= AO_FACTOR;
        c[3] *= AO_FACTOR;
    }
    if solid(1, 0) {
        c[1] *= AO_FACTOR;
        c[2] *= AO_FACTOR;
    }
    if solid(0, -1) {
        c[0] *= AO_FACTOR;
        c[1] *= AO_FACTOR;
    }
    if solid(0, 1) {
        c[2] *= AO_FACTOR;
        c[3] *= AO_FACTOR;
    }
    for (i, (su, sv)) in [(-1, -1), (1, -1), (1, 1), (-1, 1)].into_iter().enumerate() {
        if c[i] == base && solid(su, sv) {
            c[i] *= AO_FACTOR;
        }
    }
    c
}

/// Bilinear blend of plane-ordered corner values at `(s, t)` in `[0, 1]²`.
#[inline]
pub fn bilerp(c: [f32; 4], s: f32, t: f32) -> f32 {
    let bottom = c[0] + (c[1] - c[0]) * s;
    let top = c[3] + (c[2] - c[3]) * s;
    bottom + (top - bottom) * t
}
