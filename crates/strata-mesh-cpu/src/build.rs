use strata_blocks::{BlockRegistry, BlockType, ModelBox, Shape};
use strata_geom::Vec3;
use strata_world::{CHUNK_SIZE, ChunkCoord, World};

use crate::cull::{cube_face_visible, is_covered, on_boundary};
use crate::emit::{BuildSink, emit_box_face, emit_cross};
use crate::face::Face;
use crate::neighbors::ChunkNeighborhood;
use crate::packet::MeshPacket;
use crate::shade::{base_shade, bilerp, corner_ao};

const SIZE: i32 = CHUNK_SIZE as i32;

/// Turns one chunk's blocks into per-group vertex streams.
pub struct ChunkMesher;

impl ChunkMesher {
    /// Clears `packet` and fills it with the geometry of chunk `coord`.
    /// Returns the number of quads written. Missing or empty chunks produce no geometry.
    pub fn build(
        world: &World,
        reg: &BlockRegistry,
        coord: ChunkCoord,
        packet: &mut MeshPacket,
    ) -> usize {
        packet.reset(coord);
        let view = ChunkNeighborhood::new(world, reg, coord);
        let Some(chunk) = view.center() else {
            return 0;
        };
        if chunk.is_empty() {
            return 0;
        }
        let (ox, oy, oz) = coord.origin();
        for y in 0..SIZE {
            for z in 0..SIZE {
                for x in 0..SIZE {
                    let id = chunk.get_local(x as usize, y as usize, z as usize);
                    let ty = reg.resolve(id);
                    let origin = Vec3::new((ox + x) as f32, (oy + y) as f32, (oz + z) as f32);
                    match &ty.shape {
                        Shape::Air => {}
                        Shape::Cube => mesh_cube(packet, &view, ty, x, y, z, origin, true),
                        Shape::Liquid => mesh_cube(packet, &view, ty, x, y, z, origin, false),
                        Shape::Cross => {
                            emit_cross(packet, origin, ty.faces.side);
                        }
                        Shape::Model { boxes } => {
                            mesh_model(packet, &view, ty, boxes, x, y, z, origin)
                        }
                    }
                }
            }
        }
        let quads = packet.quad_count();
        log::trace!("meshed chunk {:?}: {} quads", coord, quads);
        quads
    }
}

/// Cube and liquid faces. Liquids keep flat base shade.
#[allow(clippy::too_many_arguments)]
fn mesh_cube(
    sink: &mut impl BuildSink,
    view: &ChunkNeighborhood<'_>,
    ty: &BlockType,
    x: i32,
    y: i32,
    z: i32,
    origin: Vec3,
    ao: bool,
) {
    let group = ty.group();
    for face in Face::ALL {
        let (dx, dy, dz) = face.delta();
        // Unloaded or outside the world: no face.
        let Some(nb) = view.block_type(x + dx, y + dy, z + dz) else {
            continue;
        };
        if !cube_face_visible(ty, nb, face) {
            continue;
        }
        let shades = if ao {
            corner_ao(view, x, y, z, face)
        } else {
            [base_shade(face); 4]
        };
        let region = ty.faces.for_role(face.role());
        emit_box_face(
            sink,
            group,
            face,
            origin,
            ModelBox::FULL.min,
            ModelBox::FULL.max,
            shades,
            region,
        );
    }
}

/// Six quads per model box; boundary quads are dropped when the neighbour covers them.
#[allow(clippy::too_many_arguments)]
fn mesh_model(
    sink: &mut impl BuildSink,
    view: &ChunkNeighborhood<'_>,
    ty: &BlockType,
    boxes: &[ModelBox],
    x: i32,
    y: i32,
    z: i32,
    origin: Vec3,
) {
    let group = ty.group();
    for bx in boxes {
        for face in Face::ALL {
            let boundary = on_boundary(face, bx.min, bx.max);
            let shades = if boundary {
                let (dx, dy, dz) = face.delta();
                let Some(nb) = view.block_type(x + dx, y + dy, z + dz) else {
                    continue;
                };
                if is_covered(face, bx.min, bx.max, nb) {
                    continue;
                }
                if ty.ao {
                    let corners = corner_ao(view, x, y, z, face);
                    model_quad_shades(face, bx, corners)
                } else {
                    [base_shade(face); 4]
                }
            } else {
                [base_shade(face); 4]
            };
            let region = ty.faces.for_role(face.role());
            emit_box_face(sink, group, face, origin, bx.min, bx.max, shades, region);
        }
    }
}

/// Face AO sampled at the box quad's corners.
fn model_quad_shades(face: Face, bx: &ModelBox, corners: [f32; 4]) -> [f32; 4] {
    let (ua, va) = face.plane_axes();
    let (s0, t0) = (ua.of_arr(bx.min), va.of_arr(bx.min));
    let (s1, t1) = (ua.of_arr(bx.max), va.of_arr(bx.max));
    [
        bilerp(corners, s0, t0),
        bilerp(corners, s1, t0),
        bilerp(corners, s1, t1),
        bilerp(corners, s0, t1),
    ]
}

