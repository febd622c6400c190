use strata_blocks::{BlockType, ModelBox, Shape};

use crate::constants::BOUNDARY_EPS;
use crate::face::Face;

/// Whether a cube face of `a` against neighbour `b` is visible.
#[inline]
pub fn can_add_face(a: &BlockType, b: &BlockType) -> bool {
    if b.is_air() {
        return true;
    }
    if a.solid == b.solid {
        return false;
    }
    a.solid
}

/// True when the box face lies on the block boundary in direction `face`.
#[inline]
pub fn on_boundary(face: Face, min: [f32; 3], max: [f32; 3]) -> bool {
    let a = face.axis() as usize;
    let value = if face.is_positive() { max[a] } else { min[a] };
    ((value - 0.5).abs() - 0.5).abs() < BOUNDARY_EPS
}

/// In-plane rectangle `(u0, v0, u1, v1)` of a box face.
#[inline]
fn plane_rect(face: Face, min: [f32; 3], max: [f32; 3]) -> (f32, f32, f32, f32) {
    let (ua, va) = face.plane_axes();
    (
        ua.of_arr(min),
        va.of_arr(min),
        ua.of_arr(max),
        va.of_arr(max),
    )
}

/// Area of the union of `rects`, each `(u0, v0, u1, v1)`.
///
/// Coordinate compression over the rectangle edges; boxes of one model may overlap, so their
/// areas cannot simply be added.
pub fn union_area(rects: &[(f32, f32, f32, f32)]) -> f32 {
    let mut us: Vec<f32> = Vec::with_capacity(rects.len() * 2);
    for &(u0, _, u1, _) in rects {
        us.push(u0);
        us.push(u1);
    }
    us.sort_by(f32::total_cmp);
    us.dedup();
    let mut spans: Vec<(f32, f32)> = Vec::with_capacity(rects.len());
    let mut area = 0.0;
    for w in us.windows(2) {
        let (ua, ub) = (w[0], w[1]);
        spans.clear();
        spans.extend(
            rects
                .iter()
                .filter(|r| r.0 <= ua && r.2 >= ub)
                .map(|r| (r.1, r.3)),
        );
        spans.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut covered = 0.0;
        let mut run: Option<(f32, f32)> = None;
        for &(v0, v1) in &spans {
            match run {
                Some((r0, r1)) if v0 <= r1 => run = Some((r0, r1.max(v1))),
                Some((r0, r1)) => {
                    covered += r1 - r0;
                    run = Some((v0, v1));
                }
                None => run = Some((v0, v1)),
            }
        }
        if let Some((r0, r1)) = run {
            covered += r1 - r0;
        }
        area += covered * (ub - ua);
    }
    area
}

/// Area of the box face `[min, max]` on `face` hidden by neighbour `b`.
///
/// A solid cube hides everything. A model hides the union of its own boundary quads on the
/// opposite face. Anything else hides nothing.
pub fn covered_area(face: Face, min: [f32; 3], max: [f32; 3], b: &BlockType) -> f32 {
    let (u0, v0, u1, v1) = plane_rect(face, min, max);
    let area = (u1 - u0).max(0.0) * (v1 - v0).max(0.0);
    match &b.shape {
        Shape::Cube if b.solid => area,
        Shape::Model { boxes } => {
            let opposite = face.opposite();
            let clipped: Vec<(f32, f32, f32, f32)> = boxes
                .iter()
                .filter(|bx| on_boundary(opposite, bx.min, bx.max))
                .filter_map(|bx| {
                    let (bu0, bv0, bu1, bv1) = plane_rect(opposite, bx.min, bx.max);
                    let r = (u0.max(bu0), v0.max(bv0), u1.min(bu1), v1.min(bv1));
                    (r.2 > r.0 && r.3 > r.1).then_some(r)
                })
                .collect();
            union_area(&clipped)
        }
        _ => 0.0,
    }
}

/// True when a boundary face of `[min, max]` is hidden by neighbour `b`.
#[inline]
pub fn is_covered(face: Face, min: [f32; 3], max: [f32; 3], b: &BlockType) -> bool {
    let (u0, v0, u1, v1) = plane_rect(face, min, max);
    let area = (u1 - u0) * (v1 - v0);
    area <= 0.0 || covered_area(face, min, max, b) > (1.0 - BOUNDARY_EPS) * area
}

/// Visibility of a full cube face of `a` against `b`. Model neighbours are decided by area
/// coverage alone; everything else by the face rule.
pub fn cube_face_visible(a: &BlockType, b: &BlockType, face: Face) -> bool {
    match b.shape {
        Shape::Model { .. } => !is_covered(face, ModelBox::FULL.min, ModelBox::FULL.max, b),
        _ => can_add_face(a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(solid: bool) -> BlockType {
        BlockType {
            id: 1,
            solid,
            shape: Shape::Cube,
            ..BlockType::air()
        }
    }

    fn slab() -> BlockType {
        BlockType {
            id: 2,
            shape: Shape::Model {
                boxes: vec![ModelBox::new([0.0, 0.0, 0.0], [1.0, 0.5, 1.0])],
            },
            ..BlockType::air()
        }
    }

    #[test]
    fn face_rule_table() {
        let air = BlockType::air();
        assert!(can_add_face(&cube(true), &air));
        assert!(can_add_face(&cube(false), &air));
        assert!(!can_add_face(&cube(true), &cube(true)));
        assert!(!can_add_face(&cube(false), &cube(false)));
        assert!(can_add_face(&cube(true), &cube(false)));
        assert!(!can_add_face(&cube(false), &cube(true)));
    }

    #[test]
    fn boundary_detection() {
        assert!(on_boundary(Face::PosY, [0.0; 3], [1.0, 1.0, 1.0]));
        assert!(!on_boundary(Face::PosY, [0.0; 3], [1.0, 0.5, 1.0]));
        assert!(on_boundary(Face::NegY, [0.0; 3], [1.0, 0.5, 1.0]));
        assert!(on_boundary(Face::PosX, [0.0; 3], [0.9995, 1.0, 1.0]));
    }

    #[test]
    fn slab_bottom_hides_cube_top() {
        assert!(!cube_face_visible(&cube(true), &slab(), Face::PosY));
        // The slab's side only covers half of a cube side.
        assert!(cube_face_visible(&cube(true), &slab(), Face::PosX));
    }

    fn stairs() -> BlockType {
        BlockType {
            id: 3,
            shape: Shape::Model {
                boxes: vec![
                    ModelBox::new([0.0, 0.0, 0.0], [1.0, 0.5, 1.0]),
                    ModelBox::new([0.0, 0.0, 0.5], [1.0, 1.0, 1.0]),
                ],
            },
            ..BlockType::air()
        }
    }

    #[test]
    fn overlapping_boxes_are_counted_once() {
        let full = ModelBox::FULL;
        let area = covered_area(Face::PosX, full.min, full.max, &stairs());
        assert!((area - 0.75).abs() < 1e-6, "covered {area}");
        assert!(cube_face_visible(&cube(true), &stairs(), Face::PosX));
        // The stairs' back is a full face.
        assert!(!cube_face_visible(&cube(true), &stairs(), Face::NegZ));
    }

    #[test]
    fn union_of_disjoint_and_nested_rects() {
        assert_eq!(union_area(&[]), 0.0);
        let a = (0.0, 0.0, 0.5, 0.5);
        let b = (0.5, 0.5, 1.0, 1.0);
        assert!((union_area(&[a, b]) - 0.5).abs() < 1e-6);
        assert!((union_area(&[(0.0, 0.0, 1.0, 1.0), a]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn model_neighbour_ignores_solid_flags() {
        // Glass beside a slab keeps its half-exposed side.
        assert!(cube_face_visible(&cube(false), &slab(), Face::PosX));
        let solid_slab = BlockType {
            solid: true,
            ..slab()
        };
        assert!(cube_face_visible(&cube(true), &solid_slab, Face::PosX));
        assert!(!cube_face_visible(&cube(false), &solid_slab, Face::PosY));
    }

    #[test]
    fn matching_slab_sides_cover_each_other() {
        let s = slab();
        let Shape::Model { boxes } = &s.shape else {
            unreachable!()
        };
        let b = boxes[0];
        assert!(is_covered(Face::PosX, b.min, b.max, &s));
        assert!(!is_covered(Face::PosY, b.min, b.max, &BlockType::air()));
        assert!(is_covered(Face::NegY, b.min, b.max, &cube(true)));
    }
}
