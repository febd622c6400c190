use proptest::num::f32::NORMAL;
use proptest::prelude::*;
use proptest::strategy::Strategy;
use strata_geom::{Aabb, Vec3};

fn approx(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

fn approx_abs_rel(a: f32, b: f32, atol: f32, rtol: f32) -> bool {
    let diff = (a - b).abs();
    let scale = a.abs().max(b.abs());
    diff <= atol + rtol * scale
}

fn vapprox_abs_rel(a: Vec3, b: Vec3, atol: f32, rtol: f32) -> bool {
    approx_abs_rel(a.x, b.x, atol, rtol)
        && approx_abs_rel(a.y, b.y, atol, rtol)
        && approx_abs_rel(a.z, b.z, atol, rtol)
}

fn bounded_f32() -> impl Strategy<Value = f32> {
    NORMAL.prop_filter("bounded", |v| v.is_finite() && v.abs() <= 1e4)
}

fn arb_vec3() -> impl Strategy<Value = Vec3> {
    (bounded_f32(), bounded_f32(), bounded_f32()).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

proptest! {
    #[test]
    fn add_then_sub_roundtrips(a in arb_vec3(), b in arb_vec3()) {
        prop_assert!(vapprox_abs_rel((a + b) - b, a, 1e-3, 1e-4));
    }

    #[test]
    fn neg_matches_scale_by_minus_one(a in arb_vec3()) {
        prop_assert_eq!(-a, a * -1.0);
    }

    #[test]
    fn abs_is_non_negative(a in arb_vec3()) {
        let r = a.abs();
        prop_assert!(r.x >= 0.0 && r.y >= 0.0 && r.z >= 0.0);
    }

    #[test]
    fn min_max_bracket_inputs(a in arb_vec3(), b in arb_vec3()) {
        let lo = a.min(b);
        let hi = a.max(b);
        prop_assert!(lo.x <= hi.x && lo.y <= hi.y && lo.z <= hi.z);
        let bx = Aabb::new(lo, hi);
        prop_assert!(bx.contains(a));
        prop_assert!(bx.contains(b));
    }

    #[test]
    fn normalized_has_unit_length(a in arb_vec3()) {
        prop_assume!(a.length() > 1e-3);
        prop_assert!(approx(a.normalized().length(), 1.0, 1e-3));
    }

    #[test]
    fn aabb_center_plus_half_extents_is_max(a in arb_vec3(), b in arb_vec3()) {
        let bx = Aabb::new(a.min(b), a.max(b));
        prop_assert!(vapprox_abs_rel(bx.center() + bx.half_extents(), bx.max, 1e-2, 1e-4));
    }
}
