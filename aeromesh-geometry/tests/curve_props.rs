//! Property tests over curve evaluation and matching.

use aeromesh_base::cgmath64::*;
use aeromesh_geometry::BezierCurve;
use proptest::prelude::*;

fn arb_points() -> impl Strategy<Value = Vec<Point3>> {
    proptest::collection::vec((-10.0..10.0f64, -10.0..10.0f64, -10.0..10.0f64), 2..8)
        .prop_map(|pts| pts.into_iter().map(|(x, y, z)| Point3::new(x, y, z)).collect())
}

proptest! {
    #[test]
    fn interpolation_passes_through_input(pnts in arb_points()) {
        let crv = BezierCurve::interpolate(&pnts, 0.25).unwrap();
        let n = pnts.len();
        for (i, p) in pnts.iter().enumerate() {
            let q = crv.subs(i as f64 / (n - 1) as f64);
            prop_assert!(q.distance(*p) < 1.0e-9);
        }
    }

    #[test]
    fn forward_match_implies_backward_match_of_reverse(pnts in arb_points()) {
        let crv = BezierCurve::interpolate(&pnts, 0.3).unwrap();
        let mut rev = crv.clone();
        rev.flip();
        // if match_forward(a, b) holds, match_backward(a, reverse(b)) holds
        prop_assert!(crv.match_forward(&crv, 1.0e-5));
        prop_assert!(crv.match_backward(&rev, 1.0e-5));
    }

    #[test]
    fn derivative_is_consistent_with_finite_difference(pnts in arb_points(), u in 0.05..0.95f64) {
        let crv = BezierCurve::interpolate(&pnts, 0.3).unwrap();
        // the interpolant is only C0 across section joints
        let s = u * crv.num_sections() as f64;
        prop_assume!((s - s.round()).abs() > 1.0e-3);
        let h = 1.0e-6;
        let fd = (crv.subs(u + h) - crv.subs(u - h)) / (2.0 * h);
        let an = crv.der(u);
        prop_assert!((fd - an).magnitude() < 1.0e-3 * (1.0 + an.magnitude()));
    }
}
