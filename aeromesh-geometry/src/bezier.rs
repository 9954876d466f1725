//! Single-span bezier helpers shared by the curve and surface types.

use crate::*;

/// Evaluates one bezier span by de Casteljau reduction.
pub(crate) fn de_casteljau(ctrl: &[Point3], t: f64) -> Point3 {
    let mut work: Vec<Vector3> = ctrl.iter().map(|p| p.to_vec()).collect();
    let mut n = work.len();
    while n > 1 {
        for i in 0..n - 1 {
            work[i] = work[i] * (1.0 - t) + work[i + 1] * t;
        }
        n -= 1;
    }
    Point3::from_vec(work[0])
}

/// Control points of the derivative span (degree drops by one).
pub(crate) fn derivative_ctrl(ctrl: &[Point3]) -> Vec<Vector3> {
    let deg = ctrl.len() - 1;
    (0..deg)
        .map(|i| (ctrl[i + 1] - ctrl[i]) * deg as f64)
        .collect()
}

/// Evaluates a vector-valued span.
pub(crate) fn de_casteljau_vec(ctrl: &[Vector3], t: f64) -> Vector3 {
    let mut work = ctrl.to_vec();
    let mut n = work.len();
    while n > 1 {
        for i in 0..n - 1 {
            work[i] = work[i] * (1.0 - t) + work[i + 1] * t;
        }
        n -= 1;
    }
    work[0]
}

/// Splits one span at `t` into the left and right control polygons.
pub(crate) fn split_span(ctrl: &[Point3], t: f64) -> (Vec<Point3>, Vec<Point3>) {
    let mut work: Vec<Vector3> = ctrl.iter().map(|p| p.to_vec()).collect();
    let n = work.len();
    let mut left = Vec::with_capacity(n);
    let mut right = vec![Vector3::new(0.0, 0.0, 0.0); n];
    left.push(work[0]);
    right[n - 1] = work[n - 1];
    for level in 1..n {
        for i in 0..n - level {
            work[i] = work[i] * (1.0 - t) + work[i + 1] * t;
        }
        left.push(work[0]);
        right[n - 1 - level] = work[n - 1 - level];
    }
    (
        left.into_iter().map(Point3::from_vec).collect(),
        right.into_iter().map(Point3::from_vec).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use aeromesh_base::assert_near;

    fn cubic() -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(2.0, 2.0, 1.0),
            Point3::new(3.0, 0.0, 0.5),
        ]
    }

    fn bernstein(ctrl: &[Point3], t: f64) -> Point3 {
        // direct Bernstein sum, the independent reference for de Casteljau
        let n = ctrl.len() - 1;
        let mut acc = Vector3::new(0.0, 0.0, 0.0);
        for (i, p) in ctrl.iter().enumerate() {
            let mut binom = 1.0;
            for k in 0..i {
                binom *= (n - k) as f64 / (k + 1) as f64;
            }
            let b = binom * t.powi(i as i32) * (1.0 - t).powi((n - i) as i32);
            acc += p.to_vec() * b;
        }
        Point3::from_vec(acc)
    }

    #[test]
    fn de_casteljau_matches_bernstein() {
        let ctrl = cubic();
        for i in 0..=20 {
            let t = i as f64 / 20.0;
            assert_near!(de_casteljau(&ctrl, t), bernstein(&ctrl, t));
        }
    }

    #[test]
    fn split_preserves_curve() {
        let ctrl = cubic();
        let (left, right) = split_span(&ctrl, 0.3);
        assert_near!(de_casteljau(&left, 1.0), de_casteljau(&ctrl, 0.3));
        assert_near!(de_casteljau(&right, 0.0), de_casteljau(&ctrl, 0.3));
        assert_near!(de_casteljau(&left, 0.5), de_casteljau(&ctrl, 0.15));
        assert_near!(de_casteljau(&right, 0.5), de_casteljau(&ctrl, 0.65));
    }

    #[test]
    fn derivative_matches_finite_difference() {
        let ctrl = cubic();
        let dctrl = derivative_ctrl(&ctrl);
        let h = 1.0e-7;
        for i in 1..10 {
            let t = i as f64 / 10.0;
            let fd = (de_casteljau(&ctrl, t + h) - de_casteljau(&ctrl, t - h)) / (2.0 * h);
            let an = de_casteljau_vec(&dctrl, t);
            assert!((fd - an).magnitude() < 1.0e-5);
        }
    }
}
