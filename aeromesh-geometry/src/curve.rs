use crate::bezier::*;
use crate::*;
use aeromesh_base::bounding_box::BoundingBox;
use aeromesh_base::tolerance::*;
use serde::{Deserialize, Serialize};

/// Piecewise bezier curve.
///
/// Sections join with C0 continuity; the curve parameter runs over `[0, 1]`
/// with each section covering an equal share. Curves living in a surface's
/// parameter rectangle store `(u, w, 0)`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BezierCurve {
    sections: Vec<Vec<Point3>>,
}

impl BezierCurve {
    /// Creates a curve from explicit per-section control polygons.
    pub fn new(sections: Vec<Vec<Point3>>) -> Result<Self> {
        if sections.is_empty() || sections.iter().any(|sec| sec.len() < 2) {
            return Err(Error::EmptyControlNet);
        }
        Ok(BezierCurve { sections })
    }

    /// One degree-one section from `p0` to `p1`.
    pub fn linear(p0: Point3, p1: Point3) -> Self {
        BezierCurve {
            sections: vec![vec![p0, p1]],
        }
    }

    /// Piecewise cubic through `pnts` with central-difference tangents scaled
    /// by `tan_str`.
    pub fn interpolate(pnts: &[Point3], tan_str: f64) -> Result<Self> {
        if pnts.len() < 2 {
            return Err(Error::TooFewPoints(pnts.len()));
        }
        let n = pnts.len();
        let mut sections = Vec::with_capacity(n - 1);
        let tangent = |i: usize| -> Vector3 {
            let raw = if i == 0 {
                pnts[1] - pnts[0]
            } else if i == n - 1 {
                pnts[n - 1] - pnts[n - 2]
            } else {
                pnts[i + 1] - pnts[i - 1]
            };
            let mag = raw.magnitude();
            match mag.so_small() {
                true => Vector3::new(0.0, 0.0, 0.0),
                false => raw / mag,
            }
        };
        for i in 0..n - 1 {
            let chord = (pnts[i + 1] - pnts[i]).magnitude();
            sections.push(vec![
                pnts[i],
                pnts[i] + tangent(i) * (chord * tan_str),
                pnts[i + 1] - tangent(i + 1) * (chord * tan_str),
                pnts[i + 1],
            ]);
        }
        Ok(BezierCurve { sections })
    }

    /// Number of bezier sections.
    #[inline(always)]
    pub fn num_sections(&self) -> usize { self.sections.len() }

    /// The per-section control polygons.
    #[inline(always)]
    pub fn sections(&self) -> &[Vec<Point3>] { &self.sections }

    /// First control point.
    #[inline(always)]
    pub fn first_pnt(&self) -> Point3 { self.sections[0][0] }

    /// Last control point.
    #[inline(always)]
    pub fn last_pnt(&self) -> Point3 { *self.sections[self.sections.len() - 1].last().unwrap() }

    fn locate(&self, u: f64) -> (usize, f64) {
        let nsec = self.sections.len() as f64;
        let scaled = f64::clamp(u, 0.0, 1.0) * nsec;
        let mut isec = scaled as usize;
        if isec >= self.sections.len() {
            isec = self.sections.len() - 1;
        }
        (isec, scaled - isec as f64)
    }

    /// Evaluates the curve at `u ∈ [0, 1]`.
    pub fn subs(&self, u: f64) -> Point3 {
        let (isec, t) = self.locate(u);
        de_casteljau(&self.sections[isec], t)
    }

    /// First derivative with respect to the whole-curve parameter.
    pub fn der(&self, u: f64) -> Vector3 {
        let (isec, t) = self.locate(u);
        let dctrl = derivative_ctrl(&self.sections[isec]);
        de_casteljau_vec(&dctrl, t) * self.sections.len() as f64
    }

    /// Reverses the direction of the curve.
    pub fn flip(&mut self) {
        self.sections.reverse();
        self.sections.iter_mut().for_each(|sec| sec.reverse());
    }

    /// Every control point, section by section.
    pub fn control_points(&self) -> Vec<Point3> {
        let mut pnts: Vec<Point3> = vec![self.first_pnt()];
        for sec in &self.sections {
            pnts.extend_from_slice(&sec[1..]);
        }
        pnts
    }

    /// Bounding box of the control net (contains the curve).
    pub fn bbox(&self) -> BoundingBox<Point3> {
        self.sections.iter().flatten().copied().collect()
    }

    /// Chord-length estimate from `num_segs` uniform samples.
    pub fn length(&self, num_segs: usize) -> f64 {
        let mut last = self.subs(0.0);
        let mut len = 0.0;
        for i in 1..=num_segs {
            let p = self.subs(i as f64 / num_segs as f64);
            len += last.distance(p);
            last = p;
        }
        len
    }

    /// Whether the curve is a single degree-one section.
    #[inline(always)]
    pub fn single_linear(&self) -> bool {
        self.sections.len() == 1 && self.sections[0].len() == 2
    }

    /// Whether the control nets match pointwise within `tol`.
    pub fn match_forward(&self, other: &Self, tol: f64) -> bool {
        let a = self.control_points();
        let b = other.control_points();
        a.len() == b.len()
            && a.iter()
                .zip(b.iter())
                .all(|(p, q)| p.distance(*q) <= tol)
    }

    /// Whether the control nets match with `other` reversed, within `tol`.
    pub fn match_backward(&self, other: &Self, tol: f64) -> bool {
        let a = self.control_points();
        let b = other.control_points();
        a.len() == b.len()
            && a.iter()
                .zip(b.iter().rev())
                .all(|(p, q)| p.distance(*q) <= tol)
    }

    /// Number of control points within `tol` of `other`'s corresponding one.
    pub fn count_match(&self, other: &Self, tol: f64) -> usize {
        let a = self.control_points();
        let b = other.control_points();
        match a.len() == b.len() {
            true => a
                .iter()
                .zip(b.iter())
                .filter(|(p, q)| p.distance(**q) <= tol)
                .count(),
            false => 0,
        }
    }

    /// Maps a parameter-space curve `(u, w, 0)` through `surf` into 3D by
    /// transforming every control point.
    pub fn uw_to_xyz(&self, surf: &surface::BezierSurface) -> Self {
        let sections = self
            .sections
            .iter()
            .map(|sec| sec.iter().map(|p| surf.point(p.x, p.y)).collect())
            .collect();
        BezierCurve { sections }
    }

    /// Projects a 3D curve onto `surf` producing the `(u, w, 0)` curve of the
    /// closest points of every control point.
    pub fn xyz_to_uw(&self, surf: &surface::BezierSurface) -> Self {
        let sections = self
            .sections
            .iter()
            .map(|sec| {
                sec.iter()
                    .map(|p| {
                        let (u, w) = surf.closest_point(*p, None);
                        Point3::new(u, w, 0.0)
                    })
                    .collect()
            })
            .collect();
        BezierCurve { sections }
    }

    /// Builds the trailing-edge curve of a wake swept from this leading edge:
    /// every control point moves to `x = end_x`, keeping `y` and shearing `z`
    /// along the wake angle (degrees).
    pub fn wake_trailing_edge(&self, end_x: f64, angle_deg: f64) -> Self {
        let tan_a = f64::tan(angle_deg.to_radians());
        let sections = self
            .sections
            .iter()
            .map(|sec| {
                sec.iter()
                    .map(|p| Point3::new(end_x, p.y, p.z + (end_x - p.x) * tan_a))
                    .collect()
            })
            .collect();
        BezierCurve { sections }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aeromesh_base::assert_near;

    fn sample_points() -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 0.5, 0.5),
            Point3::new(3.0, 0.0, 0.0),
        ]
    }

    #[test]
    fn interpolation_hits_input_points() {
        let pnts = sample_points();
        let crv = BezierCurve::interpolate(&pnts, 0.3).unwrap();
        assert_eq!(crv.num_sections(), 3);
        for (i, p) in pnts.iter().enumerate() {
            assert_near!(crv.subs(i as f64 / 3.0), *p);
        }
    }

    #[test]
    fn flip_reverses_evaluation() {
        let crv = BezierCurve::interpolate(&sample_points(), 0.25).unwrap();
        let mut rev = crv.clone();
        rev.flip();
        for i in 0..=10 {
            let u = i as f64 / 10.0;
            assert_near!(crv.subs(u), rev.subs(1.0 - u));
        }
    }

    #[test]
    fn match_symmetry() {
        let crv = BezierCurve::interpolate(&sample_points(), 0.25).unwrap();
        let mut rev = crv.clone();
        rev.flip();
        assert!(crv.match_forward(&crv, 1.0e-5));
        assert!(crv.match_backward(&rev, 1.0e-5));
        assert!(!crv.match_forward(&rev, 1.0e-5));
        // if match_forward(a, b) then match_backward(a, reverse(b))
        let mut rev2 = rev.clone();
        rev2.flip();
        assert!(crv.match_forward(&rev2, 1.0e-5));
    }

    #[test]
    fn linear_curve_length() {
        let crv = BezierCurve::linear(Point3::new(0.0, 0.0, 0.0), Point3::new(3.0, 4.0, 0.0));
        assert!((crv.length(10) - 5.0).abs() < 1.0e-12);
        assert!(crv.single_linear());
    }

    #[test]
    fn wake_trailing_edge_shears_z() {
        let le = BezierCurve::linear(Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 2.0, 0.0));
        let te = le.wake_trailing_edge(3.0, 45.0);
        assert_near!(te.first_pnt(), Point3::new(3.0, 0.0, 2.0));
        assert_near!(te.last_pnt(), Point3::new(3.0, 2.0, 2.0));
    }
}
