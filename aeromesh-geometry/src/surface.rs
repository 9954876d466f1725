use crate::bezier::*;
use crate::curve::BezierCurve;
use crate::*;
use aeromesh_base::bounding_box::BoundingBox;
use serde::{Deserialize, Serialize};

/// One bezier patch control net, row-major over `(degree_u+1) × (degree_w+1)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatchNet {
    deg_u: usize,
    deg_w: usize,
    ctrl: Vec<Point3>,
}

impl PatchNet {
    /// Creates a net from its degrees and row-major control points.
    pub fn new(deg_u: usize, deg_w: usize, ctrl: Vec<Point3>) -> Result<Self> {
        match ctrl.len() == (deg_u + 1) * (deg_w + 1) {
            true => Ok(PatchNet { deg_u, deg_w, ctrl }),
            false => Err(Error::IrregularControlNet),
        }
    }

    /// u-degree of the net.
    #[inline(always)]
    pub fn degree_u(&self) -> usize { self.deg_u }

    /// w-degree of the net.
    #[inline(always)]
    pub fn degree_w(&self) -> usize { self.deg_w }

    /// Control point at `(i, j)`.
    #[inline(always)]
    pub fn control_point(&self, i: usize, j: usize) -> Point3 { self.ctrl[i * (self.deg_w + 1) + j] }

    /// All control points, row-major.
    #[inline(always)]
    pub fn control_points(&self) -> &[Point3] { &self.ctrl }

    /// Evaluates the net, differentiated `du` times in u and `dw` times in w.
    pub fn eval_der(&self, tu: f64, tw: f64, du: usize, dw: usize) -> Vector3 {
        // reduce in u first, column by column
        let cols: Vec<Vec<Vector3>> = (0..=self.deg_w)
            .map(|j| {
                (0..=self.deg_u)
                    .map(|i| self.control_point(i, j).to_vec())
                    .collect()
            })
            .collect();
        let mut row: Vec<Vector3> = cols
            .into_iter()
            .map(|mut col| {
                for _ in 0..du {
                    col = diff_scaled(&col);
                }
                de_casteljau_vec_or_zero(&col, tu)
            })
            .collect();
        for _ in 0..dw {
            row = diff_scaled(&row);
        }
        de_casteljau_vec_or_zero(&row, tw)
    }

    /// Point on the net.
    pub fn point(&self, tu: f64, tw: f64) -> Point3 {
        Point3::from_vec(self.eval_der(tu, tw, 0, 0))
    }

    fn reversed_u(&self) -> Self {
        let mut ctrl = Vec::with_capacity(self.ctrl.len());
        for i in (0..=self.deg_u).rev() {
            for j in 0..=self.deg_w {
                ctrl.push(self.control_point(i, j));
            }
        }
        PatchNet { ctrl, ..*self }
    }

    fn reversed_w(&self) -> Self {
        let mut ctrl = Vec::with_capacity(self.ctrl.len());
        for i in 0..=self.deg_u {
            for j in (0..=self.deg_w).rev() {
                ctrl.push(self.control_point(i, j));
            }
        }
        PatchNet { ctrl, ..*self }
    }

    fn transposed(&self) -> Self {
        let mut ctrl = Vec::with_capacity(self.ctrl.len());
        for j in 0..=self.deg_w {
            for i in 0..=self.deg_u {
                ctrl.push(self.control_point(i, j));
            }
        }
        PatchNet {
            deg_u: self.deg_w,
            deg_w: self.deg_u,
            ctrl,
        }
    }
}

fn diff_scaled(ctrl: &[Vector3]) -> Vec<Vector3> {
    if ctrl.len() < 2 {
        return vec![Vector3::new(0.0, 0.0, 0.0)];
    }
    let deg = ctrl.len() - 1;
    (0..deg)
        .map(|i| (ctrl[i + 1] - ctrl[i]) * deg as f64)
        .collect()
}

fn de_casteljau_vec_or_zero(ctrl: &[Vector3], t: f64) -> Vector3 {
    match ctrl.is_empty() {
        true => Vector3::new(0.0, 0.0, 0.0),
        false => de_casteljau_vec(ctrl, t),
    }
}

/// Principal, mean and Gaussian curvature at one surface point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Curvature {
    /// larger-magnitude principal curvature
    pub k1: f64,
    /// smaller-magnitude principal curvature
    pub k2: f64,
    /// mean curvature
    pub mean: f64,
    /// Gaussian curvature
    pub gaussian: f64,
}

/// The four parametric borders of a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Border {
    /// u = min
    UMin,
    /// u = max
    UMax,
    /// w = min
    WMin,
    /// w = max
    WMax,
}

/// Piecewise bezier surface over a grid of patches with unit parameter spans.
///
/// The domain is `[0, num_u_patches] × [0, num_w_patches]`. Evaluation clamps
/// to the domain; a parameter more than ~1e-3 outside is a programmer error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BezierSurface {
    patches: Vec<Vec<PatchNet>>,
}

/// Parameter slop allowed outside the domain before the debug assert fires.
const PARAM_SLOP: f64 = 1.0e-3;

impl BezierSurface {
    /// Creates a surface from its patch grid (`patches[iu][iw]`).
    pub fn new(patches: Vec<Vec<PatchNet>>) -> Result<Self> {
        if patches.is_empty() || patches[0].is_empty() {
            return Err(Error::EmptyControlNet);
        }
        let nw = patches[0].len();
        if patches.iter().any(|row| row.len() != nw) {
            return Err(Error::IrregularPatchGrid);
        }
        Ok(BezierSurface { patches })
    }

    /// One bilinear patch through four corner points.
    pub fn plane(p0: Point3, p1: Point3, p2: Point3, p3: Point3) -> Self {
        let net = PatchNet::new(1, 1, vec![p0, p2, p1, p3]).unwrap();
        BezierSurface {
            patches: vec![vec![net]],
        }
    }

    /// Swept planar wake surface: w runs from the leading edge curve to its
    /// sheared trailing edge at `end_x`. The normal is turned to +z.
    pub fn wake(le: &BezierCurve, end_x: f64, angle_deg: f64) -> Self {
        let te = le.wake_trailing_edge(end_x, angle_deg);
        let mut patches: Vec<Vec<PatchNet>> = le
            .sections()
            .iter()
            .zip(te.sections().iter())
            .map(|(lsec, tsec)| {
                let deg = lsec.len() - 1;
                let mut ctrl = Vec::with_capacity(2 * (deg + 1));
                for j in 0..=deg {
                    ctrl.push(lsec[j]);
                    ctrl.push(tsec[j]);
                }
                vec![PatchNet::new(deg, 1, ctrl).unwrap()]
            })
            .collect();
        let mut surf = BezierSurface {
            patches: patches.clone(),
        };
        if surf.normal(0.0, 0.0).z < 0.0 {
            patches.reverse();
            patches
                .iter_mut()
                .for_each(|row| *row = vec![row[0].reversed_u()]);
            surf = BezierSurface { patches };
        }
        surf
    }

    /// Number of patches in u.
    #[inline(always)]
    pub fn num_u_patches(&self) -> usize { self.patches.len() }

    /// Number of patches in w.
    #[inline(always)]
    pub fn num_w_patches(&self) -> usize { self.patches[0].len() }

    /// Minimum u parameter.
    #[inline(always)]
    pub fn min_u(&self) -> f64 { 0.0 }

    /// Maximum u parameter.
    #[inline(always)]
    pub fn max_u(&self) -> f64 { self.num_u_patches() as f64 }

    /// Minimum w parameter.
    #[inline(always)]
    pub fn min_w(&self) -> f64 { 0.0 }

    /// Maximum w parameter.
    #[inline(always)]
    pub fn max_w(&self) -> f64 { self.num_w_patches() as f64 }

    /// Midpoint of the u domain.
    #[inline(always)]
    pub fn mid_u(&self) -> f64 { self.max_u() / 2.0 }

    /// Midpoint of the w domain.
    #[inline(always)]
    pub fn mid_w(&self) -> f64 { self.max_w() / 2.0 }

    /// The patch grid.
    #[inline(always)]
    pub fn patches(&self) -> &Vec<Vec<PatchNet>> { &self.patches }

    fn clamp(&self, u: f64, w: f64) -> (f64, f64) {
        debug_assert!(
            u > -PARAM_SLOP
                && w > -PARAM_SLOP
                && u < self.max_u() + PARAM_SLOP
                && w < self.max_w() + PARAM_SLOP,
            "parameter out of domain: ({u}, {w})",
        );
        (
            f64::clamp(u, 0.0, self.max_u()),
            f64::clamp(w, 0.0, self.max_w()),
        )
    }

    fn locate(&self, u: f64, w: f64) -> (usize, f64, usize, f64) {
        let (u, w) = self.clamp(u, w);
        let mut iu = u as usize;
        if iu >= self.num_u_patches() {
            iu = self.num_u_patches() - 1;
        }
        let mut iw = w as usize;
        if iw >= self.num_w_patches() {
            iw = self.num_w_patches() - 1;
        }
        (iu, u - iu as f64, iw, w - iw as f64)
    }

    /// Point at `(u, w)`.
    pub fn point(&self, u: f64, w: f64) -> Point3 {
        let (iu, tu, iw, tw) = self.locate(u, w);
        self.patches[iu][iw].point(tu, tw)
    }

    /// First u-derivative.
    pub fn der_u(&self, u: f64, w: f64) -> Vector3 {
        let (iu, tu, iw, tw) = self.locate(u, w);
        self.patches[iu][iw].eval_der(tu, tw, 1, 0)
    }

    /// First w-derivative.
    pub fn der_w(&self, u: f64, w: f64) -> Vector3 {
        let (iu, tu, iw, tw) = self.locate(u, w);
        self.patches[iu][iw].eval_der(tu, tw, 0, 1)
    }

    /// Second u-derivative.
    pub fn der_uu(&self, u: f64, w: f64) -> Vector3 {
        let (iu, tu, iw, tw) = self.locate(u, w);
        self.patches[iu][iw].eval_der(tu, tw, 2, 0)
    }

    /// Mixed second derivative.
    pub fn der_uw(&self, u: f64, w: f64) -> Vector3 {
        let (iu, tu, iw, tw) = self.locate(u, w);
        self.patches[iu][iw].eval_der(tu, tw, 1, 1)
    }

    /// Second w-derivative.
    pub fn der_ww(&self, u: f64, w: f64) -> Vector3 {
        let (iu, tu, iw, tw) = self.locate(u, w);
        self.patches[iu][iw].eval_der(tu, tw, 0, 2)
    }

    /// Unit normal. Degenerate directions are probed with a small step toward
    /// the domain midpoint.
    pub fn normal(&self, u: f64, w: f64) -> Vector3 {
        let (mut u, mut w) = self.clamp(u, w);
        let mut n = self.der_u(u, w).cross(self.der_w(u, w));
        let mut bump = 1.0e-3;
        while n.magnitude2() < 1.0e-20 && bump < 0.1 {
            u += (self.mid_u() - u) * bump;
            w += (self.mid_w() - w) * bump;
            n = self.der_u(u, w).cross(self.der_w(u, w));
            bump *= 10.0;
        }
        match n.magnitude2() < 1.0e-20 {
            true => Vector3::new(0.0, 0.0, 1.0),
            false => n.normalize(),
        }
    }

    /// Principal curvatures from the fundamental forms. `k1` carries the
    /// larger magnitude. Degenerate tangent directions are bumped toward the
    /// domain midpoint before differencing.
    pub fn curvature(&self, u: f64, w: f64) -> Curvature {
        let (mut u, mut w) = self.clamp(u, w);
        let tol = 1.0e-10;
        let bump = 1.0e-3;

        let mut s_u = self.der_u(u, w);
        let mut s_w = self.der_w(u, w);
        let mut e = s_u.dot(s_u);
        let mut g = s_w.dot(s_w);

        if e < tol && g < tol {
            u += (self.mid_u() - u) * bump;
            w += (self.mid_w() - w) * bump;
        } else if e < tol {
            w += (self.mid_w() - w) * bump;
        } else if g < tol {
            u += (self.mid_u() - u) * bump;
        }
        if e < tol || g < tol {
            s_u = self.der_u(u, w);
            s_w = self.der_w(u, w);
            e = s_u.dot(s_u);
            g = s_w.dot(s_w);
        }

        let s_uu = self.der_uu(u, w);
        let s_uw = self.der_uw(u, w);
        let s_ww = self.der_ww(u, w);

        let mut q = s_u.cross(s_w);
        if q.magnitude2() < 1.0e-20 {
            return Curvature::default();
        }
        q = q.normalize();

        let f = s_u.dot(s_w);
        let l = s_uu.dot(q);
        let m = s_uw.dot(q);
        let n = s_ww.dot(q);

        let denom = e * g - f * f;
        if denom.abs() < 1.0e-20 {
            return Curvature::default();
        }
        let mean = (e * n + g * l - 2.0 * f * m) / (2.0 * denom);
        let gaussian = (l * n - m * m) / denom;

        let b = f64::sqrt(f64::max(mean * mean - gaussian, 0.0));
        let kmax = mean + b;
        let kmin = mean - b;
        let (k1, k2) = match kmax.abs() > kmin.abs() {
            true => (kmax, kmin),
            false => (kmin, kmax),
        };
        Curvature {
            k1,
            k2,
            mean,
            gaussian,
        }
    }

    /// Bounding box of every control point (contains the surface).
    pub fn bbox(&self) -> BoundingBox<Point3> {
        self.patches
            .iter()
            .flatten()
            .flat_map(|net| net.control_points().iter().copied())
            .collect()
    }

    /// Whether every control point satisfies `y < val`.
    pub fn less_than_y(&self, val: f64) -> bool {
        self.patches
            .iter()
            .flatten()
            .flat_map(|net| net.control_points())
            .all(|p| p.y < val)
    }

    /// Whether the whole control net lies in the y = 0 plane.
    pub fn plane_at_y_zero(&self) -> bool {
        self.patches
            .iter()
            .flatten()
            .flat_map(|net| net.control_points())
            .all(|p| p.y.abs() < 1.0e-6)
    }

    /// 3D border curve along one side, running in the increasing parameter.
    pub fn border_curve(&self, border: Border) -> BezierCurve {
        let sections = match border {
            Border::WMin | Border::WMax => {
                let j = match border {
                    Border::WMin => 0,
                    _ => self.patches[0][self.num_w_patches() - 1].degree_w(),
                };
                let iw = match border {
                    Border::WMin => 0,
                    _ => self.num_w_patches() - 1,
                };
                self.patches
                    .iter()
                    .map(|row| {
                        let net = &row[iw];
                        (0..=net.degree_u())
                            .map(|i| net.control_point(i, j))
                            .collect()
                    })
                    .collect()
            }
            Border::UMin | Border::UMax => {
                let iu = match border {
                    Border::UMin => 0,
                    _ => self.num_u_patches() - 1,
                };
                let i = match border {
                    Border::UMin => 0,
                    _ => self.patches[iu][0].degree_u(),
                };
                self.patches[iu]
                    .iter()
                    .map(|net| {
                        (0..=net.degree_w())
                            .map(|j| net.control_point(i, j))
                            .collect()
                    })
                    .collect()
            }
        };
        BezierCurve::new(sections).unwrap()
    }

    fn reversed_u(&self) -> Self {
        let mut patches: Vec<Vec<PatchNet>> = self
            .patches
            .iter()
            .map(|row| row.iter().map(PatchNet::reversed_u).collect())
            .collect();
        patches.reverse();
        BezierSurface { patches }
    }

    fn reversed_w(&self) -> Self {
        let patches: Vec<Vec<PatchNet>> = self
            .patches
            .iter()
            .map(|row| {
                let mut row: Vec<PatchNet> = row.iter().map(PatchNet::reversed_w).collect();
                row.reverse();
                row
            })
            .collect();
        BezierSurface { patches }
    }

    fn swapped_uw(&self) -> Self {
        let nu = self.num_u_patches();
        let nw = self.num_w_patches();
        let patches = (0..nw)
            .map(|j| (0..nu).map(|i| self.patches[i][j].transposed()).collect())
            .collect();
        BezierSurface { patches }
    }

    fn match_this_orientation(&self, other: &Self) -> bool {
        let tol2 = 1.0e-8;
        if self.num_u_patches() != other.num_u_patches()
            || self.num_w_patches() != other.num_w_patches()
        {
            return false;
        }
        for (row, orow) in self.patches.iter().zip(other.patches.iter()) {
            for (net, onet) in row.iter().zip(orow.iter()) {
                if net.degree_u() != onet.degree_u() || net.degree_w() != onet.degree_w() {
                    return false;
                }
                let close = net
                    .control_points()
                    .iter()
                    .zip(onet.control_points().iter())
                    .all(|(p, q)| p.distance2(*q) <= tol2);
                if !close {
                    return false;
                }
            }
        }
        true
    }

    /// Geometric equivalence under the 8-fold symmetry of
    /// `reverse_u × reverse_w × swap_uw`. Used to drop mirror-image
    /// duplicate surfaces.
    pub fn surf_match(&self, other: &Self) -> bool {
        let candidates = [other.clone(), other.swapped_uw()];
        for base in &candidates {
            if self.match_this_orientation(base)
                || self.match_this_orientation(&base.reversed_u())
                || self.match_this_orientation(&base.reversed_w())
                || self.match_this_orientation(&base.reversed_u().reversed_w())
            {
                return true;
            }
        }
        false
    }

    /// Closest `(u, w)` to `pnt` by damped Newton iteration on the squared
    /// distance, seeded by `guess` or a coarse per-patch sample sweep.
    pub fn closest_point(&self, pnt: Point3, guess: Option<(f64, f64)>) -> (f64, f64) {
        let (mut u, mut w) = match guess {
            Some((gu, gw)) => self.clamp(gu, gw),
            None => self.coarse_seed(pnt),
        };
        let mut best = (u, w);
        let mut best_d2 = self.point(u, w).distance2(pnt);
        for _ in 0..50 {
            let r = self.point(u, w) - pnt;
            let s_u = self.der_u(u, w);
            let s_w = self.der_w(u, w);
            let s_uu = self.der_uu(u, w);
            let s_uw = self.der_uw(u, w);
            let s_ww = self.der_ww(u, w);

            let g0 = r.dot(s_u);
            let g1 = r.dot(s_w);
            let h00 = s_u.dot(s_u) + r.dot(s_uu);
            let h01 = s_u.dot(s_w) + r.dot(s_uw);
            let h11 = s_w.dot(s_w) + r.dot(s_ww);

            let det = h00 * h11 - h01 * h01;
            let (du, dw) = if det.abs() > 1.0e-14 {
                (
                    -(h11 * g0 - h01 * g1) / det,
                    -(h00 * g1 - h01 * g0) / det,
                )
            } else {
                // gradient step with a conservative scale
                let g2 = g0 * g0 + g1 * g1;
                if g2 < 1.0e-20 {
                    break;
                }
                (-g0 / (1.0 + g2), -g1 / (1.0 + g2))
            };

            u = f64::clamp(u + du, 0.0, self.max_u());
            w = f64::clamp(w + dw, 0.0, self.max_w());

            let d2 = self.point(u, w).distance2(pnt);
            if d2 < best_d2 {
                best_d2 = d2;
                best = (u, w);
            }
            if du.abs() < 1.0e-12 && dw.abs() < 1.0e-12 {
                break;
            }
        }
        best
    }

    fn coarse_seed(&self, pnt: Point3) -> (f64, f64) {
        let ndiv = 4;
        let mut best = (0.0, 0.0);
        let mut best_d2 = f64::INFINITY;
        let nu = self.num_u_patches() * ndiv;
        let nw = self.num_w_patches() * ndiv;
        for i in 0..=nu {
            let u = self.max_u() * i as f64 / nu as f64;
            for j in 0..=nw {
                let w = self.max_w() * j as f64 / nw as f64;
                let d2 = self.point(u, w).distance2(pnt);
                if d2 < best_d2 {
                    best_d2 = d2;
                    best = (u, w);
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aeromesh_base::assert_near;

    pub(crate) fn saddle() -> BezierSurface {
        // z = (u - 1)(w - 1) over [0,2]x[0,2] as a 2x2 grid of bilinear
        // patches; the function is bilinear, so the net reproduces it exactly
        let f = |u: f64, w: f64| Point3::new(u, w, (u - 1.0) * (w - 1.0));
        let patches = (0..2)
            .map(|iu| {
                (0..2)
                    .map(|iw| {
                        let (u0, w0) = (iu as f64, iw as f64);
                        PatchNet::new(
                            1,
                            1,
                            vec![
                                f(u0, w0),
                                f(u0, w0 + 1.0),
                                f(u0 + 1.0, w0),
                                f(u0 + 1.0, w0 + 1.0),
                            ],
                        )
                        .unwrap()
                    })
                    .collect()
            })
            .collect();
        BezierSurface::new(patches).unwrap()
    }

    #[test]
    fn plane_evaluation() {
        let s = BezierSurface::plane(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        );
        assert_near!(s.point(0.5, 0.5), Point3::new(0.5, 0.5, 0.0));
        assert_near!(s.normal(0.5, 0.5), Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn derivatives_match_finite_difference() {
        let s = saddle();
        let h = 1.0e-6;
        let (u, w) = (0.73, 1.21);
        let fd_u = (s.point(u + h, w) - s.point(u - h, w)) / (2.0 * h);
        let fd_w = (s.point(u, w + h) - s.point(u, w - h)) / (2.0 * h);
        assert!((fd_u - s.der_u(u, w)).magnitude() < 1.0e-6);
        assert!((fd_w - s.der_w(u, w)).magnitude() < 1.0e-6);
    }

    #[test]
    fn normal_is_unit() {
        let s = saddle();
        for i in 0..=4 {
            for j in 0..=4 {
                let n = s.normal(i as f64 / 2.0, j as f64 / 2.0);
                assert!((n.magnitude() - 1.0).abs() < 1.0e-12);
            }
        }
    }

    #[test]
    fn curvature_finite_difference_smooth_patch() {
        // quarter-ish cylinder approximation: curvature magnitudes must agree
        // with finite differencing of the normal within loose tolerance
        let net = PatchNet::new(
            2,
            1,
            vec![
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(1.0, 0.0, 1.0),
                Point3::new(1.0, 1.0, 1.0),
                Point3::new(0.0, 0.0, 1.0),
                Point3::new(0.0, 1.0, 1.0),
            ],
        )
        .unwrap();
        let s = BezierSurface::new(vec![vec![net]]).unwrap();
        let c = s.curvature(0.5, 0.5);
        // quadratic bezier arc of a near-circle: k1 magnitude near 1/r with
        // r the local bend radius; sanity-check the sign conventions instead
        // of exact values
        assert!(c.k1.abs() >= c.k2.abs());
        assert!((c.mean - (c.k1 + c.k2) / 2.0).abs() < 1.0e-9);
        assert!((c.gaussian - c.k1 * c.k2).abs() < 1.0e-9);
    }

    #[test]
    fn border_curves_run_along_edges() {
        let s = saddle();
        let crv = s.border_curve(Border::WMin);
        assert_near!(crv.first_pnt(), s.point(0.0, 0.0));
        assert_near!(crv.last_pnt(), s.point(2.0, 0.0));
        let crv = s.border_curve(Border::UMax);
        assert_near!(crv.first_pnt(), s.point(2.0, 0.0));
        assert_near!(crv.last_pnt(), s.point(2.0, 2.0));
    }

    #[test]
    fn surf_match_detects_mirrors() {
        let s = saddle();
        assert!(s.surf_match(&s.clone()));
        assert!(s.surf_match(&s.reversed_u()));
        assert!(s.surf_match(&s.reversed_w()));
        assert!(s.surf_match(&s.swapped_uw()));
        let t = BezierSurface::plane(
            Point3::new(0.0, 0.0, 5.0),
            Point3::new(1.0, 0.0, 5.0),
            Point3::new(0.0, 1.0, 5.0),
            Point3::new(1.0, 1.0, 5.0),
        );
        assert!(!s.surf_match(&t));
    }

    #[test]
    fn closest_point_recovers_parameters() {
        let s = saddle();
        for (u, w) in [(0.25, 0.5), (1.0, 1.0), (1.8, 0.3)] {
            let p = s.point(u, w);
            let (cu, cw) = s.closest_point(p, None);
            assert!(s.point(cu, cw).distance(p) < 1.0e-8);
        }
    }

    #[test]
    fn wake_surface_points_up() {
        let le = BezierCurve::linear(Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 2.0, 0.0));
        let s = BezierSurface::wake(&le, 2.0, 0.0);
        assert!(s.normal(0.5, 0.5).z > 0.0);
        // w = 0 edge is the leading edge
        assert_near!(s.point(0.0, 0.0), Point3::new(1.0, 0.0, 0.0));
        assert_near!(s.point(0.0, 1.0), Point3::new(2.0, 0.0, 0.0));
    }
}
