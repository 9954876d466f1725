use crate::bezier::split_span;
use crate::collision::seg_tri_intersect;
use crate::surface::{BezierSurface, PatchNet};
use crate::*;
use aeromesh_base::bounding_box::BoundingBox;
use std::cell::Cell;

/// One planar-refinable sub-patch of a surface, with its parameter rectangle
/// and 3D bounding box. The planarity verdict is cached.
#[derive(Clone, Debug)]
pub struct SurfPatch {
    net: PatchNet,
    u_range: (f64, f64),
    w_range: (f64, f64),
    bbox: BoundingBox<Point3>,
    depth: usize,
    planar: Cell<Option<bool>>,
}

impl SurfPatch {
    /// Wraps a control net spanning the given parameter rectangle.
    pub fn new(net: PatchNet, u_range: (f64, f64), w_range: (f64, f64), depth: usize) -> Self {
        let bbox = net.control_points().iter().copied().collect();
        SurfPatch {
            net,
            u_range,
            w_range,
            bbox,
            depth,
            planar: Cell::new(None),
        }
    }

    /// The control net.
    #[inline(always)]
    pub fn net(&self) -> &PatchNet { &self.net }

    /// The patch's u parameter range on the parent surface.
    #[inline(always)]
    pub fn u_range(&self) -> (f64, f64) { self.u_range }

    /// The patch's w parameter range on the parent surface.
    #[inline(always)]
    pub fn w_range(&self) -> (f64, f64) { self.w_range }

    /// Bounding box of the control net (contains the patch).
    #[inline(always)]
    pub fn bbox(&self) -> &BoundingBox<Point3> { &self.bbox }

    /// Recursion depth from the original knot-span patch.
    #[inline(always)]
    pub fn depth(&self) -> usize { self.depth }

    /// The four corner control points `(u0w0, u1w0, u1w1, u0w1)`.
    pub fn corners(&self) -> [Point3; 4] {
        let (n, m) = (self.net.degree_u(), self.net.degree_w());
        [
            self.net.control_point(0, 0),
            self.net.control_point(n, 0),
            self.net.control_point(n, m),
            self.net.control_point(0, m),
        ]
    }

    /// The corner quadrilateral as two triangles.
    pub fn corner_triangles(&self) -> [[Point3; 3]; 2] {
        let [p00, p10, p11, p01] = self.corners();
        [[p00, p10, p11], [p00, p11, p01]]
    }

    /// De Casteljau subdivision at the parametric midpoint into four children
    /// `(lo-lo, hi-lo, lo-hi, hi-hi)`.
    pub fn split(&self) -> [SurfPatch; 4] {
        let (ulo, uhi) = split_net_u(&self.net);
        let (net00, net01) = split_net_w(&ulo);
        let (net10, net11) = split_net_w(&uhi);
        let umid = 0.5 * (self.u_range.0 + self.u_range.1);
        let wmid = 0.5 * (self.w_range.0 + self.w_range.1);
        let d = self.depth + 1;
        [
            SurfPatch::new(net00, (self.u_range.0, umid), (self.w_range.0, wmid), d),
            SurfPatch::new(net10, (umid, self.u_range.1), (self.w_range.0, wmid), d),
            SurfPatch::new(net01, (self.u_range.0, umid), (wmid, self.w_range.1), d),
            SurfPatch::new(net11, (umid, self.u_range.1), (wmid, self.w_range.1), d),
        ]
    }

    /// Whether the patch is planar within `tol` relative to its bbox
    /// diagonal. The verdict is computed once and cached.
    pub fn test_planar_rel(&self, rel_tol: f64) -> bool {
        if let Some(flag) = self.planar.get() {
            return flag;
        }
        let diag = self.bbox.diagonal();
        let flag = self.planar_deviation() <= rel_tol * diag;
        self.planar.set(Some(flag));
        flag
    }

    /// Whether the patch is planar within the dimensional tolerance `tol`.
    pub fn test_planar(&self, tol: f64) -> bool {
        let diag = self.bbox.diagonal();
        match diag < 1.0e-30 {
            true => true,
            false => self.test_planar_rel(tol / diag),
        }
    }

    /// Largest control-point deviation from the bilinear corner interpolant.
    fn planar_deviation(&self) -> f64 {
        let [p00, p10, p11, p01] = self.corners();
        let (n, m) = (self.net.degree_u(), self.net.degree_w());
        let mut max_d = 0.0;
        for i in 0..=n {
            let s = i as f64 / n as f64;
            for j in 0..=m {
                let t = j as f64 / m as f64;
                let lin = p00.to_vec() * ((1.0 - s) * (1.0 - t))
                    + p10.to_vec() * (s * (1.0 - t))
                    + p01.to_vec() * ((1.0 - s) * t)
                    + p11.to_vec() * (s * t);
                let d = (self.net.control_point(i, j).to_vec() - lin).magnitude();
                max_d = f64::max(max_d, d);
            }
        }
        max_d
    }

    /// Closest `(u, w)` on an approximately planar patch, by projecting onto
    /// the corner plane and clamping.
    pub fn closest_uw_planar_approx(&self, pnt: Point3) -> (f64, f64) {
        let [p00, p10, _, p01] = self.corners();
        let u_vec = p10 - p00;
        let w_vec = p01 - p00;
        let r = pnt - p00;
        // least squares on the two (possibly non-orthogonal) axes
        let a = u_vec.dot(u_vec);
        let b = u_vec.dot(w_vec);
        let c = w_vec.dot(w_vec);
        let det = a * c - b * b;
        let (s, t) = match det.abs() < 1.0e-30 {
            true => (0.0, 0.0),
            false => (
                (r.dot(u_vec) * c - r.dot(w_vec) * b) / det,
                (r.dot(w_vec) * a - r.dot(u_vec) * b) / det,
            ),
        };
        let s = f64::clamp(s, 0.0, 1.0);
        let t = f64::clamp(t, 0.0, 1.0);
        (
            self.u_range.0 + s * (self.u_range.1 - self.u_range.0),
            self.w_range.0 + t * (self.w_range.1 - self.w_range.0),
        )
    }

    /// Closest `(u, w)` on the exact patch, Newton-refined from a guess in
    /// parent-surface coordinates.
    pub fn closest_uw(&self, pnt: Point3, guess: (f64, f64)) -> (f64, f64) {
        let local = BezierSurface::new(vec![vec![self.net.clone()]]).unwrap();
        let gu = normalized(guess.0, self.u_range);
        let gw = normalized(guess.1, self.w_range);
        let (u, w) = local.closest_point(pnt, Some((gu, gw)));
        (
            self.u_range.0 + u * (self.u_range.1 - self.u_range.0),
            self.w_range.0 + w * (self.w_range.1 - self.w_range.0),
        )
    }

    /// Accumulates ray parameters where the segment `p0→p1` crosses the
    /// patch, splitting until planar at the fixed 1e-5 tolerance. Duplicate
    /// parameters within 1e-6 are dropped.
    pub fn intersect_line_seg(
        &self,
        p0: Point3,
        p1: Point3,
        line_box: &BoundingBox<Point3>,
        t_vals: &mut Vec<f64>,
    ) {
        if !line_box.intersects(&self.bbox) {
            return;
        }
        if self.test_planar(1.0e-5) {
            let dir = p1 - p0;
            let len2 = dir.magnitude2();
            if len2 < 1.0e-30 {
                return;
            }
            for tri in self.corner_triangles() {
                if let Some(h) = seg_tri_intersect([p0, p1], tri) {
                    let t = (h - p0).dot(dir) / len2;
                    if !t_vals.iter().any(|v| (v - t).abs() < 1.0e-6) {
                        t_vals.push(t);
                    }
                }
            }
            return;
        }
        for child in self.split() {
            child.intersect_line_seg(p0, p1, line_box, t_vals);
        }
    }
}

fn normalized(v: f64, range: (f64, f64)) -> f64 {
    match (range.1 - range.0).abs() < 1.0e-30 {
        true => 0.0,
        false => f64::clamp((v - range.0) / (range.1 - range.0), 0.0, 1.0),
    }
}

fn split_net_u(net: &PatchNet) -> (PatchNet, PatchNet) {
    let (n, m) = (net.degree_u(), net.degree_w());
    let mut lo = vec![Vec::new(); n + 1];
    let mut hi = vec![Vec::new(); n + 1];
    for j in 0..=m {
        let col: Vec<Point3> = (0..=n).map(|i| net.control_point(i, j)).collect();
        let (l, h) = split_span(&col, 0.5);
        for i in 0..=n {
            lo[i].push(l[i]);
            hi[i].push(h[i]);
        }
    }
    (
        PatchNet::new(n, m, lo.concat()).unwrap(),
        PatchNet::new(n, m, hi.concat()).unwrap(),
    )
}

fn split_net_w(net: &PatchNet) -> (PatchNet, PatchNet) {
    let (n, m) = (net.degree_u(), net.degree_w());
    let mut lo = Vec::with_capacity((n + 1) * (m + 1));
    let mut hi = Vec::with_capacity((n + 1) * (m + 1));
    for i in 0..=n {
        let row: Vec<Point3> = (0..=m).map(|j| net.control_point(i, j)).collect();
        let (l, h) = split_span(&row, 0.5);
        lo.extend(l);
        hi.extend(h);
    }
    (
        PatchNet::new(n, m, lo).unwrap(),
        PatchNet::new(n, m, hi).unwrap(),
    )
}

/// Builds the flat patch vector of a surface, one entry per knot span.
pub fn build_patches(surf: &BezierSurface) -> Vec<SurfPatch> {
    let mut patches = Vec::new();
    for (iu, row) in surf.patches().iter().enumerate() {
        for (iw, net) in row.iter().enumerate() {
            patches.push(SurfPatch::new(
                net.clone(),
                (iu as f64, iu as f64 + 1.0),
                (iw as f64, iw as f64 + 1.0),
                0,
            ));
        }
    }
    patches
}

#[cfg(test)]
mod tests {
    use super::*;
    use aeromesh_base::assert_near;

    fn bent_patch() -> SurfPatch {
        let net = PatchNet::new(
            2,
            1,
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.5, 0.0, 0.5),
                Point3::new(0.5, 1.0, 0.5),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
            ],
        )
        .unwrap();
        SurfPatch::new(net, (0.0, 1.0), (0.0, 1.0), 0)
    }

    #[test]
    fn bbox_contains_all_control_points() {
        let patch = bent_patch();
        for p in patch.net().control_points() {
            assert!(patch.bbox().intersects(&[*p].into_iter().collect()));
        }
    }

    #[test]
    fn children_partition_parameter_rectangle() {
        let patch = bent_patch();
        let kids = patch.split();
        assert_eq!(kids[0].u_range(), (0.0, 0.5));
        assert_eq!(kids[1].u_range(), (0.5, 1.0));
        assert_eq!(kids[2].w_range(), (0.5, 1.0));
        assert_eq!(kids[3].u_range(), (0.5, 1.0));
        assert_eq!(kids[3].w_range(), (0.5, 1.0));
        for k in &kids {
            assert_eq!(k.depth(), 1);
        }
        // corner continuity: child 0's far corner is the surface midpoint
        let mid = kids[0].corners()[2];
        assert_near!(mid, kids[3].corners()[0]);
    }

    #[test]
    fn planarity_flat_vs_bent() {
        let flat = SurfPatch::new(
            PatchNet::new(
                1,
                1,
                vec![
                    Point3::new(0.0, 0.0, 0.0),
                    Point3::new(0.0, 1.0, 0.0),
                    Point3::new(1.0, 0.0, 0.0),
                    Point3::new(1.0, 1.0, 0.0),
                ],
            )
            .unwrap(),
            (0.0, 1.0),
            (0.0, 1.0),
            0,
        );
        assert!(flat.test_planar_rel(1.0e-5));
        assert!(!bent_patch().test_planar_rel(1.0e-5));
    }

    #[test]
    fn line_seg_hits_bent_patch() {
        let patch = bent_patch();
        let p0 = Point3::new(0.5, 0.5, -1.0);
        let p1 = Point3::new(0.5, 0.5, 1.0);
        let line_box = [p0, p1].into_iter().collect();
        let mut t_vals = Vec::new();
        patch.intersect_line_seg(p0, p1, &line_box, &mut t_vals);
        assert_eq!(t_vals.len(), 1);
        // crossing near the bump apex z = 0.25 -> t = 0.625
        assert!((t_vals[0] - 0.625).abs() < 0.01);
    }
}
