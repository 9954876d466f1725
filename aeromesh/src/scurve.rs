use crate::density::MapSource;
use crate::settings::GridDensity;
use crate::surf::Surf;
use crate::*;
use aeromesh_geometry::BezierCurve;

/// Uniform samples per knot span when tessellating a border curve.
const BORDER_PTS_PER_SEG: usize = 5;
/// Samples of the cheap tessellation used for coplanar-border projection.
const CHEAP_TESS_PTS: usize = 501;
/// Substeps of the arclength integrator between emitted vertices.
const TESS_SUBSTEPS: usize = 5;

/// One curve in a single surface's (u, w) rectangle with its tessellation
/// and the arclength/target table driving it. Border curves live in the
/// manager's arena; each chain owns two more (one per side).
#[derive(Clone, Debug, Default)]
pub struct SCurve {
    /// owning surface index
    pub surf: usize,
    /// the curve in (u, w, 0)
    pub uw_crv: BezierCurve,
    /// the pairing this curve belongs to, if matched
    pub icurve: Option<usize>,
    /// tessellation parameters in [0, 1]
    pub u_tess: Vec<f64>,
    /// tessellation points in (u, w, 0)
    pub uw_tess: Vec<Point3>,
    num_segs: usize,
    u_vec: Vec<f64>,
    dist_vec: Vec<f64>,
    target_vec: Vec<f64>,
    pnt_vec: Vec<Point3>,
}

impl SCurve {
    /// A curve on `surf`.
    pub fn new(surf: usize, uw_crv: BezierCurve) -> Self {
        SCurve {
            surf,
            uw_crv,
            ..Default::default()
        }
    }

    /// 3D point at curve parameter `u ∈ [0, 1]`.
    pub fn pnt_3d(&self, geom: &Surf, u: f64) -> Point3 {
        let uw = self.uw_crv.subs(u);
        geom.point(uw.x, uw.y)
    }

    /// Chord-length estimate over `num_segs` samples, measured in 3D.
    pub fn length(&self, geom: &Surf, num_segs: usize) -> f64 {
        use itertools::Itertools;
        (0..=num_segs)
            .map(|i| self.pnt_3d(geom, i as f64 / num_segs as f64))
            .tuple_windows()
            .map(|(a, b)| a.distance(b))
            .sum()
    }

    /// The curve's control points pushed to 3D through its surface.
    pub fn control_pnts_3d(&self, geom: &Surf) -> Vec<Point3> {
        self.uw_crv
            .control_points()
            .iter()
            .map(|uw| geom.point(uw.x, uw.y))
            .collect()
    }

    /// Reverses the direction of the curve (tessellations are rebuilt later).
    pub fn flip_dir(&mut self) { self.uw_crv.flip(); }

    /// Uniform tessellation of a border running along knot spans:
    /// 5 points per integer span of the running parameter.
    pub fn border_tesselate(&mut self) {
        self.u_tess.clear();
        self.uw_tess.clear();

        let uw_start = self.uw_crv.first_pnt();
        let uw_end = self.uw_crv.last_pnt();
        let du = uw_end.x - uw_start.x;
        let dw = uw_end.y - uw_start.y;
        let span = f64::max(du.abs(), dw.abs());

        let npt = (span as usize).max(1) * (BORDER_PTS_PER_SEG - 1) + 1;
        for i in 0..npt {
            let frac = i as f64 / (npt - 1) as f64;
            self.uw_tess.push(Point3::new(
                uw_start.x + frac * du,
                uw_start.y + frac * dw,
                0.0,
            ));
            self.u_tess.push(frac);
        }
    }

    /// Dense uniform tessellation for projection onto a coplanar partner.
    pub fn cheap_tesselate(&mut self) {
        self.u_tess = (0..CHEAP_TESS_PTS)
            .map(|i| i as f64 / (CHEAP_TESS_PTS - 1) as f64)
            .collect();
        self.uw_tess = self.u_tess.iter().map(|u| self.uw_crv.subs(*u)).collect();
    }

    /// Replaces this curve's tessellation with the projection of `other`'s
    /// tessellation onto this curve's surface.
    pub fn project_tess_to_surf(&mut self, other: &SCurve, surfs: &[Surf]) {
        let geom_a = &surfs[self.surf];
        let geom_b = &surfs[other.surf];
        let mut guess = (geom_a.geom.mid_u(), geom_a.geom.mid_w());
        self.uw_tess = other
            .uw_tess
            .iter()
            .map(|uw| {
                let p = geom_b.point(uw.x, uw.y);
                let (u, w) = geom_a.closest_uw_guess(p, guess);
                guess = (u, w);
                Point3::new(u, w, 0.0)
            })
            .collect();
        self.u_tess = other.u_tess.clone();
    }

    /// Target length at a table sample: the smaller of the two adjoining
    /// surfaces' map values.
    fn target_at(&self, surfs: &[Surf], b_curve: Option<&SCurve>, uw: Point3, u: f64) -> f64 {
        let mut len = surfs[self.surf].interp_target_map(uw.x, uw.y);
        if let Some(b) = b_curve {
            let uw_b = b.uw_crv.subs(u);
            let len_b = surfs[b.surf].interp_target_map(uw_b.x, uw_b.y);
            len = f64::min(len, len_b);
        }
        len
    }

    /// Builds the arclength/target table, and exchanges limits with the
    /// split-point sources (only the two endpoint samples trade with each
    /// source; chains are short relative to source radii).
    pub fn build_dist_table(
        &mut self,
        surfs: &[Surf],
        grid: &GridDensity,
        b_curve: Option<&SCurve>,
        split_sources: &mut [MapSource],
    ) {
        self.cleanup_dist_table();

        let mut nref = 10;
        let nseglim = 10_000;
        let nsections = self.uw_crv.num_sections().max(1);
        let mut num_segs = nref * nsections + 1;
        if num_segs > nseglim {
            nref = (nseglim / nsections).max(1);
            num_segs = nref * nsections + 1;
        }
        self.num_segs = num_segs;

        let geom = &surfs[self.surf];
        let mut total = 0.0;
        let mut last_p = self.pnt_3d(geom, 0.0);
        for i in 0..num_segs {
            let u = i as f64 / (num_segs - 1) as f64;
            let uw = self.uw_crv.subs(u);
            let p = geom.point(uw.x, uw.y);
            let t = self.target_at(surfs, b_curve, uw, u);
            self.u_vec.push(u);
            self.target_vec.push(t);
            self.pnt_vec.push(p);
            total += last_p.distance(p);
            self.dist_vec.push(total);
            last_p = p;
        }

        let grm1 = grid.grow_ratio - 1.0;
        let ends = [0, num_segs - 1];
        for src in split_sources.iter_mut() {
            for idx in ends {
                let r = src.pt.distance(self.pnt_vec[idx]);
                let target = src.strength + r * grm1;
                if target < self.target_vec[idx] {
                    self.target_vec[idx] = target;
                } else {
                    let reverse = self.target_vec[idx] + r * grm1;
                    if reverse < src.strength {
                        src.strength = reverse;
                    }
                }
            }
        }
    }

    /// Drops the arclength table.
    pub fn cleanup_dist_table(&mut self) {
        self.u_vec.clear();
        self.dist_vec.clear();
        self.target_vec.clear();
        self.pnt_vec.clear();
    }

    /// Walks the table forward then backward, capping target growth at the
    /// growth ratio per unit arclength.
    pub fn limit_target(&mut self, grid: &GridDensity) {
        let grm1 = grid.grow_ratio - 1.0;
        for i in 1..self.num_segs {
            let dt = self.target_vec[i] - self.target_vec[i - 1];
            let ds = self.dist_vec[i] - self.dist_vec[i - 1];
            let dtlim = grm1 * ds;
            if dt > dtlim {
                self.target_vec[i] = self.target_vec[i - 1] + dtlim;
            }
        }
        for i in (0..self.num_segs.saturating_sub(1)).rev() {
            let dt = self.target_vec[i] - self.target_vec[i + 1];
            let ds = self.dist_vec[i + 1] - self.dist_vec[i];
            let dtlim = grm1 * ds;
            if dt > dtlim {
                self.target_vec[i] = self.target_vec[i + 1] + dtlim;
            }
        }
    }

    /// Table build plus growth limiting.
    pub fn calc_density(
        &mut self,
        surfs: &[Surf],
        grid: &GridDensity,
        b_curve: Option<&SCurve>,
        split_sources: &mut [MapSource],
    ) {
        self.build_dist_table(surfs, grid, b_curve, split_sources);
        self.limit_target(grid);
    }

    /// Pushes every table sample back into both surfaces' target maps.
    pub fn spread_density(&self, b_curve: &SCurve, surfs: &mut [Surf], grow_ratio: f64) {
        for i in 0..self.num_segs {
            let u = self.u_vec[i];
            let t = self.target_vec[i];
            self.apply_es_surface(surfs, u, t, grow_ratio);
            b_curve.apply_es_surface(surfs, u, t, grow_ratio);
        }
    }

    /// Applies strength `t` at curve parameter `u` into the owning surface's
    /// map.
    pub fn apply_es_surface(&self, surfs: &mut [Surf], u: f64, t: f64, grow_ratio: f64) {
        let uw = self.uw_crv.subs(u);
        let surf = &mut surfs[self.surf];
        surf.target_map
            .apply_es(&surf.geom, Point2::new(uw.x, uw.y), t, grow_ratio);
    }

    fn interp_dist_table(&self, idouble: f64) -> (f64, f64, f64, f64) {
        let imax = self.target_vec.len() - 1;
        let mut ifloor = f64::floor(idouble) as i64;
        let mut iceil = f64::ceil(idouble) as i64;
        if iceil == ifloor {
            iceil += 1;
        }
        let mut ifrac = idouble - ifloor as f64;
        if iceil > imax as i64 {
            iceil = imax as i64;
            ifloor = imax as i64 - 1;
            ifrac = 1.0;
        }
        if ifloor < 0 {
            ifloor = 0;
            iceil = 1;
            ifrac = 0.0;
        }
        let (fl, ce) = (ifloor as usize, iceil as usize);
        let t = self.target_vec[fl] + ifrac * (self.target_vec[ce] - self.target_vec[fl]);
        let u = self.u_vec[fl] + ifrac * (self.u_vec[ce] - self.u_vec[fl]);
        let dsdi = self.dist_vec[ce] - self.dist_vec[fl];
        let s = self.dist_vec[fl] + ifrac * dsdi;
        (t, u, s, dsdi)
    }

    fn newton_find(
        &self,
        starget: f64,
        s: &mut f64,
        ireal: &mut f64,
        t: &mut f64,
        dsdi: &mut f64,
        u: &mut f64,
    ) -> bool {
        let sold = *s;
        let irorig = *ireal;
        let ds = (starget - sold).abs();
        let tol = 1.0e-3;
        let itermax = 10;
        let mut iter = 0;
        while (*s - starget).abs() / ds > tol && iter < itermax {
            let irold = *ireal;
            let mut di = -(*s - starget) / *dsdi;
            *ireal += di;
            let (tt, uu, ss, dd) = self.interp_dist_table(*ireal);
            *t = tt;
            *u = uu;
            *s = ss;
            *dsdi = dd;
            // one-segment fallback keeps a diverging step bounded
            if (*s - starget).abs() > (sold - starget).abs() {
                di = match di < 0.0 {
                    true => -1.0,
                    false => 1.0,
                };
                *ireal = irold + di;
                let (tt, uu, ss, dd) = self.interp_dist_table(*ireal);
                *t = tt;
                *u = uu;
                *s = ss;
                *dsdi = dd;
            }
            iter += 1;
        }
        if (*s - starget).abs() > tol {
            *ireal = irorig;
            let (tt, uu, ss, dd) = self.interp_dist_table(*ireal);
            *t = tt;
            *u = uu;
            *s = ss;
            *dsdi = dd;
            return false;
        }
        true
    }

    fn bisect_find(
        &self,
        starget: f64,
        s: &mut f64,
        ireal: &mut f64,
        t: &mut f64,
        dsdi: &mut f64,
        u: &mut f64,
        direction: i32,
    ) {
        let tol = 1.0e-3;
        let ds = (starget - *s).abs().max(1.0e-30);
        let (mut slower, mut ilower, mut supper, mut iupper);
        if direction < 0 {
            slower = 0.0;
            ilower = 0.0;
            supper = *s;
            iupper = *ireal;
        } else {
            slower = *s;
            ilower = *ireal;
            supper = *self.dist_vec.last().unwrap();
            iupper = (self.dist_vec.len() - 1) as f64;
        }
        let mut imid = (ilower + iupper) / 2.0;
        let mut guard = 0;
        while (supper - slower).abs() / ds > tol && guard < 200 {
            let (_, _, smid, _) = self.interp_dist_table(imid);
            if smid < starget {
                slower = smid;
                ilower = imid;
            } else {
                supper = smid;
                iupper = imid;
            }
            imid = (ilower + iupper) / 2.0;
            guard += 1;
        }
        *ireal = imid;
        let (tt, uu, ss, dd) = self.interp_dist_table(*ireal);
        *t = tt;
        *u = uu;
        *s = ss;
        *dsdi = dd;
    }

    /// Integrates along the table placing a vertex whenever accumulated
    /// arclength reaches the local target, in `direction` ±1.
    fn tess_integrate(&self, direction: i32) -> Vec<f64> {
        let mut utess = Vec::new();
        let dn = match direction < 0 {
            true => -1.0 / TESS_SUBSTEPS as f64,
            false => 1.0 / TESS_SUBSTEPS as f64,
        };
        let imax = (self.dist_vec.len() - 1) as f64;
        let smax = *self.dist_vec.last().unwrap();

        let mut ireal = match direction < 0 {
            true => imax,
            false => 0.0,
        };
        let (mut t, mut u, mut s, mut dsdi) = self.interp_dist_table(ireal);
        utess.push(u);

        let mut isub = 0;
        while (0.0..=imax).contains(&ireal) {
            let starget = s + t * dn;
            if !(0.0..=smax).contains(&starget) {
                break;
            }
            if !self.newton_find(starget, &mut s, &mut ireal, &mut t, &mut dsdi, &mut u) {
                self.bisect_find(
                    starget, &mut s, &mut ireal, &mut t, &mut dsdi, &mut u, direction,
                );
            }
            isub += 1;
            if isub >= TESS_SUBSTEPS {
                utess.push(u);
                isub = 0;
            }
        }

        if direction < 0 {
            if *utess.last().unwrap() > 0.0 {
                utess.push(0.0);
            }
        } else if *utess.last().unwrap() < 1.0 {
            utess.push(1.0);
        }
        utess
    }

    /// Reconciles the forward tessellation with the backward one by the
    /// asymmetric average, pinning the endpoints.
    fn smooth_tess(&mut self) {
        let mut rev = self.tess_integrate(-1);
        let nfwd = self.u_tess.len();
        let nrev = rev.len();
        let n;
        if nfwd > nrev {
            n = nrev;
            self.u_tess.pop();
            self.u_tess[n - 1] = 1.0;
        } else if nrev > nfwd {
            n = nfwd;
            rev.pop();
            rev[n - 1] = 0.0;
        } else {
            n = nfwd;
        }
        for i in 1..n.saturating_sub(1) {
            let u = self.u_tess[i];
            let ur = rev[n - i - 1];
            self.u_tess[i] = (2.0 * u - u * u + ur * ur) / 2.0;
        }
        self.u_tess[0] = 0.0;
        self.u_tess[n - 1] = 1.0;
    }

    fn uw_tess_from_u(&mut self) {
        self.uw_tess = self.u_tess.iter().map(|u| self.uw_crv.subs(*u)).collect();
    }

    /// Density-driven tessellation: forward integrate, smooth against the
    /// backward pass, then evaluate (u, w).
    pub fn tessellate(&mut self) {
        self.u_tess = self.tess_integrate(1);
        self.smooth_tess();
        self.uw_tess_from_u();
    }

    /// Adopts a partner's parameter tessellation and evaluates this curve's
    /// own (u, w) at those parameters.
    pub fn tessellate_with(&mut self, u_tess: &[f64]) {
        self.u_tess = u_tess.to_vec();
        self.uw_tess_from_u();
    }

    /// Two-point tessellation (endpoints only).
    pub fn tess_end_pts(&mut self) {
        self.u_tess = vec![0.0, 1.0];
        self.uw_tess_from_u();
    }
}

/// A pair of matched curves across a shared edge: `a` on one surface, `b` on
/// its neighbor (equal to `a` for borders of open solids).
#[derive(Clone, Copy, Debug, Default)]
pub struct ICurve {
    /// A-side curve id
    pub a: usize,
    /// B-side curve id, `None` for an unmatched open border
    pub b: Option<usize>,
    /// created by a coplanar border/surface intersection
    pub plane_border: bool,
}

/// Tries to pair two border curves: their 3D control polygons must match
/// forward or backward within tolerance. A backward match flips `ib`.
pub fn try_match_icurve(
    scurves: &mut [SCurve],
    surfs: &[Surf],
    ia: usize,
    ib: usize,
    icurve_id: usize,
) -> Option<ICurve> {
    let tol = 1.0e-5;
    let pnts_a = scurves[ia].control_pnts_3d(&surfs[scurves[ia].surf]);
    let pnts_b = scurves[ib].control_pnts_3d(&surfs[scurves[ib].surf]);
    if pnts_a.is_empty() || pnts_a.len() != pnts_b.len() {
        return None;
    }
    let n = pnts_a.len();
    let mut fmatch = true;
    let mut bmatch = true;
    for i in 0..n {
        if pnts_a[i].distance(pnts_b[i]) > tol {
            fmatch = false;
        }
        if pnts_a[i].distance(pnts_b[n - i - 1]) > tol {
            bmatch = false;
        }
        if !fmatch && !bmatch {
            return None;
        }
    }
    if !fmatch && bmatch {
        scurves[ib].flip_dir();
    }
    scurves[ia].icurve = Some(icurve_id);
    scurves[ib].icurve = Some(icurve_id);
    Some(ICurve {
        a: ia,
        b: Some(ib),
        plane_border: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aeromesh_geometry::BezierSurface;

    fn plate_surf() -> Surf {
        let mut surf = Surf::from_geom(
            BezierSurface::plane(
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
                Point3::new(2.0, 2.0, 0.0),
            ),
            0,
            0,
        );
        surf.build_target_map(&GridDensity {
            base_len: 0.25,
            min_len: 0.01,
            ..Default::default()
        });
        surf
    }

    fn diagonal_curve() -> SCurve {
        let crv = BezierCurve::interpolate(
            &[Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)],
            0.25,
        )
        .unwrap();
        SCurve::new(0, crv)
    }

    #[test]
    fn border_tesselate_spans() {
        let mut crv = SCurve::new(
            0,
            BezierCurve::linear(Point3::new(0.0, 0.0, 0.0), Point3::new(3.0, 0.0, 0.0)),
        );
        crv.border_tesselate();
        // 3 spans * 4 + 1 points
        assert_eq!(crv.uw_tess.len(), 13);
        assert!((crv.uw_tess[1].x - 0.25).abs() < 1.0e-12);
    }

    #[test]
    fn tessellation_spacing_matches_target() {
        let surfs = vec![plate_surf()];
        let grid = GridDensity {
            base_len: 0.25,
            min_len: 0.01,
            ..Default::default()
        };
        let mut crv = diagonal_curve();
        crv.calc_density(&surfs, &grid, None, &mut []);
        crv.tessellate();
        assert!(crv.u_tess.len() >= 2);
        assert!((crv.u_tess[0] - 0.0).abs() < 1.0e-12);
        assert!((crv.u_tess.last().unwrap() - 1.0).abs() < 1.0e-12);
        // diagonal of a 2x2 plate is ~2.83 long; 0.25 target -> about 12 cuts
        let n = crv.u_tess.len();
        assert!((8..=18).contains(&n), "unexpected vertex count {n}");
        // spacing in 3D stays below the target band; the forced final vertex
        // may land arbitrarily close to its neighbor
        let geom = &surfs[0];
        for pair in crv.u_tess.windows(2) {
            let d = crv.pnt_3d(geom, pair[0]).distance(crv.pnt_3d(geom, pair[1]));
            assert!(d < 0.25 * 1.8, "bad spacing {d}");
        }
    }

    #[test]
    fn shared_tessellation_is_congruent() {
        let surfs = vec![plate_surf()];
        let grid = GridDensity {
            base_len: 0.25,
            min_len: 0.01,
            ..Default::default()
        };
        let mut a = diagonal_curve();
        let mut b = diagonal_curve();
        a.calc_density(&surfs, &grid, Some(&b), &mut []);
        a.tessellate();
        b.tessellate_with(&a.u_tess);
        assert_eq!(a.u_tess.len(), b.u_tess.len());
        for (pa, pb) in a.uw_tess.iter().zip(b.uw_tess.iter()) {
            assert!(pa.distance(*pb) < 1.0e-6);
        }
    }

    #[test]
    fn icurve_matches_reversed_partner() {
        let surfs = vec![plate_surf(), plate_surf()];
        let fwd = BezierCurve::interpolate(
            &[Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)],
            0.25,
        )
        .unwrap();
        let mut bwd = fwd.clone();
        bwd.flip();
        let mut scurves = vec![SCurve::new(0, fwd), SCurve::new(1, bwd)];
        let icrv = try_match_icurve(&mut scurves, &surfs, 0, 1, 0).expect("no match");
        assert_eq!(icrv.a, 0);
        assert_eq!(icrv.b, Some(1));
        // the backward partner was flipped into forward agreement
        assert!(scurves[0]
            .uw_crv
            .match_forward(&scurves[1].uw_crv, 1.0e-9));
    }
}
