use crate::settings::GridDensity;
use crate::*;
use aeromesh_geometry::BezierSurface;

/// One discrete density sample.
#[derive(Clone, Copy, Debug)]
pub struct MapSource {
    /// 3D location of the sample
    pub pt: Point3,
    /// target edge length carried by the sample
    pub strength: f64,
    /// lowered by a stronger neighbor during limiting
    pub dominated: bool,
    /// last limiting pass that walked this cell
    pub max_visited: i64,
    /// surface that owns the sample
    pub surf_id: usize,
}

impl MapSource {
    /// A fresh sample.
    pub fn new(pt: Point3, strength: f64, surf_id: usize) -> Self {
        MapSource {
            pt,
            strength,
            dominated: false,
            max_visited: -1,
            surf_id,
        }
    }
}

/// The per-surface target-length grid over the (u, w) rectangle:
/// `(npatch_u·(k−1)+1) × (npatch_w·(k−1)+1)` samples with `k` the map
/// refinement (11 interior, 101 symmetry plane).
#[derive(Clone, Debug, Default)]
pub struct TargetMap {
    nu: usize,
    nw: usize,
    num_map: usize,
    npatch_u: usize,
    npatch_w: usize,
    cells: Vec<MapSource>,
}

const WALK_OFFSETS: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

impl TargetMap {
    /// Builds the grid by sampling curvature, sources, and the base length.
    pub fn build(
        geom: &BezierSurface,
        grid: &GridDensity,
        num_map: usize,
        far_or_sym: bool,
        surf_id: usize,
    ) -> Self {
        let npatch_u = geom.num_u_patches();
        let npatch_w = geom.num_w_patches();
        let nu = npatch_u * (num_map - 1) + 1;
        let nw = npatch_w * (num_map - 1) + 1;
        let du = geom.max_u();
        let dw = geom.max_w();

        let gap = grid.max_gap(far_or_sym);
        let rad_frac = grid.rad_frac(far_or_sym);

        let mut cells = Vec::with_capacity(nu * nw);
        for i in 0..nu {
            let u = du * i as f64 / (nu - 1) as f64;
            for j in 0..nw {
                let w = dw * j as f64 / (nw - 1) as f64;
                let mut len = curvature_len(geom, u, w, gap, rad_frac);
                len = f64::max(len, grid.min_len);
                let p = geom.point(u, w);
                len = f64::min(len, grid.target_len(p, far_or_sym));
                len = f64::min(len, grid.base_len(far_or_sym));
                cells.push(MapSource::new(p, len, surf_id));
            }
        }
        TargetMap {
            nu,
            nw,
            num_map,
            npatch_u,
            npatch_w,
            cells,
        }
    }

    /// Grid width in u.
    pub fn nu(&self) -> usize { self.nu }

    /// Grid width in w.
    pub fn nw(&self) -> usize { self.nw }

    /// All samples, row-major in u.
    pub fn cells(&self) -> &[MapSource] { &self.cells }

    #[inline(always)]
    fn at(&self, i: usize, j: usize) -> &MapSource { &self.cells[i * self.nw + j] }

    #[inline(always)]
    fn at_mut(&mut self, i: usize, j: usize) -> &mut MapSource { &mut self.cells[i * self.nw + j] }

    fn uw_to_ij(&self, u: f64, w: f64, du: f64, dw: f64) -> (usize, usize, f64, f64) {
        let imax = self.nu - 1;
        let di = u * (self.num_map - 1) as f64 * self.npatch_u as f64 / du;
        let mut i = di as usize;
        let mut fraci = di - i as f64;
        if i >= imax {
            i = imax - 1;
            fraci = 1.0;
        }
        let jmax = self.nw - 1;
        let dj = w * (self.num_map - 1) as f64 * self.npatch_w as f64 / dw;
        let mut j = dj as usize;
        let mut fracj = dj - j as f64;
        if j >= jmax {
            j = jmax - 1;
            fracj = 1.0;
        }
        (i, j, fraci, fracj)
    }

    /// Bilinearly interpolated target length at `(u, w)`.
    pub fn interp(&self, geom: &BezierSurface, u: f64, w: f64) -> f64 {
        if self.cells.is_empty() {
            return f64::MAX;
        }
        let u = f64::clamp(u, 0.0, geom.max_u());
        let w = f64::clamp(w, 0.0, geom.max_w());
        let (i, j, fraci, fracj) = self.uw_to_ij(u, w, geom.max_u(), geom.max_w());
        let ti = self.at(i, j).strength
            + fracj * (self.at(i, j + 1).strength - self.at(i, j).strength);
        let tip1 = self.at(i + 1, j).strength
            + fracj * (self.at(i + 1, j + 1).strength - self.at(i + 1, j).strength);
        ti + fraci * (tip1 - ti)
    }

    /// Lowers every cell reachable from `(istart, jstart)` to the grow-ratio
    /// bound, unconditionally re-walking improved cells.
    pub fn walk(&mut self, istart: usize, jstart: usize, grm1: f64) {
        self.walk_impl(istart, jstart, grm1, None)
    }

    /// Pass-limited walk: a cell is entered at most once per `pass`.
    pub fn walk_pass(&mut self, istart: usize, jstart: usize, grm1: f64, pass: i64) {
        self.walk_impl(istart, jstart, grm1, Some(pass))
    }

    fn walk_impl(&mut self, istart: usize, jstart: usize, grm1: f64, pass: Option<i64>) {
        let push_neighbors =
            |stack: &mut Vec<(usize, usize)>, nu: usize, nw: usize, ic: usize, jc: usize| {
                for (di, dj) in WALK_OFFSETS {
                    let inext = ic as i64 + di;
                    let jnext = jc as i64 + dj;
                    if inext >= 0 && (inext as usize) < nu && jnext >= 0 && (jnext as usize) < nw {
                        stack.push((inext as usize, jnext as usize));
                    }
                }
            };
        let mut stack: Vec<(usize, usize)> = Vec::new();
        push_neighbors(&mut stack, self.nu, self.nw, istart, jstart);
        let src = *self.at(istart, jstart);

        while let Some((ic, jc)) = stack.pop() {
            if let Some(pass) = pass {
                if self.at(ic, jc).max_visited >= pass {
                    continue;
                }
                self.at_mut(ic, jc).max_visited = pass;
            }
            let target = src.strength + self.at(ic, jc).pt.distance(src.pt) * grm1;
            if self.at(ic, jc).strength > target {
                let cell = self.at_mut(ic, jc);
                if pass.is_some() {
                    cell.dominated = true;
                }
                cell.strength = target;
                push_neighbors(&mut stack, self.nu, self.nw, ic, jc);
            }
        }
    }

    /// Source-ordered relaxation: cells ascending by strength each walk their
    /// 4-connected neighborhood once per pass.
    pub fn limit(&mut self, grow_ratio: f64) {
        let grm1 = grow_ratio - 1.0;
        for cell in &mut self.cells {
            cell.max_visited = -1;
        }
        let mut index: Vec<(f64, usize, usize)> = (0..self.nu)
            .flat_map(|i| (0..self.nw).map(move |j| (i, j)))
            .map(|(i, j)| (self.at(i, j).strength, i, j))
            .collect();
        index.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        for (pass, (_, i, j)) in index.into_iter().enumerate() {
            if !self.at(i, j).dominated {
                self.walk_pass(i, j, grm1, pass as i64);
            }
        }
    }

    /// Cross-surface rigorous limiting: every cell queries the foreign-source
    /// cloud within the radius that could still affect it and tightens.
    pub fn limit_by_cloud(&mut self, cloud: &SourceCloud, min_map: f64, grow_ratio: f64) {
        let grm1 = grow_ratio - 1.0;
        let tmin = f64::min(min_map, cloud.min_strength());
        for i in 0..self.nu {
            for j in 0..self.nw {
                let t_orig = self.at(i, j).strength;
                let rmax = (t_orig - tmin) / grm1;
                if rmax <= 0.0 {
                    continue;
                }
                let pt = self.at(i, j).pt;
                let mut t = t_orig;
                cloud.for_each_in_radius(pt, rmax, |src_pt, strength| {
                    let ts = strength + grm1 * pt.distance(src_pt);
                    t = f64::min(t, ts);
                });
                if t < t_orig {
                    self.at_mut(i, j).strength = t;
                    self.walk(i, j, grm1);
                }
            }
        }
    }

    /// Propagates a new strength `t` at `(u, w)` into the four surrounding
    /// grid corners, walking outward from each improved corner.
    pub fn apply_es(&mut self, geom: &BezierSurface, uw: Point2, t: f64, grow_ratio: f64) {
        let grm1 = grow_ratio - 1.0;
        let u = f64::clamp(uw.x, 0.0, geom.max_u());
        let w = f64::clamp(uw.y, 0.0, geom.max_w());
        let (ibase, jbase, _, _) = self.uw_to_ij(u, w, geom.max_u(), geom.max_w());
        let p = geom.point(u, w);
        for (di, dj) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            let it = ibase + di;
            let jt = jbase + dj;
            if it < self.nu && jt < self.nw {
                let r = self.at(it, jt).pt.distance(p);
                let target = t + r * grm1;
                if self.at(it, jt).strength > target {
                    self.at_mut(it, jt).strength = target;
                    self.walk(it, jt, grm1);
                }
            }
        }
    }

    /// Smallest strength in the map.
    pub fn min_strength(&self) -> f64 {
        self.cells
            .iter()
            .map(|c| c.strength)
            .fold(f64::INFINITY, f64::min)
    }
}

/// Curvature-bound target length at one sample: chordal-gap bound
/// `2·sqrt(2·r·gap − gap²)` plus the radius-fraction bound `r·rad_frac`.
/// Zero-curvature points probe a small interior offset.
fn curvature_len(geom: &BezierSurface, u: f64, w: f64, gap: f64, rad_frac: f64) -> f64 {
    let tol = 1.0e-6;
    let mut k1 = geom.curvature(u, w).k1;
    if k1.abs() < tol {
        let du = match u <= tol {
            true => tol,
            false => -tol,
        };
        let dw = match w <= tol {
            true => tol,
            false => -tol,
        };
        k1 = geom.curvature(u + du, w + dw).k1;
    }
    if k1.abs() <= tol {
        return f64::MAX;
    }
    let r = 1.0 / k1.abs();
    let glen = match r > gap {
        true => 2.0 * f64::sqrt(2.0 * r * gap - gap * gap),
        false => 2.0 * gap,
    };
    let nlen = r * rad_frac;
    f64::min(glen, nlen)
}

/// Uniform-grid point cloud of foreign map sources for radius queries.
#[derive(Debug)]
pub struct SourceCloud {
    cell: f64,
    min_strength: f64,
    bins: rustc_hash::FxHashMap<[i64; 3], Vec<(Point3, f64)>>,
}

impl SourceCloud {
    /// Builds the cloud with a cell size suited to the sample spacing.
    pub fn build(sources: impl Iterator<Item = (Point3, f64)>, cell: f64) -> Self {
        let cell = f64::max(cell, 1.0e-6);
        let mut bins: rustc_hash::FxHashMap<[i64; 3], Vec<(Point3, f64)>> = Default::default();
        let mut min_strength = f64::INFINITY;
        for (pt, s) in sources {
            min_strength = f64::min(min_strength, s);
            bins.entry(Self::key(pt, cell)).or_default().push((pt, s));
        }
        SourceCloud {
            cell,
            min_strength,
            bins,
        }
    }

    fn key(pt: Point3, cell: f64) -> [i64; 3] {
        [
            f64::floor(pt.x / cell) as i64,
            f64::floor(pt.y / cell) as i64,
            f64::floor(pt.z / cell) as i64,
        ]
    }

    /// Smallest strength in the cloud (`inf` when empty).
    pub fn min_strength(&self) -> f64 { self.min_strength }

    /// Visits every sample within `radius` of `pt`.
    pub fn for_each_in_radius(&self, pt: Point3, radius: f64, mut visit: impl FnMut(Point3, f64)) {
        let r2 = radius * radius;
        let lo = Self::key(pt + Vector3::new(-radius, -radius, -radius), self.cell);
        let hi = Self::key(pt + Vector3::new(radius, radius, radius), self.cell);
        for kx in lo[0]..=hi[0] {
            for ky in lo[1]..=hi[1] {
                for kz in lo[2]..=hi[2] {
                    if let Some(list) = self.bins.get(&[kx, ky, kz]) {
                        for (p, s) in list {
                            if pt.distance2(*p) <= r2 {
                                visit(*p, *s);
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aeromesh_geometry::surface::PatchNet;

    fn flat_plate() -> BezierSurface {
        BezierSurface::plane(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
            Point3::new(4.0, 4.0, 0.0),
        )
    }

    fn bumped() -> BezierSurface {
        let net = PatchNet::new(
            2,
            2,
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 2.0),
                Point3::new(1.0, 2.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(2.0, 1.0, 0.0),
                Point3::new(2.0, 2.0, 0.0),
            ],
        )
        .unwrap();
        BezierSurface::new(vec![vec![net]]).unwrap()
    }

    #[test]
    fn flat_surface_gets_base_length() {
        let geom = flat_plate();
        let grid = GridDensity {
            base_len: 0.5,
            min_len: 0.01,
            ..Default::default()
        };
        let map = TargetMap::build(&geom, &grid, 11, false, 0);
        for cell in map.cells() {
            assert!((cell.strength - 0.5).abs() < 1.0e-12);
        }
        assert!((map.interp(&geom, 0.37, 0.61) - 0.5).abs() < 1.0e-12);
    }

    #[test]
    fn curvature_tightens_target() {
        let geom = bumped();
        let grid = GridDensity {
            base_len: 10.0,
            min_len: 1.0e-4,
            ..Default::default()
        };
        let map = TargetMap::build(&geom, &grid, 11, false, 0);
        let center = map.interp(&geom, 0.5, 0.5);
        assert!(center < 10.0);
        assert!(center >= grid.min_len);
    }

    #[test]
    fn limit_enforces_growth_ratio() {
        let geom = flat_plate();
        let grid = GridDensity {
            base_len: 2.0,
            min_len: 1.0e-3,
            grow_ratio: 1.2,
            ..Default::default()
        };
        let mut map = TargetMap::build(&geom, &grid, 11, false, 0);
        // punch one tight spot into the field
        map.apply_es(&geom, Point2::new(2.0, 2.0), 0.05, grid.grow_ratio);
        map.limit(grid.grow_ratio);
        let grm1 = grid.grow_ratio - 1.0;
        let nw = map.nw();
        for i in 0..map.nu() {
            for j in 0..nw {
                let a = map.cells()[i * nw + j];
                if i + 1 < map.nu() {
                    let b = map.cells()[(i + 1) * nw + j];
                    let lim = grm1 * a.pt.distance(b.pt) + 1.0e-9;
                    assert!((a.strength - b.strength).abs() <= lim);
                }
                if j + 1 < nw {
                    let b = map.cells()[i * nw + j + 1];
                    let lim = grm1 * a.pt.distance(b.pt) + 1.0e-9;
                    assert!((a.strength - b.strength).abs() <= lim);
                }
            }
        }
    }

    #[test]
    fn cloud_limits_across_surfaces() {
        let geom = flat_plate();
        let grid = GridDensity {
            base_len: 2.0,
            min_len: 1.0e-3,
            grow_ratio: 1.2,
            ..Default::default()
        };
        let mut map = TargetMap::build(&geom, &grid, 11, false, 0);
        let cloud = SourceCloud::build(
            [(Point3::new(2.0, 2.0, 0.0), 0.05)].into_iter(),
            0.5,
        );
        map.limit_by_cloud(&cloud, map.min_strength(), grid.grow_ratio);
        let center = map.interp(&geom, 0.5, 0.5);
        assert!(center < 0.06 + 1.0e-6);
    }
}
