use crate::density::TargetMap;
use crate::settings::{CfdType, GridDensity, SurfKind, XferSurf};
use crate::*;
use aeromesh_geometry::collision::ray_tri_intersect;
use aeromesh_geometry::patch::{build_patches, SurfPatch};
use aeromesh_geometry::{BezierCurve, BezierSurface};
use aeromesh_mesh::{MeshSurface, TriMesh, WorkMesh};

/// Number of samples per patch of the interior target map.
const NUM_MAP: usize = 11;
/// Refined map used on the symmetry plane.
const NUM_MAP_SYM: usize = 101;
/// Samples per axis of the parameter-distance scale maps.
const DIST_MAP_SAMPLES: usize = 101;

/// One trimmed bezier surface of the configuration, with everything the
/// pipeline accumulates for it: identity and flags, the patch tree, the
/// target-length map, its border curves, and the evolving mesh.
#[derive(Debug)]
pub struct Surf {
    /// the evaluator
    pub geom: BezierSurface,
    /// component id (group id under merging)
    pub comp_id: usize,
    /// component id before open components merged
    pub unmerged_comp_id: usize,
    /// index in the manager's surface vector
    pub surf_id: usize,
    /// owning geometry id
    pub geom_id: String,
    /// display name
    pub name: String,
    /// split index within the geometry
    pub split_num: usize,
    /// tag applied to every triangle of this surface
    pub base_tag: u32,
    /// surface kind
    pub kind: SurfKind,
    /// CFD participation type
    pub cfd_type: CfdType,
    /// output winding is reversed
    pub flip_flag: bool,
    /// surface is a generated wake sheet
    pub wake_flag: bool,
    /// surf id of the wing this wake trails, when a wake
    pub wake_parent_surf_id: Option<usize>,
    /// surface lies in the y = 0 symmetry plane
    pub sym_plane_flag: bool,
    /// surface belongs to the far-field boundary
    pub far_flag: bool,
    /// bounding box of the control net
    pub bbox: BoundingBox<Point3>,
    /// one patch per knot span
    pub patches: Vec<SurfPatch>,
    /// border curve ids in the manager's curve arena
    pub scurves: Vec<usize>,
    /// the density field
    pub target_map: TargetMap,
    /// density snapshot for remeshing
    pub min_len: f64,
    /// density snapshot for remeshing
    pub grow_ratio: f64,
    /// the evolving editable mesh
    pub mesh: WorkMesh,
    /// the frozen packed mesh
    pub simp: TriMesh,
    pub(crate) u_scale_map: Vec<f64>,
    pub(crate) w_scale_map: Vec<f64>,
    pub(crate) scale_u_flag: bool,
}

impl Default for Surf {
    fn default() -> Self {
        Surf {
            geom: BezierSurface::plane(
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
            ),
            comp_id: 0,
            unmerged_comp_id: 0,
            surf_id: 0,
            geom_id: String::new(),
            name: String::new(),
            split_num: 0,
            base_tag: 0,
            kind: SurfKind::Normal,
            cfd_type: CfdType::Normal,
            flip_flag: false,
            wake_flag: false,
            wake_parent_surf_id: None,
            sym_plane_flag: false,
            far_flag: false,
            bbox: BoundingBox::new(),
            patches: Vec::new(),
            scurves: Vec::new(),
            target_map: TargetMap::default(),
            min_len: 1.0e-4,
            grow_ratio: 1.3,
            mesh: WorkMesh::new(),
            simp: TriMesh::default(),
            u_scale_map: Vec::new(),
            w_scale_map: Vec::new(),
            scale_u_flag: false,
        }
    }
}

impl Surf {
    /// Wraps a transferred surface record.
    pub fn from_xfer(xfer: XferSurf, surf_id: usize) -> Self {
        let mut flip = xfer.flip_normal;
        // negative volumes carve, so their skins face inward
        if xfer.cfd_type == CfdType::Negative {
            flip = !flip;
        }
        let mut surf = Surf {
            geom: xfer.surface,
            comp_id: xfer.comp_index,
            unmerged_comp_id: xfer.comp_index,
            surf_id,
            geom_id: xfer.geom_id,
            name: xfer.name,
            split_num: xfer.split_num,
            kind: xfer.kind,
            cfd_type: xfer.cfd_type,
            flip_flag: flip,
            ..Default::default()
        };
        surf.build_patches();
        surf
    }

    /// Wraps a raw surface (domain planes, wakes).
    pub fn from_geom(geom: BezierSurface, surf_id: usize, comp_id: usize) -> Self {
        let mut surf = Surf {
            geom,
            comp_id,
            unmerged_comp_id: comp_id,
            surf_id,
            ..Default::default()
        };
        surf.build_patches();
        surf
    }

    /// Map refinement: finer on the symmetry plane.
    pub fn num_map(&self) -> usize {
        match self.sym_plane_flag {
            true => NUM_MAP_SYM,
            false => NUM_MAP,
        }
    }

    /// Whether curvature/source limits use the far-field variants.
    pub fn limit_flag(&self) -> bool { self.far_flag || self.sym_plane_flag }

    /// Rebuilds the patch vector and bounding box from the geometry.
    pub fn build_patches(&mut self) {
        self.patches = build_patches(&self.geom);
        self.bbox = self.geom.bbox();
    }

    /// Point on the surface.
    #[inline(always)]
    pub fn point(&self, u: f64, w: f64) -> Point3 { self.geom.point(u, w) }

    /// Surface normal (before the flip flag).
    #[inline(always)]
    pub fn normal(&self, u: f64, w: f64) -> Vector3 { self.geom.normal(u, w) }

    /// Closest `(u, w)` with a seed.
    pub fn closest_uw_guess(&self, pnt: Point3, guess: (f64, f64)) -> (f64, f64) {
        self.geom.closest_point(pnt, Some(guess))
    }

    /// Closest `(u, w)` without a seed.
    pub fn closest_uw(&self, pnt: Point3) -> (f64, f64) { self.geom.closest_point(pnt, None) }

    /// Clamps a parameter pair into the valid rectangle; parameters more than
    /// `slop` outside report invalid.
    pub fn valid_uw(&self, uw: Point2, slop: f64) -> bool {
        uw.x > -slop
            && uw.y > -slop
            && uw.x < self.geom.max_u() + slop
            && uw.y < self.geom.max_w() + slop
    }

    /// Builds the target map from curvature, sources, and base lengths.
    pub fn build_target_map(&mut self, grid: &GridDensity) {
        self.target_map = TargetMap::build(
            &self.geom,
            grid,
            self.num_map(),
            self.limit_flag(),
            self.surf_id,
        );
        self.min_len = grid.min_len;
        self.grow_ratio = grid.grow_ratio;
    }

    /// Interpolated target length.
    pub fn interp_target_map(&self, u: f64, w: f64) -> f64 {
        self.target_map.interp(&self.geom, u, w)
    }

    /// Whether a 3D border of this surface matches a border of `other`
    /// forward or backward; used to merge components that share an edge.
    pub fn border_match(&self, other: &Surf) -> bool {
        let tol = 1.0e-5;
        let mine: Vec<BezierCurve> = borders(&self.geom);
        let theirs: Vec<BezierCurve> = borders(&other.geom);
        mine.iter().any(|a| {
            theirs
                .iter()
                .any(|b| a.match_forward(b, tol) || a.match_backward(b, tol))
        })
    }

    /// Accumulates ray parameters where the segment `p0→p1` crosses the
    /// surface patches.
    pub fn intersect_line_seg(&self, p0: Point3, p1: Point3, t_vals: &mut Vec<f64>) {
        let line_box: BoundingBox<Point3> = [p0, p1].into_iter().collect();
        if !line_box.intersects(&self.bbox) {
            return;
        }
        for patch in &self.patches {
            patch.intersect_line_seg(p0, p1, &line_box, t_vals);
        }
    }

    /// Same crossing count against the current work-mesh triangles.
    pub fn intersect_line_seg_mesh(&self, p0: Point3, p1: Point3, t_vals: &mut Vec<f64>) {
        let line_box: BoundingBox<Point3> = [p0, p1].into_iter().collect();
        if !line_box.intersects(&self.bbox) {
            return;
        }
        let dir = p1 - p0;
        for f in self.mesh.face_ids() {
            let [a, b, c] = self.mesh.face(f).nodes;
            let tri = [
                self.mesh.node(a).pnt,
                self.mesh.node(b).pnt,
                self.mesh.node(c).pnt,
            ];
            if let Some(t) = ray_tri_intersect(p0, dir, tri) {
                if t > 0.0 && !t_vals.iter().any(|v| (v - t).abs() < 1.0e-7) {
                    t_vals.push(t);
                }
            }
        }
    }

    /// Builds the parameter-distance scale maps that equalize 3D edge length
    /// in the scaled (u, w) space handed to the triangulator.
    pub fn build_dist_map(&mut self) {
        let nump = DIST_MAP_SAMPLES;
        let du = self.geom.max_u();
        let dw = self.geom.max_w();

        let mut pvec = vec![vec![Point3::new(0.0, 0.0, 0.0); nump]; nump];
        for (i, row) in pvec.iter_mut().enumerate() {
            let u = du * i as f64 / (nump - 1) as f64;
            for (j, p) in row.iter_mut().enumerate() {
                let w = dw * j as f64 / (nump - 1) as f64;
                *p = self.geom.point(u, w);
            }
        }

        // arclength across u for each constant-w line, and vice versa
        let mut u_dist = vec![0.0; nump];
        let mut max_u_dist = 0.0;
        for (j, dist) in u_dist.iter_mut().enumerate() {
            let mut sum = 0.0;
            for i in 1..nump {
                sum += pvec[i - 1][j].distance(pvec[i][j]);
            }
            *dist = sum;
            max_u_dist = f64::max(max_u_dist, sum);
        }
        max_u_dist = f64::max(max_u_dist, 1.0e-9);

        let mut w_dist = vec![0.0; nump];
        let mut max_w_dist = 0.0;
        for (i, dist) in w_dist.iter_mut().enumerate() {
            let mut sum = 0.0;
            for j in 1..nump {
                sum += pvec[i][j - 1].distance(pvec[i][j]);
            }
            *dist = sum;
            max_w_dist = f64::max(max_w_dist, sum);
        }
        max_w_dist = f64::max(max_w_dist, 1.0e-9);

        let wu_ratio = dw / du;
        self.u_scale_map = u_dist
            .iter()
            .map(|d| f64::max(wu_ratio * d / max_w_dist, 1.0e-5))
            .collect();
        let uw_ratio = du / dw;
        self.w_scale_map = w_dist
            .iter()
            .map(|d| f64::max(uw_ratio * d / max_u_dist, 1.0e-5))
            .collect();

        let ratio = |map: &[f64]| {
            let (mut lo, mut hi) = (f64::INFINITY, 0.0f64);
            for v in map {
                lo = f64::min(lo, *v);
                hi = f64::max(hi, *v);
            }
            hi / lo
        };
        self.scale_u_flag = ratio(&self.u_scale_map) > ratio(&self.w_scale_map);
    }

    fn interp_scale(map: &[f64], frac01: f64) -> f64 {
        let num = map.len();
        let indd = frac01 * (num - 1) as f64;
        let ind = f64::clamp(indd.floor(), 0.0, (num - 2) as f64) as usize;
        let fract = f64::clamp(indd - ind as f64, 0.0, 1.0);
        map[ind] + fract * (map[ind + 1] - map[ind])
    }

    /// u-direction scale at normalized `w01` (identity when w is scaled).
    pub fn u_scale(&self, w01: f64) -> f64 {
        match self.scale_u_flag {
            true => Self::interp_scale(&self.u_scale_map, w01),
            false => 1.0,
        }
    }

    /// w-direction scale at normalized `u01` (identity when u is scaled).
    pub fn w_scale(&self, u01: f64) -> f64 {
        match self.scale_u_flag {
            true => 1.0,
            false => Self::interp_scale(&self.w_scale_map, u01),
        }
    }
}

/// The four 3D border curves of a surface.
pub fn borders(geom: &BezierSurface) -> Vec<BezierCurve> {
    use aeromesh_geometry::surface::Border::*;
    [WMin, WMax, UMin, UMax]
        .into_iter()
        .map(|b| geom.border_curve(b))
        .collect()
}

impl MeshSurface for Surf {
    fn point(&self, u: f64, w: f64) -> Point3 { self.geom.point(u, w) }
    fn normal(&self, u: f64, w: f64) -> Vector3 { self.geom.normal(u, w) }
    fn closest_uw(&self, pnt: Point3, guess: (f64, f64)) -> (f64, f64) {
        self.geom.closest_point(pnt, Some(guess))
    }
    fn target_len(&self, u: f64, w: f64) -> f64 { self.target_map.interp(&self.geom, u, w) }
    fn min_len(&self) -> f64 { self.min_len }
    fn grow_ratio(&self) -> f64 { self.grow_ratio }
    fn flip_normal(&self) -> bool { self.flip_flag }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plate(z: f64) -> BezierSurface {
        BezierSurface::plane(
            Point3::new(0.0, 0.0, z),
            Point3::new(1.0, 0.0, z),
            Point3::new(0.0, 1.0, z),
            Point3::new(1.0, 1.0, z),
        )
    }

    #[test]
    fn border_match_shared_edge() {
        let a = Surf::from_geom(plate(0.0), 0, 0);
        // plate sharing the x in [0,1], y = 1 edge
        let b = Surf::from_geom(
            BezierSurface::plane(
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
                Point3::new(1.0, 2.0, 0.0),
            ),
            1,
            1,
        );
        let c = Surf::from_geom(plate(5.0), 2, 2);
        assert!(a.border_match(&b));
        assert!(!a.border_match(&c));
    }

    #[test]
    fn line_seg_crosses_plate() {
        let surf = Surf::from_geom(plate(0.0), 0, 0);
        let mut t_vals = Vec::new();
        surf.intersect_line_seg(
            Point3::new(0.5, 0.5, -1.0),
            Point3::new(0.5, 0.5, 1.0),
            &mut t_vals,
        );
        assert_eq!(t_vals.len(), 1);
        assert!((t_vals[0] - 0.5).abs() < 1.0e-9);
    }

    #[test]
    fn flat_plate_scales_are_unity() {
        let mut surf = Surf::from_geom(plate(0.0), 0, 0);
        surf.build_dist_map();
        // a square flat plate needs no anisotropy correction
        assert!((surf.u_scale(0.5) - 1.0).abs() < 1.0e-9 || (surf.w_scale(0.5) - 1.0).abs() < 1.0e-9);
    }
}
