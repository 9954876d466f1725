use crate::surf::Surf;
use crate::*;
use aeromesh_base::binning::scalar_bin_id;
use aeromesh_geometry::collision::tri_tri_intersect;
use aeromesh_geometry::SurfPatch;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Relative planarity tolerance driving the subdivision cutoff.
const PLANAR_REL_TOL: f64 = 1.0e-5;
/// Combined recursion depth guard for degenerate coincident patches.
const MAX_SPLIT_DEPTH: usize = 40;

/// A `(u, w)` coordinate on a specific surface.
#[derive(Clone, Copy, Debug)]
pub struct Puw {
    /// the surface
    pub surf: usize,
    /// the parameter point
    pub uw: Point2,
}

/// One shared intersection vertex: a 3D point plus one parameter point per
/// touching surface.
#[derive(Clone, Debug)]
pub struct IPnt {
    /// 3D position
    pub pnt: Point3,
    /// parameter coordinates, one per surface touching this vertex
    pub puws: SmallVec<[Puw; 2]>,
    /// already absorbed into a chain
    pub used: bool,
    /// segments referencing this point
    pub segs: Vec<usize>,
    /// scratch index used while assembling the per-surface meshes
    pub index: usize,
}

impl IPnt {
    /// The parameter point on `surf`, if this vertex touches it.
    pub fn get_puw(&self, surf: usize) -> Option<&Puw> {
        self.puws.iter().find(|p| p.surf == surf)
    }

    /// Adopts every parameter point of `other` not already represented.
    pub fn add_puws(&mut self, other: &IPnt) {
        for puw in &other.puws {
            if self.get_puw(puw.surf).is_none() {
                self.puws.push(*puw);
            }
        }
    }

    /// Recomputes the 3D position as the average of the surface evaluations
    /// of every parameter point.
    pub fn comp_pnt(&mut self, surfs: &[Surf]) {
        if self.puws.is_empty() {
            return;
        }
        let mut acc = Vector3::new(0.0, 0.0, 0.0);
        for puw in &self.puws {
            acc += surfs[puw.surf].point(puw.uw.x, puw.uw.y).to_vec();
        }
        self.pnt = Point3::from_vec(acc / self.puws.len() as f64);
    }
}

/// Line segment of the intersection between two surfaces (or a border /
/// subsurface segment when `surf_a == surf_b`).
#[derive(Clone, Copy, Debug)]
pub struct ISeg {
    /// first surface
    pub surf_a: usize,
    /// second surface
    pub surf_b: usize,
    /// endpoint vertices
    pub ipnt: [usize; 2],
}

/// Spatial bucket of intersection vertices keyed by the scalar bin id.
#[derive(Clone, Debug, Default)]
pub struct IPntBin {
    /// vertices in this bucket
    pub ipnts: Vec<usize>,
    /// ids of nearby buckets (id ± 1..3)
    pub adj: Vec<i64>,
}

/// Arena context owning every intersection vertex, segment, and bucket
/// created during one pipeline run. Dropping the context at cleanup releases
/// everything at once.
#[derive(Debug, Default)]
pub struct IsectContext {
    /// vertex arena
    pub ipnts: Vec<IPnt>,
    /// segment arena
    pub isegs: Vec<ISeg>,
    /// spatial buckets
    pub bins: FxHashMap<i64, IPntBin>,
}

impl IsectContext {
    /// Empties every arena.
    pub fn clear(&mut self) {
        self.ipnts.clear();
        self.isegs.clear();
        self.bins.clear();
    }

    /// Creates a vertex carrying the given parameter points.
    pub fn new_ipnt(&mut self, pnt: Point3, puws: &[Puw]) -> usize {
        self.ipnts.push(IPnt {
            pnt,
            puws: SmallVec::from_slice(puws),
            used: false,
            segs: Vec::new(),
            index: usize::MAX,
        });
        self.ipnts.len() - 1
    }

    /// Creates a segment and wires the endpoint back-references.
    pub fn new_seg(&mut self, surf_a: usize, surf_b: usize, ip0: usize, ip1: usize) -> usize {
        let id = self.isegs.len();
        self.isegs.push(ISeg {
            surf_a,
            surf_b,
            ipnt: [ip0, ip1],
        });
        self.ipnts[ip0].segs.push(id);
        self.ipnts[ip1].segs.push(id);
        id
    }

    /// Registers a vertex in its spatial bucket.
    pub fn bin_register(&mut self, ip: usize) {
        let id = scalar_bin_id(self.ipnts[ip].pnt);
        self.bins.entry(id).or_default().ipnts.push(ip);
    }

    /// Fills the adjacency lists of every bucket (ids within ±3).
    pub fn build_bin_adjacency(&mut self) {
        let ids: Vec<i64> = self.bins.keys().copied().collect();
        for id in ids {
            let adj: Vec<i64> = (-3..=3)
                .filter(|i| *i != 0)
                .map(|i| id + i)
                .filter(|n| self.bins.contains_key(n))
                .collect();
            self.bins.get_mut(&id).unwrap().adj = adj;
        }
    }

    /// Finds the closest unused two-surface vertex (same surface pair, within
    /// 1e-6) in the bucket of `ip` or its neighbors.
    pub fn bin_match(&self, ip: usize) -> Option<usize> {
        let probe = &self.ipnts[ip];
        if probe.puws.len() != 2 {
            return None;
        }
        let id = scalar_bin_id(probe.pnt);
        let bin = self.bins.get(&id)?;
        let tol2 = 1.0e-6 * 1.0e-6;
        let mut close = None;
        let mut close_d2 = f64::INFINITY;
        let candidates = std::iter::once(&bin.ipnts)
            .chain(bin.adj.iter().filter_map(|a| self.bins.get(a)).map(|b| &b.ipnts));
        for list in candidates {
            for cand in list {
                let other = &self.ipnts[*cand];
                if *cand == ip || other.used || other.puws.len() != 2 {
                    continue;
                }
                if other.puws[0].surf != probe.puws[0].surf
                    || other.puws[1].surf != probe.puws[1].surf
                {
                    continue;
                }
                let d2 = probe.pnt.distance2(other.pnt);
                if d2 < close_d2 && d2 < tol2 {
                    close_d2 = d2;
                    close = Some(*cand);
                }
            }
        }
        close
    }

    /// Emits one intersection segment between two planar patches, projecting
    /// both endpoints into each patch's parameter rectangle. Degenerate
    /// segments are dropped.
    pub fn add_intersection_seg(
        &mut self,
        pa: &SurfPatch,
        pb: &SurfPatch,
        surf_a: usize,
        surf_b: usize,
        ip0: Point3,
        ip1: Point3,
    ) {
        if ip0.distance2(ip1) < f64::EPSILON {
            return;
        }
        let mut project = |p: Point3| -> [Puw; 2] {
            let seed_a = pa.closest_uw_planar_approx(p);
            let (ua, wa) = pa.closest_uw(p, seed_a);
            let seed_b = pb.closest_uw_planar_approx(p);
            let (ub, wb) = pb.closest_uw(p, seed_b);
            [
                Puw {
                    surf: surf_a,
                    uw: Point2::new(ua, wa),
                },
                Puw {
                    surf: surf_b,
                    uw: Point2::new(ub, wb),
                },
            ]
        };
        let puws0 = project(ip0);
        let puws1 = project(ip1);
        let i0 = self.new_ipnt(ip0, &puws0);
        let i1 = self.new_ipnt(ip1, &puws1);
        self.new_seg(surf_a, surf_b, i0, i1);
        self.bin_register(i0);
        self.bin_register(i1);
    }
}

/// Recursive patch-pair intersection: subdivide while boxes overlap, then
/// intersect the planar leaves as corner-triangle pairs.
pub fn intersect_patches(
    ctx: &mut IsectContext,
    surf_a: usize,
    surf_b: usize,
    pa: &SurfPatch,
    pb: &SurfPatch,
) {
    if !pa.bbox().intersects(pb.bbox()) {
        return;
    }
    let pa_planar = pa.test_planar_rel(PLANAR_REL_TOL);
    let pb_planar = pb.test_planar_rel(PLANAR_REL_TOL);
    if pa_planar && pb_planar {
        for ta in pa.corner_triangles() {
            for tb in pb.corner_triangles() {
                if let Some((s0, s1)) = tri_tri_intersect(ta, tb) {
                    ctx.add_intersection_seg(pa, pb, surf_a, surf_b, s0, s1);
                }
            }
        }
        return;
    }
    if pa.depth() + pb.depth() > MAX_SPLIT_DEPTH {
        log::debug!("patch intersection depth limit hit; dropping a leaf pair");
        return;
    }
    let split_a = !pa_planar && (pb_planar || pa.bbox().diagonal() >= pb.bbox().diagonal());
    match split_a {
        true => {
            for child in pa.split() {
                intersect_patches(ctx, surf_a, surf_b, &child, pb);
            }
        }
        false => {
            for child in pb.split() {
                intersect_patches(ctx, surf_a, surf_b, pa, &child);
            }
        }
    }
}
