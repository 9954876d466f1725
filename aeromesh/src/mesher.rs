use crate::chain::{chain_chain_intersect, ISegChain};
use crate::density::{MapSource, SourceCloud};
use crate::isect::{intersect_patches, IsectContext, Puw};
use crate::scurve::{try_match_icurve, ICurve, SCurve};
use crate::settings::{CfdType, MeshSettings, SurfKind, XferSurf};
use crate::subsurface::{SubSurface, TagRegistry};
use crate::surf::Surf;
use crate::wake::{Wake, WakeMgr};
use crate::*;
use aeromesh_geometry::BezierCurve;
use aeromesh_mesh::analysis::{watertight_report, PointIndexMap, WatertightReport};
use aeromesh_mesh::{io, SimpTri, TriMesh};
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::BufWriter;

/// Where progress strings go. The sink must not mutate any pipeline state.
pub trait ProgressSink {
    /// Receives one informational line.
    fn message(&mut self, msg: &str);
}

/// Default sink: forward progress to the `log` crate.
#[derive(Debug, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn message(&mut self, msg: &str) {
        log::info!(target: "CFDMessage", "{}", msg.trim_end());
    }
}

/// Collecting sink for tests.
#[derive(Debug, Default, derive_more::Deref)]
pub struct VecSink(pub Vec<String>);

impl ProgressSink for VecSink {
    fn message(&mut self, msg: &str) { self.0.push(msg.to_string()); }
}

/// Chain density is propagated across surfaces this many times.
const NUM_EDGE_PROP: usize = 4;
/// Remesh passes per surface.
const NUM_REMESH_ITER: usize = 10;
/// Subsurface line segments are cut into this many pieces.
const SS_NUM_SECTS: usize = 100;

/// The pipeline orchestrator: owns every surface, curve, chain, and the
/// intersection arenas, and drives [`generate_mesh`](Mesher::generate_mesh).
pub struct Mesher {
    /// the settings bundle
    pub settings: MeshSettings,
    /// every surface, body surfaces first, then domain planes, then wakes
    pub surfs: Vec<Surf>,
    /// border curve arena
    pub scurves: Vec<SCurve>,
    /// matched border pairings
    pub icurves: Vec<ICurve>,
    /// every chain, borders first
    pub chains: Vec<ISegChain>,
    /// intersection vertex/segment arenas
    pub ctx: IsectContext,
    /// the wake builder
    pub wake_mgr: WakeMgr,
    /// subsurface polygons
    pub subsurfaces: Vec<SubSurface>,
    /// the tag-combination registry
    pub tags: TagRegistry,
    /// the meshing domain box
    pub domain: BoundingBox<Point3>,
    num_comps: usize,
    poss_coplanar: FxHashMap<usize, Vec<usize>>,
    sink: Box<dyn ProgressSink>,
    watertight: Option<WatertightReport>,
}

impl std::fmt::Debug for Mesher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesher")
            .field("surfs", &self.surfs.len())
            .field("chains", &self.chains.len())
            .finish()
    }
}

impl Mesher {
    /// A mesher with the given settings, reporting through the log sink.
    pub fn new(settings: MeshSettings) -> Self {
        Mesher {
            settings,
            surfs: Vec::new(),
            scurves: Vec::new(),
            icurves: Vec::new(),
            chains: Vec::new(),
            ctx: IsectContext::default(),
            wake_mgr: WakeMgr::default(),
            subsurfaces: Vec::new(),
            tags: TagRegistry::default(),
            domain: BoundingBox::new(),
            num_comps: 0,
            poss_coplanar: FxHashMap::default(),
            sink: Box::new(LogSink),
            watertight: None,
        }
    }

    /// Replaces the progress sink.
    pub fn set_progress_sink(&mut self, sink: Box<dyn ProgressSink>) { self.sink = sink; }

    /// Emits one progress line.
    pub fn add_output_text(&mut self, msg: &str) { self.sink.message(msg); }

    /// The watertight report of the last run.
    pub fn watertight(&self) -> Option<&WatertightReport> { self.watertight.as_ref() }

    /// Registers subsurface polygons.
    pub fn add_subsurface(&mut self, ss: SubSurface) { self.subsurfaces.push(ss); }

    /// Registers the wake leading-edge polylines collected by the geometry
    /// collaborator.
    pub fn set_wake_leading_edges(&mut self, edges: Vec<Vec<Point3>>) {
        self.wake_mgr.leading_edges = edges;
    }

    /// Releases every structure built during a run.
    pub fn clean_up(&mut self) {
        self.surfs.clear();
        self.scurves.clear();
        self.icurves.clear();
        self.chains.clear();
        self.ctx.clear();
        self.wake_mgr.wakes.clear();
        self.tags.clear();
        self.poss_coplanar.clear();
        self.watertight = None;
    }

    /// The whole pipeline: intersection, density, meshing, trimming,
    /// stitching, export, and the watertight report.
    pub fn generate_mesh(&mut self, xfersurfs: Vec<XferSurf>) -> String {
        self.clean_up();
        self.add_output_text("Loading Bezier Surfaces\n");
        self.load_surfs(xfersurfs);
        self.clean_merge_surfs();
        if self.surfs.is_empty() {
            self.add_output_text("No Surfaces To Mesh\n");
            return String::new();
        }

        self.update_sources_and_wakes();
        self.build_domain();

        self.add_output_text("Build Grid\n");
        self.build_grid();

        self.add_output_text("Intersect\n");
        self.intersect();
        self.add_output_text("Finished Intersect\n");

        self.add_output_text("Build Target Map\n");
        self.build_target_map();

        self.add_output_text("InitMesh\n");
        self.init_mesh();

        self.add_output_text("Remesh\n");
        self.remesh();

        let qual = self.quality_string();
        self.add_output_text(&qual);

        self.add_output_text("Exporting Files\n");
        self.export_files();

        self.add_output_text("Check Water Tight\n");
        let result = self.check_water_tight();
        self.add_output_text(&result);
        result
    }

    /// Loads the transferred surfaces.
    pub fn load_surfs(&mut self, xfersurfs: Vec<XferSurf>) {
        let mut max_comp = 0;
        for xfer in xfersurfs {
            let surf_id = self.surfs.len();
            max_comp = max_comp.max(xfer.comp_index);
            self.surfs.push(Surf::from_xfer(xfer, surf_id));
        }
        self.num_comps = max_comp + 1;
    }

    /// Drops half-mesh rejects and mirror duplicates, then unions components
    /// sharing a border. Running it twice is a no-op.
    pub fn clean_merge_surfs(&mut self) {
        let half = self.settings.half_mesh_flag;
        self.surfs.retain(|surf| {
            !(half && (surf.geom.less_than_y(1.0e-6) || surf.geom.plane_at_y_zero()))
        });

        self.delete_duplicate_surfs();

        // union components that share a border curve
        let mut merge_map: FxHashMap<usize, usize> = FxHashMap::default();
        for s in 0..self.surfs.len() {
            for t in s + 1..self.surfs.len() {
                let comp_a = self.surfs[s].comp_id;
                let comp_b = self.surfs[t].comp_id;
                if comp_a != comp_b && self.surfs[s].border_match(&self.surfs[t]) {
                    merge_map.insert(comp_b, comp_a);
                }
            }
        }
        for surf in &mut self.surfs {
            let mut comp = surf.comp_id;
            // chase the merge map to the root component
            while let Some(next) = merge_map.get(&comp) {
                if *next == comp {
                    break;
                }
                comp = *next;
            }
            surf.comp_id = comp;
        }
        for (i, surf) in self.surfs.iter_mut().enumerate() {
            surf.surf_id = i;
        }
    }

    fn delete_duplicate_surfs(&mut self) {
        let n = self.surfs.len();
        let mut del = vec![false; n];
        for s in 0..n {
            for t in s + 1..n {
                if self.surfs[s].geom.surf_match(&self.surfs[t].geom) {
                    del[s] = true;
                    del[t] = true;
                }
            }
        }
        let mut keep = Vec::with_capacity(n);
        for (surf, dead) in self.surfs.drain(..).zip(del) {
            if !dead {
                keep.push(surf);
            }
        }
        self.surfs = keep;
    }

    /// Collects the wake extents from the configuration box.
    pub fn update_sources_and_wakes(&mut self) {
        let mut bbox = BoundingBox::new();
        for surf in &self.surfs {
            bbox.merge(&surf.bbox);
        }
        self.wake_mgr
            .set_extents(&bbox, self.settings.wake_angle, self.settings.wake_scale);
        self.domain = crate::domain::update_domain(&self.settings, &bbox);
    }

    /// Creates the far-field / symmetry planes and renumbers everything
    /// above them.
    pub fn build_domain(&mut self) {
        let mut vehicle_box = BoundingBox::new();
        for surf in &self.surfs {
            vehicle_box.merge(&surf.bbox);
        }
        let domain_surfs =
            crate::domain::create_domain_surfs(&self.settings, &self.domain, &vehicle_box);
        let inc = domain_surfs.len();
        if inc > 0 {
            for surf in &mut self.surfs {
                surf.comp_id += inc;
                surf.unmerged_comp_id += inc;
                surf.surf_id += inc;
            }
            let mut all = domain_surfs;
            all.append(&mut self.surfs);
            self.surfs = all;
            self.num_comps += inc;
        }

        if self.settings.far_mesh_flag && self.settings.far_comp_flag {
            let far_geom = self.settings.far_geom_id.clone();
            for surf in &mut self.surfs {
                if surf.geom_id == far_geom {
                    surf.far_flag = true;
                    surf.cfd_type = CfdType::Transparent;
                    surf.flip_flag = !surf.flip_flag;
                }
            }
        }
        self.num_comps = self
            .surfs
            .iter()
            .map(|s| s.comp_id + 1)
            .max()
            .unwrap_or(0)
            .max(self.num_comps);
    }

    fn find_border_curves(&mut self, surf_idx: usize) {
        let degen_tol = 1.0e-6;
        let geom = &self.surfs[surf_idx].geom;
        let (min_u, max_u) = (geom.min_u(), geom.max_u());
        let (min_w, max_w) = (geom.min_w(), geom.max_w());
        let corners = [
            (Point3::new(min_u, min_w, 0.0), Point3::new(max_u, min_w, 0.0)),
            (Point3::new(max_u, min_w, 0.0), Point3::new(max_u, max_w, 0.0)),
            (Point3::new(max_u, max_w, 0.0), Point3::new(min_u, max_w, 0.0)),
            (Point3::new(min_u, max_w, 0.0), Point3::new(min_u, min_w, 0.0)),
        ];
        for (p0, p1) in corners {
            let crv = match BezierCurve::interpolate(&[p0, p1], 0.25) {
                Ok(crv) => crv,
                Err(_) => continue,
            };
            let scurve = SCurve::new(surf_idx, crv);
            if scurve.length(&self.surfs[surf_idx], 10) > degen_tol {
                let id = self.scurves.len();
                self.scurves.push(scurve);
                self.surfs[surf_idx].scurves.push(id);
            }
        }
    }

    /// Finds border curves on every surface, matches them into pairings, and
    /// builds the wake surfaces.
    pub fn build_grid(&mut self) {
        for i in 0..self.surfs.len() {
            self.surfs[i].build_dist_map();
            self.find_border_curves(i);
        }
        let all: Vec<usize> = (0..self.scurves.len()).collect();
        self.match_scurve_set(&all);
        self.create_wakes_append_border_curves();
    }

    /// Pairwise matching over a set of curve ids, then single-sided pairings
    /// for whatever stays unmatched.
    fn match_scurve_set(&mut self, set: &[usize]) {
        for (k, i) in set.iter().enumerate() {
            for j in &set[k + 1..] {
                if self.scurves[*i].icurve.is_some() && self.scurves[*j].icurve.is_some() {
                    continue;
                }
                let id = self.icurves.len();
                if let Some(icrv) = try_match_icurve(&mut self.scurves, &self.surfs, *i, *j, id) {
                    self.icurves.push(icrv);
                }
            }
        }
        for i in set {
            if self.scurves[*i].icurve.is_none() {
                let id = self.icurves.len();
                self.scurves[*i].icurve = Some(id);
                self.icurves.push(ICurve {
                    a: *i,
                    b: None,
                    plane_border: false,
                });
            }
        }
    }

    fn create_wakes_append_border_curves(&mut self) {
        self.wake_mgr.wakes = self
            .wake_mgr
            .leading_edges
            .clone()
            .into_iter()
            .map(|leading_edge| Wake {
                leading_edge,
                ..Default::default()
            })
            .collect();
        if self.wake_mgr.wakes.is_empty() {
            return;
        }

        // match wakes against existing border pairings
        let mut wakes = std::mem::take(&mut self.wake_mgr.wakes);
        for wake in &mut wakes {
            for (ici, icrv) in self.icurves.iter().enumerate() {
                let a = &self.scurves[icrv.a];
                let surf = &self.surfs[a.surf];
                if surf.kind != SurfKind::Wing {
                    continue;
                }
                let p0 = a.pnt_3d(surf, 0.0);
                let p1 = a.pnt_3d(surf, 1.0);
                if wake.matches_curve(p0, p1) {
                    wake.leading_curves.push(ici);
                }
            }
        }

        // build one wake surface per attached trailing edge
        let mut new_surf_ids = Vec::new();
        for wake in &mut wakes {
            for ici in wake.leading_curves.clone() {
                let a_id = self.icurves[ici].a;
                let parent_surf = self.scurves[a_id].surf;
                let parent = &self.surfs[parent_surf];
                wake.comp_id = parent.comp_id;
                let le_crv = self.scurves[a_id].uw_crv.uw_to_xyz(&parent.geom);
                if le_crv.num_sections() == 0 {
                    continue;
                }
                let geom =
                    aeromesh_geometry::BezierSurface::wake(&le_crv, self.wake_mgr.end_x, self.wake_mgr.angle);
                let surf_id = self.surfs.len();
                let mut wsurf = Surf::from_geom(geom, surf_id, parent.comp_id);
                wsurf.wake_flag = true;
                wsurf.cfd_type = CfdType::Transparent;
                wsurf.unmerged_comp_id = parent.unmerged_comp_id;
                wsurf.geom_id = parent.geom_id.clone();
                wsurf.wake_parent_surf_id = Some(parent_surf);
                self.surfs.push(wsurf);
                wake.surf_ids.push(surf_id);
                new_surf_ids.push(surf_id);
            }
        }
        self.wake_mgr.wakes = wakes;

        // border curves of the new wake surfaces
        let mut wake_scurves = Vec::new();
        for surf_id in &new_surf_ids {
            self.surfs[*surf_id].build_dist_map();
            let before = self.scurves.len();
            self.find_border_curves(*surf_id);
            wake_scurves.extend(before..self.scurves.len());
        }

        // pair wake curves with the shedding trailing edges first
        let le_scurves: Vec<usize> = self
            .wake_mgr
            .wakes
            .iter()
            .flat_map(|w| w.leading_curves.iter().map(|ici| self.icurves[*ici].a))
            .collect();
        for ws in &wake_scurves {
            for le in &le_scurves {
                if self.scurves[*ws].icurve.is_some() {
                    break;
                }
                let id = self.icurves.len();
                if let Some(icrv) = try_match_icurve(&mut self.scurves, &self.surfs, *le, *ws, id) {
                    self.icurves.push(icrv);
                }
            }
        }
        // then among themselves, then the leftovers stand alone
        self.match_scurve_set(&wake_scurves);
    }

    // ===================== intersection =====================

    /// Pairwise surface intersection, chain assembly, border loading,
    /// splitting, chain/chain intersection, and curve building.
    pub fn intersect(&mut self) {
        if self.settings.intersect_subsurfs {
            self.build_subsurf_int_chains();
        }

        for i in 0..self.surfs.len() {
            for j in i + 1..self.surfs.len() {
                self.surf_pair_intersect(i, j);
            }
        }

        self.build_chains();
        self.load_border_curves();
        self.merge_interior_chain_ipnts();
        self.split_border_curves();
        self.intersect_split_chains();
        self.build_curves();
    }

    fn surf_pair_intersect(&mut self, i: usize, j: usize) {
        if self.surfs[i].comp_id == self.surfs[j].comp_id {
            return;
        }
        if !self.surfs[i].bbox.intersects(&self.surfs[j].bbox) {
            return;
        }
        if self.border_curve_on_surface(i, j) {
            return;
        }
        if self.border_curve_on_surface(j, i) {
            return;
        }
        let other_box = self.surfs[j].bbox;
        for pa in 0..self.surfs[i].patches.len() {
            if !self.surfs[i].patches[pa].bbox().intersects(&other_box) {
                continue;
            }
            for pb in 0..self.surfs[j].patches.len() {
                intersect_patches(
                    &mut self.ctx,
                    i,
                    j,
                    &self.surfs[i].patches[pa],
                    &self.surfs[j].patches[pb],
                );
            }
        }
    }

    fn single_linear_3d(crv: &BezierCurve, tol: f64) -> bool {
        if crv.num_sections() != 1 {
            return false;
        }
        let pnts = crv.control_points();
        let (first, last) = (pnts[0], *pnts.last().unwrap());
        let dir = last - first;
        let len2 = dir.magnitude2();
        if len2 < 1.0e-30 {
            return true;
        }
        pnts.iter().all(|p| {
            let t = (p - first).dot(dir) / len2;
            let proj = first + dir * t;
            proj.distance(*p) <= tol
        })
    }

    /// Checks whether a border of `b` lies on surface `a`; coplanar borders
    /// become shared curves instead of intersections.
    fn border_curve_on_surface(&mut self, a: usize, b: usize) -> bool {
        let tol = 1.0e-5;
        if self.surfs[a].cfd_type == CfdType::Structure {
            return false;
        }
        let mut ret = false;
        for scid in self.surfs[b].scurves.clone() {
            let crv3d = self.scurves[scid].uw_crv.uw_to_xyz(&self.surfs[b].geom);
            if !crv3d.bbox().intersects(&self.surfs[a].bbox) {
                continue;
            }
            let proj = crv3d
                .xyz_to_uw(&self.surfs[a].geom)
                .uw_to_xyz(&self.surfs[a].geom);
            let num_on_surf = crv3d.count_match(&proj, tol);
            if num_on_surf > 2 || (num_on_surf == 2 && Self::single_linear_3d(&crv3d, tol)) {
                ret = true;
                self.poss_coplanar.entry(a).or_default().push(b);
                self.plane_border_curve_intersect(a, b, scid);
            }
        }
        ret
    }

    fn plane_border_curve_intersect(&mut self, a: usize, b: usize, brd: usize) {
        // already re-paired through one of a's curves?
        if let Some(ici) = self.scurves[brd].icurve {
            let repeat = self.surfs[a]
                .scurves
                .iter()
                .any(|sc| self.scurves[*sc].icurve == Some(ici));
            if repeat {
                return;
            }
        }

        let crv = self.scurves[brd]
            .uw_crv
            .uw_to_xyz(&self.surfs[b].geom)
            .xyz_to_uw(&self.surfs[a].geom);
        let ps_id = self.scurves.len();
        self.scurves.push(SCurve::new(a, crv));
        self.surfs[a].scurves.push(ps_id);

        match self.scurves[brd].icurve {
            Some(ici) => {
                self.icurves[ici] = ICurve {
                    a: brd,
                    b: Some(ps_id),
                    plane_border: true,
                };
                self.scurves[ps_id].icurve = Some(ici);
            }
            None => {
                let mut found = false;
                for (k, icrv) in self.icurves.iter_mut().enumerate() {
                    if icrv.a == brd && icrv.b.is_none() {
                        icrv.b = Some(ps_id);
                        icrv.plane_border = true;
                        self.scurves[ps_id].icurve = Some(k);
                        self.scurves[brd].icurve = Some(k);
                        found = true;
                        break;
                    }
                }
                if !found {
                    let id = self.icurves.len();
                    self.icurves.push(ICurve {
                        a: brd,
                        b: Some(ps_id),
                        plane_border: true,
                    });
                    self.scurves[brd].icurve = Some(id);
                    self.scurves[ps_id].icurve = Some(id);
                }
            }
        }
    }

    fn build_chains(&mut self) {
        self.ctx.build_bin_adjacency();
        let mut bin_ids: Vec<i64> = self.ctx.bins.keys().copied().collect();
        bin_ids.sort_unstable();
        for id in bin_ids {
            let members = self.ctx.bins[&id].ipnts.clone();
            for ip in members {
                if self.ctx.ipnts[ip].used || self.ctx.ipnts[ip].segs.is_empty() {
                    continue;
                }
                let seg_id = self.ctx.ipnts[ip].segs[0];
                let seg = self.ctx.isegs[seg_id];
                self.ctx.ipnts[seg.ipnt[0]].used = true;
                self.ctx.ipnts[seg.ipnt[1]].used = true;
                let mut chain = ISegChain::new(seg.surf_a, seg.surf_b);
                chain.segs.push_back(seg_id);
                self.expand_chain(&mut chain);
                if chain.valid(&self.ctx) {
                    self.chains.push(chain);
                }
            }
        }
    }

    fn expand_chain(&mut self, chain: &mut ISegChain) {
        let mut expand_front = true;
        loop {
            let test = match expand_front {
                true => chain.front_ipnt(&self.ctx),
                false => chain.back_ipnt(&self.ctx),
            };
            match self.ctx.bin_match(test) {
                Some(matched) => {
                    let seg_id = self.ctx.ipnts[matched].segs[0];
                    chain.add_seg(&mut self.ctx, seg_id, expand_front);
                    let seg = self.ctx.isegs[seg_id];
                    self.ctx.ipnts[seg.ipnt[0]].used = true;
                    self.ctx.ipnts[seg.ipnt[1]].used = true;
                }
                None => match expand_front {
                    true => expand_front = false,
                    false => break,
                },
            }
        }
    }

    fn load_border_curves(&mut self) {
        let mut border_chains = Vec::new();
        for ici in 0..self.icurves.len() {
            if self.icurves[ici].b.is_none() {
                // open border of an open solid shares its own tessellation
                self.icurves[ici].b = Some(self.icurves[ici].a);
            }
            let a_id = self.icurves[ici].a;
            let b_id = self.icurves[ici].b.unwrap();

            if self.icurves[ici].plane_border {
                // the non-symmetry side leads
                let a_sym = self.surfs[self.scurves[a_id].surf].sym_plane_flag;
                let (lead, follow) = match a_sym {
                    false => (a_id, b_id),
                    true => (b_id, a_id),
                };
                let mut lead_crv = std::mem::take(&mut self.scurves[lead]);
                lead_crv.cheap_tesselate();
                self.scurves[lead] = lead_crv;
                let mut follow_crv = std::mem::take(&mut self.scurves[follow]);
                let lead_ref = self.scurves[lead].clone();
                follow_crv.project_tess_to_surf(&lead_ref, &self.surfs);
                self.scurves[follow] = follow_crv;
            } else {
                let mut a_crv = std::mem::take(&mut self.scurves[a_id]);
                a_crv.border_tesselate();
                self.scurves[a_id] = a_crv;
                if b_id != a_id {
                    let mut b_crv = std::mem::take(&mut self.scurves[b_id]);
                    b_crv.border_tesselate();
                    self.scurves[b_id] = b_crv;
                }
            }

            let surf_a = self.scurves[a_id].surf;
            let surf_b = self.scurves[b_id].surf;
            let uw_a = self.scurves[a_id].uw_tess.clone();
            let uw_b = self.scurves[b_id].uw_tess.clone();
            if uw_a.len() < 2 || uw_a.len() != uw_b.len() {
                continue;
            }

            let mut chain = ISegChain::new(surf_a, surf_b);
            chain.border_flag = true;
            for j in 1..uw_a.len() {
                let mk = |ctx: &mut IsectContext, surfs: &[Surf], ua: Point3, ub: Point3| {
                    let puws = [
                        Puw {
                            surf: surf_a,
                            uw: Point2::new(ua.x, ua.y),
                        },
                        Puw {
                            surf: surf_b,
                            uw: Point2::new(ub.x, ub.y),
                        },
                    ];
                    let ip = ctx.new_ipnt(Point3::new(0.0, 0.0, 0.0), &puws);
                    ctx.ipnts[ip].comp_pnt(surfs);
                    ip
                };
                let p0 = mk(&mut self.ctx, &self.surfs, uw_a[j - 1], uw_b[j - 1]);
                let p1 = mk(&mut self.ctx, &self.surfs, uw_a[j], uw_b[j]);
                let seg = self.ctx.new_seg(surf_a, surf_b, p0, p1);
                chain.segs.push_back(seg);
            }
            if chain.valid(&self.ctx) {
                border_chains.push(chain);
            }
        }
        // border chains go in front
        border_chains.append(&mut self.chains);
        self.chains = border_chains;
    }

    fn merge_interior_chain_ipnts(&mut self) {
        let mut chains = std::mem::take(&mut self.chains);
        for chain in &mut chains {
            chain.merge_interior_ipnts(&mut self.ctx);
        }
        self.chains = chains;
    }

    fn split_border_curves(&mut self) {
        // endpoints of intersection chains seed the splits
        let mut split_puws: Vec<Vec<Puw>> = Vec::new();
        for chain in &self.chains {
            if !chain.border_flag {
                for ip in [chain.front_ipnt(&self.ctx), chain.back_ipnt(&self.ctx)] {
                    split_puws.push(self.ctx.ipnts[ip].puws.to_vec());
                }
            }
        }

        let mut chains = std::mem::take(&mut self.chains);
        for chain in chains.iter_mut().filter(|c| c.border_flag) {
            for puws in &split_puws {
                let on_a = puws.iter().find(|p| p.surf == chain.surf_a);
                let on_b = puws.iter().find(|p| p.surf == chain.surf_b);
                if let Some(puw) = on_a.or(on_b) {
                    chain.add_border_split(&self.ctx, &self.surfs, puw);
                }
            }
        }

        let mut new_chains = Vec::new();
        for chain in chains.iter_mut().filter(|c| c.border_flag) {
            chain.merge_splits(&self.surfs);
            for mut nc in chain.sort_and_split(&mut self.ctx, &self.surfs) {
                nc.border_flag = true;
                if nc.valid(&self.ctx) {
                    new_chains.push(nc);
                }
            }
        }
        chains.append(&mut new_chains);
        self.chains = chains;
    }

    fn intersect_split_chains(&mut self) {
        let idx: Vec<usize> = (0..self.chains.len())
            .filter(|i| !self.chains[*i].border_flag)
            .collect();
        let mut chains = std::mem::take(&mut self.chains);
        for i in &idx {
            chains[*i].build_boxes(&self.ctx);
        }
        for (k, i) in idx.iter().enumerate() {
            for j in &idx[k + 1..] {
                let (ci, cj) = (&chains[*i], &chains[*j]);
                let shared = if ci.surf_a == cj.surf_a || ci.surf_a == cj.surf_b {
                    Some(ci.surf_a)
                } else if ci.surf_b == cj.surf_a || ci.surf_b == cj.surf_b {
                    Some(ci.surf_b)
                } else {
                    None
                };
                let Some(surf) = shared else { continue };
                let (sa, sb) = chain_chain_intersect(ci, cj, surf, surf, &self.ctx);
                for (index, uw) in sa {
                    chains[*i].add_split(surf, index, uw);
                }
                for (index, uw) in sb {
                    chains[*j].add_split(surf, index, uw);
                }
            }
        }
        let mut new_chains = Vec::new();
        for i in &idx {
            chains[*i].merge_splits(&self.surfs);
            chains[*i].remove_chain_end_splits(&self.ctx);
            for nc in chains[*i].sort_and_split(&mut self.ctx, &self.surfs) {
                if nc.valid(&self.ctx) {
                    new_chains.push(nc);
                }
            }
        }
        chains.append(&mut new_chains);
        self.chains = chains;
    }

    fn build_curves(&mut self) {
        let mut chains = std::mem::take(&mut self.chains);
        for chain in &mut chains {
            if !chain.segs.is_empty() {
                chain.build_curves(&self.ctx);
            }
        }
        self.chains = chains;
    }

    fn build_subsurf_int_chains(&mut self) {
        for s in 0..self.surfs.len() {
            let geom_id = self.surfs[s].geom_id.clone();
            let (max_u, max_w) = (self.surfs[s].geom.max_u(), self.surfs[s].geom.max_w());
            let subsurfs: Vec<SubSurface> = self
                .subsurfaces
                .iter()
                .filter(|ss| ss.geom_id == geom_id)
                .cloned()
                .collect();
            for ss in subsurfs {
                let tol = 1.0e-6;
                for (uw0, uw1) in ss.line_segs() {
                    // skip segments off the surface or along its borders
                    let inside = |p: Point2| {
                        p.x >= 0.0 && p.y >= 0.0 && p.x <= max_u && p.y <= max_w
                    };
                    if !inside(uw0) || !inside(uw1) {
                        continue;
                    }
                    let on_border = ((uw0.x - max_u).abs() < tol && (uw1.x - max_u).abs() < tol)
                        || ((uw0.y - max_w).abs() < tol && (uw1.y - max_w).abs() < tol)
                        || (uw0.x.abs() < tol && uw1.x.abs() < tol)
                        || (uw0.y.abs() < tol && uw1.y.abs() < tol);
                    if on_border && ss.poly_flag {
                        continue;
                    }

                    let mut chain = ISegChain::new(s, s);
                    let delta = (uw1 - uw0) / SS_NUM_SECTS as f64;
                    let mut last: Option<usize> = None;
                    for p in 0..=SS_NUM_SECTS {
                        let uw = uw0 + delta * p as f64;
                        let puws = [Puw { surf: s, uw }, Puw { surf: s, uw }];
                        let ip = self.ctx.new_ipnt(Point3::new(0.0, 0.0, 0.0), &puws);
                        self.ctx.ipnts[ip].comp_pnt(&self.surfs);
                        if let Some(prev) = last {
                            let seg = self.ctx.new_seg(s, s, prev, ip);
                            chain.segs.push_back(seg);
                        }
                        last = Some(ip);
                    }
                    if chain.valid(&self.ctx) {
                        self.chains.push(chain);
                    }
                }
            }
        }
    }

    // ===================== density =====================

    /// Builds and limits every surface's target map, then propagates chain
    /// density across seams (with rigorous 3D limiting when enabled).
    pub fn build_target_map(&mut self) {
        let grid = self.settings.grid.clone();
        for surf in &mut self.surfs {
            surf.build_target_map(&grid);
            surf.target_map.limit(grid.grow_ratio);
        }

        // split points become sources so endpoint density crosses chains
        let mut split_sources: Vec<MapSource> = Vec::new();
        for chain in &self.chains {
            for split in &chain.splits {
                let strength = self.surfs[split.surf].interp_target_map(split.uw.x, split.uw.y);
                split_sources.push(MapSource::new(split.pnt, strength, split.surf));
            }
        }

        let mut chains = std::mem::take(&mut self.chains);
        for _ in 0..NUM_EDGE_PROP {
            for chain in &mut chains {
                if chain.segs.is_empty() {
                    continue;
                }
                chain.calc_density(&self.surfs, &grid, &mut split_sources);
                chain.spread_density(&mut self.surfs, grid.grow_ratio);
            }
        }

        if grid.rigor_limit {
            self.add_output_text(" Rigorous 3D Limiting\n");
            for i in 0..self.surfs.len() {
                let mut min_map = f64::INFINITY;
                let mut pts: Vec<(Point3, f64)> = Vec::new();
                for surf in &self.surfs {
                    for cell in surf.target_map.cells() {
                        if cell.surf_id != i {
                            min_map = f64::min(min_map, cell.strength);
                            pts.push((cell.pt, cell.strength));
                        }
                    }
                }
                if pts.is_empty() {
                    continue;
                }
                let cloud = SourceCloud::build(pts.into_iter(), f64::max(grid.base_len, grid.min_len));
                let surf = &mut self.surfs[i];
                let geom_min = surf.target_map.min_strength();
                surf.target_map
                    .limit_by_cloud(&cloud, f64::min(min_map, geom_min), grid.grow_ratio);
            }
            for chain in &mut chains {
                if !chain.segs.is_empty() {
                    chain.calc_density(&self.surfs, &grid, &mut split_sources);
                }
            }
        }
        self.chains = chains;
    }

    // ===================== meshing =====================

    /// Wake matching, chain tessellation, endpoint merging, coplanar wake
    /// chains, per-surface triangulation, interior removal, and stitching.
    pub fn init_mesh(&mut self) {
        self.match_wakes();
        self.tessellate_chains();
        self.merge_border_end_points();
        self.add_wake_coplanar_surface_chains();
        self.build_mesh();
        crate::classify::remove_interior_tris(&mut self.surfs, &self.settings, self.num_comps);
        crate::stitch::connect_border_edges(&mut self.surfs, false);
        crate::stitch::connect_border_edges(&mut self.surfs, true);
    }

    fn match_wakes(&mut self) {
        let n = self.chains.len();
        for c in 0..n {
            if !self.chains[c].border_flag {
                continue;
            }
            let sa = self.chains[c].surf_a;
            let sb = self.chains[c].surf_b;
            // on the attach curve the wake is always the B surface
            if !self.surfs[sb].wake_flag || self.surfs[sa].wake_flag {
                continue;
            }
            if self.surfs[sb].wake_parent_surf_id != Some(sa) {
                continue;
            }
            // find the trailing-edge border chain of the parent wing
            for d in 0..n {
                if d == c || !self.chains[d].border_flag {
                    continue;
                }
                if self.chains[d].surf_a != sa {
                    continue;
                }
                let mut chain_c = std::mem::take(&mut self.chains[c]);
                let matched = chain_c.match_3d(&mut self.ctx, &self.chains[d]);
                if matched {
                    chain_c.wake_attach_chain = Some(d);
                }
                self.chains[c] = chain_c;
                if matched {
                    break;
                }
            }
        }
    }

    fn tessellate_chains(&mut self) {
        let grid = self.settings.grid.clone();
        let mut chains = std::mem::take(&mut self.chains);
        for chain in chains.iter_mut().filter(|c| c.wake_attach_chain.is_none()) {
            if chain.segs.is_empty() {
                continue;
            }
            chain.calc_density(&self.surfs, &grid, &mut []);
            chain.tessellate();
            chain.transfer_tess();
            chain.apply_tess(&mut self.ctx, &self.surfs);
        }
        for c in 0..chains.len() {
            let Some(attach) = chains[c].wake_attach_chain else {
                continue;
            };
            let u = chains[attach].a_curve.u_tess.clone();
            let chain = &mut chains[c];
            chain.a_curve.tessellate_with(&u);
            chain.transfer_tess();
            chain.apply_tess(&mut self.ctx, &self.surfs);
        }
        self.chains = chains;
    }

    fn merge_border_end_points(&mut self) {
        // groups, border chain endpoints first
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for border in [true, false] {
            for chain in &self.chains {
                if chain.border_flag == border && !chain.tess.is_empty() {
                    groups.push(vec![chain.tess[0]]);
                    groups.push(vec![*chain.tess.last().unwrap()]);
                }
            }
        }
        let tol = self.settings.grid.min_len / 100.0;

        // iterative nearest-pair merging
        loop {
            let mut near = (f64::INFINITY, 0, 0);
            for g in 0..groups.len() {
                for h in 0..groups.len() {
                    if g == h {
                        continue;
                    }
                    let mut d = f64::INFINITY;
                    for a in &groups[g] {
                        for b in &groups[h] {
                            d = f64::min(
                                d,
                                self.ctx.ipnts[*a].pnt.distance(self.ctx.ipnts[*b].pnt),
                            );
                        }
                    }
                    if d < near.0 {
                        near = (d, g, h);
                    }
                }
            }
            if near.0 >= tol {
                break;
            }
            let (_, g, h) = near;
            let (lo, hi) = (g.min(h), g.max(h));
            let mut other = groups.swap_remove(hi);
            groups[lo].append(&mut other);
        }

        // collapse each group into one shared vertex
        let mut replace: FxHashMap<usize, usize> = FxHashMap::default();
        for group in &groups {
            if group.len() < 2 {
                continue;
            }
            let mut merged = self.ctx.ipnts[group[0]].clone();
            for other in &group[1..] {
                let other_pnt = self.ctx.ipnts[*other].clone();
                merged.add_puws(&other_pnt);
            }
            merged.comp_pnt(&self.surfs);
            let new_ip = self.ctx.new_ipnt(merged.pnt, &merged.puws);
            for old in group {
                replace.insert(*old, new_ip);
            }
        }
        for chain in &mut self.chains {
            if chain.tess.is_empty() {
                continue;
            }
            if let Some(new_ip) = replace.get(&chain.tess[0]) {
                chain.tess[0] = *new_ip;
            }
            let last = chain.tess.len() - 1;
            if let Some(new_ip) = replace.get(&chain.tess[last]) {
                chain.tess[last] = *new_ip;
            }
        }
    }

    fn add_wake_coplanar_surface_chains(&mut self) {
        let border_idx: Vec<usize> = (0..self.chains.len())
            .filter(|i| self.chains[*i].border_flag)
            .collect();
        let coplanar = self.poss_coplanar.clone();
        let mut new_chains = Vec::new();
        for (on_surf, partners) in coplanar {
            if !self.surfs[on_surf].wake_flag {
                continue;
            }
            for b in &border_idx {
                let chain = &self.chains[*b];
                let touches = partners
                    .iter()
                    .any(|p| chain.surf_a == *p || chain.surf_b == *p);
                if !touches {
                    continue;
                }
                for nc in self.chains[*b].find_coplanar_chains(&mut self.ctx, &self.surfs, on_surf)
                {
                    if !nc.tess.is_empty() {
                        new_chains.push(nc);
                    }
                }
            }
        }
        self.chains.extend(new_chains);
    }

    fn build_mesh(&mut self) {
        let mut surfs = std::mem::take(&mut self.surfs);
        for s in 0..surfs.len() {
            let chain_refs: Vec<&ISegChain> = self
                .chains
                .iter()
                .filter(|c| c.surf_a == s || c.surf_b == s)
                .collect();
            if !chain_refs.is_empty() {
                crate::tessellate::init_surf_mesh(s, &mut surfs, &chain_refs, &mut self.ctx);
            }
        }
        self.surfs = surfs;
    }

    /// Iterative refinement of every surface mesh, then packing, tagging,
    /// condensing, and wake stretching.
    pub fn remesh(&mut self) {
        let nsurf = self.surfs.len();
        let mut total_tris = 0;
        for i in 0..nsurf {
            let mut mesh = std::mem::take(&mut self.surfs[i].mesh);
            let mut num_rev = 0;
            for iter in 0..NUM_REMESH_ITER {
                mesh.remesh_pass(&self.surfs[i]);
                num_rev = mesh.remove_reversed_faces(&self.surfs[i]);
                let msg = format!(
                    "Surf {}/{} Iter {}/{} Num Tris = {}\n",
                    i + 1,
                    nsurf,
                    iter + 1,
                    NUM_REMESH_ITER,
                    mesh.num_faces()
                );
                self.add_output_text(&msg);
            }
            if num_rev > 0 {
                let msg = format!("{num_rev} reversed tris collapsed in final iteration.\n");
                self.add_output_text(&msg);
            }
            total_tris += mesh.num_faces();

            let mut simp = TriMesh::load(&mesh);
            mesh.clear();
            self.subtag(i, &mut simp);
            simp.condense();
            self.surfs[i].simp = simp;
            self.surfs[i].mesh = mesh;
        }
        self.wake_mgr.stretch_wakes(&mut self.surfs);
        let msg = format!("Total Num Tris = {total_tris}\n");
        self.add_output_text(&msg);
    }

    fn subtag(&mut self, surf_idx: usize, simp: &mut TriMesh) {
        let base_tag = surf_idx as u32 + 1;
        self.surfs[surf_idx].base_tag = base_tag;
        let name = match self.surfs[surf_idx].name.is_empty() {
            true => format!("Surf_{surf_idx}"),
            false => self.surfs[surf_idx].name.clone(),
        };
        self.tags.set_base_name(base_tag, name);

        let geom_id = self.surfs[surf_idx].geom_id.clone();
        let subsurfs: Vec<&SubSurface> = self
            .subsurfaces
            .iter()
            .filter(|ss| ss.geom_id == geom_id)
            .collect();
        for t in 0..simp.tris.len() {
            let center = simp.tri_center_uw(&simp.tris[t]);
            let mut tags = vec![base_tag];
            for ss in &subsurfs {
                if ss.contains(center) {
                    tags.push(ss.tag);
                }
            }
            tags.sort_unstable();
            simp.tris[t].tags = tags;
        }
        for tri in &simp.tris {
            self.tags.register(&tri.tags);
        }
    }

    /// Smallest-angle quality summary over every surface mesh.
    pub fn quality_string(&self) -> String {
        let mut min_q = f64::INFINITY;
        let mut sum = 0.0;
        let mut count = 0usize;
        for surf in &self.surfs {
            for tri in &surf.simp.tris {
                let q = tri_min_angle(
                    surf.simp.pnts[tri.ind0],
                    surf.simp.pnts[tri.ind1],
                    surf.simp.pnts[tri.ind2],
                );
                min_q = f64::min(min_q, q);
                sum += q;
                count += 1;
            }
        }
        match count {
            0 => "No triangles meshed\n".to_string(),
            _ => format!(
                "Min Angle = {:.2} deg, Avg Angle = {:.2} deg, {} Tris\n",
                min_q.to_degrees(),
                (sum / count as f64).to_degrees(),
                count
            ),
        }
    }

    // ===================== output =====================

    fn gather(&self, include: impl Fn(&Surf) -> bool) -> (Vec<Point3>, Vec<SimpTri>, Vec<i32>) {
        let mut index = PointIndexMap::new();
        let mut tris = Vec::new();
        let mut tags = Vec::new();
        for surf in &self.surfs {
            if !include(surf) {
                continue;
            }
            for tri in &surf.simp.tris {
                let packed = SimpTri {
                    ind0: index.find_or_add(surf.simp.pnts[tri.ind0]),
                    ind1: index.find_or_add(surf.simp.pnts[tri.ind1]),
                    ind2: index.find_or_add(surf.simp.pnts[tri.ind2]),
                    tags: tri.tags.clone(),
                };
                let tag = self.tags.resolve(&tri.tags).unwrap_or(0) as i32;
                tris.push(packed);
                tags.push(tag);
            }
        }
        (index.pnts().to_vec(), tris, tags)
    }

    /// Writes every export file the settings select. A file that cannot be
    /// opened is skipped with a progress note.
    pub fn export_files(&mut self) {
        let export = self.settings.export.clone();
        if let Some(path) = &export.stl {
            self.with_writer(path, |m, w| {
                let solid_tris = |wake: bool| {
                    let mut tris = Vec::new();
                    for surf in m.surfs.iter().filter(|s| s.wake_flag == wake) {
                        for tri in &surf.simp.tris {
                            tris.push([
                                surf.simp.pnts[tri.ind0],
                                surf.simp.pnts[tri.ind1],
                                surf.simp.pnts[tri.ind2],
                            ]);
                        }
                    }
                    tris
                };
                io::write_stl_solid(w, "", solid_tris(false))?;
                let wake_tris = solid_tris(true);
                if !wake_tris.is_empty() {
                    io::write_stl_solid(w, "wake", wake_tris)?;
                }
                Ok(())
            });
        }
        if let Some(path) = &export.tagged_stl {
            self.with_writer(path, |m, w| {
                let (pnts, tris, tags) = m.gather(|_| true);
                for tag in m.tags.all_tags() {
                    let name = m.tags.tag_name(tag);
                    let solid = tris
                        .iter()
                        .zip(tags.iter())
                        .filter(|(_, t)| **t == tag as i32)
                        .map(|(tri, _)| [pnts[tri.ind0], pnts[tri.ind1], pnts[tri.ind2]]);
                    io::write_stl_solid(w, &name, solid)?;
                }
                Ok(())
            });
        }
        if let Some(path) = &export.obj {
            self.with_writer(path, |m, w| {
                let (pnts, tris, _) = m.gather(|s| !s.wake_flag);
                io::write_obj(w, &pnts, &tris)
            });
        }
        if let Some(path) = &export.nascart {
            self.with_writer(path, |m, w| {
                let (pnts, tris, tags) = m.gather(|s| !s.wake_flag);
                io::write_nascart_dat(w, &pnts, &tris, &tags)
            });
        }
        if let Some(path) = &export.tri {
            self.with_writer(path, |m, w| {
                let (pnts, tris, tags) = m.gather(|_| true);
                io::write_cart3d_tri(w, &pnts, &tris, &tags)
            });
        }
        if let Some(path) = &export.gmsh {
            self.with_writer(path, |m, w| {
                let (pnts, tris, _) = m.gather(|_| true);
                io::write_gmsh(w, &pnts, &tris)
            });
        }
        if let Some(path) = &export.poly {
            self.with_writer(path, |m, w| {
                let (pnts, tris, _) = m.gather(|_| true);
                let holes = m.interior_hole_points();
                io::write_tetgen_poly(w, &pnts, &tris, &holes)
            });
        }
        if let Some(path) = &export.srf {
            self.with_writer(path, |m, w| {
                let mut comp_surfs: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
                for surf in &m.surfs {
                    comp_surfs.entry(surf.comp_id).or_default().push(surf.surf_id);
                }
                let mut comp_list: Vec<(usize, Vec<usize>)> = comp_surfs.into_iter().collect();
                comp_list.sort_unstable();
                let geoms: Vec<&aeromesh_geometry::BezierSurface> =
                    m.surfs.iter().map(|s| &s.geom).collect();
                let curve_rows = |chain: &ISegChain| -> io::SrfCurve {
                    let rows = chain
                        .tess
                        .iter()
                        .filter_map(|ip| {
                            let a = m.ctx.ipnts[*ip].get_puw(chain.surf_a)?;
                            let b = m.ctx.ipnts[*ip].get_puw(chain.surf_b)?;
                            Some([a.uw.x, a.uw.y, b.uw.x, b.uw.y])
                        })
                        .collect();
                    io::SrfCurve {
                        surf_a: chain.surf_a,
                        surf_b: chain.surf_b,
                        rows,
                    }
                };
                let borders: Vec<io::SrfCurve> = m
                    .chains
                    .iter()
                    .filter(|c| c.border_flag)
                    .map(curve_rows)
                    .collect();
                let isects: Vec<io::SrfCurve> = m
                    .chains
                    .iter()
                    .filter(|c| !c.border_flag)
                    .map(curve_rows)
                    .collect();
                io::write_srf(w, &comp_list, &geoms, &borders, &isects)
            });
        }
    }

    fn with_writer(
        &mut self,
        path: &str,
        body: impl FnOnce(&mut Self, &mut BufWriter<File>) -> Result<(), io::ExportError>,
    ) {
        match File::create(path) {
            Ok(file) => {
                let mut writer = BufWriter::new(file);
                if let Err(err) = body(self, &mut writer) {
                    let msg = format!("Export to {path} failed: {err}\n");
                    self.add_output_text(&msg);
                }
            }
            Err(_) => {
                let msg = format!("Could not open {path}\n");
                self.add_output_text(&msg);
            }
        }
    }

    /// One interior point per solid component (the component centroid), used
    /// as TetGen hole seeds. Half meshes keep only y > 0 points.
    pub fn interior_hole_points(&self) -> Vec<Point3> {
        let mut per_comp: FxHashMap<usize, (Vector3, usize)> = FxHashMap::default();
        for surf in &self.surfs {
            if surf.cfd_type == CfdType::Transparent || surf.far_flag || surf.sym_plane_flag {
                continue;
            }
            let entry = per_comp.entry(surf.comp_id).or_insert((Vector3::new(0.0, 0.0, 0.0), 0));
            for p in &surf.simp.pnts {
                entry.0 += p.to_vec();
                entry.1 += 1;
            }
        }
        let mut holes: Vec<Point3> = per_comp
            .into_values()
            .filter(|(_, n)| *n > 0)
            .map(|(acc, n)| Point3::from_vec(acc / n as f64))
            .collect();
        if self.settings.half_mesh_flag {
            for p in &mut holes {
                if p.y.abs() < 1.0e-4 {
                    p.y = 1.0e-5;
                }
            }
            holes.retain(|p| p.y > 0.0);
        }
        holes
    }

    /// Rebuilds global edge multiplicity and reports watertightness.
    pub fn check_water_tight(&mut self) -> String {
        let meshes: Vec<&TriMesh> = self
            .surfs
            .iter()
            .filter(|s| s.cfd_type != CfdType::Transparent || s.far_flag || s.sym_plane_flag)
            .map(|s| &s.simp)
            .collect();
        let report = watertight_report(&meshes);
        let text = report.to_report_string();
        self.watertight = Some(report);
        text
    }
}

fn tri_min_angle(p0: Point3, p1: Point3, p2: Point3) -> f64 {
    let d01 = p0.distance(p1);
    let d12 = p1.distance(p2);
    let d20 = p2.distance(p0);
    if d01 < 1.0e-30 || d12 < 1.0e-30 || d20 < 1.0e-30 {
        return 0.0;
    }
    let a0 = ((d01 * d01 + d20 * d20 - d12 * d12) / (2.0 * d01 * d20)).clamp(-1.0, 1.0);
    let a1 = ((d01 * d01 + d12 * d12 - d20 * d20) / (2.0 * d01 * d12)).clamp(-1.0, 1.0);
    let a2 = ((d12 * d12 + d20 * d20 - d01 * d01) / (2.0 * d12 * d20)).clamp(-1.0, 1.0);
    let max_cos = a0.max(a1).max(a2);
    max_cos.acos()
}
