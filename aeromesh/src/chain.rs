use crate::density::MapSource;
use crate::isect::{IsectContext, Puw};
use crate::scurve::SCurve;
use crate::settings::GridDensity;
use crate::surf::Surf;
use crate::*;
use aeromesh_geometry::collision::{proj_pnt_on_line_u, seg_seg_intersect_2d};
use aeromesh_geometry::BezierCurve;
use std::collections::VecDeque;

/// Chains shorter than this are dropped as numerical debris.
const MIN_CHAIN_LEN: f64 = 1.0e-4;
/// Leaf size of the parameter-space box hierarchy.
const BOX_LEAF_SEGS: usize = 8;

/// One pending split of a chain.
#[derive(Clone, Copy, Debug)]
pub struct ISegSplit {
    /// side the split parameter lives on
    pub surf: usize,
    /// segment index in the deque
    pub index: usize,
    /// fractional position along the segment
    pub fract: f64,
    /// parameter point of the split
    pub uw: Point2,
    /// 3D point of the split
    pub pnt: Point3,
}

/// Node of the 2D parameter-space bounding hierarchy over one chain side.
#[derive(Clone, Debug)]
pub struct ISegBox {
    begin: usize,
    end: usize,
    bbox: BoundingBox<Point2>,
    children: Option<Box<(ISegBox, ISegBox)>>,
}

impl ISegBox {
    fn build(chain: &ISegChain, ctx: &IsectContext, surf: usize, begin: usize, end: usize) -> Self {
        let mut bbox = BoundingBox::new();
        for i in begin..end {
            let seg = &ctx.isegs[chain.segs[i]];
            for ip in seg.ipnt {
                if let Some(puw) = ctx.ipnts[ip].get_puw(surf) {
                    bbox.push(puw.uw);
                }
            }
        }
        let children = match end - begin > BOX_LEAF_SEGS {
            true => {
                let split = (begin + end) / 2;
                Some(Box::new((
                    ISegBox::build(chain, ctx, surf, begin, split),
                    ISegBox::build(chain, ctx, surf, split, end),
                )))
            }
            false => None,
        };
        ISegBox {
            begin,
            end,
            bbox,
            children,
        }
    }
}

/// Ordered open run of intersection segments between exactly two surfaces.
#[derive(Clone, Debug, Default)]
pub struct ISegChain {
    /// segment ids, adjacent entries sharing one vertex
    pub segs: VecDeque<usize>,
    /// first surface
    pub surf_a: usize,
    /// second surface
    pub surf_b: usize,
    /// built from an already-matched border pairing
    pub border_flag: bool,
    /// subsurface tag index for chains cut by subsurface lines
    pub ss_index: Option<usize>,
    /// the border chain this wake-attach chain copies its tessellation from
    pub wake_attach_chain: Option<usize>,
    /// pending splits
    pub splits: Vec<ISegSplit>,
    /// parameter curve on the A side
    pub a_curve: SCurve,
    /// parameter curve on the B side
    pub b_curve: SCurve,
    /// tessellated shared vertices (ids into the context arena)
    pub tess: Vec<usize>,
    box_a: Option<ISegBox>,
    box_b: Option<ISegBox>,
}

impl ISegChain {
    /// An empty chain between two surfaces.
    pub fn new(surf_a: usize, surf_b: usize) -> Self {
        ISegChain {
            surf_a,
            surf_b,
            ..Default::default()
        }
    }

    /// First vertex of the chain.
    pub fn front_ipnt(&self, ctx: &IsectContext) -> usize {
        ctx.isegs[*self.segs.front().unwrap()].ipnt[0]
    }

    /// Last vertex of the chain.
    pub fn back_ipnt(&self, ctx: &IsectContext) -> usize {
        ctx.isegs[*self.segs.back().unwrap()].ipnt[1]
    }

    /// Whether the chain is long enough to keep.
    pub fn valid(&self, ctx: &IsectContext) -> bool {
        if self.segs.is_empty() {
            return false;
        }
        let mut len = 0.0;
        for s in &self.segs {
            let seg = &ctx.isegs[*s];
            len += ctx.ipnts[seg.ipnt[0]].pnt.distance(ctx.ipnts[seg.ipnt[1]].pnt);
        }
        len >= MIN_CHAIN_LEN
    }

    /// Reverses the chain direction in place.
    pub fn flip_dir(&mut self, ctx: &mut IsectContext) {
        let mut rev: VecDeque<usize> = VecDeque::with_capacity(self.segs.len());
        for s in &self.segs {
            ctx.isegs[*s].ipnt.swap(0, 1);
            rev.push_front(*s);
        }
        self.segs = rev;
    }

    /// Appends a segment at the front or back, flipping it so shared
    /// vertices stay adjacent.
    pub fn add_seg(&mut self, ctx: &mut IsectContext, seg_id: usize, front: bool) {
        if self.segs.is_empty() {
            self.segs.push_back(seg_id);
            return;
        }
        let anchor = match front {
            true => ctx.ipnts[self.front_ipnt(ctx)].pnt,
            false => ctx.ipnts[self.back_ipnt(ctx)].pnt,
        };
        let seg = ctx.isegs[seg_id];
        let d0 = ctx.ipnts[seg.ipnt[0]].pnt.distance2(anchor);
        let d1 = ctx.ipnts[seg.ipnt[1]].pnt.distance2(anchor);
        // the shared endpoint must face the chain
        let needs_flip = match front {
            true => d1 > d0,
            false => d0 > d1,
        };
        if needs_flip {
            ctx.isegs[seg_id].ipnt.swap(0, 1);
        }
        match front {
            true => self.segs.push_front(seg_id),
            false => self.segs.push_back(seg_id),
        }
    }

    /// 3D endpoint match against another chain on the same A surface; a
    /// reversed match flips this chain. Used to find wake attach partners.
    pub fn match_3d(&mut self, ctx: &mut IsectContext, other: &ISegChain) -> bool {
        let tol2 = 1.0e-8;
        let pa0 = ctx.ipnts[self.front_ipnt(ctx)].pnt;
        let pa1 = ctx.ipnts[self.back_ipnt(ctx)].pnt;
        let pb0 = ctx.ipnts[other.front_ipnt(ctx)].pnt;
        let pb1 = ctx.ipnts[other.back_ipnt(ctx)].pnt;
        if pa0.distance2(pb0) < tol2 && pa1.distance2(pb1) < tol2 {
            return true;
        }
        if pa0.distance2(pb1) < tol2 && pa1.distance2(pb0) < tol2 {
            self.flip_dir(ctx);
            return true;
        }
        false
    }

    /// Builds the per-side parameter-space box hierarchies.
    pub fn build_boxes(&mut self, ctx: &IsectContext) {
        let n = self.segs.len();
        let box_a = ISegBox::build(self, ctx, self.surf_a, 0, n);
        let box_b = ISegBox::build(self, ctx, self.surf_b, 0, n);
        self.box_a = Some(box_a);
        self.box_b = Some(box_b);
    }

    fn side_box(&self, surf: usize) -> Option<&ISegBox> {
        match surf == self.surf_a {
            true => self.box_a.as_ref(),
            false => self.box_b.as_ref(),
        }
    }

    fn seg_uw(&self, ctx: &IsectContext, i: usize, surf: usize) -> (Point2, Point2) {
        let seg = &ctx.isegs[self.segs[i]];
        (
            ctx.ipnts[seg.ipnt[0]].get_puw(surf).map(|p| p.uw).unwrap(),
            ctx.ipnts[seg.ipnt[1]].get_puw(surf).map(|p| p.uw).unwrap(),
        )
    }

    /// Records a pending split.
    pub fn add_split(&mut self, surf: usize, index: usize, uw: Point2) {
        self.splits.push(ISegSplit {
            surf,
            index,
            fract: 0.0,
            uw,
            pnt: Point3::new(0.0, 0.0, 0.0),
        });
    }

    /// Injects a split where another chain's endpoint touches this border
    /// chain (3D distance under tolerance). Returns whether a split landed.
    pub fn add_border_split(&mut self, ctx: &IsectContext, surfs: &[Surf], puw: &Puw) -> bool {
        let tol = 1.0e-3;
        let surf = &surfs[puw.surf];
        let mut closest: Option<(usize, f64, f64)> = None;
        for i in 0..self.segs.len() {
            let (uw0, uw1) = self.seg_uw(ctx, i, puw.surf);
            let u = proj_pnt_on_line_u(uw0, uw1, puw.uw);
            if u <= 0.0 || u >= 1.0 {
                continue;
            }
            let proj = uw0 + (uw1 - uw0) * u;
            let proj3d = surf.point(proj.x, proj.y);
            let probe3d = surf.point(puw.uw.x, puw.uw.y);
            let d = proj3d.distance(probe3d);
            if closest.map(|c| d < c.1).unwrap_or(true) {
                let p0 = surf.point(uw0.x, uw0.y);
                let p1 = surf.point(uw1.x, uw1.y);
                let denom = p0.distance(p1);
                let fract = match denom > 1.0e-7 {
                    true => p0.distance(proj3d) / denom,
                    false => 0.0,
                };
                closest = Some((i, d, fract));
            }
        }
        match closest {
            Some((index, d, fract)) if d < tol => {
                self.splits.push(ISegSplit {
                    surf: puw.surf,
                    index,
                    fract,
                    uw: puw.uw,
                    pnt: Point3::new(0.0, 0.0, 0.0),
                });
                true
            }
            _ => false,
        }
    }

    /// Computes split 3D points and merges splits within 1e-6, keeping the
    /// first of each cluster.
    pub fn merge_splits(&mut self, surfs: &[Surf]) {
        for split in &mut self.splits {
            split.pnt = surfs[split.surf].point(split.uw.x, split.uw.y);
        }
        let tol = 1.0e-6;
        let mut kept: Vec<ISegSplit> = Vec::new();
        for split in &self.splits {
            if !kept.iter().any(|k| k.pnt.distance(split.pnt) < tol) {
                kept.push(*split);
            }
        }
        self.splits = kept;
    }

    /// Drops splits landing on the chain's own endpoints.
    pub fn remove_chain_end_splits(&mut self, ctx: &IsectContext) {
        let tol = 1.0e-7;
        let front = self.front_ipnt(ctx);
        let back = self.back_ipnt(ctx);
        let ends: Vec<(usize, Point2)> = [front, back]
            .into_iter()
            .flat_map(|ip| ctx.ipnts[ip].puws.iter().map(|p| (p.surf, p.uw)).collect::<Vec<_>>())
            .collect();
        self.splits.retain(|split| {
            !ends
                .iter()
                .any(|(surf, uw)| *surf == split.surf && uw.distance(split.uw) < tol)
        });
    }

    /// Splits from the tail forward (splits sorted by segment index then
    /// fraction, descending), producing one new chain per split.
    pub fn sort_and_split(&mut self, ctx: &mut IsectContext, surfs: &[Surf]) -> Vec<ISegChain> {
        self.splits.sort_by(|a, b| {
            match a.index == b.index {
                true => b.fract.partial_cmp(&a.fract),
                false => b.index.partial_cmp(&a.index),
            }
            .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut new_chains = Vec::new();
        let splits = self.splits.clone();
        for s in &splits {
            let seg_id = self.segs[s.index];
            if let Some(new_seg) = split_seg(ctx, surfs, seg_id, s.surf, s.uw) {
                let mut nc = ISegChain::new(self.surf_a, self.surf_b);
                nc.segs.push_back(new_seg);
                for j in s.index + 1..self.segs.len() {
                    nc.segs.push_back(self.segs[j]);
                }
                let num_remove = self.segs.len() - s.index - 1;
                for _ in 0..num_remove {
                    self.segs.pop_back();
                }
                new_chains.push(nc);
            }
        }
        new_chains
    }

    /// Unifies the shared interior vertex of every adjacent segment pair.
    pub fn merge_interior_ipnts(&mut self, ctx: &mut IsectContext) {
        for i in 1..self.segs.len() {
            let prev_end = ctx.isegs[self.segs[i - 1]].ipnt[1];
            let seg_id = self.segs[i];
            ctx.isegs[seg_id].ipnt[0] = prev_end;
            ctx.ipnts[prev_end].segs.push(seg_id);
        }
    }

    /// Builds the two parameter curves by interpolating the segment corner
    /// parameters on each side.
    pub fn build_curves(&mut self, ctx: &IsectContext) {
        let gather = |surf: usize| -> Vec<Point3> {
            let mut pnts = Vec::with_capacity(self.segs.len() + 1);
            let first = ctx.ipnts[self.front_ipnt(ctx)].get_puw(surf).unwrap().uw;
            pnts.push(Point3::new(first.x, first.y, 0.0));
            for s in &self.segs {
                let uw = ctx.ipnts[ctx.isegs[*s].ipnt[1]].get_puw(surf).unwrap().uw;
                pnts.push(Point3::new(uw.x, uw.y, 0.0));
            }
            pnts
        };
        let a_pnts = gather(self.surf_a);
        let b_pnts = gather(self.surf_b);
        self.a_curve = SCurve::new(self.surf_a, BezierCurve::interpolate(&a_pnts, 0.3).unwrap());
        self.b_curve = SCurve::new(self.surf_b, BezierCurve::interpolate(&b_pnts, 0.3).unwrap());
    }

    /// Density table for the A curve against the B curve.
    pub fn calc_density(
        &mut self,
        surfs: &[Surf],
        grid: &GridDensity,
        split_sources: &mut [MapSource],
    ) {
        let ISegChain {
            a_curve, b_curve, ..
        } = self;
        a_curve.calc_density(surfs, grid, Some(b_curve), split_sources);
    }

    /// Pushes the chain's density table back into both surface maps.
    pub fn spread_density(&self, surfs: &mut [Surf], grow_ratio: f64) {
        self.a_curve.spread_density(&self.b_curve, surfs, grow_ratio);
    }

    /// Tessellates the A side by density integration.
    pub fn tessellate(&mut self) {
        self.a_curve.tessellate();
        self.a_curve.cleanup_dist_table();
    }

    /// Copies the A-side parameters onto the B side.
    pub fn transfer_tess(&mut self) {
        let ISegChain {
            a_curve, b_curve, ..
        } = self;
        b_curve.tessellate_with(&a_curve.u_tess);
    }

    /// Materializes the shared tessellation as intersection vertices.
    pub fn apply_tess(&mut self, ctx: &mut IsectContext, surfs: &[Surf]) {
        self.tess.clear();
        debug_assert_eq!(self.a_curve.uw_tess.len(), self.b_curve.uw_tess.len());
        for (ta, tb) in self
            .a_curve
            .uw_tess
            .iter()
            .zip(self.b_curve.uw_tess.iter())
        {
            let puws = [
                Puw {
                    surf: self.surf_a,
                    uw: Point2::new(ta.x, ta.y),
                },
                Puw {
                    surf: self.surf_b,
                    uw: Point2::new(tb.x, tb.y),
                },
            ];
            let ip = ctx.new_ipnt(Point3::new(0.0, 0.0, 0.0), &puws);
            ctx.ipnts[ip].comp_pnt(surfs);
            self.tess.push(ip);
        }
    }

    /// Collects the sub-chain of tessellated points lying on `s_ptr`
    /// (within 1e-4), the coplanar-wake sharing case.
    pub fn find_coplanar_chains(
        &self,
        ctx: &mut IsectContext,
        surfs: &[Surf],
        s_ptr: usize,
    ) -> Vec<ISegChain> {
        let surf = &surfs[s_ptr];
        let tol = 1.0e-4;
        let mut ipnt_vec = Vec::new();
        for ip in &self.tess {
            let p = ctx.ipnts[*ip].pnt;
            let (u, w) = surf.closest_uw_guess(p, (surf.geom.mid_u(), surf.geom.mid_w()));
            if surf.point(u, w).distance(p) < tol {
                let puws = [
                    Puw {
                        surf: s_ptr,
                        uw: Point2::new(u, w),
                    },
                    Puw {
                        surf: s_ptr,
                        uw: Point2::new(u, w),
                    },
                ];
                let new_ip = ctx.new_ipnt(p, &puws);
                ipnt_vec.push(new_ip);
            }
        }
        match ipnt_vec.len() > 1 {
            true => {
                let mut nc = ISegChain::new(s_ptr, s_ptr);
                nc.border_flag = true;
                nc.tess = ipnt_vec;
                vec![nc]
            }
            false => Vec::new(),
        }
    }
}

/// Splits one segment at a parameter point on `surf`, interpolating the other
/// side linearly. Returns the id of the new tail segment.
pub fn split_seg(
    ctx: &mut IsectContext,
    surfs: &[Surf],
    seg_id: usize,
    surf: usize,
    uw: Point2,
) -> Option<usize> {
    let seg = ctx.isegs[seg_id];
    let uw0 = ctx.ipnts[seg.ipnt[0]].get_puw(surf)?.uw;
    let uw1 = ctx.ipnts[seg.ipnt[1]].get_puw(surf)?.uw;
    let denom = uw0.distance(uw1);
    if denom < 1.0e-12 {
        return None;
    }
    let fract = uw0.distance(uw) / denom;
    if !(1.0e-9..=1.0 - 1.0e-9).contains(&fract) {
        return None;
    }
    let other_surf = match surf == seg.surf_a {
        true => seg.surf_b,
        false => seg.surf_a,
    };
    let ouw0 = ctx.ipnts[seg.ipnt[0]].get_puw(other_surf)?.uw;
    let ouw1 = ctx.ipnts[seg.ipnt[1]].get_puw(other_surf)?.uw;
    let ouw = ouw0 + (ouw1 - ouw0) * fract;

    let puws = [
        Puw { surf, uw },
        Puw {
            surf: other_surf,
            uw: ouw,
        },
    ];
    let new_ip = ctx.new_ipnt(Point3::new(0.0, 0.0, 0.0), &puws);
    ctx.ipnts[new_ip].comp_pnt(surfs);

    let old_end = seg.ipnt[1];
    let new_seg = ctx.new_seg(seg.surf_a, seg.surf_b, new_ip, old_end);
    ctx.isegs[seg_id].ipnt[1] = new_ip;
    ctx.ipnts[new_ip].segs.push(seg_id);
    Some(new_seg)
}

/// Intersects two chains in the parameter space of their shared surface,
/// returning the split candidates for each chain.
pub fn chain_chain_intersect(
    a: &ISegChain,
    b: &ISegChain,
    surf_a_side: usize,
    surf_b_side: usize,
    ctx: &IsectContext,
) -> (Vec<(usize, Point2)>, Vec<(usize, Point2)>) {
    let mut splits_a = Vec::new();
    let mut splits_b = Vec::new();
    let (Some(box_a), Some(box_b)) = (a.side_box(surf_a_side), b.side_box(surf_b_side)) else {
        return (splits_a, splits_b);
    };
    let mut stack = vec![(box_a, box_b)];
    while let Some((na, nb)) = stack.pop() {
        if !na.bbox.intersects(&nb.bbox) {
            continue;
        }
        match (&na.children, &nb.children) {
            (Some(kids), _) => {
                stack.push((&kids.0, nb));
                stack.push((&kids.1, nb));
            }
            (None, Some(kids)) => {
                stack.push((na, &kids.0));
                stack.push((na, &kids.1));
            }
            (None, None) => {
                for i in na.begin..na.end {
                    let (p0, p1) = a.seg_uw(ctx, i, surf_a_side);
                    for j in nb.begin..nb.end {
                        let (p2, p3) = b.seg_uw(ctx, j, surf_b_side);
                        if let Some(int_pnt) = seg_seg_intersect_2d(p0, p1, p2, p3) {
                            splits_a.push((i, int_pnt));
                            splits_b.push((j, int_pnt));
                        }
                    }
                }
            }
        }
    }
    (splits_a, splits_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aeromesh_geometry::BezierSurface;

    fn plate() -> Surf {
        Surf::from_geom(
            BezierSurface::plane(
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
            ),
            0,
            0,
        )
    }

    fn line_chain(ctx: &mut IsectContext, pts: &[Point2]) -> ISegChain {
        let mut chain = ISegChain::new(0, 1);
        let mk = |ctx: &mut IsectContext, uw: Point2| {
            let puws = [Puw { surf: 0, uw }, Puw { surf: 1, uw }];
            ctx.new_ipnt(Point3::new(uw.x, uw.y, 0.0), &puws)
        };
        let mut last = mk(ctx, pts[0]);
        for p in &pts[1..] {
            let next = mk(ctx, *p);
            let seg = ctx.new_seg(0, 1, last, next);
            chain.segs.push_back(seg);
            last = next;
        }
        chain
    }

    #[test]
    fn validity_rejects_short_chains() {
        let mut ctx = IsectContext::default();
        let good = line_chain(&mut ctx, &[Point2::new(0.0, 0.0), Point2::new(0.5, 0.0)]);
        let tiny = line_chain(
            &mut ctx,
            &[Point2::new(0.0, 0.0), Point2::new(1.0e-5, 0.0)],
        );
        assert!(good.valid(&ctx));
        assert!(!tiny.valid(&ctx));
    }

    #[test]
    fn split_seg_divides_and_relinks() {
        let surfs = vec![plate(), plate()];
        let mut ctx = IsectContext::default();
        let chain = line_chain(&mut ctx, &[Point2::new(0.0, 0.5), Point2::new(1.0, 0.5)]);
        let seg_id = chain.segs[0];
        let new_seg = split_seg(&mut ctx, &surfs, seg_id, 0, Point2::new(0.25, 0.5)).unwrap();
        let old = ctx.isegs[seg_id];
        let new = ctx.isegs[new_seg];
        assert_eq!(old.ipnt[1], new.ipnt[0]);
        let mid = ctx.ipnts[old.ipnt[1]].pnt;
        assert!((mid.x - 0.25).abs() < 1.0e-9 && (mid.y - 0.5).abs() < 1.0e-9);
    }

    #[test]
    fn crossing_chains_split_each_other() {
        let surfs = vec![plate(), plate()];
        let mut ctx = IsectContext::default();
        let mut a = line_chain(&mut ctx, &[Point2::new(0.0, 0.5), Point2::new(1.0, 0.5)]);
        let mut b = line_chain(&mut ctx, &[Point2::new(0.5, 0.0), Point2::new(0.5, 1.0)]);
        a.build_boxes(&ctx);
        b.build_boxes(&ctx);
        let (sa, sb) = chain_chain_intersect(&a, &b, 0, 0, &ctx);
        assert_eq!(sa.len(), 1);
        assert_eq!(sb.len(), 1);
        for (idx, uw) in sa.iter().chain(sb.iter()) {
            assert_eq!(*idx, 0);
            assert!((uw.x - 0.5).abs() < 1.0e-12 && (uw.y - 0.5).abs() < 1.0e-12);
        }
        a.add_split(0, sa[0].0, sa[0].1);
        a.merge_splits(&surfs);
        a.remove_chain_end_splits(&ctx);
        let new_chains = a.sort_and_split(&mut ctx, &surfs);
        assert_eq!(new_chains.len(), 1);
        assert_eq!(a.segs.len(), 1);
        assert_eq!(new_chains[0].segs.len(), 1);
        assert!(a.valid(&ctx) && new_chains[0].valid(&ctx));
    }

    #[test]
    fn interior_merge_unifies_vertices() {
        let mut ctx = IsectContext::default();
        let mut chain = line_chain(
            &mut ctx,
            &[
                Point2::new(0.0, 0.0),
                Point2::new(0.5, 0.0),
                Point2::new(1.0, 0.0),
            ],
        );
        // duplicate the shared corner, as raw assembly produces
        chain.merge_interior_ipnts(&mut ctx);
        let s0 = ctx.isegs[chain.segs[0]];
        let s1 = ctx.isegs[chain.segs[1]];
        assert_eq!(s0.ipnt[1], s1.ipnt[0]);
    }

    #[test]
    fn build_curves_follows_corners() {
        let surfs = vec![plate(), plate()];
        let mut ctx = IsectContext::default();
        let mut chain = line_chain(
            &mut ctx,
            &[
                Point2::new(0.0, 0.0),
                Point2::new(0.5, 0.25),
                Point2::new(1.0, 0.0),
            ],
        );
        chain.build_curves(&ctx);
        assert_eq!(chain.a_curve.uw_crv.num_sections(), 2);
        let mid = chain.a_curve.uw_crv.subs(0.5);
        assert!((mid.x - 0.5).abs() < 1.0e-9 && (mid.y - 0.25).abs() < 1.0e-9);
        // shared tessellation machinery: endpoints only
        chain.a_curve.tess_end_pts();
        chain.transfer_tess();
        chain.apply_tess(&mut ctx, &surfs);
        assert_eq!(chain.tess.len(), 2);
        let p0 = ctx.ipnts[chain.tess[0]].pnt;
        assert!(p0.distance(Point3::new(0.0, 0.0, 0.0)) < 1.0e-9);
    }
}
