use crate::chain::ISegChain;
use crate::isect::IsectContext;
use crate::surf::Surf;
use crate::*;
use rustc_hash::FxHashSet;
use spade::{ConstrainedDelaunayTriangulation, Point2 as SPoint2, Triangulation};

type Cdt = ConstrainedDelaunayTriangulation<SPoint2<f64>>;

/// Parameter points closer than this collapse into one mesh vertex.
const UW_DEDUP_TOL: f64 = 1.0e-4;

fn spade_round(x: f64) -> f64 {
    match x.abs() < spade::MIN_ALLOWED_VALUE {
        true => 0.0,
        false => x,
    }
}

/// Builds one surface's initial mesh: deduplicates the chain tessellations
/// into a unique (u, w) point set, triangulates in the scaled parameter
/// space with the chains as constraints plus an interior Steiner grid, and
/// lifts the result back onto the surface.
pub fn init_surf_mesh(surf_idx: usize, surfs: &mut [Surf], chains: &[&ISegChain], ctx: &mut IsectContext) {
    // one instance of each tessellated vertex
    let mut ipnt_set: Vec<usize> = Vec::new();
    let mut seen: FxHashSet<usize> = FxHashSet::default();
    for chain in chains {
        for ip in &chain.tess {
            if seen.insert(*ip) {
                ipnt_set.push(*ip);
            }
        }
    }

    // deduplicate nearby parameter points
    let mut uw_pnts: Vec<Point2> = Vec::new();
    for ip in &ipnt_set {
        let uw = match ctx.ipnts[*ip].get_puw(surf_idx) {
            Some(puw) => puw.uw,
            None => continue,
        };
        let mut min_id = usize::MAX;
        let mut min_dist = 1.0;
        for (i, p) in uw_pnts.iter().enumerate() {
            let d = p.distance(uw);
            if d < min_dist {
                min_dist = d;
                min_id = i;
            }
        }
        if min_dist < UW_DEDUP_TOL {
            ctx.ipnts[*ip].index = min_id;
        } else {
            uw_pnts.push(uw);
            ctx.ipnts[*ip].index = uw_pnts.len() - 1;
        }
    }

    // segment list from consecutive chain vertices
    let mut segs: Vec<(usize, usize)> = Vec::new();
    for chain in chains {
        for pair in chain.tess.windows(2) {
            let i0 = ctx.ipnts[pair[0]].index;
            let i1 = ctx.ipnts[pair[1]].index;
            if i0 != i1 && i0 != usize::MAX && i1 != usize::MAX {
                segs.push((i0, i1));
            }
        }
    }

    if uw_pnts.len() < 3 {
        return;
    }

    let surf = &surfs[surf_idx];
    let max_u = surf.geom.max_u();
    let max_w = surf.geom.max_w();
    let scaled: Vec<Point2> = uw_pnts
        .iter()
        .map(|uw| scale_uw(surf, *uw, max_u, max_w))
        .collect();

    // triangulate in the scaled space
    let mut cdt = Cdt::new();
    let mut handles = Vec::with_capacity(scaled.len());
    for p in &scaled {
        let sp = SPoint2::new(spade_round(p.x), spade_round(p.y));
        handles.push(cdt.insert(sp).ok());
    }
    let mut constrained: FxHashSet<(usize, usize)> = FxHashSet::default();
    for (i0, i1) in &segs {
        if let (Some(Some(a)), Some(Some(b))) = (handles.get(*i0), handles.get(*i1)) {
            if a != b && cdt.can_add_constraint(*a, *b) {
                cdt.add_constraint(*a, *b);
                constrained.insert((*i0.min(i1), *i0.max(i1)));
            }
        }
    }

    // interior points at the spacing the triangulator's area bound implies
    let est_tris = f64::clamp((uw_pnts.len() as f64 / 4.0).powi(2), 1.0, 10_000.0);
    let bbox: BoundingBox<Point2> = scaled.iter().copied().collect();
    let area = (bbox.max().x - bbox.min().x) * (bbox.max().y - bbox.min().y);
    let tri_area = f64::max(4.0 * area / est_tris, 1.0e-4);
    let h = f64::sqrt(2.0 * tri_area);
    let nx = ((bbox.max().x - bbox.min().x) / h) as usize;
    let ny = ((bbox.max().y - bbox.min().y) / h) as usize;
    for i in 1..nx {
        for j in 1..ny {
            let p = Point2::new(
                bbox.min().x + h * i as f64,
                bbox.min().y + h * j as f64,
            );
            // stay clear of the constrained boundary points
            let close = scaled.iter().any(|q| q.distance2(p) < 0.25 * h * h);
            if !close {
                let _ = cdt.insert(SPoint2::new(p.x, p.y));
            }
        }
    }

    // lift back through the inverse scale onto the surface
    let mut vmap: rustc_hash::FxHashMap<spade::handles::FixedVertexHandle, usize> =
        Default::default();
    let mut out_pnts: Vec<(Point3, Point2)> = Vec::new();
    for v in cdt.vertices() {
        let sp = *v.as_ref();
        let uw = unscale_uw(surf, Point2::new(sp.x, sp.y), max_u, max_w);
        let p3 = surf.point(uw.x, uw.y);
        vmap.insert(v.fix(), out_pnts.len());
        out_pnts.push((p3, uw));
    }

    let mut tris: Vec<[usize; 3]> = Vec::new();
    for face in cdt.inner_faces() {
        let vs = face.vertices();
        let tri = [
            vmap[&vs[0].fix()],
            vmap[&vs[1].fix()],
            vmap[&vs[2].fix()],
        ];
        if tri[0] != tri[1] && tri[1] != tri[2] && tri[2] != tri[0] {
            tris.push(tri);
        }
    }

    // ridge constraints carried over by vertex index in the output point set
    let mut ridge_segs: FxHashSet<(usize, usize)> = FxHashSet::default();
    for (i0, i1) in constrained {
        if let (Some(Some(a)), Some(Some(b))) = (handles.get(i0), handles.get(i1)) {
            let (oa, ob) = (vmap[a], vmap[b]);
            ridge_segs.insert((oa.min(ob), oa.max(ob)));
        }
    }

    let flip = surfs[surf_idx].flip_flag;
    let surf = &mut surfs[surf_idx];
    surf.mesh.build_from_triangulation(&out_pnts, &tris, flip);
    surf.mesh.set_edge_and_node_flags(&ridge_segs);
}

fn scale_uw(surf: &Surf, uw: Point2, max_u: f64, max_w: f64) -> Point2 {
    let su = surf.u_scale(uw.y / max_w);
    let sw = surf.w_scale(uw.x / max_u);
    Point2::new(su * uw.x, sw * uw.y)
}

fn unscale_uw(surf: &Surf, scaled: Point2, max_u: f64, max_w: f64) -> Point2 {
    // the scale maps are one-directional: only one axis is ever scaled, so
    // the unscaled coordinate of the other axis is exact
    let su = surf.u_scale(scaled.y / max_w);
    let sw = surf.w_scale(scaled.x / max_u);
    let u = f64::clamp(scaled.x / su, 0.0, max_u);
    let w = f64::clamp(scaled.y / sw, 0.0, max_w);
    Point2::new(u, w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isect::Puw;
    use aeromesh_geometry::BezierSurface;

    fn plate() -> Surf {
        let mut surf = Surf::from_geom(
            BezierSurface::plane(
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
            ),
            0,
            0,
        );
        surf.build_dist_map();
        surf
    }

    fn border_chain(ctx: &mut IsectContext, pts: &[Point2]) -> ISegChain {
        let mut chain = ISegChain::new(0, 0);
        chain.border_flag = true;
        for uw in pts {
            let puws = [Puw { surf: 0, uw: *uw }, Puw { surf: 0, uw: *uw }];
            let ip = ctx.new_ipnt(Point3::new(uw.x, uw.y, 0.0), &puws);
            chain.tess.push(ip);
        }
        chain
    }

    #[test]
    fn square_boundary_triangulates() {
        let mut surfs = vec![plate()];
        let mut ctx = IsectContext::default();
        // four border chains around the unit square, 3 points per side
        let sides = [
            [Point2::new(0.0, 0.0), Point2::new(0.5, 0.0), Point2::new(1.0, 0.0)],
            [Point2::new(1.0, 0.0), Point2::new(1.0, 0.5), Point2::new(1.0, 1.0)],
            [Point2::new(1.0, 1.0), Point2::new(0.5, 1.0), Point2::new(0.0, 1.0)],
            [Point2::new(0.0, 1.0), Point2::new(0.0, 0.5), Point2::new(0.0, 0.0)],
        ];
        let chains: Vec<ISegChain> = sides
            .iter()
            .map(|s| border_chain(&mut ctx, s))
            .collect();
        let chain_refs: Vec<&ISegChain> = chains.iter().collect();
        init_surf_mesh(0, &mut surfs, &chain_refs, &mut ctx);
        let mesh = &surfs[0].mesh;
        assert!(mesh.num_faces() >= 2);
        // winding should agree with the +z surface normal
        for f in mesh.face_ids() {
            assert!(mesh.face_normal(f).z > 0.0);
        }
        // boundary nodes are fixed
        let fixed = mesh.node_ids().filter(|n| mesh.node(*n).fixed).count();
        assert!(fixed >= 8);
    }
}
