use crate::surf::Surf;
use crate::*;
use aeromesh_mesh::{EdgeId, NodeId};

/// Squared snap distance for matching two border edges.
const STITCH_DIST2: f64 = 0.01 * 0.01;

#[derive(Clone, Copy, Debug)]
struct BorderEdge {
    surf: usize,
    nodes: [NodeId; 2],
    p0: Point3,
    p1: Point3,
}

/// Collects every face edge missing a neighbor across the selected surfaces
/// (wakes or non-wakes), buckets them spatially, and within each bucket
/// iteratively snaps the closest edge pair together until nothing is within
/// tolerance.
pub fn connect_border_edges(surfs: &mut [Surf], wake_only: bool) {
    let mut edges: Vec<BorderEdge> = Vec::new();
    for (si, surf) in surfs.iter().enumerate() {
        if surf.wake_flag != wake_only {
            continue;
        }
        let mesh = &surf.mesh;
        let mut seen: Vec<EdgeId> = Vec::new();
        for f in mesh.face_ids() {
            for e in mesh.face(f).edges {
                if mesh.edge(e).faces.iter().flatten().count() == 1 && !seen.contains(&e) {
                    seen.push(e);
                    let [n0, n1] = mesh.edge(e).nodes;
                    edges.push(BorderEdge {
                        surf: si,
                        nodes: [n0, n1],
                        p0: mesh.node(n0).pnt,
                        p1: mesh.node(n1).pnt,
                    });
                }
            }
        }
    }
    if edges.len() <= 1 {
        return;
    }

    // bucket over a coarse grid; a single cell today, the slop keeps edges on
    // the cell boundary from being missed if the grid count grows
    let num_grid = 1;
    let mut bbox = BoundingBox::new();
    for e in &edges {
        bbox.push(e.p0);
        bbox.push(e.p1);
    }
    let slop = 1.0e-5;
    let min = bbox.min();
    let cell = |lo: f64, hi: f64| 2.0 * slop + (hi - lo) / num_grid as f64;
    let (dx, dy, dz) = (
        cell(min.x, bbox.max().x),
        cell(min.y, bbox.max().y),
        cell(min.z, bbox.max().z),
    );
    let key_of = |e: &BorderEdge| -> (usize, usize, usize) {
        let mx = f64::min(e.p0.x, e.p1.x);
        let my = f64::min(e.p0.y, e.p1.y);
        let mz = f64::min(e.p0.z, e.p1.z);
        (
            (((mx - min.x + slop) / dx) as usize).min(num_grid - 1),
            (((my - min.y + slop) / dy) as usize).min(num_grid - 1),
            (((mz - min.z + slop) / dz) as usize).min(num_grid - 1),
        )
    };

    let mut buckets: rustc_hash::FxHashMap<(usize, usize, usize), Vec<BorderEdge>> =
        Default::default();
    for e in edges {
        buckets.entry(key_of(&e)).or_default().push(e);
    }
    for bucket in buckets.into_values() {
        match_border_edges(surfs, bucket);
    }
}

fn edge_pos(surfs: &[Surf], e: &BorderEdge) -> (Point3, Point3) {
    let mesh = &surfs[e.surf].mesh;
    (mesh.node(e.nodes[0]).pnt, mesh.node(e.nodes[1]).pnt)
}

fn match_border_edges(surfs: &mut [Surf], mut edges: Vec<BorderEdge>) {
    while edges.len() > 1 {
        // closest pair under both orientations, on live positions
        let mut close = (f64::INFINITY, 0, 0);
        'outer: for i in 0..edges.len() {
            for j in 0..edges.len() {
                if i == j {
                    continue;
                }
                let (e0, e1) = edge_pos(surfs, &edges[i]);
                let (f0, f1) = edge_pos(surfs, &edges[j]);
                let d0011 = e0.distance2(f0) + e1.distance2(f1);
                let d0110 = e0.distance2(f1) + e1.distance2(f0);
                let d = f64::min(d0011, d0110);
                if d < close.0 {
                    close = (d, i, j);
                }
                if close.0 < STITCH_DIST2 {
                    break 'outer;
                }
            }
        }
        let (d, i, j) = close;
        if !d.is_finite() {
            break;
        }
        if d < STITCH_DIST2 {
            // snap the second edge's endpoints onto the first
            let (e0, e1) = edge_pos(surfs, &edges[i]);
            let (f0, f1) = edge_pos(surfs, &edges[j]);
            let d0011 = e0.distance2(f0) + e1.distance2(f1);
            let d0110 = e0.distance2(f1) + e1.distance2(f0);
            let (t0, t1) = match d0011 < d0110 {
                true => (e0, e1),
                false => (e1, e0),
            };
            let f = edges[j];
            let mesh = &mut surfs[f.surf].mesh;
            mesh.node_mut(f.nodes[0]).pnt = t0;
            mesh.node_mut(f.nodes[1]).pnt = t1;
        }
        // matched or hopeless: either way both leave the pool
        let (hi, lo) = (i.max(j), i.min(j));
        edges.swap_remove(hi);
        edges.swap_remove(lo);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aeromesh_base::cgmath64::Point2;

    fn one_tri_surf(shift: f64, wake: bool) -> Surf {
        let mut surf = Surf {
            wake_flag: wake,
            ..Default::default()
        };
        let pnts = vec![
            (Point3::new(0.0, 0.0 + shift, 0.0), Point2::new(0.0, 0.0)),
            (Point3::new(1.0, 0.0 + shift, 0.0), Point2::new(1.0, 0.0)),
            (Point3::new(0.0, 1.0 + shift, 0.0), Point2::new(0.0, 1.0)),
        ];
        surf.mesh
            .build_from_triangulation(&pnts, &[[0, 1, 2]], false);
        surf
    }

    #[test]
    fn nearby_borders_snap_together() {
        // second triangle shares the x axis edge, shifted by less than the
        // stitch tolerance
        let mut surfs = vec![one_tri_surf(0.0, false), one_tri_surf(0.005, false)];
        connect_border_edges(&mut surfs, false);
        // the shifted edge landed exactly on the first surface's edge
        let moved: Vec<Point3> = surfs[1]
            .mesh
            .node_ids()
            .map(|n| surfs[1].mesh.node(n).pnt)
            .collect();
        assert!(moved
            .iter()
            .any(|p| p.distance(Point3::new(0.0, 0.0, 0.0)) < 1.0e-12));
        assert!(moved
            .iter()
            .any(|p| p.distance(Point3::new(1.0, 0.0, 0.0)) < 1.0e-12));
    }

    #[test]
    fn wakes_stitch_separately() {
        let mut surfs = vec![one_tri_surf(0.0, false), one_tri_surf(0.005, true)];
        connect_border_edges(&mut surfs, false);
        // the wake surface was not touched by the non-wake pass
        let wake_pnts: Vec<Point3> = surfs[1]
            .mesh
            .node_ids()
            .map(|n| surfs[1].mesh.node(n).pnt)
            .collect();
        assert!(wake_pnts
            .iter()
            .all(|p| p.distance(Point3::new(0.0, 0.0, 0.0)) > 1.0e-3));
    }
}
