use crate::simp::TriMesh;
use crate::*;
use aeromesh_base::binning::scalar_bin_id;
use rustc_hash::FxHashMap;

/// Deduplicating index over a set of 3D points (1e-12 per coordinate).
#[derive(Debug, Default)]
pub struct PointIndexMap {
    bins: FxHashMap<i64, Vec<usize>>,
    pnts: Vec<Point3>,
}

impl PointIndexMap {
    const TOL: f64 = 1.0e-12;

    /// Creates an empty map.
    pub fn new() -> Self { Self::default() }

    /// The unique points added so far.
    pub fn pnts(&self) -> &[Point3] { &self.pnts }

    /// Finds the index of a point seen before.
    pub fn find(&self, p: Point3) -> Option<usize> {
        let key = scalar_bin_id(p);
        for adj in [key - 1, key, key + 1] {
            if let Some(cands) = self.bins.get(&adj) {
                for i in cands {
                    let d = p - self.pnts[*i];
                    if d.x.abs() < Self::TOL && d.y.abs() < Self::TOL && d.z.abs() < Self::TOL {
                        return Some(*i);
                    }
                }
            }
        }
        None
    }

    /// Finds the index of `p`, inserting it when unseen.
    pub fn find_or_add(&mut self, p: Point3) -> usize {
        if let Some(i) = self.find(p) {
            return i;
        }
        let i = self.pnts.len();
        self.bins.entry(scalar_bin_id(p)).or_default().push(i);
        self.pnts.push(p);
        i
    }
}

/// Result of the edge-multiplicity scan over the final meshes.
#[derive(Clone, Debug, Default)]
pub struct WatertightReport {
    /// edges with fewer than two incident triangles
    pub border_edges: usize,
    /// edges with more than two incident triangles
    pub over_shared_edges: usize,
    /// `(mesh index, triangle index)` of triangles on an over-shared edge
    pub bad_tris: Vec<(usize, usize)>,
}

impl WatertightReport {
    /// Whether every edge is shared by exactly two triangles.
    pub fn is_watertight(&self) -> bool {
        self.border_edges == 0 && self.over_shared_edges == 0
    }

    /// The single-line report string.
    pub fn to_report_string(&self) -> String {
        match self.is_watertight() {
            true => "Is Water Tight\n".to_string(),
            false => format!(
                "NOT Water Tight : {} Border Edges, {} Edges > 2 Tris\n",
                self.border_edges, self.over_shared_edges
            ),
        }
    }
}

/// Rebuilds edge multiplicity across all `meshes` (points merged globally)
/// and counts border and over-shared edges.
pub fn watertight_report(meshes: &[&TriMesh]) -> WatertightReport {
    let mut index = PointIndexMap::new();
    // edge key sum -> (lo, hi, count) entries
    let mut edge_map: FxHashMap<usize, Vec<(usize, usize, usize)>> = FxHashMap::default();
    let mut report = WatertightReport::default();

    let mut tri_edges: Vec<(usize, usize, [usize; 3])> = Vec::new();
    for (mi, mesh) in meshes.iter().enumerate() {
        for (ti, tri) in mesh.tris.iter().enumerate() {
            let i0 = index.find_or_add(mesh.pnts[tri.ind0]);
            let i1 = index.find_or_add(mesh.pnts[tri.ind1]);
            let i2 = index.find_or_add(mesh.pnts[tri.ind2]);
            let mut eids = [0usize; 3];
            for (k, (a, b)) in [(i0, i1), (i1, i2), (i2, i0)].into_iter().enumerate() {
                let (lo, hi) = (a.min(b), a.max(b));
                let bucket = edge_map.entry(lo + hi).or_default();
                match bucket.iter_mut().enumerate().find(|(_, e)| e.0 == lo && e.1 == hi) {
                    Some((pos, entry)) => {
                        entry.2 += 1;
                        eids[k] = (lo + hi) << 16 | pos;
                    }
                    None => {
                        bucket.push((lo, hi, 1));
                        eids[k] = (lo + hi) << 16 | (bucket.len() - 1);
                    }
                }
            }
            tri_edges.push((mi, ti, eids));
        }
    }

    let mut over: rustc_hash::FxHashSet<usize> = Default::default();
    for (sum, bucket) in &edge_map {
        for (pos, (_, _, count)) in bucket.iter().enumerate() {
            if *count < 2 {
                report.border_edges += 1;
            } else if *count > 2 {
                report.over_shared_edges += 1;
                over.insert((*sum << 16) | pos);
            }
        }
    }
    if !over.is_empty() {
        for (mi, ti, eids) in &tri_edges {
            if eids.iter().any(|e| over.contains(e)) {
                report.bad_tris.push((*mi, *ti));
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simp::SimpTri;

    fn tetrahedron() -> TriMesh {
        let p = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let tri = |a: usize, b: usize, c: usize| SimpTri {
            ind0: a,
            ind1: b,
            ind2: c,
            tags: vec![1],
        };
        TriMesh {
            pnts: p.to_vec(),
            uws: vec![Point2::new(0.0, 0.0); 4],
            tris: vec![tri(0, 2, 1), tri(0, 1, 3), tri(1, 2, 3), tri(0, 3, 2)],
        }
    }

    #[test]
    fn closed_tet_is_watertight() {
        let mesh = tetrahedron();
        let report = watertight_report(&[&mesh]);
        assert!(report.is_watertight());
        assert_eq!(report.to_report_string(), "Is Water Tight\n");
    }

    #[test]
    fn missing_face_reports_borders() {
        let mut mesh = tetrahedron();
        mesh.tris.pop();
        let report = watertight_report(&[&mesh]);
        assert_eq!(report.border_edges, 3);
        assert_eq!(report.over_shared_edges, 0);
        assert!(report.to_report_string().starts_with("NOT Water Tight : 3"));
    }

    #[test]
    fn point_map_merges_across_meshes() {
        let mesh = tetrahedron();
        let report = watertight_report(&[&mesh, &TriMesh::default()]);
        assert!(report.is_watertight());

        let mut index = PointIndexMap::new();
        let a = index.find_or_add(Point3::new(0.5, 0.5, 0.5));
        let b = index.find_or_add(Point3::new(0.5, 0.5, 0.5 + 1.0e-13));
        let c = index.find_or_add(Point3::new(0.5, 0.5, 0.6));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
