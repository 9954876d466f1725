use crate::mesh::WorkMesh;
use crate::*;
use aeromesh_base::binning::scalar_bin_id;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// One packed triangle: indices into the owning [`TriMesh`] point vector plus
/// its sorted tag list (base surface tag first).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpTri {
    /// first corner
    pub ind0: usize,
    /// second corner
    pub ind1: usize,
    /// third corner
    pub ind2: usize,
    /// base tag plus any subsurface tags
    pub tags: Vec<u32>,
}

/// Packed per-surface triangle mesh, frozen from a [`WorkMesh`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TriMesh {
    /// 3D positions
    pub pnts: Vec<Point3>,
    /// parameter-space positions
    pub uws: Vec<Point2>,
    /// triangles
    pub tris: Vec<SimpTri>,
}

impl TriMesh {
    /// Packs the live, non-deleted faces of a work mesh, three points per
    /// triangle; call [`condense`](Self::condense) to deduplicate.
    pub fn load(mesh: &WorkMesh) -> Self {
        let mut out = TriMesh::default();
        for f in mesh.face_ids() {
            let face = mesh.face(f);
            if face.delete_me {
                continue;
            }
            let base = out.pnts.len();
            for n in face.nodes {
                out.pnts.push(mesh.node(n).pnt);
                out.uws.push(mesh.node(n).uw);
            }
            out.tris.push(SimpTri {
                ind0: base,
                ind1: base + 1,
                ind2: base + 2,
                tags: Vec::new(),
            });
        }
        out
    }

    /// Merges coincident points (1e-8 per coordinate) and rewrites triangle
    /// indices.
    pub fn condense(&mut self) {
        let tol = 1.0e-8;
        let mut ind_map: FxHashMap<i64, Vec<usize>> = FxHashMap::default();
        let mut canon = vec![usize::MAX; self.pnts.len()];
        for i in 0..self.pnts.len() {
            let key = scalar_bin_id(self.pnts[i]);
            let mut found = None;
            for adj in [key - 1, key, key + 1] {
                if let Some(cands) = ind_map.get(&adj) {
                    for j in cands {
                        let d = self.pnts[i] - self.pnts[*j];
                        if d.x.abs() < tol && d.y.abs() < tol && d.z.abs() < tol {
                            found = Some(*j);
                            break;
                        }
                    }
                }
                if found.is_some() {
                    break;
                }
            }
            match found {
                Some(j) => canon[i] = j,
                None => {
                    ind_map.entry(key).or_default().push(i);
                    canon[i] = i;
                }
            }
        }

        let mut new_index = vec![usize::MAX; self.pnts.len()];
        let mut pnts = Vec::new();
        let mut uws = Vec::new();
        for i in 0..self.pnts.len() {
            if canon[i] == i {
                new_index[i] = pnts.len();
                pnts.push(self.pnts[i]);
                uws.push(self.uws[i]);
            }
        }
        for tri in &mut self.tris {
            tri.ind0 = new_index[canon[tri.ind0]];
            tri.ind1 = new_index[canon[tri.ind1]];
            tri.ind2 = new_index[canon[tri.ind2]];
        }
        self.pnts = pnts;
        self.uws = uws;
    }

    /// Stretches wake points past `start_x`: `x += (scale−1)·fract²·(x−start)`
    /// with `z` re-projected along the wake angle (degrees).
    pub fn stretch_x(&mut self, start_x: f64, end_x: f64, scale: f64, angle_deg: f64) {
        let factor = scale - 1.0;
        let tan_a = f64::tan(angle_deg.to_radians());
        if (end_x - start_x).abs() < 1.0e-12 {
            return;
        }
        for p in &mut self.pnts {
            if p.x > start_x {
                let numer = p.x - start_x;
                let fract = numer / (end_x - start_x);
                let xx = start_x + numer * (1.0 + factor * fract * fract);
                p.z += (xx - p.x) * tan_a;
                p.x = xx;
            }
        }
    }

    /// Centroid of one triangle.
    pub fn tri_center(&self, t: &SimpTri) -> Point3 {
        Point3::from_vec(
            (self.pnts[t.ind0].to_vec() + self.pnts[t.ind1].to_vec() + self.pnts[t.ind2].to_vec())
                / 3.0,
        )
    }

    /// Parameter-space centroid of one triangle.
    pub fn tri_center_uw(&self, t: &SimpTri) -> Point2 {
        Point2::from_vec(
            (self.uws[t.ind0].to_vec() + self.uws[t.ind1].to_vec() + self.uws[t.ind2].to_vec())
                / 3.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condense_merges_shared_corners() {
        let mut mesh = TriMesh {
            pnts: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            uws: vec![Point2::new(0.0, 0.0); 6],
            tris: vec![
                SimpTri {
                    ind0: 0,
                    ind1: 1,
                    ind2: 2,
                    tags: vec![1],
                },
                SimpTri {
                    ind0: 3,
                    ind1: 4,
                    ind2: 5,
                    tags: vec![1],
                },
            ],
        };
        mesh.condense();
        assert_eq!(mesh.pnts.len(), 4);
        assert_eq!(mesh.tris[1].ind0, 1);
        assert_eq!(mesh.tris[1].ind2, 2);
    }

    #[test]
    fn stretch_moves_only_past_start() {
        let mut mesh = TriMesh {
            pnts: vec![Point3::new(0.5, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)],
            uws: vec![Point2::new(0.0, 0.0); 2],
            tris: Vec::new(),
        };
        mesh.stretch_x(1.0, 3.0, 2.0, 0.0);
        assert_eq!(mesh.pnts[0].x, 0.5);
        // numer = 1, fract = 0.5 -> x = 1 + 1*(1 + 1*0.25) = 2.25
        assert!((mesh.pnts[1].x - 2.25).abs() < 1.0e-12);
    }
}
