use crate::mesh::*;
use crate::*;

const SPLIT_RATIO: f64 = 1.41;
const COLLAPSE_RATIO: f64 = 0.707;
const NORMAL_MOVE_LIMIT: f64 = std::f64::consts::FRAC_PI_8;
const SWAP_DIHEDRAL_LIMIT: f64 = 0.25 * std::f64::consts::FRAC_PI_4;

fn angle(a: Vector3, b: Vector3) -> f64 {
    let d = a.magnitude() * b.magnitude();
    match d < 1.0e-30 {
        true => 0.0,
        false => f64::acos(f64::clamp(a.dot(b) / d, -1.0, 1.0)),
    }
}

impl WorkMesh {
    /// Target length of one edge: borders freeze at their current length
    /// (when above the minimum), everything else queries the surface map at
    /// the edge midpoint.
    pub fn compute_target_edge_length(&mut self, e: EdgeId, surf: &dyn MeshSurface) {
        let edge = self.edge(e);
        if edge.border && edge.length > surf.min_len() {
            let len = edge.length;
            self.edge_mut(e).target_len = len;
        } else {
            let [n0, n1] = edge.nodes;
            let uw = Point2::from_vec((self.node(n0).uw.to_vec() + self.node(n1).uw.to_vec()) * 0.5);
            self.edge_mut(e).target_len = surf.target_len(uw.x, uw.y);
        }
    }

    fn compute_node_target_lengths(&mut self, n: NodeId, surf: &dyn MeshSurface) {
        for e in self.node(n).edges.clone() {
            self.compute_target_edge_length(e, surf);
        }
    }

    /// Caps every neighbor's target at `grow_ratio` times each edge's target,
    /// visiting edges from the shortest target upward.
    pub fn limit_target_edge_lengths(&mut self, surf: &dyn MeshSurface) {
        use itertools::Itertools;
        let grow = surf.grow_ratio();
        let order: Vec<EdgeId> = self
            .edge_ids()
            .sorted_by(|a, b| {
                self.edge(*a)
                    .target_len
                    .partial_cmp(&self.edge(*b).target_len)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .collect();
        for e in order {
            let limit = grow * self.edge(e).target_len;
            let [n0, n1] = self.edge(e).nodes;
            for n in [n0, n1] {
                for ne in self.node(n).edges.clone() {
                    if !self.edge(ne).border && self.edge(ne).target_len > limit {
                        self.edge_mut(ne).target_len = limit;
                    }
                }
            }
        }
    }

    fn limit_around_node(&mut self, n: NodeId, surf: &dyn MeshSurface) {
        let grow = surf.grow_ratio();
        for e in self.node(n).edges.clone() {
            let limit = grow * self.edge(e).target_len;
            let [n0, n1] = self.edge(e).nodes;
            for m in [n0, n1] {
                for ne in self.node(m).edges.clone() {
                    if !self.edge(ne).border && self.edge(ne).target_len > limit {
                        self.edge_mut(ne).target_len = limit;
                    }
                }
            }
        }
    }

    /// One remeshing pass: recompute targets, then alternate split/collapse,
    /// swap diagonals once, and smooth twice.
    pub fn remesh_pass(&mut self, surf: &dyn MeshSurface) {
        for e in self.edge_ids().collect::<Vec<_>>() {
            self.compute_length(e);
            self.compute_target_edge_length(e, surf);
        }
        self.limit_target_edge_lengths(surf);

        let mut num_split = 1;
        let mut num_collapse = 1;
        for _ in 0..20 {
            if num_split > 0 {
                num_split = self.split_pass(surf);
            }
            if num_collapse > 0 {
                num_collapse = self.collapse_pass(surf);
            }
            if num_split == 0 && num_collapse == 0 {
                break;
            }
        }

        for e in self.edge_ids().collect::<Vec<_>>() {
            if self.edge(e).alive && !self.edge(e).border && !self.edge(e).ridge {
                self.swap_edge(e, surf);
            }
        }

        self.laplacian_smooth(2, surf);
    }

    /// Splits the worst 10% of edges with `len/target > √2`. Returns how many
    /// were over the ratio.
    pub fn split_pass(&mut self, surf: &dyn MeshSurface) -> usize {
        let mut long_edges: Vec<(EdgeId, f64)> = self
            .edge_ids()
            .filter(|e| !self.edge(*e).border)
            .filter_map(|e| {
                let edge = self.edge(e);
                let rat = edge.length / edge.target_len;
                (rat > SPLIT_RATIO).then_some((e, rat))
            })
            .collect();
        long_edges.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let num_split = long_edges.len() / 10;
        for (e, _) in long_edges.iter().take(num_split) {
            if self.edge(*e).alive {
                self.compute_length(*e);
                self.split_edge(*e, surf);
            }
        }
        long_edges.len()
    }

    /// Collapses the worst 10% of edges with `len/target < √2/2`. Returns how
    /// many were under the ratio.
    pub fn collapse_pass(&mut self, surf: &dyn MeshSurface) -> usize {
        let mut short_edges: Vec<(EdgeId, f64)> = self
            .edge_ids()
            .filter(|e| self.valid_collapse(*e))
            .filter_map(|e| {
                let edge = self.edge(e);
                let rat = edge.length / edge.target_len;
                (rat < COLLAPSE_RATIO).then_some((e, rat))
            })
            .collect();
        short_edges.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let num_collapse = short_edges.len() / 10;
        let mut collapsed = 0;
        for (e, _) in short_edges.iter().take(num_collapse) {
            if self.edge(*e).alive && self.valid_collapse(*e) {
                self.compute_length(*e);
                collapsed += 1;
                self.collapse_edge(*e, surf);
            }
        }
        collapsed
    }

    /// Splits one edge at its surface-projected midpoint, fanning the one or
    /// two adjacent faces into four.
    pub fn split_edge(&mut self, e: EdgeId, surf: &dyn MeshSurface) {
        if self.edge(e).border {
            return;
        }
        let fa = self.edge(e).faces[0];
        let fb = self.edge(e).faces[1];
        let [mut n0, mut n1] = self.edge(e).nodes;
        if let Some(f) = fa.or(fb) {
            if !self.face_correct_order(f, n0, n1) {
                std::mem::swap(&mut n0, &mut n1);
            }
        }

        let psplit = Point3::from_vec((self.node(n0).pnt.to_vec() + self.node(n1).pnt.to_vec()) * 0.5);
        let uwsplit = Point2::from_vec((self.node(n0).uw.to_vec() + self.node(n1).uw.to_vec()) * 0.5);
        let (u, w) = surf.closest_uw(psplit, (uwsplit.x, uwsplit.y));
        let ps = surf.point(u, w);

        let ns = self.add_node(ps, Point2::new(u, w));
        let es0 = self.add_edge(n0, ns);
        let es1 = self.add_edge(ns, n1);
        let ridge = self.edge(e).ridge;
        self.edge_mut(es0).ridge = ridge;
        self.edge_mut(es1).ridge = ridge;
        if ridge {
            self.node_mut(ns).fixed = true;
        }

        if let Some(fa) = fa {
            let na = self.face_other_node(fa, n0, n1);
            let ea = self.add_edge(na, ns);
            let ea0 = self.face_find_edge(fa, n0, na).expect("broken face loop");
            let ea1 = self.face_find_edge(fa, na, n1).expect("broken face loop");
            self.detach_face_from_edge(ea0, fa);
            self.detach_face_from_edge(ea1, fa);
            self.add_face([n0, ns, na], [es0, ea, ea0]);
            self.add_face([n1, na, ns], [ea1, ea, es1]);
            self.remove_face(fa);
        }
        if let Some(fb) = fb {
            let nb = self.face_other_node(fb, n0, n1);
            let eb = self.add_edge(ns, nb);
            let eb0 = self.face_find_edge(fb, n0, nb).expect("broken face loop");
            let eb1 = self.face_find_edge(fb, nb, n1).expect("broken face loop");
            self.detach_face_from_edge(eb0, fb);
            self.detach_face_from_edge(eb1, fb);
            self.add_face([n0, nb, ns], [eb0, eb, es0]);
            self.add_face([n1, ns, nb], [es1, eb, eb1]);
            self.remove_face(fb);
        }
        self.remove_edge(e);

        self.compute_node_target_lengths(ns, surf);
        self.limit_around_node(ns, surf);
    }

    /// Whether collapsing `e` keeps the local topology a disk.
    pub fn valid_collapse(&self, e: EdgeId) -> bool {
        let edge = self.edge(e);
        if !edge.alive || edge.border || edge.ridge {
            return false;
        }
        let [n0, n1] = edge.nodes;
        if self.node(n0).fixed && self.node(n1).fixed {
            return false;
        }
        let (fa, fb) = match edge.faces {
            [Some(fa), Some(fb)] => (fa, fb),
            _ => return false,
        };
        let na = self.face_other_node(fa, n0, n1);
        let nb = self.face_other_node(fb, n0, n1);
        if na == nb {
            return false;
        }

        let check_wing = |f: FaceId, apex: NodeId| -> bool {
            let e0 = self.face_find_edge(f, n0, apex);
            let e1 = self.face_find_edge(f, n1, apex);
            let (e0, e1) = match (e0, e1) {
                (Some(a), Some(b)) => (a, b),
                _ => return false,
            };
            let f0 = self.edge_other_face(e0, f);
            let f1 = self.edge_other_face(e1, f);
            if let (Some(f0), Some(f1)) = (f0, f1) {
                let m0 = self.face_other_node(f0, n0, apex);
                let m1 = self.face_other_node(f1, n1, apex);
                if m0 == m1 {
                    return false;
                }
            }
            true
        };
        check_wing(fa, na) && check_wing(fb, nb)
    }

    /// Whether moving `n` to `move_to` keeps every incident face normal
    /// within π/8 of its current direction.
    pub fn valid_node_move(
        &mut self,
        n: NodeId,
        move_to: Point3,
        ignore: [Option<FaceId>; 2],
    ) -> bool {
        let faces: Vec<FaceId> = self
            .node_faces(n)
            .into_iter()
            .filter(|f| !ignore.contains(&Some(*f)))
            .collect();
        let before: Vec<Vector3> = faces.iter().map(|f| self.face_normal(*f)).collect();
        let save = self.node(n).pnt;
        self.node_mut(n).pnt = move_to;
        let valid = faces
            .iter()
            .zip(before.iter())
            .all(|(f, n0)| angle(self.face_normal(*f), *n0) < NORMAL_MOVE_LIMIT);
        self.node_mut(n).pnt = save;
        valid
    }

    /// Collapses `e`, merging its endpoints into one node at the projected
    /// midpoint (or the fixed endpoint when one end is fixed).
    pub fn collapse_edge(&mut self, e: EdgeId, surf: &dyn MeshSurface) {
        let [n0, n1] = self.edge(e).nodes;
        let (fa, fb) = match self.edge(e).faces {
            [Some(fa), Some(fb)] => (fa, fb),
            _ => return,
        };
        let na = self.face_other_node(fa, n0, n1);
        let nb = self.face_other_node(fb, n0, n1);

        let (pc, uwc) = if self.node(n0).fixed {
            (self.node(n0).pnt, self.node(n0).uw)
        } else if self.node(n1).fixed {
            (self.node(n1).pnt, self.node(n1).uw)
        } else {
            let psplit =
                Point3::from_vec((self.node(n0).pnt.to_vec() + self.node(n1).pnt.to_vec()) * 0.5);
            let uwsplit =
                Point2::from_vec((self.node(n0).uw.to_vec() + self.node(n1).uw.to_vec()) * 0.5);
            let (u, w) = surf.closest_uw(psplit, (uwsplit.x, uwsplit.y));
            (surf.point(u, w), Point2::new(u, w))
        };

        if !self.valid_node_move(n0, pc, [Some(fa), Some(fb)])
            || !self.valid_node_move(n1, pc, [Some(fa), Some(fb)])
        {
            return;
        }

        let ea0 = self.face_find_edge(fa, na, n0).expect("broken face loop");
        let ea1 = self.face_find_edge(fa, na, n1).expect("broken face loop");
        let eb0 = self.face_find_edge(fb, nb, n0).expect("broken face loop");
        let eb1 = self.face_find_edge(fb, nb, n1).expect("broken face loop");

        let nc = self.add_node(pc, uwc);
        if self.node(n0).fixed || self.node(n1).fixed {
            self.node_mut(nc).fixed = true;
        }
        let eca = self.add_edge(na, nc);
        let ecb = self.add_edge(nb, nc);
        if self.edge(ea0).border || self.edge(ea1).border {
            self.edge_mut(eca).border = true;
        }
        if self.edge(eb0).border || self.edge(eb1).border {
            self.edge_mut(ecb).border = true;
        }
        if self.edge(ea0).ridge || self.edge(ea1).ridge {
            self.edge_mut(eca).ridge = true;
        }
        if self.edge(eb0).ridge || self.edge(eb1).ridge {
            self.edge_mut(ecb).ridge = true;
        }

        // rewire the surviving faces around the dying pair
        self.remove_face(fa);
        self.remove_face(fb);
        for (old, merged) in [(ea0, eca), (ea1, eca), (eb0, ecb), (eb1, ecb)] {
            if let Some(f) = self.edge(old).faces.into_iter().flatten().next() {
                self.face_replace_edge(f, old, merged);
                self.attach_face(merged, f);
            }
            self.remove_edge(old);
        }
        self.remove_edge(e);

        for n_old in [n0, n1] {
            for edge_id in self.node(n_old).edges.clone() {
                // re-point the remaining spokes at the merged node
                for slot in 0..2 {
                    if self.edge(edge_id).nodes[slot] == n_old {
                        self.edge_mut(edge_id).nodes[slot] = nc;
                    }
                }
                self.node_mut(nc).edges.push(edge_id);
                for f in self.edge(edge_id).faces.into_iter().flatten() {
                    self.face_replace_node(f, n_old, nc);
                }
            }
            self.node_mut(n_old).edges.clear();
            self.remove_node(n_old);
        }
        // faces of merged edges may still reference the dead endpoints
        for f in self.node_faces(nc) {
            self.face_replace_node(f, n0, nc);
            self.face_replace_node(f, n1, nc);
        }

        self.compute_node_target_lengths(nc, surf);
        self.limit_around_node(nc, surf);
        for e2 in self.node(nc).edges.clone() {
            self.compute_length(e2);
        }
    }

    fn three_edges_three_faces(&self, e: EdgeId) -> bool {
        let [n0, n1] = self.edge(e).nodes;
        for n in [n0, n1] {
            if self.node(n).edges.len() == 3 && self.node_faces(n).len() == 3 {
                return true;
            }
        }
        false
    }

    /// Swaps the diagonal of the two faces on `e` when that improves the
    /// worse triangle and bends no normal past the dihedral cap.
    pub fn swap_edge(&mut self, e: EdgeId, surf: &dyn MeshSurface) {
        if self.edge(e).border || self.edge(e).ridge {
            return;
        }
        let (fa, fb) = match self.edge(e).faces {
            [Some(fa), Some(fb)] => (fa, fb),
            _ => return,
        };
        if self.three_edges_three_faces(e) {
            return;
        }
        let [mut n0, mut n1] = self.edge(e).nodes;
        if !self.face_correct_order(fa, n0, n1) {
            std::mem::swap(&mut n0, &mut n1);
        }
        let na = self.face_other_node(fa, n0, n1);
        let nb = self.face_other_node(fb, n0, n1);
        if na == nb {
            return;
        }

        let qa = self.face_quality(fa);
        let qb = self.face_quality(fb);
        let qc = self.quality_of(n0, nb, na);
        let qd = self.quality_of(n1, na, nb);
        if f64::min(qc, qd) <= f64::min(qa, qb) {
            return;
        }

        let normal_of = |m: &Self, a: NodeId, b: NodeId, c: NodeId| {
            let (pa, pb, pc) = (m.node(a).pnt, m.node(b).pnt, m.node(c).pnt);
            (pb - pa).cross(pc - pa)
        };
        let norma = self.face_normal(fa);
        let normb = self.face_normal(fb);
        let normc = normal_of(self, n0, nb, na);
        let normd = normal_of(self, n1, na, nb);
        if angle(norma, normb) > SWAP_DIHEDRAL_LIMIT
            || angle(normc, normd) > SWAP_DIHEDRAL_LIMIT
            || angle(norma, normc) > SWAP_DIHEDRAL_LIMIT
        {
            return;
        }

        let ea0 = self.face_find_edge(fa, n0, na).expect("broken face loop");
        let ea1 = self.face_find_edge(fa, na, n1).expect("broken face loop");
        let eb0 = self.face_find_edge(fb, n0, nb).expect("broken face loop");
        let eb1 = self.face_find_edge(fb, nb, n1).expect("broken face loop");

        // re-point the diagonal
        self.nodes[n0.idx()].edges.retain(|x| *x != e);
        self.nodes[n1.idx()].edges.retain(|x| *x != e);
        self.edge_mut(e).nodes = [na, nb];
        self.nodes[na.idx()].edges.push(e);
        self.nodes[nb.idx()].edges.push(e);
        self.compute_length(e);
        self.compute_target_edge_length(e, surf);

        self.faces[fa.idx()].nodes = [n0, nb, na];
        self.faces[fa.idx()].edges = [eb0, e, ea0];
        self.faces[fb.idx()].nodes = [n1, na, nb];
        self.faces[fb.idx()].edges = [ea1, e, eb1];

        // move the outer edges' face refs across the swap
        for slot in self.edges[ea1.idx()].faces.iter_mut() {
            if *slot == Some(fa) {
                *slot = Some(fb);
            }
        }
        for slot in self.edges[eb0.idx()].faces.iter_mut() {
            if *slot == Some(fb) {
                *slot = Some(fa);
            }
        }

        self.limit_around_node(na, surf);
        self.limit_around_node(nb, surf);
    }

    /// Area-weighted Laplacian smoothing of non-fixed nodes toward the
    /// weighted centroid of incident triangle centroids, step 0.1,
    /// re-projected onto the surface.
    pub fn laplacian_smooth(&mut self, num_iter: usize, surf: &dyn MeshSurface) {
        for _ in 0..num_iter {
            for n in self.node_ids().collect::<Vec<_>>() {
                if self.node(n).fixed {
                    continue;
                }
                let faces = self.node_faces(n);
                if faces.is_empty() {
                    continue;
                }
                let mut sum_area = 0.0;
                let mut move_pnt = Vector3::new(0.0, 0.0, 0.0);
                let mut move_uw = Vector2::new(0.0, 0.0);
                let areas: Vec<f64> = faces.iter().map(|f| self.face_area(*f)).collect();
                sum_area += areas.iter().sum::<f64>();
                if sum_area < 1.0e-12 {
                    continue;
                }
                for (f, area) in faces.iter().zip(areas.iter()) {
                    let frac = area / sum_area;
                    move_pnt += self.face_center(*f).to_vec() * frac;
                    move_uw += self.face_center_uw(*f).to_vec() * frac;
                }
                let (u, w) = surf.closest_uw(Point3::from_vec(move_pnt), (move_uw.x, move_uw.y));
                let uw = self.node(n).uw;
                let new_uw = uw + (Point2::new(u, w) - uw) * 0.1;
                self.node_mut(n).uw = new_uw;
                self.node_mut(n).pnt = surf.point(new_uw.x, new_uw.y);
            }
        }
        for e in self.edge_ids().collect::<Vec<_>>() {
            self.compute_length(e);
        }
    }

    /// Collapses the longest edge of any face whose winding disagrees with
    /// the surface normal (flip flag accounted). Returns how many reversed
    /// faces were seen.
    pub fn remove_reversed_faces(&mut self, surf: &dyn MeshSurface) -> usize {
        let mut bad_edges = Vec::new();
        let mut bad_count = 0;
        for f in self.face_ids().collect::<Vec<_>>() {
            let nface = self.face_normal(f);
            let c = self.face_center_uw(f);
            let pc = self.face_center(f);
            let (u, w) = surf.closest_uw(pc, (c.x, c.y));
            let mut nsurf = surf.normal(u, w);
            if surf.flip_normal() {
                nsurf = -nsurf;
            }
            if nface.dot(nsurf) < 0.0 {
                // longest edge of the face
                let longest = self
                    .face(f)
                    .edges
                    .into_iter()
                    .max_by(|a, b| {
                        self.edge(*a)
                            .length
                            .partial_cmp(&self.edge(*b).length)
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .unwrap();
                bad_edges.push(longest);
                bad_count += 1;
            }
        }
        for e in bad_edges {
            if self.edge(e).alive && self.valid_collapse(e) {
                self.collapse_edge(e, surf);
            }
        }
        bad_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    /// flat unit square surface for exercising the operators
    #[derive(Debug)]
    struct FlatSurf {
        target: f64,
    }

    impl MeshSurface for FlatSurf {
        fn point(&self, u: f64, w: f64) -> Point3 { Point3::new(u, w, 0.0) }
        fn normal(&self, _: f64, _: f64) -> Vector3 { Vector3::unit_z() }
        fn closest_uw(&self, pnt: Point3, _: (f64, f64)) -> (f64, f64) { (pnt.x, pnt.y) }
        fn target_len(&self, _: f64, _: f64) -> f64 { self.target }
        fn min_len(&self) -> f64 { 1.0e-3 }
        fn grow_ratio(&self) -> f64 { 1.3 }
        fn flip_normal(&self) -> bool { false }
    }

    fn two_tri_square(mesh: &mut WorkMesh) {
        let pnts = vec![
            (Point3::new(0.0, 0.0, 0.0), Point2::new(0.0, 0.0)),
            (Point3::new(1.0, 0.0, 0.0), Point2::new(1.0, 0.0)),
            (Point3::new(1.0, 1.0, 0.0), Point2::new(1.0, 1.0)),
            (Point3::new(0.0, 1.0, 0.0), Point2::new(0.0, 1.0)),
        ];
        let tris = vec![[0, 1, 2], [0, 2, 3]];
        mesh.build_from_triangulation(&pnts, &tris, false);
        mesh.set_edge_and_node_flags(&FxHashSet::default());
    }

    #[test]
    fn border_flags_and_fixed_nodes() {
        let mut mesh = WorkMesh::new();
        two_tri_square(&mut mesh);
        let borders = mesh
            .edge_ids()
            .filter(|e| mesh.edge(*e).border)
            .count();
        assert_eq!(borders, 4);
        // every node touches a border here
        assert!(mesh.node_ids().all(|n| mesh.node(n).fixed));
    }

    #[test]
    fn split_interior_edge_makes_four_faces() {
        let mut mesh = WorkMesh::new();
        two_tri_square(&mut mesh);
        let surf = FlatSurf { target: 0.5 };
        let diag = mesh
            .edge_ids()
            .find(|e| !mesh.edge(*e).border)
            .expect("no diagonal");
        for e in mesh.edge_ids().collect::<Vec<_>>() {
            mesh.compute_target_edge_length(e, &surf);
        }
        mesh.split_edge(diag, &surf);
        assert_eq!(mesh.num_faces(), 4);
        // the new node sits at the square center
        let center = mesh
            .node_ids()
            .map(|n| mesh.node(n).pnt)
            .find(|p| p.distance(Point3::new(0.5, 0.5, 0.0)) < 1.0e-12);
        assert!(center.is_some());
    }

    #[test]
    fn collapse_restores_two_faces() {
        let mut mesh = WorkMesh::new();
        two_tri_square(&mut mesh);
        let surf = FlatSurf { target: 2.0 };
        let diag = mesh.edge_ids().find(|e| !mesh.edge(*e).border).unwrap();
        for e in mesh.edge_ids().collect::<Vec<_>>() {
            mesh.compute_target_edge_length(e, &surf);
        }
        mesh.split_edge(diag, &surf);
        assert_eq!(mesh.num_faces(), 4);
        // collapse one of the four spokes around the center node
        let center = mesh
            .node_ids()
            .find(|n| mesh.node(*n).pnt.distance(Point3::new(0.5, 0.5, 0.0)) < 1.0e-12)
            .unwrap();
        let spoke = mesh
            .node(center)
            .edges
            .iter()
            .copied()
            .find(|e| mesh.valid_collapse(*e));
        if let Some(spoke) = spoke {
            mesh.collapse_edge(spoke, &surf);
            assert_eq!(mesh.num_faces(), 2);
        }
    }

    #[test]
    fn remesh_refines_toward_target() {
        let mut mesh = WorkMesh::new();
        two_tri_square(&mut mesh);
        let surf = FlatSurf { target: 0.35 };
        for _ in 0..10 {
            mesh.remesh_pass(&surf);
        }
        assert!(mesh.num_faces() > 4);
        // interior edges should approach the target band
        let mut within = 0;
        let mut interior = 0;
        for e in mesh.edge_ids().collect::<Vec<_>>() {
            if !mesh.edge(e).border {
                interior += 1;
                let rat = mesh.edge(e).length / mesh.edge(e).target_len;
                if rat > COLLAPSE_RATIO && rat < SPLIT_RATIO {
                    within += 1;
                }
            }
        }
        if interior > 0 {
            assert!(within * 2 >= interior);
        }
    }
}
