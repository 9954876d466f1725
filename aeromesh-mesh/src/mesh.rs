use crate::*;
use serde::{Deserialize, Serialize};

macro_rules! handle {
    ($(#[$doc: meta])* $name: ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            /// index into the arena
            #[inline(always)]
            pub fn idx(self) -> usize { self.0 as usize }
        }
    };
}

handle!(
    /// handle of a mesh vertex
    NodeId
);
handle!(
    /// handle of a mesh edge
    EdgeId
);
handle!(
    /// handle of a mesh triangle
    FaceId
);

/// Mesh vertex.
#[derive(Clone, Debug)]
pub struct Node {
    /// 3D position
    pub pnt: Point3,
    /// parameter-space position on the owning surface
    pub uw: Point2,
    /// frozen during collapse and smoothing (border / ridge vertices)
    pub fixed: bool,
    /// incident edges
    pub edges: Vec<EdgeId>,
    pub(crate) alive: bool,
}

/// Mesh edge with up to two incident faces.
#[derive(Clone, Debug)]
pub struct Edge {
    /// endpoint nodes
    pub nodes: [NodeId; 2],
    /// incident faces
    pub faces: [Option<FaceId>; 2],
    /// open boundary of the surface mesh; never split or collapsed
    pub border: bool,
    /// interior constraint; never collapsed or swapped, may be split
    pub ridge: bool,
    /// wanted 3D length
    pub target_len: f64,
    /// cached 3D length
    pub length: f64,
    pub(crate) alive: bool,
}

/// Mesh triangle.
#[derive(Clone, Debug, Default)]
pub struct Face {
    /// corner nodes, winding defines the normal
    pub nodes: [NodeId; 3],
    /// edges opposite to nothing in particular, one per side
    pub edges: [EdgeId; 3],
    /// per-component inside flag, filled during classification
    pub inside: Vec<bool>,
    /// per-component neighborhood vote, filled during classification
    pub vote: Vec<i32>,
    /// marked for removal
    pub delete_me: bool,
    pub(crate) alive: bool,
}

impl Default for Node {
    fn default() -> Self {
        Node {
            pnt: Point3::new(0.0, 0.0, 0.0),
            uw: Point2::new(0.0, 0.0),
            fixed: false,
            edges: Vec::new(),
            alive: false,
        }
    }
}

impl Default for Edge {
    fn default() -> Self {
        Edge {
            nodes: [NodeId(0); 2],
            faces: [None; 2],
            border: false,
            ridge: false,
            target_len: 0.0,
            length: 0.0,
            alive: false,
        }
    }
}

impl Default for FaceId {
    fn default() -> Self { FaceId(0) }
}
impl Default for EdgeId {
    fn default() -> Self { EdgeId(0) }
}
impl Default for NodeId {
    fn default() -> Self { NodeId(0) }
}

/// Editable triangle mesh of one surface, on u32 handle arenas.
///
/// Removed entities stay in the arena with `alive = false`; iteration skips
/// them and `dump_garbage` is implicit in the packed output step.
#[derive(Clone, Debug, Default)]
pub struct WorkMesh {
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) faces: Vec<Face>,
}

impl WorkMesh {
    /// Creates an empty mesh.
    pub fn new() -> Self { Self::default() }

    /// Drops every node, edge and face.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.faces.clear();
    }

    /// Number of live faces.
    pub fn num_faces(&self) -> usize { self.faces.iter().filter(|f| f.alive).count() }

    /// Live node ids.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.alive)
            .map(|(i, _)| NodeId(i as u32))
    }

    /// Live edge ids.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.alive)
            .map(|(i, _)| EdgeId(i as u32))
    }

    /// Live face ids.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.alive)
            .map(|(i, _)| FaceId(i as u32))
    }

    /// Shared access to a node.
    #[inline(always)]
    pub fn node(&self, id: NodeId) -> &Node { &self.nodes[id.idx()] }

    /// Mutable access to a node.
    #[inline(always)]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node { &mut self.nodes[id.idx()] }

    /// Shared access to an edge.
    #[inline(always)]
    pub fn edge(&self, id: EdgeId) -> &Edge { &self.edges[id.idx()] }

    /// Mutable access to an edge.
    #[inline(always)]
    pub fn edge_mut(&mut self, id: EdgeId) -> &mut Edge { &mut self.edges[id.idx()] }

    /// Shared access to a face.
    #[inline(always)]
    pub fn face(&self, id: FaceId) -> &Face { &self.faces[id.idx()] }

    /// Mutable access to a face.
    #[inline(always)]
    pub fn face_mut(&mut self, id: FaceId) -> &mut Face { &mut self.faces[id.idx()] }

    /// Adds a vertex.
    pub fn add_node(&mut self, pnt: Point3, uw: Point2) -> NodeId {
        self.nodes.push(Node {
            pnt,
            uw,
            fixed: false,
            edges: Vec::new(),
            alive: true,
        });
        NodeId(self.nodes.len() as u32 - 1)
    }

    /// Removes a vertex (must have no incident edges left).
    pub fn remove_node(&mut self, id: NodeId) {
        debug_assert!(self.nodes[id.idx()].edges.is_empty());
        self.nodes[id.idx()].alive = false;
    }

    /// Adds an edge between two vertices and registers it on both.
    pub fn add_edge(&mut self, n0: NodeId, n1: NodeId) -> EdgeId {
        let id = EdgeId(self.edges.len() as u32);
        let length = self.node(n0).pnt.distance(self.node(n1).pnt);
        self.edges.push(Edge {
            nodes: [n0, n1],
            faces: [None; 2],
            border: false,
            ridge: false,
            target_len: length,
            length,
            alive: true,
        });
        self.nodes[n0.idx()].edges.push(id);
        self.nodes[n1.idx()].edges.push(id);
        id
    }

    /// Removes an edge, detaching it from its nodes.
    pub fn remove_edge(&mut self, id: EdgeId) {
        let [n0, n1] = self.edges[id.idx()].nodes;
        self.nodes[n0.idx()].edges.retain(|e| *e != id);
        self.nodes[n1.idx()].edges.retain(|e| *e != id);
        self.edges[id.idx()].alive = false;
    }

    /// Finds the live edge between two vertices.
    pub fn find_edge(&self, n0: NodeId, n1: NodeId) -> Option<EdgeId> {
        self.node(n0)
            .edges
            .iter()
            .copied()
            .find(|e| self.edge(*e).alive && self.edge_other_node(*e, n0) == Some(n1))
    }

    /// Finds the live edge or creates it.
    pub fn find_or_add_edge(&mut self, n0: NodeId, n1: NodeId) -> EdgeId {
        match self.find_edge(n0, n1) {
            Some(e) => e,
            None => self.add_edge(n0, n1),
        }
    }

    /// Adds a face and registers it on its three edges.
    pub fn add_face(
        &mut self,
        nodes: [NodeId; 3],
        edges: [EdgeId; 3],
    ) -> FaceId {
        let id = FaceId(self.faces.len() as u32);
        self.faces.push(Face {
            nodes,
            edges,
            inside: Vec::new(),
            vote: Vec::new(),
            delete_me: false,
            alive: true,
        });
        for e in edges {
            self.attach_face(e, id);
        }
        id
    }

    pub(crate) fn attach_face(&mut self, e: EdgeId, f: FaceId) {
        let slots = &mut self.edges[e.idx()].faces;
        if slots[0].is_none() {
            slots[0] = Some(f);
        } else if slots[1].is_none() {
            slots[1] = Some(f);
        } else {
            debug_assert!(false, "more than two faces on an edge");
        }
    }

    /// Removes a face, clearing its back-references.
    pub fn remove_face(&mut self, id: FaceId) {
        let edges = self.faces[id.idx()].edges;
        for e in edges {
            let slots = &mut self.edges[e.idx()].faces;
            for slot in slots.iter_mut() {
                if *slot == Some(id) {
                    *slot = None;
                }
            }
        }
        self.faces[id.idx()].alive = false;
    }

    /// Detaches `f` from edge `e` (used while rebuilding the local fan).
    pub fn detach_face_from_edge(&mut self, e: EdgeId, f: FaceId) {
        for slot in self.edges[e.idx()].faces.iter_mut() {
            if *slot == Some(f) {
                *slot = None;
            }
        }
    }

    /// The endpoint of `e` other than `n`.
    pub fn edge_other_node(&self, e: EdgeId, n: NodeId) -> Option<NodeId> {
        let [a, b] = self.edge(e).nodes;
        if a == n {
            Some(b)
        } else if b == n {
            Some(a)
        } else {
            None
        }
    }

    /// The face on `e` other than `f`.
    pub fn edge_other_face(&self, e: EdgeId, f: FaceId) -> Option<FaceId> {
        let [fa, fb] = self.edge(e).faces;
        if fa == Some(f) {
            fb
        } else if fb == Some(f) {
            fa
        } else {
            None
        }
    }

    /// Recomputes the cached 3D length of an edge.
    pub fn compute_length(&mut self, e: EdgeId) {
        let [n0, n1] = self.edge(e).nodes;
        self.edges[e.idx()].length = self.node(n0).pnt.distance(self.node(n1).pnt);
    }

    /// The face corner other than `a` and `b`.
    pub fn face_other_node(&self, f: FaceId, a: NodeId, b: NodeId) -> NodeId {
        *self
            .face(f)
            .nodes
            .iter()
            .find(|n| **n != a && **n != b)
            .expect("degenerate face")
    }

    /// Whether `a → b` appears in the face's winding order.
    pub fn face_correct_order(&self, f: FaceId, a: NodeId, b: NodeId) -> bool {
        let n = self.face(f).nodes;
        (n[0] == a && n[1] == b) || (n[1] == a && n[2] == b) || (n[2] == a && n[0] == b)
    }

    /// The face's edge joining `a` and `b`.
    pub fn face_find_edge(&self, f: FaceId, a: NodeId, b: NodeId) -> Option<EdgeId> {
        self.face(f)
            .edges
            .iter()
            .copied()
            .find(|e| {
                let [x, y] = self.edge(*e).nodes;
                (x == a && y == b) || (x == b && y == a)
            })
    }

    /// Replaces node `from` with `to` in the face's corner list.
    pub fn face_replace_node(&mut self, f: FaceId, from: NodeId, to: NodeId) {
        for n in self.faces[f.idx()].nodes.iter_mut() {
            if *n == from {
                *n = to;
            }
        }
    }

    /// Replaces edge `from` with `to` in the face's edge list.
    pub fn face_replace_edge(&mut self, f: FaceId, from: EdgeId, to: EdgeId) {
        for e in self.faces[f.idx()].edges.iter_mut() {
            if *e == from {
                *e = to;
            }
        }
    }

    /// Face normal from the winding order (not normalized against area 0).
    pub fn face_normal(&self, f: FaceId) -> Vector3 {
        let [a, b, c] = self.face(f).nodes;
        let (pa, pb, pc) = (self.node(a).pnt, self.node(b).pnt, self.node(c).pnt);
        let n = (pb - pa).cross(pc - pa);
        match n.magnitude2() < 1.0e-30 {
            true => Vector3::new(0.0, 0.0, 0.0),
            false => n.normalize(),
        }
    }

    /// Face area.
    pub fn face_area(&self, f: FaceId) -> f64 {
        let [a, b, c] = self.face(f).nodes;
        let (pa, pb, pc) = (self.node(a).pnt, self.node(b).pnt, self.node(c).pnt);
        (pb - pa).cross(pc - pa).magnitude() / 2.0
    }

    /// 3D centroid of a face.
    pub fn face_center(&self, f: FaceId) -> Point3 {
        let [a, b, c] = self.face(f).nodes;
        Point3::from_vec(
            (self.node(a).pnt.to_vec() + self.node(b).pnt.to_vec() + self.node(c).pnt.to_vec())
                / 3.0,
        )
    }

    /// Parameter-space centroid of a face.
    pub fn face_center_uw(&self, f: FaceId) -> Point2 {
        let [a, b, c] = self.face(f).nodes;
        Point2::from_vec(
            (self.node(a).uw.to_vec() + self.node(b).uw.to_vec() + self.node(c).uw.to_vec()) / 3.0,
        )
    }

    /// Smallest corner angle (radians) of the triangle `(a, b, c)`.
    pub fn quality_of(&self, a: NodeId, b: NodeId, c: NodeId) -> f64 {
        let (pa, pb, pc) = (self.node(a).pnt, self.node(b).pnt, self.node(c).pnt);
        let dsqr01 = pa.distance2(pb);
        let dsqr12 = pb.distance2(pc);
        let dsqr20 = pc.distance2(pa);
        let d01 = dsqr01.sqrt();
        let d12 = dsqr12.sqrt();
        let d20 = dsqr20.sqrt();
        if d01 < 1.0e-30 || d12 < 1.0e-30 || d20 < 1.0e-30 {
            return 0.0;
        }
        let ang0 = (-dsqr12 + dsqr01 + dsqr20) / (2.0 * d01 * d20);
        let ang1 = (-dsqr20 + dsqr01 + dsqr12) / (2.0 * d01 * d12);
        let ang2 = (-dsqr01 + dsqr12 + dsqr20) / (2.0 * d12 * d20);
        let max_cos = f64::max(ang0, f64::max(ang1, ang2));
        if max_cos > 1.0 {
            0.0
        } else if max_cos < -1.0 {
            std::f64::consts::PI
        } else {
            max_cos.acos()
        }
    }

    /// Smallest corner angle of a face.
    pub fn face_quality(&self, f: FaceId) -> f64 {
        let [a, b, c] = self.face(f).nodes;
        self.quality_of(a, b, c)
    }

    /// Live faces around a node.
    pub fn node_faces(&self, n: NodeId) -> Vec<FaceId> {
        let mut faces = Vec::new();
        for e in &self.node(n).edges {
            for f in self.edge(*e).faces.into_iter().flatten() {
                if self.face(f).alive && !faces.contains(&f) {
                    faces.push(f);
                }
            }
        }
        faces
    }

    /// Adjacent faces within `levels` rings, not crossing border edges.
    pub fn adjacent_faces(&self, f: FaceId, levels: usize, out: &mut Vec<FaceId>) {
        if !out.contains(&f) {
            out.push(f);
        }
        if levels == 0 {
            return;
        }
        for e in self.face(f).edges {
            if self.edge(e).border {
                continue;
            }
            if let Some(other) = self.edge_other_face(e, f) {
                if self.face(other).alive && !out.contains(&other) {
                    self.adjacent_faces(other, levels - 1, out);
                }
            }
        }
    }

    /// Builds the mesh from triangulated output: positions, parameters and
    /// index triples. `flip` reverses the winding of every face.
    pub fn build_from_triangulation(
        &mut self,
        pnts: &[(Point3, Point2)],
        tris: &[[usize; 3]],
        flip: bool,
    ) {
        self.clear();
        let ids: Vec<NodeId> = pnts
            .iter()
            .map(|(p, uw)| self.add_node(*p, *uw))
            .collect();
        for tri in tris {
            let [i0, mut i1, mut i2] = *tri;
            if flip {
                std::mem::swap(&mut i1, &mut i2);
            }
            let (n0, n1, n2) = (ids[i0], ids[i1], ids[i2]);
            let e0 = self.find_or_add_edge(n0, n1);
            let e1 = self.find_or_add_edge(n1, n2);
            let e2 = self.find_or_add_edge(n2, n0);
            self.add_face([n0, n1, n2], [e0, e1, e2]);
        }
    }

    /// Marks open edges as borders, flags constrained interior edges as
    /// ridges, and fixes every node touching either. `ridge_segs` holds
    /// index pairs into the triangulation point list, which maps one-to-one
    /// onto node ids here.
    pub fn set_edge_and_node_flags(&mut self, ridge_segs: &rustc_hash::FxHashSet<(usize, usize)>) {
        let ordered = |a: NodeId, b: NodeId| match a.0 < b.0 {
            true => (a, b),
            false => (b, a),
        };
        let ridge_pairs: rustc_hash::FxHashSet<(NodeId, NodeId)> = ridge_segs
            .iter()
            .map(|(a, b)| ordered(NodeId(*a as u32), NodeId(*b as u32)))
            .collect();
        for e in self.edge_ids().collect::<Vec<_>>() {
            let [a, b] = self.edge(e).nodes;
            let nfaces = self.edge(e).faces.iter().flatten().count();
            let constrained = ridge_pairs.contains(&ordered(a, b));
            let edge = self.edge_mut(e);
            if nfaces < 2 {
                edge.border = true;
            } else if constrained {
                edge.ridge = true;
            }
        }
        for e in self.edge_ids().collect::<Vec<_>>() {
            if self.edge(e).border || self.edge(e).ridge {
                let [a, b] = self.edge(e).nodes;
                self.node_mut(a).fixed = true;
                self.node_mut(b).fixed = true;
            }
        }
    }

    /// Removes faces flagged `delete_me`, then edges with no face left, then
    /// isolated nodes.
    pub fn remove_interior(&mut self) {
        for f in self.face_ids().collect::<Vec<_>>() {
            if self.face(f).delete_me {
                self.remove_face(f);
            }
        }
        for e in self.edge_ids().collect::<Vec<_>>() {
            if self.edge(e).faces.iter().all(|f| f.is_none()) {
                self.remove_edge(e);
            }
        }
        for n in self.node_ids().collect::<Vec<_>>() {
            if self.node(n).edges.is_empty() {
                self.remove_node(n);
            }
        }
        // an interior edge that lost one side becomes a border
        for e in self.edge_ids().collect::<Vec<_>>() {
            if self.edge(e).faces.iter().flatten().count() < 2 {
                self.edge_mut(e).border = true;
                let [a, b] = self.edge(e).nodes;
                self.node_mut(a).fixed = true;
                self.node_mut(b).fixed = true;
            }
        }
    }
}
