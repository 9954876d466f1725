//! Editable triangle mesh on handle arenas, remeshing operators, packed
//! triangle output, watertight analysis, and mesh file exporters.

#![cfg_attr(not(debug_assertions), deny(warnings))]
#![deny(clippy::all, rust_2018_idioms)]
#![warn(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_import_braces,
    unused_qualifications
)]

pub(crate) use aeromesh_base::cgmath64::*;

/// Point index maps and the watertight check.
pub mod analysis;
/// Mesh file writers.
pub mod io;
mod mesh;
mod remesh;
/// Packed triangle mesh output.
pub mod simp;

pub use mesh::{Edge, EdgeId, Face, FaceId, Node, NodeId, WorkMesh};
pub use simp::{SimpTri, TriMesh};

/// The surface queries remeshing needs from its owner.
///
/// The pipeline's surface wrapper implements this; the mesh crate itself
/// never sees the bezier machinery behind it.
pub trait MeshSurface {
    /// 3D point at `(u, w)`.
    fn point(&self, u: f64, w: f64) -> Point3;
    /// Outward unit normal at `(u, w)` (before any flip flag).
    fn normal(&self, u: f64, w: f64) -> Vector3;
    /// Closest `(u, w)` to `pnt`, seeded at `guess`.
    fn closest_uw(&self, pnt: Point3, guess: (f64, f64)) -> (f64, f64);
    /// Interpolated target edge length at `(u, w)`.
    fn target_len(&self, u: f64, w: f64) -> f64;
    /// Minimum allowed edge length.
    fn min_len(&self) -> f64;
    /// Allowed growth ratio of neighboring target lengths.
    fn grow_ratio(&self) -> f64;
    /// Whether the surface normal is flipped for output winding.
    fn flip_normal(&self) -> bool;
}
