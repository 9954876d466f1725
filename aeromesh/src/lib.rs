//! Watertight, density-controlled surface meshing of trimmed piecewise-bezier
//! skins (wings, wakes, fuselages, symmetry planes, and far-field boxes) for
//! CFD solvers.
//!
//! The pipeline runs from [`Mesher::generate_mesh`]: surfaces are loaded and
//! merged, border curves matched across seams, surface pairs intersected into
//! chains, a curvature- and source-driven target-length field built, every
//! surface triangulated against its tessellated chains, refined by
//! split/collapse/swap/smooth passes, trimmed by inside/outside ray casting,
//! and stitched watertight along shared borders.

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

/// Intersection chains and chain surgery.
pub mod chain;
/// Inside/outside classification and trimming.
pub mod classify;
/// Target-length maps and growth-ratio limiting.
pub mod density;
/// Far-field domain box construction.
pub mod domain;
/// Intersection points, segments, bins, and their arenas.
pub mod isect;
/// The pipeline orchestrator.
pub mod mesher;
/// Border and intersection curves in one surface's parameter space.
pub mod scurve;
/// Settings bundle and grid density snapshot.
pub mod settings;
/// User density sources.
pub mod source;
/// Border-edge stitching.
pub mod stitch;
/// Subsurface polygons and triangle tagging.
pub mod subsurface;
/// The pipeline surface wrapper.
pub mod surf;
/// Constrained Delaunay initial meshing.
pub mod tessellate;
/// Trailing-edge wakes.
pub mod wake;

pub use mesher::{Mesher, ProgressSink};
pub use settings::{CfdType, GridDensity, MeshSettings, SurfKind, XferSurf};

pub(crate) use aeromesh_base::bounding_box::BoundingBox;
