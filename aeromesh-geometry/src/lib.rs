//! Piecewise bezier curves and surfaces: evaluation, derivatives, curvature,
//! border extraction, patch trees, and closest-point searches.

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

mod bezier;
/// Triangle and segment intersection predicates.
pub mod collision;
/// Piecewise bezier curves.
pub mod curve;
/// Errors.
pub mod errors;
/// Planar-refinable sub-patches of a surface.
pub mod patch;
/// Piecewise bezier surfaces.
pub mod surface;

pub use curve::BezierCurve;
pub use errors::Error;
pub use patch::SurfPatch;
pub use surface::{BezierSurface, Curvature};

/// re-export `aeromesh_base`.
pub mod base {
    pub use aeromesh_base::{binning, bounding_box::*, cgmath64::*, tolerance::*};
}

pub(crate) type Result<T> = std::result::Result<T, errors::Error>;
