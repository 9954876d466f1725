//! Basic structs and traits: importing cgmath, tolerance, bounding box, spatial binning

#![cfg_attr(not(debug_assertions), deny(warnings))]
#![deny(clippy::all, rust_2018_idioms)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_import_braces,
    unused_qualifications
)]

/// Scalar spatial bin ids and integer-lattice rounding for point deduplication.
pub mod binning;
/// Axis-aligned bounding boxes over cgmath points.
pub mod bounding_box;
/// Redefines vectors, matrices and points with scalar = f64.
pub mod cgmath64;
/// Setting tolerance.
pub mod tolerance;
