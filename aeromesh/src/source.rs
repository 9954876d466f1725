use crate::*;
use serde::{Deserialize, Serialize};

/// A user density source: a region that pulls the target edge length down to
/// `len` inside its core and blends back to the base length at its rim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MeshSource {
    /// sphere of influence around a point
    Point {
        /// center
        pnt: Point3,
        /// target length inside the core
        len: f64,
        /// influence radius
        rad: f64,
    },
    /// capsule of influence around a line segment
    Line {
        /// first endpoint
        pnt0: Point3,
        /// second endpoint
        pnt1: Point3,
        /// target length at the first endpoint
        len0: f64,
        /// target length at the second endpoint
        len1: f64,
        /// influence radius at the first endpoint
        rad0: f64,
        /// influence radius at the second endpoint
        rad1: f64,
    },
    /// axis-aligned box of influence
    Box {
        /// minimum corner
        min: Point3,
        /// maximum corner
        max: Point3,
        /// target length inside the box
        len: f64,
        /// blend distance outside the box
        rad: f64,
    },
}

impl MeshSource {
    /// Point source constructor.
    pub fn point(pnt: Point3, len: f64, rad: f64) -> Self { MeshSource::Point { pnt, len, rad } }

    /// Uniform line source constructor.
    pub fn line(pnt0: Point3, pnt1: Point3, len: f64, rad: f64) -> Self {
        MeshSource::Line {
            pnt0,
            pnt1,
            len0: len,
            len1: len,
            rad0: rad,
            rad1: rad,
        }
    }

    /// Box source constructor.
    pub fn cuboid(min: Point3, max: Point3, len: f64, rad: f64) -> Self {
        MeshSource::Box { min, max, len, rad }
    }

    /// Target length this source imposes at `pos`, given the global `base`
    /// length. Outside the influence region the base length is returned.
    pub fn target_len(&self, base: f64, pos: Point3) -> f64 {
        match *self {
            MeshSource::Point { pnt, len, rad } => {
                let d = pos.distance(pnt);
                blend(base, len, d, rad)
            }
            MeshSource::Line {
                pnt0,
                pnt1,
                len0,
                len1,
                rad0,
                rad1,
            } => {
                let dir = pnt1 - pnt0;
                let len2 = dir.magnitude2();
                let t = match len2 < 1.0e-30 {
                    true => 0.0,
                    false => f64::clamp((pos - pnt0).dot(dir) / len2, 0.0, 1.0),
                };
                let closest = pnt0 + dir * t;
                let len = len0 + (len1 - len0) * t;
                let rad = rad0 + (rad1 - rad0) * t;
                blend(base, len, pos.distance(closest), rad)
            }
            MeshSource::Box { min, max, len, rad } => {
                let dx = axis_dist(pos.x, min.x, max.x);
                let dy = axis_dist(pos.y, min.y, max.y);
                let dz = axis_dist(pos.z, min.z, max.z);
                let d = Vector3::new(dx, dy, dz).magnitude();
                blend(base, len, d, rad)
            }
        }
    }
}

fn axis_dist(v: f64, lo: f64, hi: f64) -> f64 {
    if v < lo {
        lo - v
    } else if v > hi {
        v - hi
    } else {
        0.0
    }
}

/// Linear blend from the source length at the core to the base length at the
/// influence rim.
fn blend(base: f64, len: f64, dist: f64, rad: f64) -> f64 {
    if dist >= rad || rad < 1.0e-30 {
        base
    } else {
        len + (base - len) * (dist / rad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_source_falls_off_linearly() {
        let src = MeshSource::point(Point3::new(0.0, 0.0, 0.0), 0.1, 1.0);
        assert!((src.target_len(1.0, Point3::new(0.0, 0.0, 0.0)) - 0.1).abs() < 1e-12);
        assert!((src.target_len(1.0, Point3::new(0.5, 0.0, 0.0)) - 0.55).abs() < 1e-12);
        assert!((src.target_len(1.0, Point3::new(2.0, 0.0, 0.0)) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn line_source_interpolates_along_axis() {
        let src = MeshSource::Line {
            pnt0: Point3::new(0.0, 0.0, 0.0),
            pnt1: Point3::new(1.0, 0.0, 0.0),
            len0: 0.1,
            len1: 0.3,
            rad0: 1.0,
            rad1: 1.0,
        };
        assert!((src.target_len(1.0, Point3::new(0.5, 0.0, 0.0)) - 0.2).abs() < 1e-12);
        assert!((src.target_len(1.0, Point3::new(1.0, 0.0, 0.0)) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn box_source_zero_inside() {
        let src = MeshSource::cuboid(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
            0.2,
            0.5,
        );
        assert!((src.target_len(1.0, Point3::new(0.5, 0.5, 0.5)) - 0.2).abs() < 1e-12);
        assert!((src.target_len(1.0, Point3::new(1.25, 0.5, 0.5)) - 0.6).abs() < 1e-12);
        assert!((src.target_len(1.0, Point3::new(5.0, 0.5, 0.5)) - 1.0).abs() < 1e-12);
    }
}
