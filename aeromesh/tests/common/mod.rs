//! Shared geometry builders for the end-to-end scenarios.
#![allow(dead_code)]

use aeromesh::settings::{CfdType, SurfKind, XferSurf};
use aeromesh_base::cgmath64::*;
use aeromesh_geometry::surface::PatchNet;
use aeromesh_geometry::BezierSurface;

/// Cubic bezier weight approximating a 90° circular arc.
pub const ARC_K: f64 = 0.5522847498307936;

/// Control points of a unit quarter arc from angle `a0` to `a0 + 90°`.
pub fn quarter_arc(a0: f64) -> [Point2; 4] {
    let a1 = a0 + std::f64::consts::FRAC_PI_2;
    let (c0, s0) = (a0.cos(), a0.sin());
    let (c1, s1) = (a1.cos(), a1.sin());
    [
        Point2::new(c0, s0),
        Point2::new(c0 - ARC_K * s0, s0 + ARC_K * c0),
        Point2::new(c1 + ARC_K * s1, s1 - ARC_K * c1),
        Point2::new(c1, s1),
    ]
}

/// Half of a unit sphere skin spanning longitudes `[lon0, lon0 + 180°]`:
/// 2 longitude patches by 2 latitude patches, bicubic.
pub fn hemisphere_skin(lon0: f64) -> BezierSurface {
    // profile from the south pole over the equator to the north pole,
    // in (radius, z)
    let lower = quarter_arc(-std::f64::consts::FRAC_PI_2);
    let upper = quarter_arc(0.0);
    let profile: [Vec<Point2>; 2] = [lower.to_vec(), upper.to_vec()];

    let patches = (0..2)
        .map(|iu| {
            let arc = quarter_arc(lon0 + iu as f64 * std::f64::consts::FRAC_PI_2);
            (0..2)
                .map(|iw| {
                    let prof = &profile[iw];
                    let mut ctrl = Vec::with_capacity(16);
                    for a in arc.iter() {
                        for p in prof.iter() {
                            // tensor product of the longitude arc and profile
                            ctrl.push(Point3::new(a.x * p.x, a.y * p.x, p.y));
                        }
                    }
                    PatchNet::new(3, 3, ctrl).unwrap()
                })
                .collect()
        })
        .collect();
    BezierSurface::new(patches).unwrap()
}

/// The unit sphere as two transferred half skins sharing one component.
pub fn sphere_xfers() -> Vec<XferSurf> {
    [0.0, std::f64::consts::PI]
        .into_iter()
        .enumerate()
        .map(|(i, lon0)| XferSurf {
            surface: hemisphere_skin(lon0),
            geom_id: "sphere".to_string(),
            name: format!("sphere_half_{i}"),
            split_num: i,
            comp_index: 0,
            kind: SurfKind::Normal,
            cfd_type: CfdType::Normal,
            flip_normal: false,
        })
        .collect()
}

/// The six faces of an axis-aligned box with outward normals.
pub fn box_faces(min: Point3, max: Point3) -> Vec<BezierSurface> {
    let (a, b) = (min, max);
    let plane = BezierSurface::plane;
    vec![
        // z = max, +z out: u along x, w along y
        plane(
            Point3::new(a.x, a.y, b.z),
            Point3::new(b.x, a.y, b.z),
            Point3::new(a.x, b.y, b.z),
            Point3::new(b.x, b.y, b.z),
        ),
        // z = min, -z out: u along y, w along x
        plane(
            Point3::new(a.x, a.y, a.z),
            Point3::new(a.x, b.y, a.z),
            Point3::new(b.x, a.y, a.z),
            Point3::new(b.x, b.y, a.z),
        ),
        // x = max, +x out: u along y, w along z
        plane(
            Point3::new(b.x, a.y, a.z),
            Point3::new(b.x, b.y, a.z),
            Point3::new(b.x, a.y, b.z),
            Point3::new(b.x, b.y, b.z),
        ),
        // x = min, -x out: u along z, w along y
        plane(
            Point3::new(a.x, a.y, a.z),
            Point3::new(a.x, a.y, b.z),
            Point3::new(a.x, b.y, a.z),
            Point3::new(a.x, b.y, b.z),
        ),
        // y = max, +y out: u along z, w along x
        plane(
            Point3::new(a.x, b.y, a.z),
            Point3::new(a.x, b.y, b.z),
            Point3::new(b.x, b.y, a.z),
            Point3::new(b.x, b.y, b.z),
        ),
        // y = min, -y out: u along x, w along z
        plane(
            Point3::new(a.x, a.y, a.z),
            Point3::new(b.x, a.y, a.z),
            Point3::new(a.x, a.y, b.z),
            Point3::new(b.x, a.y, b.z),
        ),
    ]
}

/// A box as six transferred faces in one component.
pub fn box_xfers(
    min: Point3,
    max: Point3,
    comp: usize,
    geom_id: &str,
    cfd_type: CfdType,
) -> Vec<XferSurf> {
    box_faces(min, max)
        .into_iter()
        .enumerate()
        .map(|(i, surface)| XferSurf {
            surface,
            geom_id: geom_id.to_string(),
            name: format!("{geom_id}_face_{i}"),
            split_num: i,
            comp_index: comp,
            kind: SurfKind::Normal,
            cfd_type,
            flip_normal: false,
        })
        .collect()
}

/// A single rectangular plate transferred as one surface.
pub fn plate_xfer(
    p0: Point3,
    p1: Point3,
    p2: Point3,
    p3: Point3,
    kind: SurfKind,
    geom_id: &str,
) -> XferSurf {
    XferSurf {
        surface: BezierSurface::plane(p0, p1, p2, p3),
        geom_id: geom_id.to_string(),
        name: geom_id.to_string(),
        split_num: 0,
        comp_index: 0,
        kind,
        cfd_type: CfdType::Normal,
        flip_normal: false,
    }
}
