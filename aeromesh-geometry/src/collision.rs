use crate::*;
use aeromesh_base::tolerance::*;

/// Where a segment pierces a triangle, if it does.
pub fn seg_tri_intersect(seg: [Point3; 2], tri: [Point3; 3]) -> Option<Point3> {
    let ab = tri[1] - tri[0];
    let bc = tri[2] - tri[1];
    let ca = tri[0] - tri[2];
    let nor = ab.cross(ca);
    if nor.so_small() {
        return None;
    }
    let ap = seg[0] - tri[0];
    let aq = seg[1] - tri[0];
    let dap = ap.dot(nor);
    let daq = aq.dot(nor);
    if dap * daq > 0.0 {
        return None;
    }
    let h = seg[0] + (seg[1] - seg[0]) * (dap / (dap - daq));
    let inside = f64::signum(ab.cross(nor).dot(h - tri[0]))
        + f64::signum(bc.cross(nor).dot(h - tri[1]))
        + f64::signum(ca.cross(nor).dot(h - tri[2]))
        >= 2.0;
    match inside {
        true => Some(h),
        false => None,
    }
}

/// Intersection segment of two triangles: the two extreme crossing points of
/// either triangle's edges with the other. `None` for disjoint or coplanar
/// pairs.
pub fn tri_tri_intersect(tri0: [Point3; 3], tri1: [Point3; 3]) -> Option<(Point3, Point3)> {
    let mut tuple: (Option<Point3>, Option<Point3>) = (None, None);
    [
        seg_tri_intersect([tri0[0], tri0[1]], tri1),
        seg_tri_intersect([tri0[1], tri0[2]], tri1),
        seg_tri_intersect([tri0[2], tri0[0]], tri1),
        seg_tri_intersect([tri1[0], tri1[1]], tri0),
        seg_tri_intersect([tri1[1], tri1[2]], tri0),
        seg_tri_intersect([tri1[2], tri1[0]], tri0),
    ]
    .iter()
    .for_each(|pt| match tuple {
        (None, _) => tuple.0 = *pt,
        (Some(_), None) => tuple.1 = *pt,
        (Some(ref mut p), Some(ref mut q)) => {
            if let Some(pt) = pt {
                let dist0 = pt.distance2(*p);
                let dist1 = pt.distance2(*q);
                let dist2 = p.distance2(*q);
                if dist2 < dist0 {
                    *q = *pt;
                } else if dist2 < dist1 {
                    *p = *pt;
                }
            }
        }
    });
    match tuple {
        (Some(a), Some(b)) => Some((a, b)),
        _ => None,
    }
}

/// Ray/triangle intersection parameter: `t` with `orig + t·dir` on the
/// triangle, `t ≥ 0`. Möller–Trumbore.
pub fn ray_tri_intersect(orig: Point3, dir: Vector3, tri: [Point3; 3]) -> Option<f64> {
    let e1 = tri[1] - tri[0];
    let e2 = tri[2] - tri[0];
    let pvec = dir.cross(e2);
    let det = e1.dot(pvec);
    if det.abs() < 1.0e-12 {
        return None;
    }
    let inv_det = 1.0 / det;
    let tvec = orig - tri[0];
    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let qvec = tvec.cross(e1);
    let v = dir.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(qvec) * inv_det;
    match t >= 0.0 {
        true => Some(t),
        false => None,
    }
}

/// 2D segment/segment intersection point, interiors only.
pub fn seg_seg_intersect_2d(
    p0: Point2,
    p1: Point2,
    p2: Point2,
    p3: Point2,
) -> Option<Point2> {
    let d1 = p1 - p0;
    let d2 = p3 - p2;
    let denom = d1.x * d2.y - d1.y * d2.x;
    if denom.abs() < 1.0e-14 {
        return None;
    }
    let r = p2 - p0;
    let s = (r.x * d2.y - r.y * d2.x) / denom;
    let t = (r.x * d1.y - r.y * d1.x) / denom;
    match (0.0..=1.0).contains(&s) && (0.0..=1.0).contains(&t) {
        true => Some(p0 + d1 * s),
        false => None,
    }
}

/// Parameter of the projection of `p` onto the line through `a`, `b`
/// (0 at `a`, 1 at `b`).
pub fn proj_pnt_on_line_u(a: Point2, b: Point2, p: Point2) -> f64 {
    let d = b - a;
    let len2 = d.magnitude2();
    match len2 < 1.0e-30 {
        true => 0.0,
        false => (p - a).dot(d) / len2,
    }
}

/// Even-odd crossing test of `p` against a closed 2D polygon.
pub fn point_in_polygon_2d(p: Point2, poly: &[Point2]) -> bool {
    let mut inside = false;
    let n = poly.len();
    for i in 0..n {
        let a = poly[i];
        let b = poly[(i + 1) % n];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}
