use crate::cgmath64::*;

/// Scale applied before truncating a coordinate sum into a scalar bin id.
pub const BIN_SCALE: f64 = 1.0e4;

/// Scalar bin id of a 3D point: `trunc(x·s) + trunc(y·s) + trunc(z·s)`.
///
/// Distant points may alias onto one id; every consumer re-checks true
/// distance, so aliasing only costs lookups.
#[inline(always)]
pub fn scalar_bin_id(pt: Point3) -> i64 {
    (pt.x * BIN_SCALE) as i64 + (pt.y * BIN_SCALE) as i64 + (pt.z * BIN_SCALE) as i64
}

/// Rounds a point onto the integer lattice with cell size `tol`.
#[inline(always)]
pub fn lattice_key(pt: Point3, tol: f64) -> [i64; 3] {
    [
        f64::floor(pt.x / tol) as i64,
        f64::floor(pt.y / tol) as i64,
        f64::floor(pt.z / tol) as i64,
    ]
}

/// The 27 lattice cells around `key`, own cell included.
pub fn lattice_neighborhood(key: [i64; 3]) -> impl Iterator<Item = [i64; 3]> {
    let [a, b, c] = key;
    (-1..=1)
        .flat_map(move |i| (-1..=1).flat_map(move |j| (-1..=1).map(move |k| [a + i, b + j, c + k])))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_points_same_or_adjacent_id() {
        let p = Point3::new(0.123456, -4.5, 2.25);
        let q = p + Vector3::new(1.0e-6, 0.0, 0.0);
        assert!((scalar_bin_id(p) - scalar_bin_id(q)).abs() <= 1);
    }

    #[test]
    fn lattice_neighborhood_has_27_cells() {
        assert_eq!(lattice_neighborhood([0, 0, 0]).count(), 27);
    }
}
