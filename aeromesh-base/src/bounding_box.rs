use crate::cgmath64::*;
use serde::{Deserialize, Serialize};

/// axis-aligned bounding box
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct BoundingBox<P> {
    min: P,
    max: P,
}

/// The points a bounding box can hold.
pub trait Bounded: Copy {
    /// componentwise minimum
    fn elem_min(self, other: Self) -> Self;
    /// componentwise maximum
    fn elem_max(self, other: Self) -> Self;
    /// all components `+inf`
    fn pos_infinity() -> Self;
    /// all components `-inf`
    fn neg_infinity() -> Self;
    /// largest component of `self - other`
    fn max_extent(self, other: Self) -> f64;
    /// squared diagonal length of the box `[other, self]`
    fn diag2(self, other: Self) -> f64;
    /// midpoint
    fn mid(self, other: Self) -> Self;
    /// shifts every component by `-d` (min side) resp. `+d` (max side)
    fn offset(self, d: f64) -> Self;
}

macro_rules! impl_bounded {
    ($point: ident, $($i: expr),*) => {
        impl Bounded for $point {
            fn elem_min(self, other: Self) -> Self { $point::new($(f64::min(self[$i], other[$i])),*) }
            fn elem_max(self, other: Self) -> Self { $point::new($(f64::max(self[$i], other[$i])),*) }
            fn pos_infinity() -> Self { $point::new($({ let _ = $i; f64::INFINITY }),*) }
            fn neg_infinity() -> Self { $point::new($({ let _ = $i; f64::NEG_INFINITY }),*) }
            fn max_extent(self, other: Self) -> f64 {
                let mut res = f64::NEG_INFINITY;
                $(res = f64::max(res, self[$i] - other[$i]);)*
                res
            }
            fn diag2(self, other: Self) -> f64 {
                let mut res = 0.0;
                $(res += (self[$i] - other[$i]) * (self[$i] - other[$i]);)*
                res
            }
            fn mid(self, other: Self) -> Self { $point::new($((self[$i] + other[$i]) / 2.0),*) }
            fn offset(self, d: f64) -> Self { $point::new($(self[$i] + d),*) }
        }
    };
}
impl_bounded!(Point2, 0, 1);
impl_bounded!(Point3, 0, 1, 2);

impl<P: Bounded> Default for BoundingBox<P> {
    #[inline(always)]
    fn default() -> Self {
        BoundingBox {
            min: P::pos_infinity(),
            max: P::neg_infinity(),
        }
    }
}

impl<P: Bounded> BoundingBox<P> {
    /// Creates an empty bounding box.
    #[inline(always)]
    pub fn new() -> Self { Self::default() }

    /// Adds a point to the bounding box.
    #[inline(always)]
    pub fn push(&mut self, pt: P) {
        self.min = self.min.elem_min(pt);
        self.max = self.max.elem_max(pt);
    }

    /// Merges another box into this one.
    #[inline(always)]
    pub fn merge(&mut self, other: &Self) {
        self.min = self.min.elem_min(other.min);
        self.max = self.max.elem_max(other.max);
    }

    /// Returns the minimum corner.
    #[inline(always)]
    pub fn min(&self) -> P { self.min }

    /// Returns the maximum corner.
    #[inline(always)]
    pub fn max(&self) -> P { self.max }

    /// Returns the center of the box.
    #[inline(always)]
    pub fn center(&self) -> P { self.max.mid(self.min) }

    /// Whether no point has been pushed.
    #[inline(always)]
    pub fn is_empty(&self) -> bool { self.min.max_extent(self.max) > 0.0 }

    /// Length of the diagonal.
    #[inline(always)]
    pub fn diagonal(&self) -> f64 {
        match self.is_empty() {
            true => 0.0,
            false => f64::sqrt(self.max.diag2(self.min)),
        }
    }

    /// Whether two boxes overlap (closed intervals on every axis).
    #[inline(always)]
    pub fn intersects(&self, other: &Self) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.max_extent(other.max) <= 0.0
            && other.min.max_extent(self.max) <= 0.0
    }

    /// Grows the box by `d` on every side.
    #[inline(always)]
    pub fn expand(&mut self, d: f64) {
        self.min = self.min.offset(-d);
        self.max = self.max.offset(d);
    }
}

impl<P: Bounded> FromIterator<P> for BoundingBox<P> {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut bbox = BoundingBox::new();
        iter.into_iter().for_each(|pt| bbox.push(pt));
        bbox
    }
}

impl BoundingBox<Point3> {
    /// Largest edge length of the box.
    #[inline(always)]
    pub fn largest_dist(&self) -> f64 { -self.min.max_extent(self.max) }

    /// Returns the 8 corner points, z-major as a binary count of (x, y, z) bits.
    pub fn corners(&self) -> [Point3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Point3::new(a.x, a.y, a.z),
            Point3::new(b.x, a.y, a.z),
            Point3::new(a.x, b.y, a.z),
            Point3::new(b.x, b.y, a.z),
            Point3::new(a.x, a.y, b.z),
            Point3::new(b.x, a.y, b.z),
            Point3::new(a.x, b.y, b.z),
            Point3::new(b.x, b.y, b.z),
        ]
    }

    /// Clamps the minimum y coordinate upward.
    #[inline(always)]
    pub fn set_min_y(&mut self, y: f64) {
        if self.min.y < y {
            self.min.y = y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_query() {
        let mut bbox = BoundingBox::new();
        bbox.push(Point3::new(-1.0, 2.0, 0.0));
        bbox.push(Point3::new(1.0, -2.0, 0.5));
        assert_eq!(bbox.min(), Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(bbox.max(), Point3::new(1.0, 2.0, 0.5));
        assert_eq!(bbox.center(), Point3::new(0.0, 0.0, 0.25));
        assert!(!bbox.is_empty());
    }

    #[test]
    fn overlap() {
        let a: BoundingBox<Point3> = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)]
            .into_iter()
            .collect();
        let b: BoundingBox<Point3> = [Point3::new(0.5, 0.5, 0.5), Point3::new(2.0, 2.0, 2.0)]
            .into_iter()
            .collect();
        let c: BoundingBox<Point3> = [Point3::new(1.5, 1.5, 1.5), Point3::new(2.0, 2.0, 2.0)]
            .into_iter()
            .collect();
        assert!(a.intersects(&b));
        assert!(b.intersects(&c));
        assert!(!a.intersects(&c));
        assert!(!a.intersects(&BoundingBox::new()));
    }

    #[test]
    fn expand_and_diagonal() {
        let mut bbox: BoundingBox<Point3> =
            [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)]
                .into_iter()
                .collect();
        bbox.expand(1.0);
        assert_eq!(bbox.min(), Point3::new(-1.0, -1.0, -1.0));
        assert_eq!(bbox.max(), Point3::new(2.0, 1.0, 1.0));
        assert!((bbox.largest_dist() - 3.0).abs() < 1.0e-12);
    }
}
