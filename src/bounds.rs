//! Axis-aligned bounding boxes over the X, Y, Z and M axes.

use geo_traits::{CoordTrait, RectTrait};

/// Number of axes tracked by a [`Bounds`]: X, Y, Z and M.
pub const NUM_AXES: usize = 4;

/// A 4-axis bounding box. Axis order is X, Y, Z, M.
///
/// Only the first `dimension` axes take part in overlap and containment tests, so a 2D tree
/// ignores whatever Z and M ranges a shape carries.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub min: [f64; NUM_AXES],
    pub max: [f64; NUM_AXES],
}

impl Bounds {
    pub fn new(min: [f64; NUM_AXES], max: [f64; NUM_AXES]) -> Self {
        Self { min, max }
    }

    /// A box in the XY plane, with zeroed Z and M ranges.
    pub fn from_xy(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min: [min_x, min_y, 0., 0.],
            max: [max_x, max_y, 0., 0.],
        }
    }

    /// Convert any [`RectTrait`] into an XY box.
    pub fn from_rect(rect: &impl RectTrait<T = f64>) -> Self {
        Self::from_xy(
            rect.min().x(),
            rect.min().y(),
            rect.max().x(),
            rect.max().y(),
        )
    }

    pub fn min_x(&self) -> f64 {
        self.min[0]
    }

    pub fn min_y(&self) -> f64 {
        self.min[1]
    }

    pub fn max_x(&self) -> f64 {
        self.max[0]
    }

    pub fn max_y(&self) -> f64 {
        self.max[1]
    }

    /// Grow this box so that it also covers `other` on every axis. Never shrinks.
    pub fn expand(&mut self, other: &Bounds) {
        for axis in 0..NUM_AXES {
            if other.min[axis] < self.min[axis] {
                self.min[axis] = other.min[axis];
            }
            if other.max[axis] > self.max[axis] {
                self.max[axis] = other.max[axis];
            }
        }
    }

    /// Whether this box and `other` share at least one point on the first `dimension` axes.
    pub fn overlaps(&self, other: &Bounds, dimension: usize) -> bool {
        check_bounds_overlap(&self.min, &self.max, &other.min, &other.max, dimension)
    }

    /// Whether `other` lies entirely inside this box on the first `dimension` axes.
    pub fn contains(&self, other: &Bounds, dimension: usize) -> bool {
        (0..dimension).all(|axis| {
            other.min[axis] >= self.min[axis] && other.max[axis] <= self.max[axis]
        })
    }

    /// Split this box in two at the midpoint of `axis`. The halves share the split plane and
    /// together cover exactly this box.
    pub fn split(&self, axis: usize) -> (Bounds, Bounds) {
        let mid = self.min[axis] + (self.max[axis] - self.min[axis]) / 2.;
        let mut lower = *self;
        let mut upper = *self;
        lower.max[axis] = mid;
        upper.min[axis] = mid;
        (lower, upper)
    }

    /// Flatten to `[min_x, min_y, min_z, min_m, max_x, max_y, max_z, max_m]`.
    pub(crate) fn to_array(self) -> [f64; 2 * NUM_AXES] {
        let mut out = [0.; 2 * NUM_AXES];
        out[..NUM_AXES].copy_from_slice(&self.min);
        out[NUM_AXES..].copy_from_slice(&self.max);
        out
    }

    pub(crate) fn from_array(values: [f64; 2 * NUM_AXES]) -> Self {
        let mut bounds = Bounds::default();
        bounds.min.copy_from_slice(&values[..NUM_AXES]);
        bounds.max.copy_from_slice(&values[NUM_AXES..]);
        bounds
    }
}

/// Test whether two boxes overlap on their first `dimension` axes.
///
/// Intervals are closed, so boxes that only touch along an edge overlap.
#[inline]
pub fn check_bounds_overlap(
    min_a: &[f64; NUM_AXES],
    max_a: &[f64; NUM_AXES],
    min_b: &[f64; NUM_AXES],
    max_b: &[f64; NUM_AXES],
    dimension: usize,
) -> bool {
    for axis in 0..dimension.min(NUM_AXES) {
        if max_a[axis] < min_b[axis] {
            return false;
        }
        if max_b[axis] < min_a[axis] {
            return false;
        }
    }
    true
}

/// A single XY coordinate.
///
/// Used in the implementation of RectTrait for Bounds.
pub struct Coord {
    x: f64,
    y: f64,
}

impl CoordTrait for Coord {
    type T = f64;

    fn dim(&self) -> geo_traits::Dimensions {
        geo_traits::Dimensions::Xy
    }

    fn x(&self) -> Self::T {
        self.x
    }

    fn y(&self) -> Self::T {
        self.y
    }

    fn nth_or_panic(&self, n: usize) -> Self::T {
        match n {
            0 => self.x,
            1 => self.y,
            _ => panic!("Invalid index of coord"),
        }
    }
}

impl RectTrait for Bounds {
    type T = f64;
    type CoordType<'a>
        = Coord
    where
        Self: 'a;

    fn dim(&self) -> geo_traits::Dimensions {
        geo_traits::Dimensions::Xy
    }

    fn min(&self) -> Self::CoordType<'_> {
        Coord {
            x: self.min_x(),
            y: self.min_y(),
        }
    }

    fn max(&self) -> Self::CoordType<'_> {
        Coord {
            x: self.max_x(),
            y: self.max_y(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn overlap_is_symmetric() {
        let a = Bounds::from_xy(0., 0., 10., 10.);
        let b = Bounds::from_xy(5., 5., 15., 15.);
        let c = Bounds::from_xy(20., 20., 30., 30.);
        assert!(a.overlaps(&b, 2));
        assert!(b.overlaps(&a, 2));
        assert!(!a.overlaps(&c, 2));
        assert!(!c.overlaps(&a, 2));
    }

    #[test]
    fn touching_boxes_overlap() {
        let a = Bounds::from_xy(0., 0., 10., 10.);
        let b = Bounds::from_xy(10., 0., 20., 10.);
        assert!(check_bounds_overlap(&a.min, &a.max, &b.min, &b.max, 2));
        assert!(check_bounds_overlap(&b.min, &b.max, &a.min, &a.max, 2));

        let c = Bounds::from_xy(10.000001, 0., 20., 10.);
        assert!(!a.overlaps(&c, 2));
    }

    #[test]
    fn inactive_axes_are_ignored() {
        let a = Bounds::new([0., 0., 0., 0.], [1., 1., 1., 0.]);
        let b = Bounds::new([0., 0., 5., 0.], [1., 1., 6., 0.]);
        assert!(a.overlaps(&b, 2));
        assert!(!a.overlaps(&b, 3));
    }

    #[test]
    fn split_covers_parent() {
        let parent = Bounds::from_xy(0., 0., 10., 4.);
        let (lower, upper) = parent.split(0);
        assert_eq!(lower, Bounds::from_xy(0., 0., 5., 4.));
        assert_eq!(upper, Bounds::from_xy(5., 0., 10., 4.));
        assert!(parent.contains(&lower, 2));
        assert!(parent.contains(&upper, 2));
    }

    #[test]
    fn expand_never_shrinks() {
        let mut a = Bounds::from_xy(0., 0., 10., 10.);
        a.expand(&Bounds::from_xy(2., 2., 3., 3.));
        assert_eq!(a, Bounds::from_xy(0., 0., 10., 10.));
        a.expand(&Bounds::from_xy(-1., 2., 3., 30.));
        assert_eq!(a, Bounds::from_xy(-1., 0., 10., 30.));
    }

    #[test]
    fn rect_view() {
        let a = Bounds::from_xy(1., 2., 3., 4.);
        assert_eq!(Bounds::from_rect(&a), a);
    }
}
