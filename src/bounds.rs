//! Axis-aligned bounding-box accumulation.
//!
//! A `Bounds` is a reusable min/max accumulator: reset it to the infinite
//! sentinels, feed it quads/vertices/frames in world space, and materialize
//! a [`Rectangle`] only when a caller actually asks for one.

use crate::math::{Matrix, Point, Rectangle};

/// Min/max scalars tracking an axis-aligned box under accumulation.
#[derive(Clone, Debug)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn new() -> Self {
        Self {
            min_x: f32::INFINITY,
            min_y: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            max_y: f32::NEG_INFINITY,
        }
    }

    /// Reset to the empty (inverted-infinity) state before a new pass.
    pub fn clear(&mut self) {
        self.min_x = f32::INFINITY;
        self.min_y = f32::INFINITY;
        self.max_x = f32::NEG_INFINITY;
        self.max_y = f32::NEG_INFINITY;
    }

    /// True while nothing has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x
    }

    pub fn add_point(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    /// Extend by a quad given as four interleaved x/y vertex pairs.
    pub fn add_quad(&mut self, vertices: &[f32; 8]) {
        for pair in vertices.chunks_exact(2) {
            self.min_x = self.min_x.min(pair[0]);
            self.min_y = self.min_y.min(pair[1]);
            self.max_x = self.max_x.max(pair[0]);
            self.max_y = self.max_y.max(pair[1]);
        }
    }

    /// Extend by interleaved x/y vertices transformed through `transform`.
    pub fn add_vertices(&mut self, transform: &Matrix, vertices: &[f32]) {
        for pair in vertices.chunks_exact(2) {
            let p = transform.apply(Point::new(pair[0], pair[1]));
            self.add_point(p);
        }
    }

    /// Extend by an axis-aligned frame transformed through `transform`
    /// (the transformed frame's four corners, so rotation is handled).
    pub fn add_frame(&mut self, transform: &Matrix, x0: f32, y0: f32, x1: f32, y1: f32) {
        self.add_point(transform.apply(Point::new(x0, y0)));
        self.add_point(transform.apply(Point::new(x1, y0)));
        self.add_point(transform.apply(Point::new(x0, y1)));
        self.add_point(transform.apply(Point::new(x1, y1)));
    }

    /// Union with another accumulated box.
    pub fn add_bounds(&mut self, other: &Bounds) {
        if other.is_empty() {
            return;
        }
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    /// Union with `other` clipped to `mask`: only the part of `other`
    /// inside the mask's box contributes.
    pub fn add_bounds_masked(&mut self, other: &Bounds, mask: &Bounds) {
        if other.is_empty() || mask.is_empty() {
            return;
        }
        let min_x = other.min_x.max(mask.min_x);
        let min_y = other.min_y.max(mask.min_y);
        let max_x = other.max_x.min(mask.max_x);
        let max_y = other.max_y.min(mask.max_y);

        if max_x > min_x && max_y > min_y {
            self.min_x = self.min_x.min(min_x);
            self.min_y = self.min_y.min(min_y);
            self.max_x = self.max_x.max(max_x);
            self.max_y = self.max_y.max(max_y);
        }
    }

    /// Materialize the accumulated box. An empty accumulator yields the
    /// zero rectangle rather than infinities.
    pub fn rectangle(&self) -> Rectangle {
        if self.is_empty() {
            return Rectangle::EMPTY;
        }
        Rectangle::new(
            self.min_x,
            self.min_y,
            self.max_x - self.min_x,
            self.max_y - self.min_y,
        )
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_rectangle_is_zero() {
        let b = Bounds::new();
        assert!(b.is_empty());
        assert_eq!(b.rectangle(), Rectangle::EMPTY);
    }

    #[test]
    fn test_add_quad() {
        let mut b = Bounds::new();
        b.add_quad(&[30.0, 20.0, 40.0, 20.0, 40.0, 30.0, 30.0, 30.0]);
        assert_eq!(b.rectangle(), Rectangle::new(30.0, 20.0, 10.0, 10.0));
    }

    #[test]
    fn test_add_frame_with_rotation() {
        // A 10x10 frame rotated 90° around the origin still produces a
        // tight 10x10 box.
        let mut m = Matrix::identity();
        m.rotate(std::f32::consts::FRAC_PI_2);

        let mut b = Bounds::new();
        b.add_frame(&m, 0.0, 0.0, 10.0, 10.0);
        let r = b.rectangle();
        assert!((r.width - 10.0).abs() < 1e-3);
        assert!((r.height - 10.0).abs() < 1e-3);
        assert!((r.x + 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_union_and_reuse() {
        let mut a = Bounds::new();
        a.add_point(Point::new(0.0, 0.0));
        a.add_point(Point::new(5.0, 5.0));

        let mut c = Bounds::new();
        c.add_point(Point::new(10.0, -2.0));

        a.add_bounds(&c);
        assert_eq!(a.rectangle(), Rectangle::new(0.0, -2.0, 10.0, 7.0));

        a.clear();
        assert!(a.is_empty());
    }

    #[test]
    fn test_masked_union_clips() {
        let mut child = Bounds::new();
        child.add_point(Point::new(0.0, 0.0));
        child.add_point(Point::new(100.0, 100.0));

        let mut mask = Bounds::new();
        mask.add_point(Point::new(50.0, 50.0));
        mask.add_point(Point::new(60.0, 60.0));

        let mut out = Bounds::new();
        out.add_bounds_masked(&child, &mask);
        assert_eq!(out.rectangle(), Rectangle::new(50.0, 50.0, 10.0, 10.0));
    }

    #[test]
    fn test_disjoint_mask_contributes_nothing() {
        let mut child = Bounds::new();
        child.add_point(Point::new(0.0, 0.0));
        child.add_point(Point::new(10.0, 10.0));

        let mut mask = Bounds::new();
        mask.add_point(Point::new(50.0, 50.0));
        mask.add_point(Point::new(60.0, 60.0));

        let mut out = Bounds::new();
        out.add_bounds_masked(&child, &mask);
        assert!(out.is_empty());
    }
}
