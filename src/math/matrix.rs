//! 2D affine transformation matrix.
//!
//! The matrix maps local coordinates into a parent coordinate space and is
//! composed hierarchically during the scene-graph transform pass:
//!
//! ```text
//! | a  c  tx |
//! | b  d  ty |
//! | 0  0  1  |
//! ```

use super::point::Point;

/// Tolerance used by [`Matrix::decompose`] to tell a uniform rotation apart
/// from a skewed matrix. The value is a tuned heuristic, not a derived bound;
/// tighten it if decomposition of nearly-skewed matrices misbehaves.
pub const SKEW_EPSILON: f32 = 1e-5;

/// A 2D affine transform as six scalars (a, b, c, d, tx, ty).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

/// Scale/rotation/skew/translation recovered from a composed matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Decomposed {
    pub position: Point,
    pub scale: Point,
    pub rotation: f32,
    pub skew: Point,
}

impl Matrix {
    /// The identity transform. Composed with any matrix M it yields M.
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub fn new(a: f32, b: f32, c: f32, d: f32, tx: f32, ty: f32) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    /// Create a pure translation matrix.
    pub fn translation(x: f32, y: f32) -> Self {
        Self {
            tx: x,
            ty: y,
            ..Self::IDENTITY
        }
    }

    /// Translate this matrix in place (applied after the current transform).
    pub fn translate(&mut self, x: f32, y: f32) -> &mut Self {
        self.tx += x;
        self.ty += y;
        self
    }

    /// Scale this matrix in place (applied after the current transform,
    /// so an existing translation is scaled as well).
    pub fn scale(&mut self, x: f32, y: f32) -> &mut Self {
        self.a *= x;
        self.c *= x;
        self.tx *= x;
        self.b *= y;
        self.d *= y;
        self.ty *= y;
        self
    }

    /// Rotate this matrix in place by `angle` radians (applied after the
    /// current transform).
    pub fn rotate(&mut self, angle: f32) -> &mut Self {
        let (sin, cos) = angle.sin_cos();
        let a1 = self.a;
        let c1 = self.c;
        let tx1 = self.tx;

        self.a = a1 * cos - self.b * sin;
        self.b = a1 * sin + self.b * cos;
        self.c = c1 * cos - self.d * sin;
        self.d = c1 * sin + self.d * cos;
        self.tx = tx1 * cos - self.ty * sin;
        self.ty = tx1 * sin + self.ty * cos;
        self
    }

    /// Append `other`: the resulting matrix applies `other` first, then
    /// `self`. Composition is non-commutative; this order is what gives
    /// parent-world ∘ child-local semantics in the transform pass.
    pub fn append(&mut self, other: &Matrix) -> &mut Self {
        let a1 = self.a;
        let b1 = self.b;
        let c1 = self.c;
        let d1 = self.d;

        self.a = other.a * a1 + other.b * c1;
        self.b = other.a * b1 + other.b * d1;
        self.c = other.c * a1 + other.d * c1;
        self.d = other.c * b1 + other.d * d1;
        self.tx = other.tx * a1 + other.ty * c1 + self.tx;
        self.ty = other.tx * b1 + other.ty * d1 + self.ty;
        self
    }

    /// Prepend `other`: the resulting matrix applies `self` first, then
    /// `other`.
    pub fn prepend(&mut self, other: &Matrix) -> &mut Self {
        let tx1 = self.tx;

        if other.a != 1.0 || other.b != 0.0 || other.c != 0.0 || other.d != 1.0 {
            let a1 = self.a;
            let c1 = self.c;

            self.a = a1 * other.a + self.b * other.c;
            self.b = a1 * other.b + self.b * other.d;
            self.c = c1 * other.a + self.d * other.c;
            self.d = c1 * other.b + self.d * other.d;
        }

        self.tx = tx1 * other.a + self.ty * other.c + other.tx;
        self.ty = tx1 * other.b + self.ty * other.d + other.ty;
        self
    }

    /// Returns `self ∘ other` without mutating either operand.
    pub fn appended(&self, other: &Matrix) -> Matrix {
        let mut out = *self;
        out.append(other);
        out
    }

    /// Transform a point by this matrix.
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.tx,
            self.b * p.x + self.d * p.y + self.ty,
        )
    }

    /// Transform a point by the inverse of this matrix.
    ///
    /// Degenerate matrices (zero determinant) map everything to the origin
    /// rather than producing NaNs; geometry helpers never fail.
    pub fn apply_inverse(&self, p: Point) -> Point {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < 1e-10 {
            return Point::new(0.0, 0.0);
        }
        let id = 1.0 / det;
        Point::new(
            self.d * id * p.x - self.c * id * p.y + (self.ty * self.c - self.tx * self.d) * id,
            self.a * id * p.y - self.b * id * p.x + (self.tx * self.b - self.ty * self.a) * id,
        )
    }

    /// Invert this matrix in place. Degenerate matrices become identity.
    pub fn invert(&mut self) -> &mut Self {
        let a1 = self.a;
        let b1 = self.b;
        let c1 = self.c;
        let d1 = self.d;
        let tx1 = self.tx;
        let det = a1 * d1 - b1 * c1;

        if det.abs() < 1e-10 {
            *self = Self::IDENTITY;
            return self;
        }

        self.a = d1 / det;
        self.b = -b1 / det;
        self.c = -c1 / det;
        self.d = a1 / det;
        self.tx = (c1 * self.ty - d1 * tx1) / det;
        self.ty = -(a1 * self.ty - b1 * tx1) / det;
        self
    }

    /// Recover position/scale/rotation/skew from this matrix.
    ///
    /// Uses an atan2 heuristic: when the two recovered skew angles cancel
    /// (within [`SKEW_EPSILON`]) the matrix is treated as a uniform rotation,
    /// otherwise rotation is reported as zero and the skew pair carries the
    /// full angular information.
    pub fn decompose(&self) -> Decomposed {
        let skew_x = -(-self.c).atan2(self.d);
        let skew_y = self.b.atan2(self.a);

        let delta = (skew_x + skew_y).abs();
        let (rotation, skew) =
            if delta < SKEW_EPSILON || (std::f32::consts::TAU - delta).abs() < SKEW_EPSILON {
                (skew_y, Point::new(0.0, 0.0))
            } else {
                (0.0, Point::new(skew_x, skew_y))
            };

        Decomposed {
            position: Point::new(self.tx, self.ty),
            scale: Point::new(
                (self.a * self.a + self.b * self.b).sqrt(),
                (self.c * self.c + self.d * self.d).sqrt(),
            ),
            rotation,
            skew,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn approx_point(p: Point, x: f32, y: f32) -> bool {
        approx_eq(p.x, x) && approx_eq(p.y, y)
    }

    #[test]
    fn test_identity_composition() {
        let m = Matrix::new(2.0, 0.5, -0.5, 3.0, 10.0, -4.0);
        let mut lhs = Matrix::IDENTITY;
        lhs.append(&m);
        assert_eq!(lhs, m);

        let mut rhs = m;
        rhs.append(&Matrix::IDENTITY);
        assert_eq!(rhs, m);
    }

    #[test]
    fn test_translate_then_scale_order() {
        // translate(20,20) then scale(2,2) scales the translation too:
        // (100,100) -> 240,240
        let mut m = Matrix::identity();
        m.translate(20.0, 20.0).scale(2.0, 2.0);
        let p = m.apply(Point::new(100.0, 100.0));
        assert!(approx_point(p, 240.0, 240.0));
    }

    #[test]
    fn test_append_matches_nested_apply() {
        let mut a = Matrix::identity();
        a.rotate(0.7);
        a.translate(5.0, -3.0);
        let mut b = Matrix::identity();
        b.scale(2.0, 0.5);
        b.translate(-1.0, 4.0);

        let p = Point::new(13.0, -7.0);
        let nested = a.apply(b.apply(p));

        let mut composed = a;
        composed.append(&b);
        let direct = composed.apply(p);

        assert!(approx_point(direct, nested.x, nested.y));
    }

    #[test]
    fn test_prepend_is_reverse_composition() {
        let mut a = Matrix::identity();
        a.translate(3.0, 4.0);
        let mut b = Matrix::identity();
        b.scale(2.0, 2.0);

        let mut appended = b;
        appended.append(&a);
        let mut prepended = a;
        prepended.prepend(&b);

        let p = Point::new(1.0, 1.0);
        let pa = appended.apply(p);
        let pb = prepended.apply(p);
        assert!(approx_point(pb, pa.x, pa.y));
    }

    #[test]
    fn test_apply_inverse_round_trip() {
        let mut m = Matrix::identity();
        m.rotate(1.2);
        m.scale(3.0, 0.25);
        m.translate(-40.0, 12.0);

        let p = Point::new(7.5, -2.25);
        let back = m.apply_inverse(m.apply(p));
        assert!(approx_point(back, p.x, p.y));
    }

    #[test]
    fn test_invert_composes_to_identity() {
        let mut m = Matrix::identity();
        m.rotate(0.3);
        m.translate(9.0, 9.0);

        let mut inv = m;
        inv.invert();
        let mut composed = m;
        composed.append(&inv);

        let p = composed.apply(Point::new(5.0, 6.0));
        assert!(approx_point(p, 5.0, 6.0));
    }

    #[test]
    fn test_degenerate_inverse_is_safe() {
        let m = Matrix::new(0.0, 0.0, 0.0, 0.0, 3.0, 3.0);
        let p = m.apply_inverse(Point::new(100.0, 100.0));
        assert!(approx_point(p, 0.0, 0.0));

        let mut inv = m;
        inv.invert();
        assert!(inv.is_identity());
    }

    #[test]
    fn test_decompose_pure_rotation() {
        let mut m = Matrix::identity();
        m.rotate(0.9);
        let d = m.decompose();
        assert!(approx_eq(d.rotation, 0.9));
        assert!(approx_eq(d.skew.x, 0.0) && approx_eq(d.skew.y, 0.0));
        assert!(approx_eq(d.scale.x, 1.0) && approx_eq(d.scale.y, 1.0));
    }

    #[test]
    fn test_decompose_skewed() {
        // A shear along x only: skew angles do not cancel.
        let m = Matrix::new(1.0, 0.0, 0.6, 1.0, 0.0, 0.0);
        let d = m.decompose();
        assert!(approx_eq(d.rotation, 0.0));
        assert!(d.skew.x.abs() > 0.1);
    }

    #[test]
    fn test_decompose_recovers_translation_and_scale() {
        let mut m = Matrix::identity();
        m.scale(2.0, 5.0);
        m.translate(11.0, -3.0);
        let d = m.decompose();
        assert!(approx_point(d.position, 11.0, -3.0));
        assert!(approx_eq(d.scale.x, 2.0) && approx_eq(d.scale.y, 5.0));
    }
}
