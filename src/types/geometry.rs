use serde::{Deserialize, Serialize};

/// Rectangle in top-down page space: origin at the top-left corner of the
/// page, Y growing downward, units in points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Placeholder box carried by spans the locator could not place
    pub const ZERO: BoundingBox = BoundingBox {
        left: 0.0,
        top: 0.0,
        width: 0.0,
        height: 0.0,
    };

    /// Builds a box, clamping negative extents to zero
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Builds the smallest box containing both corners
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        let left = x0.min(x1);
        let top = y0.min(y1);
        Self::new(left, top, (x1 - x0).abs(), (y1 - y0).abs())
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Smallest box containing `self` and `other`
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        BoundingBox::new(left, top, right - left, bottom - top)
    }
}

/// Rectangle in PDF user space: origin at the bottom-left, Y growing upward.
///
/// Only the compositor produces these; top-down boxes are converted exactly
/// once, right before painting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Affine transform `[a b c d e f]` using the PDF row-vector convention
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self × other`: applies `self` first, then `other`
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn transform(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
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

    #[test]
    fn test_negative_extent_is_clamped() {
        let b = BoundingBox::new(10.0, 10.0, -5.0, -1.0);
        assert_eq!(b.width, 0.0);
        assert_eq!(b.height, 0.0);
    }

    #[test]
    fn test_derived_edges() {
        let b = BoundingBox::new(100.0, 200.0, 50.0, 20.0);
        assert_eq!(b.right(), 150.0);
        assert_eq!(b.bottom(), 220.0);
        assert!(!b.is_zero());
        assert!(BoundingBox::ZERO.is_zero());
    }

    #[test]
    fn test_union() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 8.0, 10.0, 10.0);
        assert_eq!(a.union(&b), BoundingBox::new(0.0, 0.0, 15.0, 18.0));
    }

    #[test]
    fn test_matrix_order() {
        // scale by 2, then move by (10, 0)
        let m = Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0).multiply(&Matrix::translate(10.0, 0.0));
        assert_eq!(m.transform(1.0, 1.0), (12.0, 2.0));

        // move first, then scale
        let m = Matrix::translate(10.0, 0.0).multiply(&Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0));
        assert_eq!(m.transform(1.0, 1.0), (22.0, 2.0));
    }
}
