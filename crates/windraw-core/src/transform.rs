//! 2x3 affine matrices in row-vector convention
//!
//! A point is transformed as `p' = p · M`:
//!
//! ```text
//! x' = m11*x + m21*y + dx
//! y' = m12*x + m22*y + dy
//! ```
//!
//! This is the layout both native engines use (`D2D1_MATRIX_3X2_F`,
//! GDI+ `Matrix`), so values cross the backend boundary untouched.
//! `a.then(&b)` applies `a` first (innermost, local coordinates) and `b` after.

use std::ops::Mul;

use crate::types::Point;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub m11: f32,
    pub m12: f32,
    pub m21: f32,
    pub m22: f32,
    pub dx: f32,
    pub dy: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(m11: f32, m12: f32, m21: f32, m22: f32, dx: f32, dy: f32) -> Self {
        Self {
            m11,
            m12,
            m21,
            m22,
            dx,
            dy,
        }
    }

    pub const fn translation(dx: f32, dy: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, dx, dy)
    }

    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Clockwise rotation in degrees (y axis points down).
    pub fn rotation(degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Horizontal reflection about the vertical centerline of a layout
    /// `width` pixels wide. The reflection is its own inverse.
    pub const fn mirror(width: f32) -> Self {
        Self::new(-1.0, 0.0, 0.0, 1.0, width, 0.0)
    }

    /// `self × next`: `self` is applied first, `next` after it.
    pub fn then(&self, next: &Matrix) -> Matrix {
        Matrix {
            m11: self.m11 * next.m11 + self.m12 * next.m21,
            m12: self.m11 * next.m12 + self.m12 * next.m22,
            m21: self.m21 * next.m11 + self.m22 * next.m21,
            m22: self.m21 * next.m12 + self.m22 * next.m22,
            dx: self.dx * next.m11 + self.dy * next.m21 + next.dx,
            dy: self.dx * next.m12 + self.dy * next.m22 + next.dy,
        }
    }

    /// Adds a device-space offset after everything else.
    pub fn offset(&self, dx: f32, dy: f32) -> Matrix {
        Matrix {
            dx: self.dx + dx,
            dy: self.dy + dy,
            ..*self
        }
    }

    pub fn transform_point(&self, p: Point) -> Point {
        Point {
            x: self.m11 * p.x + self.m21 * p.y + self.dx,
            y: self.m12 * p.x + self.m22 * p.y + self.dy,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Exact equality of the underlying bits, distinguishing `0.0` from `-0.0`.
    pub fn bits_eq(&self, other: &Matrix) -> bool {
        self.to_array()
            .iter()
            .zip(other.to_array().iter())
            .all(|(a, b)| a.to_bits() == b.to_bits())
    }

    pub const fn to_array(&self) -> [f32; 6] {
        [self.m11, self.m12, self.m21, self.m22, self.dx, self.dy]
    }

    pub const fn from_array(v: [f32; 6]) -> Self {
        Self::new(v[0], v[1], v[2], v[3], v[4], v[5])
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    /// `a * b` is `a.then(&b)`.
    fn mul(self, rhs: Matrix) -> Matrix {
        self.then(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-4 && (a.y - b.y).abs() < 1e-4
    }

    #[test]
    fn test_then_applies_left_operand_first() {
        let scale = Matrix::scale(2.0, 3.0);
        let shift = Matrix::translation(10.0, 20.0);

        let p = Point::new(1.0, 1.0);
        assert_eq!(scale.then(&shift).transform_point(p), Point::new(12.0, 23.0));
        assert_eq!(shift.then(&scale).transform_point(p), Point::new(22.0, 63.0));
        assert_eq!(scale * shift, scale.then(&shift));
    }

    #[test]
    fn test_mirror_is_involution() {
        let r = Matrix::mirror(200.0);
        assert!(r.then(&r).is_identity());
        assert_eq!(r.transform_point(Point::new(0.0, 5.0)), Point::new(200.0, 5.0));
        assert_eq!(r.transform_point(Point::new(200.0, 5.0)), Point::new(0.0, 5.0));
    }

    #[test]
    fn test_rotation_quarter_turn() {
        let m = Matrix::rotation(90.0);
        assert!(close(m.transform_point(Point::new(1.0, 0.0)), Point::new(0.0, 1.0)));
    }

    #[test]
    fn test_offset_is_device_space() {
        let m = Matrix::scale(2.0, 2.0).offset(0.5, -0.5);
        assert_eq!(m.transform_point(Point::new(1.0, 1.0)), Point::new(2.5, 1.5));
    }

    #[test]
    fn test_bits_eq_distinguishes_signed_zero() {
        let a = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        let b = Matrix::new(1.0, -0.0, 0.0, 1.0, 0.0, 0.0);
        assert_eq!(a, b);
        assert!(!a.bits_eq(&b));
    }
}
