use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::geom::{Point, PointF, Rect, RectF};

/// Scale used by the near-zero policy: coefficients are rounded to three
/// decimal digits before the identity and singularity checks. A coefficient
/// within 5e-4 of an identity value therefore still counts as identity, and a
/// determinant whose rounded factors collapse to zero counts as singular.
pub const COEFF_ROUND_SCALE: f32 = 1e3;

#[inline]
fn round_coeff(v: f32) -> f32 {
    (v * COEFF_ROUND_SCALE).round() / COEFF_ROUND_SCALE
}

/// Whether an incoming transform is applied before (`Prepend`) or after
/// (`Append`) the receiver's existing transform. Defaults to `Prepend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatrixOrder {
    #[default]
    Prepend,
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixError {
    /// The rectangle-to-parallelogram constructor needs exactly 3 points.
    WrongPointCount(usize),
    /// The source rectangle of a point correspondence has zero width or
    /// height, so it does not span a basis.
    DegenerateRect,
    /// The matrix is singular under the near-zero policy, or a coefficient
    /// is NaN or infinite.
    NotInvertible,
    /// A transform target slice was empty.
    EmptyPoints,
}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatrixError::WrongPointCount(n) => {
                write!(f, "expected exactly 3 destination points, got {n}")
            }
            MatrixError::DegenerateRect => {
                f.write_str("source rectangle has zero width or height")
            }
            MatrixError::NotInvertible => f.write_str("matrix is not invertible"),
            MatrixError::EmptyPoints => f.write_str("point slice is empty"),
        }
    }
}

impl std::error::Error for MatrixError {}

/// A 2D affine transformation, stored as six coefficients in row-vector
/// convention:
///
/// ```text
/// (x, y, 1) · | m11 m12 0 |
///             | m21 m22 0 |  =  (x*m11 + y*m21 + dx, x*m12 + y*m22 + dy)
///             | dx  dy  1 |
/// ```
///
/// The bottom row of the conceptual 3x3 matrix is always `(0, 0, 1)` and is
/// never stored. Every combining operation rewrites the receiver in place.
///
/// Equality is plain IEEE comparison of all six coefficients (NaN is never
/// equal to NaN); only `is_identity` and `is_invertible` apply the near-zero
/// rounding policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 6]", into = "[f32; 6]")]
pub struct Matrix {
    m11: f32,
    m12: f32,
    m21: f32,
    m22: f32,
    dx: f32,
    dy: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[f32; 6]> for Matrix {
    fn from(e: [f32; 6]) -> Self {
        Self::new(e[0], e[1], e[2], e[3], e[4], e[5])
    }
}

impl From<Matrix> for [f32; 6] {
    fn from(m: Matrix) -> Self {
        m.elements()
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} {} {} {} {} {}]",
            self.m11, self.m12, self.m21, self.m22, self.dx, self.dy
        )
    }
}

impl Hash for Matrix {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // -0.0 must hash like 0.0 since the two compare equal. NaN payloads
        // are irrelevant because NaN matrices never compare equal.
        #[inline]
        fn bits(v: f32) -> u32 {
            if v == 0.0 { 0.0f32.to_bits() } else { v.to_bits() }
        }

        for e in self.elements() {
            bits(e).hash(state);
        }
    }
}

// Construction
// ------------------------------------------------------------------------------
impl Matrix {
    pub const fn identity() -> Self {
        Self {
            m11: 1.0,
            m12: 0.0,
            m21: 0.0,
            m22: 1.0,
            dx: 0.0,
            dy: 0.0,
        }
    }

    /// Stores the six coefficients verbatim. No finiteness validation;
    /// NaN and infinities are legal states.
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

    /// Parses a 6-element coefficient slice in `(m11, m12, m21, m22, dx, dy)`
    /// order. Returns `None` if there are fewer than 6 elements.
    pub fn from_elements(elems: &[f32]) -> Option<Self> {
        if elems.len() < 6 {
            return None;
        }
        Some(Self::new(
            elems[0], elems[1], elems[2], elems[3], elems[4], elems[5],
        ))
    }

    /// The unique affine map sending the rectangle's `(left, top)`,
    /// `(right, top)` and `(left, bottom)` corners to `plg[0]`, `plg[1]` and
    /// `plg[2]` respectively.
    ///
    /// Fails with `WrongPointCount` unless `plg` holds exactly 3 points, and
    /// with `DegenerateRect` if the rectangle's width or height is zero.
    pub fn from_rect_points(rect: RectF, plg: &[PointF]) -> Result<Self, MatrixError> {
        // Argument shape first, then the basis check.
        if plg.len() != 3 {
            return Err(MatrixError::WrongPointCount(plg.len()));
        }
        if rect.w == 0.0 || rect.h == 0.0 {
            return Err(MatrixError::DegenerateRect);
        }

        let m11 = (plg[1].x - plg[0].x) / rect.w;
        let m12 = (plg[1].y - plg[0].y) / rect.w;
        let m21 = (plg[2].x - plg[0].x) / rect.h;
        let m22 = (plg[2].y - plg[0].y) / rect.h;
        let dx = plg[0].x - rect.x * m11 - rect.y * m21;
        let dy = plg[0].y - rect.x * m12 - rect.y * m22;

        Ok(Self::new(m11, m12, m21, m22, dx, dy))
    }

    /// Integer-geometry variant of [`Matrix::from_rect_points`].
    pub fn from_rect_points_i(rect: Rect, plg: &[Point]) -> Result<Self, MatrixError> {
        let plg_f: Vec<PointF> = plg.iter().map(|&p| PointF::from(p)).collect();
        Self::from_rect_points(RectF::from(rect), &plg_f)
    }
}

// Properties
// ------------------------------------------------------------------------------
impl Matrix {
    /// The six coefficients in canonical `(m11, m12, m21, m22, dx, dy)` order.
    #[inline]
    pub fn elements(&self) -> [f32; 6] {
        [self.m11, self.m12, self.m21, self.m22, self.dx, self.dy]
    }

    #[inline]
    pub fn m11(&self) -> f32 {
        self.m11
    }

    #[inline]
    pub fn m12(&self) -> f32 {
        self.m12
    }

    #[inline]
    pub fn m21(&self) -> f32 {
        self.m21
    }

    #[inline]
    pub fn m22(&self) -> f32 {
        self.m22
    }

    /// The x translation, alias for `dx`.
    #[inline]
    pub fn offset_x(&self) -> f32 {
        self.dx
    }

    /// The y translation, alias for `dy`.
    #[inline]
    pub fn offset_y(&self) -> f32 {
        self.dy
    }

    /// True iff every coefficient equals its identity value after rounding
    /// per [`COEFF_ROUND_SCALE`].
    pub fn is_identity(&self) -> bool {
        round_coeff(self.m11) == 1.0
            && round_coeff(self.m12) == 0.0
            && round_coeff(self.m21) == 0.0
            && round_coeff(self.m22) == 1.0
            && round_coeff(self.dx) == 0.0
            && round_coeff(self.dy) == 0.0
    }

    /// True iff all coefficients are finite and the determinant of the
    /// linear block, computed on coefficients rounded per
    /// [`COEFF_ROUND_SCALE`], is nonzero.
    pub fn is_invertible(&self) -> bool {
        if self.elements().iter().any(|e| !e.is_finite()) {
            return false;
        }
        let det = round_coeff(self.m11) * round_coeff(self.m22)
            - round_coeff(self.m12) * round_coeff(self.m21);
        det != 0.0
    }
}

// Combination
// ------------------------------------------------------------------------------
impl Matrix {
    /// Combines `b` with `self` per `order`: `self <- b * self` for
    /// `Prepend`, `self <- self * b` for `Append` (row-vector products).
    fn combine(&mut self, b: &Matrix, order: MatrixOrder) {
        let (m11, m12, m21, m22, dx, dy) = match order {
            MatrixOrder::Prepend => (
                b.m11 * self.m11 + b.m12 * self.m21,
                b.m11 * self.m12 + b.m12 * self.m22,
                b.m21 * self.m11 + b.m22 * self.m21,
                b.m21 * self.m12 + b.m22 * self.m22,
                b.dx * self.m11 + b.dy * self.m21 + self.dx,
                b.dx * self.m12 + b.dy * self.m22 + self.dy,
            ),
            MatrixOrder::Append => (
                self.m11 * b.m11 + self.m12 * b.m21,
                self.m11 * b.m12 + self.m12 * b.m22,
                self.m21 * b.m11 + self.m22 * b.m21,
                self.m21 * b.m12 + self.m22 * b.m22,
                self.dx * b.m11 + self.dy * b.m21 + b.dx,
                self.dx * b.m12 + self.dy * b.m22 + b.dy,
            ),
        };

        *self = Self::new(m11, m12, m21, m22, dx, dy);
    }

    /// Multiplies `self` by `other` per `order`, in place.
    pub fn multiply(&mut self, other: &Matrix, order: MatrixOrder) {
        self.combine(other, order);
    }

    /// Combines a scale by `(sx, sy)` about the origin.
    pub fn scale(&mut self, sx: f32, sy: f32, order: MatrixOrder) {
        self.combine(&Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0), order);
    }

    /// Combines a rotation about the origin. The angle is in degrees and is
    /// normalized modulo 360, so negative angles and full turns behave.
    pub fn rotate(&mut self, angle_degrees: f32, order: MatrixOrder) {
        let theta = (angle_degrees % 360.0).to_radians();
        let (sin, cos) = theta.sin_cos();
        self.combine(&Self::new(cos, sin, -sin, cos, 0.0, 0.0), order);
    }

    /// Combines a rotation about `center`: the single elementary transform
    /// `T(-center) * R(angle) * T(center)`.
    pub fn rotate_at(&mut self, angle_degrees: f32, center: PointF, order: MatrixOrder) {
        let theta = (angle_degrees % 360.0).to_radians();
        let (sin, cos) = theta.sin_cos();
        let dx = center.x - center.x * cos + center.y * sin;
        let dy = center.y - center.x * sin - center.y * cos;
        self.combine(&Self::new(cos, sin, -sin, cos, dx, dy), order);
    }

    /// Combines a shear: x gains `shx` per unit y, y gains `shy` per unit x.
    pub fn shear(&mut self, shx: f32, shy: f32, order: MatrixOrder) {
        self.combine(&Self::new(1.0, shy, shx, 1.0, 0.0, 0.0), order);
    }

    /// Combines a translation by `(dx, dy)`.
    pub fn translate(&mut self, dx: f32, dy: f32, order: MatrixOrder) {
        self.combine(&Self::new(1.0, 0.0, 0.0, 1.0, dx, dy), order);
    }

    /// Overwrites the matrix with the identity. Idempotent.
    pub fn reset(&mut self) {
        *self = Self::identity();
    }

    /// Replaces the matrix with its inverse. Fails, leaving the matrix
    /// unchanged, if `self` is not invertible (see [`Matrix::is_invertible`]).
    pub fn invert(&mut self) -> Result<(), MatrixError> {
        if !self.is_invertible() {
            return Err(MatrixError::NotInvertible);
        }

        // The raw determinant feeds the division; rounding applies only to
        // the invertibility decision above.
        let det = self.m11 * self.m22 - self.m12 * self.m21;
        let n11 = self.m22 / det;
        let n12 = -self.m12 / det;
        let n21 = -self.m21 / det;
        let n22 = self.m11 / det;
        let ndx = -(self.dx * n11 + self.dy * n21);
        let ndy = -(self.dx * n12 + self.dy * n22);

        *self = Self::new(n11, n12, n21, n22, ndx, ndy);
        Ok(())
    }
}

// Point/vector transformation
// ------------------------------------------------------------------------------
impl Matrix {
    /// Applies the full affine map (linear block and translation) to every
    /// point, in place and in order. Fails on an empty slice.
    pub fn transform_points(&self, pts: &mut [PointF]) -> Result<(), MatrixError> {
        if pts.is_empty() {
            return Err(MatrixError::EmptyPoints);
        }
        for p in pts.iter_mut() {
            let (x, y) = (p.x, p.y);
            p.x = x * self.m11 + y * self.m21 + self.dx;
            p.y = x * self.m12 + y * self.m22 + self.dy;
        }
        Ok(())
    }

    /// Applies only the linear block (no translation) to every point, in
    /// place. Models displacement vectors rather than positions. Fails on an
    /// empty slice.
    pub fn transform_vectors(&self, pts: &mut [PointF]) -> Result<(), MatrixError> {
        if pts.is_empty() {
            return Err(MatrixError::EmptyPoints);
        }
        for p in pts.iter_mut() {
            let (x, y) = (p.x, p.y);
            p.x = x * self.m11 + y * self.m21;
            p.y = x * self.m12 + y * self.m22;
        }
        Ok(())
    }

    /// Integer variant of [`Matrix::transform_points`]. Each transformed
    /// coordinate is rounded to the nearest integer, halves away from zero.
    pub fn transform_points_i(&self, pts: &mut [Point]) -> Result<(), MatrixError> {
        if pts.is_empty() {
            return Err(MatrixError::EmptyPoints);
        }
        for p in pts.iter_mut() {
            let (x, y) = (p.x as f32, p.y as f32);
            p.x = (x * self.m11 + y * self.m21 + self.dx).round() as i32;
            p.y = (x * self.m12 + y * self.m22 + self.dy).round() as i32;
        }
        Ok(())
    }

    /// Integer variant of [`Matrix::transform_vectors`]. Same rounding rule
    /// as [`Matrix::transform_points_i`].
    pub fn transform_vectors_i(&self, pts: &mut [Point]) -> Result<(), MatrixError> {
        if pts.is_empty() {
            return Err(MatrixError::EmptyPoints);
        }
        for p in pts.iter_mut() {
            let (x, y) = (p.x as f32, p.y as f32);
            p.x = (x * self.m11 + y * self.m21).round() as i32;
            p.y = (x * self.m12 + y * self.m22).round() as i32;
        }
        Ok(())
    }
}

/// Parses a matrix from its JSON wire form, a 6-element array in
/// `(m11, m12, m21, m22, dx, dy)` order.
pub fn parse_matrix_json(json_text: &str) -> Result<Matrix, serde_json::Error> {
    serde_json::from_str(json_text)
}
