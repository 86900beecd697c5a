//! `Array` — a one-dimensional vector of reals used for optimizer iterates.
//!
//! Thin newtype around `nalgebra::DVector<f64>` exposing indexing,
//! element-wise arithmetic and the few reductions the optimizers need.

use heston_core::Real;
use nalgebra::DVector;
use std::ops::{Add, Div, Index, IndexMut, Mul, Sub};

/// A dynamically-sized 1D vector of `Real` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Array(DVector<Real>);

impl Array {
    /// Create a zero-filled array of length `n`.
    pub fn zeros(n: usize) -> Self {
        Self(DVector::zeros(n))
    }

    /// Create an array with every element set to `value`.
    pub fn from_element(n: usize, value: Real) -> Self {
        Self(DVector::from_element(n, value))
    }

    /// Create an array from a slice.
    pub fn from_slice(data: &[Real]) -> Self {
        Self(DVector::from_column_slice(data))
    }

    /// Create an array from a `Vec`.
    pub fn from_vec(data: Vec<Real>) -> Self {
        Self(DVector::from_vec(data))
    }

    /// Number of elements.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Return `true` if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return the elements as a slice.
    pub fn as_slice(&self) -> &[Real] {
        self.0.as_slice()
    }

    /// Copy the elements into a `Vec`.
    pub fn to_vec(&self) -> Vec<Real> {
        self.0.as_slice().to_vec()
    }

    /// Borrow the underlying `DVector`.
    pub fn inner(&self) -> &DVector<Real> {
        &self.0
    }

    /// Dot product.
    pub fn dot(&self, other: &Array) -> Real {
        self.0.dot(&other.0)
    }

    /// Squared Euclidean norm.
    pub fn norm_squared(&self) -> Real {
        self.0.norm_squared()
    }

    /// Euclidean (L2) norm.
    pub fn norm(&self) -> Real {
        self.0.norm()
    }

    /// Iterator over elements.
    pub fn iter(&self) -> impl Iterator<Item = &Real> {
        self.0.iter()
    }

    /// `true` when every element is finite.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|x| x.is_finite())
    }

    /// Component-wise clamp into `[lower[i], upper[i]]`.
    pub fn clamp(&self, lower: &Array, upper: &Array) -> Self {
        Self(DVector::from_iterator(
            self.size(),
            self.0
                .iter()
                .zip(lower.iter().zip(upper.iter()))
                .map(|(&x, (&lo, &hi))| x.max(lo).min(hi)),
        ))
    }
}

// ── From / Into conversions ───────────────────────────────────────────────────

impl From<DVector<Real>> for Array {
    fn from(v: DVector<Real>) -> Self {
        Self(v)
    }
}

impl From<Vec<Real>> for Array {
    fn from(v: Vec<Real>) -> Self {
        Self::from_vec(v)
    }
}

impl From<&[Real]> for Array {
    fn from(s: &[Real]) -> Self {
        Self::from_slice(s)
    }
}

// ── Index ─────────────────────────────────────────────────────────────────────

impl Index<usize> for Array {
    type Output = Real;
    fn index(&self, i: usize) -> &Real {
        &self.0[i]
    }
}

impl IndexMut<usize> for Array {
    fn index_mut(&mut self, i: usize) -> &mut Real {
        &mut self.0[i]
    }
}

// ── Element-wise arithmetic ───────────────────────────────────────────────────

impl Add for &Array {
    type Output = Array;
    fn add(self, rhs: &Array) -> Array {
        Array(&self.0 + &rhs.0)
    }
}

impl Sub for &Array {
    type Output = Array;
    fn sub(self, rhs: &Array) -> Array {
        Array(&self.0 - &rhs.0)
    }
}

impl Mul<Real> for &Array {
    type Output = Array;
    fn mul(self, rhs: Real) -> Array {
        Array(&self.0 * rhs)
    }
}

impl Div<Real> for &Array {
    type Output = Array;
    fn div(self, rhs: Real) -> Array {
        Array(&self.0 / rhs)
    }
}

// ── Display ───────────────────────────────────────────────────────────────────

impl std::fmt::Display for Array {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v:.6}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_wise_ops() {
        let a = Array::from_slice(&[1.0, 2.0, 3.0]);
        let b = Array::from_slice(&[4.0, 5.0, 6.0]);
        let sum = &a + &b;
        assert_eq!(sum.to_vec(), vec![5.0, 7.0, 9.0]);

        let diff = &b - &a;
        assert_eq!(diff[0], 3.0);

        let scaled = &a * 2.0;
        assert_eq!(scaled[2], 6.0);

        let halved = &b / 2.0;
        assert_eq!(halved[0], 2.0);
    }

    #[test]
    fn clamp_to_box() {
        let x = Array::from_slice(&[-1.0, 0.5, 7.0]);
        let lo = Array::from_slice(&[0.0, 0.0, 0.0]);
        let hi = Array::from_slice(&[1.0, 1.0, 5.0]);
        assert_eq!(x.clamp(&lo, &hi).to_vec(), vec![0.0, 0.5, 5.0]);
    }

    #[test]
    fn finiteness_and_norm() {
        let a = Array::from_slice(&[3.0, 4.0]);
        assert!(a.is_finite());
        assert!((a.norm() - 5.0).abs() < 1e-12);
        assert_eq!(a.norm_squared(), 25.0);
        assert_eq!(a.dot(&Array::from_element(2, 2.0)), 14.0);
        let b = Array::from_vec(vec![1.0, f64::NAN]);
        assert!(!b.is_finite());
    }

    #[test]
    fn display_is_bracketed() {
        let a = Array::from_slice(&[0.5, -0.25]);
        assert_eq!(a.to_string(), "[0.500000, -0.250000]");
    }
}
