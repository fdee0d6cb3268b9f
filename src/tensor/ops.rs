//! Elementwise, reduction and matrix primitives on [`Tensor`]
//!
//! These are the dense CPU kernels the Kronecker routines are composed from.
//! All binary operations require identical shapes; there is no broadcasting.

use super::{Shape, Tensor};
use crate::dtype::{Element, LinalgElement};
use crate::error::{Error, Result};

impl<T: Element> Tensor<T> {
    /// Apply `f` to every element
    pub fn map(&self, f: impl Fn(T) -> T) -> Self {
        let data = self.as_slice().iter().map(|&x| f(x)).collect();
        Self::from_parts(data, Shape::from(self.shape()))
    }

    /// Combine two equally shaped tensors element by element
    pub fn zip_map(&self, other: &Self, f: impl Fn(T, T) -> T) -> Result<Self> {
        if self.shape() != other.shape() {
            return Err(Error::shape_mismatch(self.shape(), other.shape()));
        }
        let data = self
            .as_slice()
            .iter()
            .zip(other.as_slice())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(Self::from_parts(data, Shape::from(self.shape())))
    }

    /// Elementwise `self + other`
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.zip_map(other, |a, b| a + b)
    }

    /// Elementwise `self - other`
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.zip_map(other, |a, b| a - b)
    }

    /// Elementwise `self * other`
    pub fn mul(&self, other: &Self) -> Result<Self> {
        self.zip_map(other, |a, b| a * b)
    }

    /// Elementwise `self / other`
    pub fn div(&self, other: &Self) -> Result<Self> {
        self.zip_map(other, |a, b| a / b)
    }

    /// In-place `self += other`
    pub fn add_assign(&mut self, other: &Self) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::shape_mismatch(self.shape(), other.shape()));
        }
        for (a, &b) in self.as_mut_slice().iter_mut().zip(other.as_slice()) {
            *a = *a + b;
        }
        Ok(())
    }

    /// Add a scalar to every element
    pub fn add_scalar(&self, scalar: T) -> Self {
        self.map(|x| x + scalar)
    }

    /// Multiply every element by a scalar
    pub fn mul_scalar(&self, scalar: T) -> Self {
        self.map(|x| x * scalar)
    }

    /// Divide every element by a scalar
    pub fn div_scalar(&self, scalar: T) -> Self {
        self.map(|x| x / scalar)
    }

    /// Sum of all elements
    pub fn sum(&self) -> T {
        self.as_slice().iter().fold(T::zero(), |acc, &x| acc + x)
    }

    /// Mean of all elements
    pub fn mean(&self) -> T {
        self.sum() / T::from_f64(self.numel() as f64)
    }

    /// Largest element; errors on an empty tensor
    pub fn max_element(&self) -> Result<T> {
        let (first, rest) = self
            .as_slice()
            .split_first()
            .ok_or_else(|| Error::invalid_argument("tensor", "max of an empty tensor"))?;
        Ok(rest
            .iter()
            .fold(*first, |acc, &x| if x > acc { x } else { acc }))
    }

    /// Sum of elementwise products of two equally shaped tensors
    pub fn dot(&self, other: &Self) -> Result<T> {
        if self.shape() != other.shape() {
            return Err(Error::shape_mismatch(self.shape(), other.shape()));
        }
        Ok(self
            .as_slice()
            .iter()
            .zip(other.as_slice())
            .fold(T::zero(), |acc, (&a, &b)| acc + a * b))
    }

    /// Trace of a square matrix
    pub fn trace(&self) -> Result<T> {
        let n = square_dim(self.shape())?;
        Ok((0..n).fold(T::zero(), |acc, i| acc + self.at2(i, i)))
    }

    /// Matrix transpose of a 2D tensor
    pub fn transpose(&self) -> Result<Self> {
        if self.ndim() != 2 {
            return Err(Error::invalid_argument(
                "tensor",
                format!("transpose expects a 2D tensor, got shape {:?}", self.shape()),
            ));
        }
        let (m, n) = (self.shape()[0], self.shape()[1]);
        let mut data = Vec::with_capacity(m * n);
        for j in 0..n {
            for i in 0..m {
                data.push(self.at2(i, j));
            }
        }
        Ok(Self::from_parts(data, Shape::from([n, m])))
    }

    /// Matrix product of two 2D tensors
    pub fn matmul(&self, other: &Self) -> Result<Self> {
        if self.ndim() != 2 || other.ndim() != 2 {
            return Err(Error::invalid_argument(
                "tensor",
                format!(
                    "matmul expects 2D operands, got {:?} and {:?}",
                    self.shape(),
                    other.shape()
                ),
            ));
        }
        let (m, k) = (self.shape()[0], self.shape()[1]);
        let (k2, n) = (other.shape()[0], other.shape()[1]);
        if k != k2 {
            return Err(Error::shape_mismatch(&[k, n], other.shape()));
        }

        let a = self.as_slice();
        let b = other.as_slice();
        let mut out = vec![T::zero(); m * n];
        // i-k-j loop order keeps the inner loop contiguous in both b and out
        for i in 0..m {
            for p in 0..k {
                let a_ip = a[i * k + p];
                let row = &b[p * n..(p + 1) * n];
                for (o, &b_pj) in out[i * n..(i + 1) * n].iter_mut().zip(row) {
                    *o = *o + a_ip * b_pj;
                }
            }
        }
        Ok(Self::from_parts(out, Shape::from([m, n])))
    }
}

impl<T: LinalgElement> Tensor<T> {
    /// Euclidean norm of the flattened tensor (Frobenius norm for matrices)
    pub fn frobenius_norm(&self) -> T {
        self.as_slice()
            .iter()
            .fold(T::zero(), |acc, &x| acc + x * x)
            .sqrt_val()
    }

    /// Elementwise reciprocal
    pub fn recip(&self) -> Self {
        self.map(|x| T::one() / x)
    }

    /// Replace every element below `min` with `min` (NaN is kept)
    pub fn clamp_min(&self, min: T) -> Self {
        self.map(|x| if x < min { min } else { x })
    }
}

/// Validate that `shape` describes a square matrix and return its dimension
pub(crate) fn square_dim(shape: &[usize]) -> Result<usize> {
    if shape.len() != 2 {
        return Err(Error::invalid_argument(
            "matrix",
            format!(
                "expected 2D matrix, got {}D tensor with shape {:?}",
                shape.len(),
                shape
            ),
        ));
    }
    if shape[0] != shape[1] {
        return Err(Error::ShapeMismatch {
            expected: vec![shape[0], shape[0]],
            got: shape.to_vec(),
        });
    }
    Ok(shape[0])
}
