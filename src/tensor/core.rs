//! Core Tensor type

use super::Shape;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};

/// Dense n-dimensional array in row-major (C) order
///
/// `Tensor` is the fundamental data structure in kronfac. It consists of:
/// - **Data**: contiguous, owned element buffer
/// - **Shape**: dimensions, row-major strides implied
///
/// Rank 0 tensors hold exactly one element and play the role of scalars
/// (1x1 Kronecker factors, norms, damping values).
///
/// # Example
///
/// ```
/// use kronfac::tensor::Tensor;
///
/// let a = Tensor::from_slice(&[1.0f64, 2.0, 3.0, 4.0], &[2, 2]);
/// assert_eq!(a.shape(), &[2, 2]);
/// assert_eq!(a.trace().unwrap(), 5.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor<T: Element> {
    data: Vec<T>,
    shape: Shape,
}

impl<T: Element> Tensor<T> {
    /// Create a tensor from an owned buffer and a shape that is known to match
    pub(crate) fn from_parts(data: Vec<T>, shape: Shape) -> Self {
        debug_assert_eq!(data.len(), shape.numel());
        Self { data, shape }
    }

    /// Create a tensor from a slice of data
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` does not equal the product of the `shape` dimensions.
    /// For a fallible alternative, use [`Self::try_from_slice`].
    pub fn from_slice(data: &[T], shape: &[usize]) -> Self {
        Self::try_from_slice(data, shape).expect("Tensor::from_slice failed")
    }

    /// Create a tensor from a slice of data (fallible version)
    ///
    /// Returns an error if `data.len()` does not equal the product of the `shape` dimensions.
    pub fn try_from_slice(data: &[T], shape: &[usize]) -> Result<Self> {
        Self::from_vec(data.to_vec(), shape)
    }

    /// Create a tensor taking ownership of `data`
    pub fn from_vec(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        let expected_len: usize = shape.iter().product();
        if data.len() != expected_len {
            return Err(Error::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![data.len()],
            });
        }
        Ok(Self {
            data,
            shape: Shape::from(shape),
        })
    }

    /// Create a rank 0 tensor holding `value`
    pub fn scalar(value: T) -> Self {
        Self {
            data: vec![value],
            shape: Shape::new(),
        }
    }

    /// Create a tensor filled with zeros
    pub fn zeros(shape: &[usize]) -> Self {
        let shape = Shape::from(shape);
        Self {
            data: bytemuck::allocation::zeroed_vec(shape.numel()),
            shape,
        }
    }

    /// Create a tensor filled with `value`
    pub fn full(shape: &[usize], value: T) -> Self {
        let shape = Shape::from(shape);
        Self {
            data: vec![value; shape.numel()],
            shape,
        }
    }

    /// Create a tensor filled with ones
    pub fn ones(shape: &[usize]) -> Self {
        Self::full(shape, T::one())
    }

    /// Create an `n x n` identity matrix
    pub fn eye(n: usize) -> Self {
        let mut out = Self::zeros(&[n, n]);
        for i in 0..n {
            out.data[i * n + i] = T::one();
        }
        out
    }

    /// Zeros with the shape of `self`
    pub fn zeros_like(&self) -> Self {
        Self::zeros(&self.shape)
    }

    /// Ones with the shape of `self`
    pub fn ones_like(&self) -> Self {
        Self::ones(&self.shape)
    }

    /// Shape of the tensor
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.shape.as_slice()
    }

    /// Number of dimensions
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Total number of elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Runtime dtype tag of the elements
    #[inline]
    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// Row-major view of the elements
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Copy the elements out in row-major order
    pub fn to_vec(&self) -> Vec<T> {
        self.data.clone()
    }

    /// Consume the tensor, returning its row-major buffer
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// The single element of a one-element tensor of any rank
    pub fn item(&self) -> Result<T> {
        if self.data.len() != 1 {
            return Err(Error::invalid_argument(
                "tensor",
                format!("item() requires exactly one element, got shape {:?}", self.shape),
            ));
        }
        Ok(self.data[0])
    }

    /// Same elements under a new shape with equal element count
    pub fn reshape(&self, shape: &[usize]) -> Result<Self> {
        let numel: usize = shape.iter().product();
        if numel != self.numel() {
            return Err(Error::shape_mismatch(shape, self.shape()));
        }
        Ok(Self::from_parts(self.data.clone(), Shape::from(shape)))
    }

    /// Element `(i, j)` of a 2D tensor; caller guarantees bounds
    #[inline]
    pub(crate) fn at2(&self, i: usize, j: usize) -> T {
        self.data[i * self.shape[1] + j]
    }

    /// Returns true if any element is NaN
    pub fn has_nan(&self) -> bool {
        self.data.iter().any(|x| x.to_f64().is_nan())
    }

    /// Sub-tensor at `index` along the leading axis (drops that axis)
    pub fn index_leading(&self, index: usize) -> Result<Self> {
        if self.ndim() == 0 {
            return Err(Error::InvalidDimension { dim: 0, ndim: 0 });
        }
        let size = self.shape[0];
        if index >= size {
            return Err(Error::IndexOutOfBounds { index, size });
        }
        let inner = self.shape.span(1, self.ndim());
        let data = self.data[index * inner..(index + 1) * inner].to_vec();
        Ok(Self::from_parts(data, Shape::from(&self.shape[1..])))
    }

    /// Rows `start..end` along the leading axis (keeps that axis)
    pub fn slice_leading(&self, start: usize, end: usize) -> Result<Self> {
        if self.ndim() == 0 {
            return Err(Error::InvalidDimension { dim: 0, ndim: 0 });
        }
        let size = self.shape[0];
        if start > end || end > size {
            return Err(Error::IndexOutOfBounds { index: end, size });
        }
        let inner = self.shape.span(1, self.ndim());
        let data = self.data[start * inner..end * inner].to_vec();
        let mut dims = self.shape.to_vec();
        dims[0] = end - start;
        Ok(Self::from_parts(data, Shape::from(dims)))
    }

    /// Stack equally shaped tensors along a new leading axis
    pub fn stack(tensors: &[Tensor<T>]) -> Result<Self> {
        let first = tensors
            .first()
            .ok_or_else(|| Error::invalid_argument("tensors", "cannot stack zero tensors"))?;
        let mut data = Vec::with_capacity(first.numel() * tensors.len());
        for t in tensors {
            if t.shape != first.shape {
                return Err(Error::shape_mismatch(first.shape(), t.shape()));
            }
            data.extend_from_slice(&t.data);
        }
        let mut dims = Vec::with_capacity(first.ndim() + 1);
        dims.push(tensors.len());
        dims.extend_from_slice(first.shape());
        Ok(Self::from_parts(data, Shape::from(dims)))
    }
}
