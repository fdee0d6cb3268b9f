//! Matrix-vector products with Kronecker-factored matrices
//!
//! A Kronecker product `kron(F_1, ..., F_k)` acting on the row-major
//! vectorization of a tensor `v` never needs to be formed densely: when each
//! factor `F_i` acts on a contiguous group of axes of `v`, the product is a
//! sequence of single-axis contractions, one per factor.
//!
//! ```text
//! v: [outer, mid, inner]      (axis group folded into `mid`)
//! out[o, z, i] = Σ_y F[z, y] · v[o, y, i]      (F[y, z] when transposed)
//! ```

use crate::dtype::{Element, LinalgElement};
use crate::error::{Error, Result};
use crate::tensor::{Shape, Tensor, square_dim};

/// Whether to transpose the factors of a Kronecker product
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transpose {
    /// Same flag for every factor
    All(bool),
    /// One flag per factor
    PerFactor(Vec<bool>),
}

impl Transpose {
    fn flags(&self, num_factors: usize) -> Result<Vec<bool>> {
        match self {
            Self::All(t) => Ok(vec![*t; num_factors]),
            Self::PerFactor(flags) if flags.len() == num_factors => Ok(flags.clone()),
            Self::PerFactor(flags) => Err(Error::invalid_argument(
                "transpose",
                format!(
                    "The length of the transpose sequence ({}) must match the number of factors ({num_factors})",
                    flags.len()
                ),
            )),
        }
    }
}

impl Default for Transpose {
    fn default() -> Self {
        Self::All(false)
    }
}

impl From<bool> for Transpose {
    fn from(t: bool) -> Self {
        Self::All(t)
    }
}

impl From<Vec<bool>> for Transpose {
    fn from(flags: Vec<bool>) -> Self {
        Self::PerFactor(flags)
    }
}

/// Computes `kron(factors) · rvec(v)`, returned in the shape of `v`.
///
/// `axis_groups[i]` lists the consecutive axes of `v` that factor `i` acts on;
/// `None` means one factor per axis (`[[0], [1], ...]`). Concatenating the
/// groups in order must give exactly `0..v.ndim()`. Each factor must be a
/// square matrix whose dimension equals the product of its group's axis sizes.
///
/// # Errors
///
/// `InvalidArgument` for malformed groups, a factor/group count mismatch, a
/// transpose sequence of the wrong length, or a non-matrix factor;
/// `ShapeMismatch` when a factor does not match its axis group.
///
/// # Example
///
/// ```
/// use kronfac::algorithm::kronecker::kronecker_product_axis_mul_v;
/// use kronfac::tensor::Tensor;
///
/// let a = Tensor::from_slice(&[2.0f64, 0.0, 0.0, 3.0], &[2, 2]);
/// let b = Tensor::<f64>::eye(3);
/// let v = Tensor::<f64>::ones(&[2, 3]);
/// let out = kronecker_product_axis_mul_v(&[a, b], &v, None, false).unwrap();
/// assert_eq!(out.as_slice(), &[2.0, 2.0, 2.0, 3.0, 3.0, 3.0]);
/// ```
pub fn kronecker_product_axis_mul_v<T: Element>(
    factors: &[Tensor<T>],
    v: &Tensor<T>,
    axis_groups: Option<&[Vec<usize>]>,
    transpose: impl Into<Transpose>,
) -> Result<Tensor<T>> {
    let groups = resolve_axis_groups(axis_groups, v.ndim())?;
    if factors.len() != groups.len() {
        return Err(Error::invalid_argument(
            "factors",
            format!(
                "The number of factors ({}) must be equal to the number of axis groups ({})",
                factors.len(),
                groups.len()
            ),
        ));
    }
    let flags = transpose.into().flags(factors.len())?;

    let shape = Shape::from(v.shape());
    let mut data = v.to_vec();
    let mut next = vec![T::zero(); data.len()];

    for ((group, factor), transposed) in groups.iter().zip(factors).zip(flags) {
        let (start, end) = (group[0], group[group.len() - 1] + 1);
        let outer = shape.span(0, start);
        let mid = shape.span(start, end);
        let inner = shape.span(end, shape.ndim());

        if factor.ndim() != 2 {
            return Err(Error::invalid_argument(
                "factors",
                format!("Kronecker factors must be square 2D matrices, got shape {:?}", factor.shape()),
            ));
        }
        if factor.shape() != [mid, mid].as_slice() {
            return Err(Error::shape_mismatch(&[mid, mid], factor.shape()));
        }

        contract_axis(&data, &mut next, factor.as_slice(), outer, mid, inner, transposed);
        std::mem::swap(&mut data, &mut next);
    }

    Tensor::from_vec(data, v.shape())
}

/// Computes `kron(q_factors) · diag(eigenvalues) · kron(q_factors)^T · rvec(v)`.
///
/// `eigenvalues` must have the shape of `v` but need not itself be a
/// Kronecker product of per-factor eigenvalues.
///
/// # Errors
///
/// Everything [`kronecker_product_axis_mul_v`] reports, plus `ShapeMismatch`
/// when `eigenvalues` does not match the projected tensor.
pub fn kronecker_eigen_basis_axis_mul_v<T: Element>(
    q_factors: &[Tensor<T>],
    eigenvalues: &Tensor<T>,
    v: &Tensor<T>,
    axis_groups: Option<&[Vec<usize>]>,
) -> Result<Tensor<T>> {
    let projected = kronecker_product_axis_mul_v(q_factors, v, axis_groups, true)?;
    if eigenvalues.shape() != projected.shape() {
        return Err(Error::shape_mismatch(projected.shape(), eigenvalues.shape()));
    }
    let weighted = projected.mul(eigenvalues)?;
    kronecker_product_axis_mul_v(q_factors, &weighted, axis_groups, false)
}

/// Computes `unvec[(a ⊗ b) vec(v)] = b · v · a^T` for a matrix `v`, with
/// column-major `vec`.
pub fn kronecker_product_mul_v<T: Element>(
    a: &Tensor<T>,
    b: &Tensor<T>,
    v: &Tensor<T>,
) -> Result<Tensor<T>> {
    kronecker_product_axis_mul_v(&[b.clone(), a.clone()], v, None, false)
}

/// Computes `unvec[(q_a ⊗ q_b) diag(vec(eigenvalues)) (q_a ⊗ q_b)^T vec(v)]`
/// for a matrix `v`, with column-major `vec`.
pub fn kronecker_eigen_basis_mul_v<T: Element>(
    q_a: &Tensor<T>,
    q_b: &Tensor<T>,
    eigenvalues: &Tensor<T>,
    v: &Tensor<T>,
) -> Result<Tensor<T>> {
    kronecker_eigen_basis_axis_mul_v(&[q_b.clone(), q_a.clone()], eigenvalues, v, None)
}

/// Dense Kronecker product of factors given as square matrices, vectors
/// (diagonal matrices) or scalars.
///
/// # Errors
///
/// Returns an error for an empty factor list, a non-square matrix or a factor
/// of rank greater than 2.
pub fn kron<T: LinalgElement>(factors: &[Tensor<T>]) -> Result<Tensor<T>> {
    let (first, rest) = factors
        .split_first()
        .ok_or_else(|| Error::invalid_argument("factors", "cannot form an empty Kronecker product"))?;

    let mut acc = as_dense_matrix(first)?;
    for factor in rest {
        let b = as_dense_matrix(factor)?;
        let (m, n) = (acc.shape()[0], b.shape()[0]);
        let (a_data, b_data) = (acc.as_slice(), b.as_slice());
        let size = m * n;
        let mut out = vec![T::zero(); size * size];
        for i in 0..m {
            for j in 0..m {
                let a_ij = a_data[i * m + j];
                for k in 0..n {
                    for l in 0..n {
                        out[(i * n + k) * size + (j * n + l)] = a_ij * b_data[k * n + l];
                    }
                }
            }
        }
        acc = Tensor::from_vec(out, &[size, size])?;
    }
    Ok(acc)
}

fn as_dense_matrix<T: LinalgElement>(factor: &Tensor<T>) -> Result<Tensor<T>> {
    match factor.ndim() {
        0 => factor.reshape(&[1, 1]),
        1 => {
            let n = factor.numel();
            let mut out = Tensor::zeros(&[n, n]);
            let data = out.as_mut_slice();
            for (i, &x) in factor.as_slice().iter().enumerate() {
                data[i * n + i] = x;
            }
            Ok(out)
        }
        2 => {
            square_dim(factor.shape())?;
            Ok(factor.clone())
        }
        ndim => Err(Error::invalid_argument(
            "factors",
            format!("Kronecker factors must have rank 0, 1 or 2, got rank {ndim}"),
        )),
    }
}

fn resolve_axis_groups(axis_groups: Option<&[Vec<usize>]>, ndim: usize) -> Result<Vec<Vec<usize>>> {
    let groups = match axis_groups {
        None => return Ok((0..ndim).map(|i| vec![i]).collect()),
        Some(groups) => groups.to_vec(),
    };

    let flat: Vec<usize> = groups.iter().flatten().copied().collect();
    if groups.iter().any(Vec::is_empty) || !flat.iter().copied().eq(0..ndim) {
        return Err(Error::invalid_argument(
            "axis_groups",
            format!(
                "The axis groups {groups:?} are either not in consecutive order or do not cover exactly the {ndim} axes of the input"
            ),
        ));
    }
    Ok(groups)
}

/// One single-axis contraction of `src` (`[outer, mid, inner]`) into `dst`
fn contract_axis<T: Element>(
    src: &[T],
    dst: &mut [T],
    factor: &[T],
    outer: usize,
    mid: usize,
    inner: usize,
    transposed: bool,
) {
    dst.fill(T::zero());
    for o in 0..outer {
        let block = o * mid * inner;
        for z in 0..mid {
            let out_row = &mut dst[block + z * inner..block + (z + 1) * inner];
            for y in 0..mid {
                let f = if transposed {
                    factor[y * mid + z]
                } else {
                    factor[z * mid + y]
                };
                let in_row = &src[block + y * inner..block + (y + 1) * inner];
                for (out, &x) in out_row.iter_mut().zip(in_row) {
                    *out = *out + f * x;
                }
            }
        }
    }
}
