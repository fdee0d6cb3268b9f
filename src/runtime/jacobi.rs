//! Jacobi rotation utilities for the host eigensolver
//!
//! The rotation parameters use the numerically stable LAPACK formula to avoid
//! catastrophic cancellation. Matrices are dense, row-major `[n × n]` slices.

use crate::dtype::LinalgElement;

/// Jacobi rotation parameters (cosine and sine of rotation angle).
///
/// These parameters define a Givens rotation matrix:
/// ```text
/// J = [ c  -s ]
///     [ s   c ]
/// ```
#[derive(Debug, Clone, Copy)]
pub struct JacobiRotation {
    /// Cosine of rotation angle
    pub c: f64,
    /// Sine of rotation angle
    pub s: f64,
}

impl JacobiRotation {
    /// Compute the rotation that zeroes `A[p,q]` of a symmetric 2x2 block.
    ///
    /// # Algorithm
    /// ```text
    /// τ = (a_qq - a_pp) / (2 * a_pq)
    /// t = sign(τ) / (|τ| + sqrt(1 + τ²))
    /// c = 1 / sqrt(1 + t²)
    /// s = t * c
    /// ```
    #[inline]
    pub fn compute(a_pp: f64, a_qq: f64, a_pq: f64) -> Self {
        let tau_den = 2.0 * a_pq;
        if tau_den.abs() < 1e-300 {
            return Self { c: 1.0, s: 0.0 };
        }

        let tau = (a_qq - a_pp) / tau_den;
        let t = if tau >= 0.0 {
            1.0 / (tau + (1.0 + tau * tau).sqrt())
        } else {
            -1.0 / (-tau + (1.0 + tau * tau).sqrt())
        };

        let c = 1.0 / (1.0 + t * t).sqrt();
        Self { c, s: t * c }
    }

    /// Returns typed rotation parameters.
    #[inline]
    pub fn typed<T: LinalgElement>(&self) -> (T, T) {
        (T::from_f64(self.c), T::from_f64(self.s))
    }
}

/// Apply a Jacobi rotation to columns `p` and `q` of a `[rows × cols]` matrix.
///
/// Computes: `[col_p', col_q'] = [col_p, col_q] @ [[c, s], [-s, c]]`
#[inline]
pub fn apply_rotation_to_columns<T: LinalgElement>(
    data: &mut [T],
    rows: usize,
    cols: usize,
    p: usize,
    q: usize,
    rot: &JacobiRotation,
) {
    let (c, s): (T, T) = rot.typed();

    for i in 0..rows {
        let idx_p = i * cols + p;
        let idx_q = i * cols + q;

        let val_p = data[idx_p];
        let val_q = data[idx_q];

        data[idx_p] = c * val_p - s * val_q;
        data[idx_q] = s * val_p + c * val_q;
    }
}

/// Apply a two-sided Jacobi rotation `A' = J^T @ A @ J` to a symmetric matrix,
/// zeroing `A[p,q]` and `A[q,p]`.
#[inline]
pub fn apply_two_sided_rotation<T: LinalgElement>(
    work: &mut [T],
    n: usize,
    p: usize,
    q: usize,
    rot: &JacobiRotation,
) {
    let (c, s): (T, T) = rot.typed();
    let a_pp = work[p * n + p];
    let a_qq = work[q * n + q];
    let a_pq = work[p * n + q];

    for k in 0..n {
        if k != p && k != q {
            let a_kp = work[k * n + p];
            let a_kq = work[k * n + q];

            let new_kp = c * a_kp - s * a_kq;
            let new_kq = s * a_kp + c * a_kq;

            work[k * n + p] = new_kp;
            work[p * n + k] = new_kp;
            work[k * n + q] = new_kq;
            work[q * n + k] = new_kq;
        }
    }

    let c2 = T::from_f64(rot.c * rot.c);
    let s2 = T::from_f64(rot.s * rot.s);
    let cs2 = T::from_f64(2.0 * rot.c * rot.s);

    work[p * n + p] = c2 * a_pp - cs2 * a_pq + s2 * a_qq;
    work[q * n + q] = s2 * a_pp + cs2 * a_pq + c2 * a_qq;
    work[p * n + q] = T::zero();
    work[q * n + p] = T::zero();
}

/// Indices that sort `values` ascending (NaN compares equal).
#[inline]
pub fn argsort_asc<T: LinalgElement>(values: &[T]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&i, &j| {
        values[i]
            .partial_cmp(&values[j])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    indices
}

/// Reorder vector elements according to an index permutation.
#[inline]
pub fn permute_vector<T: LinalgElement>(data: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&idx| data[idx]).collect()
}

/// Reorder the columns of a square `[n × n]` matrix according to an index permutation.
#[inline]
pub fn permute_columns<T: LinalgElement>(data: &[T], n: usize, indices: &[usize]) -> Vec<T> {
    let mut result = vec![T::zero(); n * n];
    for (new_idx, &old_idx) in indices.iter().enumerate() {
        for i in 0..n {
            result[i * n + new_idx] = data[i * n + old_idx];
        }
    }
    result
}

/// Initialize an identity matrix [n × n].
#[inline]
pub fn identity_matrix<T: LinalgElement>(n: usize) -> Vec<T> {
    let mut result = vec![T::zero(); n * n];
    for i in 0..n {
        result[i * n + i] = T::one();
    }
    result
}
