//! Host reference eigensolver: cyclic two-sided Jacobi

use super::jacobi::{
    JacobiRotation, apply_rotation_to_columns, apply_two_sided_rotation, argsort_asc,
    identity_matrix, permute_columns, permute_vector,
};
use super::{EigenBackend, EigenDecomposition};
use crate::dtype::LinalgElement;
use crate::error::Result;
use crate::tensor::{Tensor, square_dim};

/// Cyclic Jacobi eigensolver for symmetric matrices.
///
/// Slower than [`super::TridiagonalBackend`] (`O(n³)` per sweep) but
/// unconditionally convergent, so it serves as the fallback path whenever the
/// default solver produces non-finite eigenvalues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostBackend {
    max_sweeps: usize,
}

impl HostBackend {
    /// Sweep limit used by [`HostBackend::new`]
    pub const DEFAULT_MAX_SWEEPS: usize = 50;

    /// Create a host solver with the default sweep limit
    pub const fn new() -> Self {
        Self {
            max_sweeps: Self::DEFAULT_MAX_SWEEPS,
        }
    }

    /// Create a host solver with an explicit sweep limit
    pub const fn with_max_sweeps(max_sweeps: usize) -> Self {
        Self { max_sweeps }
    }
}

impl Default for HostBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl EigenBackend for HostBackend {
    fn name(&self) -> &'static str {
        "host-jacobi"
    }

    /// Eigendecomposition for symmetric matrices using the Jacobi algorithm
    ///
    /// Algorithm: Jacobi Eigenvalue Algorithm
    /// 1. Initialize: V = I_n
    /// 2. REPEAT (max `max_sweeps` sweeps):
    ///    FOR each pair (p, q) where p < q with |A[p,q]| > tol:
    ///      a. Compute Jacobi rotation from A[p,p], A[q,q], A[p,q]
    ///      b. A' = J^T @ A @ J (zeros out A[p,q] and A[q,p])
    ///      c. V = V @ J
    ///    Stop once max |A[i,j]| (i≠j) < n * eps * ||A||_F
    /// 3. eigenvalues = diag(A), sorted ascending with V's columns
    fn eigh<T: LinalgElement>(&self, a: &Tensor<T>) -> Result<EigenDecomposition<T>> {
        let n = square_dim(a.shape())?;

        if n == 0 {
            return Ok(EigenDecomposition {
                eigenvalues: Tensor::zeros(&[0]),
                eigenvectors: Tensor::zeros(&[0, 0]),
            });
        }

        // Symmetrize from the lower triangle
        let a_data = a.as_slice();
        let mut work: Vec<T> = vec![T::zero(); n * n];
        for i in 0..n {
            for j in 0..=i {
                let val = a_data[i * n + j];
                work[i * n + j] = val;
                work[j * n + i] = val;
            }
        }

        let mut v: Vec<T> = identity_matrix(n);

        let scale = work
            .iter()
            .fold(0.0f64, |acc, x| acc + x.to_f64() * x.to_f64())
            .sqrt();
        let tol = (n as f64) * T::epsilon_val() * scale;

        for _sweep in 0..self.max_sweeps {
            let mut max_off_diag = 0.0f64;
            for i in 0..n {
                for j in (i + 1)..n {
                    max_off_diag = max_off_diag.max(work[i * n + j].abs_val().to_f64());
                }
            }
            if max_off_diag <= tol {
                break;
            }

            for p in 0..n {
                for q in (p + 1)..n {
                    let a_pq = work[p * n + q];
                    if a_pq.abs_val().to_f64() <= tol {
                        continue;
                    }
                    let rot = JacobiRotation::compute(
                        work[p * n + p].to_f64(),
                        work[q * n + q].to_f64(),
                        a_pq.to_f64(),
                    );
                    apply_two_sided_rotation(&mut work, n, p, q, &rot);
                    apply_rotation_to_columns(&mut v, n, n, p, q, &rot);
                }
            }
        }

        let eigenvalues: Vec<T> = (0..n).map(|i| work[i * n + i]).collect();
        let order = argsort_asc(&eigenvalues);

        Ok(EigenDecomposition {
            eigenvalues: Tensor::from_vec(permute_vector(&eigenvalues, &order), &[n])?,
            eigenvectors: Tensor::from_vec(permute_columns(&v, n, &order), &[n, n])?,
        })
    }
}
