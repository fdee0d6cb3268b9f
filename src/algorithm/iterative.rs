//! Iterative estimators for the largest eigenvalue of a symmetric PSD matrix
//!
//! Both estimators run in `f64` regardless of the element type and stop either
//! at convergence or after a fixed number of iterations, whichever comes first.

use crate::dtype::LinalgElement;
use crate::error::{Error, Result};
use crate::runtime::{EigenBackend, HostBackend};
use crate::tensor::{Tensor, square_dim};

/// Stopping rule for the iterative estimators
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterativeEigOptions {
    /// Maximum number of iterations
    pub max_iter: usize,
    /// Relative residual tolerance: stop once `||A x - λ x|| <= tol * |λ|`
    pub tol: f64,
}

impl IterativeEigOptions {
    /// Settings used for the LOBPCG 2-norm estimate (300 iterations, 1e-8)
    pub const LOBPCG: Self = Self {
        max_iter: 300,
        tol: 1e-8,
    };

    /// Settings used for the power-iteration 2-norm estimate (300 iterations, 1e-7)
    pub const POWER_ITERATION: Self = Self {
        max_iter: 300,
        tol: 1e-7,
    };
}

/// Largest eigenvalue estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterativeEigResult {
    /// Estimated largest eigenvalue
    pub eigenvalue: f64,
    /// Iterations performed
    pub iterations: usize,
    /// Whether the residual tolerance was reached
    pub converged: bool,
}

/// Largest eigenvalue by single-vector LOBPCG.
///
/// Each iteration performs Rayleigh-Ritz on `span{x, r, p}` where `r` is the
/// residual and `p` the previous search direction, keeping the top Ritz pair.
pub fn lobpcg_largest<T: LinalgElement>(
    matrix: &Tensor<T>,
    start: &[f64],
    options: IterativeEigOptions,
) -> Result<IterativeEigResult> {
    let (a, n) = dense_f64(matrix, start)?;

    let mut x = start.to_vec();
    if normalize(&mut x) == 0.0 {
        return Err(Error::invalid_argument("start", "start vector is zero"));
    }
    let mut ax = matvec(&a, &x, n);
    let mut lambda = dot(&x, &ax);
    let mut p: Option<Vec<f64>> = None;
    let host = HostBackend::new();
    let mut iterations = 0;

    for iter in 0..options.max_iter {
        let r: Vec<f64> = ax.iter().zip(&x).map(|(ai, xi)| ai - lambda * xi).collect();
        if residual_converged(&r, lambda, options.tol) {
            return Ok(IterativeEigResult {
                eigenvalue: lambda,
                iterations: iter,
                converged: true,
            });
        }

        let mut basis = vec![x.clone()];
        for candidate in std::iter::once(r).chain(p.take()) {
            if let Some(v) = orthonormalize_against(&basis, candidate) {
                basis.push(v);
            }
        }
        if basis.len() == 1 {
            // x already spans an invariant subspace
            break;
        }

        let a_basis: Vec<Vec<f64>> = basis.iter().map(|s| matvec(&a, s, n)).collect();
        let k = basis.len();
        let mut gram = vec![0.0f64; k * k];
        for i in 0..k {
            for j in 0..=i {
                let g = 0.5 * (dot(&basis[i], &a_basis[j]) + dot(&basis[j], &a_basis[i]));
                gram[i * k + j] = g;
                gram[j * k + i] = g;
            }
        }
        let ritz = host.eigh(&Tensor::from_vec(gram, &[k, k])?)?;
        let q = ritz.eigenvectors.as_slice();
        let coeffs: Vec<f64> = (0..k).map(|i| q[i * k + (k - 1)]).collect();

        let mut x_new = vec![0.0f64; n];
        let mut ax_new = vec![0.0f64; n];
        let mut p_new = vec![0.0f64; n];
        for (i, &c) in coeffs.iter().enumerate() {
            axpy(&mut x_new, c, &basis[i]);
            axpy(&mut ax_new, c, &a_basis[i]);
            if i > 0 {
                axpy(&mut p_new, c, &basis[i]);
            }
        }

        let scale = normalize(&mut x_new);
        if scale == 0.0 {
            break;
        }
        ax_new.iter_mut().for_each(|v| *v /= scale);

        x = x_new;
        ax = ax_new;
        lambda = dot(&x, &ax);
        p = Some(p_new);
        iterations = iter + 1;
    }

    let r: Vec<f64> = ax.iter().zip(&x).map(|(ai, xi)| ai - lambda * xi).collect();
    Ok(IterativeEigResult {
        eigenvalue: lambda,
        iterations,
        converged: residual_converged(&r, lambda, options.tol),
    })
}

/// Largest eigenvalue by power iteration with a Rayleigh quotient estimate.
pub fn power_iteration<T: LinalgElement>(
    matrix: &Tensor<T>,
    start: &[f64],
    options: IterativeEigOptions,
) -> Result<IterativeEigResult> {
    let (a, n) = dense_f64(matrix, start)?;

    let mut v = start.to_vec();
    if normalize(&mut v) == 0.0 {
        return Err(Error::invalid_argument("start", "start vector is zero"));
    }

    let mut lambda = 0.0;
    for iter in 0..options.max_iter {
        let mut w = matvec(&a, &v, n);
        lambda = dot(&v, &w);

        let r: Vec<f64> = w.iter().zip(&v).map(|(wi, vi)| wi - lambda * vi).collect();
        if residual_converged(&r, lambda, options.tol) {
            return Ok(IterativeEigResult {
                eigenvalue: lambda,
                iterations: iter + 1,
                converged: true,
            });
        }
        if normalize(&mut w) == 0.0 {
            break;
        }
        v = w;
    }

    Ok(IterativeEigResult {
        eigenvalue: lambda,
        iterations: options.max_iter,
        converged: false,
    })
}

fn dense_f64<T: LinalgElement>(matrix: &Tensor<T>, start: &[f64]) -> Result<(Vec<f64>, usize)> {
    let n = square_dim(matrix.shape())?;
    if start.len() != n {
        return Err(Error::shape_mismatch(&[n], &[start.len()]));
    }
    Ok((matrix.as_slice().iter().map(|x| x.to_f64()).collect(), n))
}

fn residual_converged(r: &[f64], lambda: f64, tol: f64) -> bool {
    dot(r, r).sqrt() <= tol * lambda.abs()
}

fn matvec(a: &[f64], x: &[f64], n: usize) -> Vec<f64> {
    (0..n).map(|i| dot(&a[i * n..(i + 1) * n], x)).collect()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn axpy(y: &mut [f64], alpha: f64, x: &[f64]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}

/// Scale `v` to unit length and return its original norm
fn normalize(v: &mut [f64]) -> f64 {
    let norm = dot(v, v).sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    norm
}

/// Two passes of Gram-Schmidt; `None` if `v` is numerically inside the span
fn orthonormalize_against(basis: &[Vec<f64>], mut v: Vec<f64>) -> Option<Vec<f64>> {
    let original = dot(&v, &v).sqrt();
    if original == 0.0 {
        return None;
    }
    for _ in 0..2 {
        for b in basis {
            let proj = dot(b, &v);
            axpy(&mut v, -proj, b);
        }
    }
    if normalize(&mut v) <= 1e-10 * original {
        return None;
    }
    Some(v)
}
