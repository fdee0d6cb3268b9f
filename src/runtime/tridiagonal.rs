//! Default eigensolver: Householder tridiagonalization + implicit QL

use super::jacobi::{argsort_asc, permute_columns, permute_vector};
use super::{EigenBackend, EigenDecomposition};
use crate::dtype::LinalgElement;
use crate::error::Result;
use crate::tensor::{Tensor, square_dim};

/// Householder reduction to tridiagonal form followed by implicit QL with
/// Wilkinson-style shifts.
///
/// All arithmetic is carried out in `f64` and cast back to `T`. When an
/// eigenvalue fails to converge within `max_iterations` QL sweeps the solver
/// does not error; it reports every eigenvalue and eigenvector entry as NaN so
/// that callers can detect the failure and retry on [`super::HostBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TridiagonalBackend {
    max_iterations: usize,
}

impl TridiagonalBackend {
    /// QL iteration limit per eigenvalue used by [`TridiagonalBackend::new`]
    pub const DEFAULT_MAX_ITERATIONS: usize = 30;

    /// Create a solver with the default iteration limit
    pub const fn new() -> Self {
        Self {
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Create a solver with an explicit per-eigenvalue iteration limit
    pub const fn with_max_iterations(max_iterations: usize) -> Self {
        Self { max_iterations }
    }
}

impl Default for TridiagonalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl EigenBackend for TridiagonalBackend {
    fn name(&self) -> &'static str {
        "tridiagonal-ql"
    }

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
        let mut v = vec![0.0f64; n * n];
        for i in 0..n {
            for j in 0..=i {
                let val = a_data[i * n + j].to_f64();
                v[i * n + j] = val;
                v[j * n + i] = val;
            }
        }

        let mut d = vec![0.0f64; n];
        let mut e = vec![0.0f64; n];
        tridiagonalize(&mut v, &mut d, &mut e, n);

        if !implicit_ql(&mut v, &mut d, &mut e, n, self.max_iterations) {
            return Ok(EigenDecomposition {
                eigenvalues: Tensor::full(&[n], T::nan_val()),
                eigenvectors: Tensor::full(&[n, n], T::nan_val()),
            });
        }

        let order = argsort_asc(&d);
        let eigenvalues: Vec<T> = permute_vector(&d, &order)
            .into_iter()
            .map(T::from_f64)
            .collect();
        let eigenvectors: Vec<T> = permute_columns(&v, n, &order)
            .into_iter()
            .map(T::from_f64)
            .collect();

        Ok(EigenDecomposition {
            eigenvalues: Tensor::from_vec(eigenvalues, &[n])?,
            eigenvectors: Tensor::from_vec(eigenvectors, &[n, n])?,
        })
    }
}

/// Householder tridiagonalization of the symmetric matrix held in `v`.
///
/// On return `d` holds the diagonal, `e[1..]` the sub-diagonal and `v` the
/// accumulated orthogonal transformation.
fn tridiagonalize(v: &mut [f64], d: &mut [f64], e: &mut [f64], n: usize) {
    for j in 0..n {
        d[j] = v[(n - 1) * n + j];
    }

    for i in (1..n).rev() {
        let scale: f64 = d[..i].iter().map(|x| x.abs()).sum();
        let mut h = 0.0f64;

        if scale == 0.0 {
            e[i] = d[i - 1];
            for j in 0..i {
                d[j] = v[(i - 1) * n + j];
                v[i * n + j] = 0.0;
                v[j * n + i] = 0.0;
            }
        } else {
            for dk in d[..i].iter_mut() {
                *dk /= scale;
                h += *dk * *dk;
            }
            let f = d[i - 1];
            let mut g = h.sqrt();
            if f > 0.0 {
                g = -g;
            }
            e[i] = scale * g;
            h -= f * g;
            d[i - 1] = f - g;
            e[..i].fill(0.0);

            // Apply the similarity transformation to the remaining columns
            for j in 0..i {
                let f = d[j];
                v[j * n + i] = f;
                let mut g = e[j] + v[j * n + j] * f;
                for k in (j + 1)..i {
                    g += v[k * n + j] * d[k];
                    e[k] += v[k * n + j] * f;
                }
                e[j] = g;
            }

            let mut f = 0.0;
            for j in 0..i {
                e[j] /= h;
                f += e[j] * d[j];
            }
            let hh = f / (h + h);
            for j in 0..i {
                e[j] -= hh * d[j];
            }
            for j in 0..i {
                let f = d[j];
                let g = e[j];
                for k in j..i {
                    v[k * n + j] -= f * e[k] + g * d[k];
                }
                d[j] = v[(i - 1) * n + j];
                v[i * n + j] = 0.0;
            }
        }
        d[i] = h;
    }

    // Accumulate transformations
    for i in 0..n.saturating_sub(1) {
        v[(n - 1) * n + i] = v[i * n + i];
        v[i * n + i] = 1.0;
        let h = d[i + 1];
        if h != 0.0 {
            for k in 0..=i {
                d[k] = v[k * n + i + 1] / h;
            }
            for j in 0..=i {
                let mut g = 0.0;
                for k in 0..=i {
                    g += v[k * n + i + 1] * v[k * n + j];
                }
                for k in 0..=i {
                    v[k * n + j] -= g * d[k];
                }
            }
        }
        for k in 0..=i {
            v[k * n + i + 1] = 0.0;
        }
    }
    for j in 0..n {
        d[j] = v[(n - 1) * n + j];
        v[(n - 1) * n + j] = 0.0;
    }
    v[(n - 1) * n + (n - 1)] = 1.0;
    e[0] = 0.0;
}

/// Implicit QL on the tridiagonal `(d, e)`; rotations are accumulated into `v`.
///
/// Returns `false` when some eigenvalue needs more than `max_iterations` sweeps.
fn implicit_ql(
    v: &mut [f64],
    d: &mut [f64],
    e: &mut [f64],
    n: usize,
    max_iterations: usize,
) -> bool {
    for i in 1..n {
        e[i - 1] = e[i];
    }
    e[n - 1] = 0.0;

    let eps = f64::EPSILON;
    let mut f = 0.0;
    let mut tst1 = 0.0f64;

    for l in 0..n {
        tst1 = tst1.max(d[l].abs() + e[l].abs());
        let mut m = l;
        while m < n - 1 {
            if e[m].abs() <= eps * tst1 {
                break;
            }
            m += 1;
        }

        if m > l {
            let mut iter = 0;
            loop {
                if iter >= max_iterations {
                    return false;
                }
                iter += 1;

                // Compute implicit shift
                let mut g = d[l];
                let mut p = (d[l + 1] - g) / (2.0 * e[l]);
                let mut r = p.hypot(1.0);
                if p < 0.0 {
                    r = -r;
                }
                d[l] = e[l] / (p + r);
                d[l + 1] = e[l] * (p + r);
                let dl1 = d[l + 1];
                let mut h = g - d[l];
                for di in d[(l + 2)..n].iter_mut() {
                    *di -= h;
                }
                f += h;

                p = d[m];
                let mut c = 1.0;
                let mut c2 = c;
                let mut c3 = c;
                let el1 = e[l + 1];
                let mut s = 0.0;
                let mut s2 = 0.0;
                for i in (l..m).rev() {
                    c3 = c2;
                    c2 = c;
                    s2 = s;
                    g = c * e[i];
                    h = c * p;
                    r = p.hypot(e[i]);
                    e[i + 1] = s * r;
                    s = e[i] / r;
                    c = p / r;
                    p = c * d[i] - s * g;
                    d[i + 1] = h + s * (c * g + s * d[i]);

                    for k in 0..n {
                        let h = v[k * n + i + 1];
                        v[k * n + i + 1] = s * v[k * n + i] + c * h;
                        v[k * n + i] = c * v[k * n + i] - s * h;
                    }
                }
                p = -s * s2 * c3 * el1 * e[l] / dl1;
                e[l] = s * p;
                d[l] = c * p;

                if e[l].abs() <= eps * tst1 {
                    break;
                }
            }
        }
        d[l] += f;
        e[l] = 0.0;
    }
    true
}
