//! Damped inverses of PSD matrices and of Kronecker products of PSD factors

use super::norm::{NormType, TwoNormMethod, psd_matrix_norm};
use crate::config::MathConfig;
use crate::dtype::LinalgElement;
use crate::error::{Error, Result};
use crate::tensor::{Tensor, square_dim};
use tracing::debug;

/// Which formula [`pi_adjusted_kronecker_inverse`] applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InverseBranch {
    /// Normalize, distribute damping, invert each factor
    Regular,
    /// Product of factor norms is zero or NaN: return scaled identities
    Zero,
}

impl InverseBranch {
    /// Pick the branch for the product of factor norms `scale`.
    ///
    /// With the special case disabled the regular branch always runs.
    pub fn select<T: LinalgElement>(config: &MathConfig, scale: T) -> Self {
        if config.special_case_zero_inv() && !(scale > T::zero()) {
            Self::Zero
        } else {
            Self::Regular
        }
    }
}

/// Computes `inverse(matrix + damping * I)` through a Cholesky factorization.
///
/// # Errors
///
/// Returns `ShapeMismatch`/`InvalidArgument` for a non-square input and
/// `Internal` if the damped matrix is not positive definite.
pub fn psd_inv_cholesky<T: LinalgElement>(matrix: &Tensor<T>, damping: T) -> Result<Tensor<T>> {
    let n = square_dim(matrix.shape())?;
    let a = matrix.as_slice();

    // L L^T = A + damping * I, reading the lower triangle
    let mut l: Vec<T> = vec![T::zero(); n * n];
    for i in 0..n {
        let mut sum_sq = T::zero();
        for k in 0..i {
            sum_sq = sum_sq + l[i * n + k] * l[i * n + k];
        }

        let diag = a[i * n + i] + damping - sum_sq;
        if diag.to_f64() <= 0.0 {
            return Err(Error::Internal(
                "Matrix is not positive definite".to_string(),
            ));
        }
        l[i * n + i] = diag.sqrt_val();

        for j in (i + 1)..n {
            let mut sum_prod = T::zero();
            for k in 0..i {
                sum_prod = sum_prod + l[j * n + k] * l[i * n + k];
            }
            l[j * n + i] = (a[j * n + i] - sum_prod) / l[i * n + i];
        }
    }

    // Solve L Y = I then L^T X = Y, one column of the identity at a time
    let mut inv: Vec<T> = vec![T::zero(); n * n];
    let mut y: Vec<T> = vec![T::zero(); n];
    for col in 0..n {
        for i in 0..n {
            let mut sum = if i == col { T::one() } else { T::zero() };
            for k in 0..i {
                sum = sum - l[i * n + k] * y[k];
            }
            y[i] = sum / l[i * n + i];
        }
        for i in (0..n).rev() {
            let mut sum = y[i];
            for k in (i + 1)..n {
                sum = sum - l[k * n + i] * inv[k * n + col];
            }
            inv[i * n + col] = sum / l[i * n + i];
        }
    }

    Tensor::from_vec(inv, &[n, n])
}

/// Replacement factors `b_i` such that `kron(b_1, ..., b_k)` approximates
/// `inverse(kron(a_1, ..., a_k) + damping * I)`.
///
/// Each factor may be a square matrix, a vector (diagonal matrix) or a scalar.
/// Factors are normalized by their average trace `n_i` so that the overall
/// scale `c = Π n_i` can be pulled out of the product. The damping is then
/// split evenly (in the geometric sense) across the non-scalar normalized
/// factors, each of which is inverted and rescaled by `c^(-1/k)`. When every
/// factor is a scalar the damping is instead folded into the scale:
/// `c_k = (c + damping)^(1/k)`.
///
/// If the special case is enabled in `config` and `c` is not positive (a zero
/// factor, or NaN), the product is treated as degenerate and every result is
/// an identity (or ones) divided by `damping^(1/k)`.
///
/// The output has the same arity and shapes as `factors`.
///
/// # Errors
///
/// Returns `InvalidArgument` for an empty factor list or a factor of rank
/// greater than 2, and a shape error for non-square matrix factors.
pub fn pi_adjusted_kronecker_inverse<T: LinalgElement>(
    config: &MathConfig,
    factors: &[Tensor<T>],
    damping: T,
) -> Result<Vec<Tensor<T>>> {
    if factors.is_empty() {
        return Err(Error::invalid_argument(
            "factors",
            "at least one Kronecker factor is required",
        ));
    }
    for factor in factors {
        match factor.ndim() {
            0 | 1 => {}
            2 => {
                square_dim(factor.shape())?;
            }
            ndim => {
                return Err(Error::invalid_argument(
                    "factors",
                    format!("Kronecker factors must have rank 0, 1 or 2, got rank {ndim}"),
                ));
            }
        }
    }

    let norms = factors
        .iter()
        .map(|a| psd_matrix_norm(a, NormType::AvgTrace, TwoNormMethod::default(), None))
        .collect::<Result<Vec<T>>>()?;
    let c = norms.iter().fold(T::one(), |acc, &n| acc * n);
    let k = factors.len();
    let inv_k = T::from_f64(1.0 / k as f64);

    let branch = InverseBranch::select(config, c);
    debug!(
        branch = ?branch,
        scale = c.to_f64(),
        num_factors = k,
        "pi-adjusted Kronecker inverse"
    );

    match branch {
        InverseBranch::Regular => {
            let non_scalar = factors.iter().filter(|a| a.numel() != 1).count();
            let (c_k, d_hat) = if non_scalar == 0 {
                ((c + damping).powf_val(inv_k), T::zero())
            } else {
                let d_hat = (damping / c).powf_val(T::from_f64(1.0 / non_scalar as f64));
                (c.powf_val(inv_k), d_hat)
            };

            factors
                .iter()
                .zip(&norms)
                .map(|(a, &n)| {
                    let inverted = if a.numel() == 1 {
                        a.ones_like()
                    } else {
                        let u = a.div_scalar(n);
                        if u.ndim() == 2 {
                            psd_inv_cholesky(&u, d_hat)?
                        } else {
                            u.add_scalar(d_hat).recip()
                        }
                    };
                    Ok(inverted.div_scalar(c_k))
                })
                .collect()
        }
        InverseBranch::Zero => {
            let c_k = damping.powf_val(inv_k);
            Ok(factors
                .iter()
                .map(|a| {
                    let identity = if a.ndim() == 2 {
                        Tensor::eye(a.shape()[0])
                    } else {
                        a.ones_like()
                    };
                    identity.div_scalar(c_k)
                })
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cholesky_inverse_2x2() {
        let a = Tensor::from_slice(&[4.0f64, 2.0, 2.0, 3.0], &[2, 2]);
        let inv = psd_inv_cholesky(&a, 0.0).unwrap();
        let eye = a.matmul(&inv).unwrap();
        for (x, y) in eye.as_slice().iter().zip(Tensor::<f64>::eye(2).as_slice()) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_cholesky_rejects_indefinite() {
        let a = Tensor::from_slice(&[0.0f64, 1.0, 1.0, 0.0], &[2, 2]);
        assert!(matches!(
            psd_inv_cholesky(&a, 0.0),
            Err(Error::Internal(_))
        ));
    }

    #[test]
    fn test_branch_selection() {
        let config = MathConfig::default();
        assert_eq!(InverseBranch::select(&config, 1.0f64), InverseBranch::Regular);
        assert_eq!(InverseBranch::select(&config, 0.0f64), InverseBranch::Zero);
        assert_eq!(InverseBranch::select(&config, f64::NAN), InverseBranch::Zero);

        let disabled = config.with_special_case_zero_inv(false);
        assert_eq!(InverseBranch::select(&disabled, 0.0f64), InverseBranch::Regular);
    }

    #[test]
    fn test_rejects_bad_factors() {
        let config = MathConfig::default();
        let empty: Vec<Tensor<f64>> = vec![];
        assert!(pi_adjusted_kronecker_inverse(&config, &empty, 1.0).is_err());
        let cube = Tensor::<f64>::ones(&[2, 2, 2]);
        assert!(pi_adjusted_kronecker_inverse(&config, &[cube], 1.0).is_err());
    }
}
