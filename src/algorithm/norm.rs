//! Norms of PSD matrices given in dense, diagonal or scalar form

use super::iterative::{IterativeEigOptions, lobpcg_largest, power_iteration};
use crate::dtype::LinalgElement;
use crate::error::{Error, Result};
use crate::tensor::Tensor;
use rand::prelude::*;
use rand_distr::StandardNormal;
use std::fmt;
use std::str::FromStr;

/// Seed for the 2-norm start vector when the caller does not supply one
pub const DEFAULT_NORM_SEED: u64 = 123;

/// Which matrix norm to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormType {
    /// Spectral norm (largest eigenvalue)
    TwoNorm,
    /// Trace divided by dimension
    AvgTrace,
    /// Induced 1-norm (max absolute column sum)
    OneNorm,
    /// Frobenius norm divided by the square root of the dimension
    AvgFro,
}

impl NormType {
    /// Canonical string name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TwoNorm => "2_norm",
            Self::AvgTrace => "avg_trace",
            Self::OneNorm => "1_norm",
            Self::AvgFro => "avg_fro",
        }
    }
}

impl fmt::Display for NormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NormType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "2_norm" => Ok(Self::TwoNorm),
            "avg_trace" => Ok(Self::AvgTrace),
            "1_norm" => Ok(Self::OneNorm),
            "avg_fro" => Ok(Self::AvgFro),
            other => Err(Error::invalid_argument(
                "norm_type",
                format!("Unrecognized norm type '{other}'"),
            )),
        }
    }
}

/// Estimator used for [`NormType::TwoNorm`] on dense matrices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TwoNormMethod {
    /// Single-vector LOBPCG
    #[default]
    Lobpcg,
    /// Power iteration
    PowerIteration,
}

impl TwoNormMethod {
    /// Canonical string name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lobpcg => "lobpcg",
            Self::PowerIteration => "power_iteration",
        }
    }
}

impl fmt::Display for TwoNormMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TwoNormMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lobpcg" => Ok(Self::Lobpcg),
            "power_iteration" => Ok(Self::PowerIteration),
            other => Err(Error::invalid_argument(
                "method_2norm",
                format!("Unrecognized 2-norm method '{other}'"),
            )),
        }
    }
}

/// Norm of a PSD matrix.
///
/// - rank 0: the scalar itself, for every norm type
/// - rank 1 (diagonal matrix): `2_norm` and `1_norm` give the max entry,
///   `avg_trace` the mean entry, `avg_fro` the Euclidean norm over `√len`
/// - rank 2 (square): `avg_trace` is `trace / d`, `1_norm` the max absolute
///   column sum, `avg_fro` the Frobenius norm over `√d`, and `2_norm` the
///   largest eigenvalue estimated iteratively from a start vector drawn with
///   `seed` (default [`DEFAULT_NORM_SEED`])
///
/// # Errors
///
/// Returns `InvalidArgument` for rank > 2 or non-square matrices.
///
/// # Example
///
/// ```
/// use kronfac::algorithm::norm::{NormType, TwoNormMethod, psd_matrix_norm};
/// use kronfac::tensor::Tensor;
///
/// let a = Tensor::from_slice(&[2.0f64, 0.0, 0.0, 4.0], &[2, 2]);
/// let n = psd_matrix_norm(&a, NormType::AvgTrace, TwoNormMethod::Lobpcg, None).unwrap();
/// assert_eq!(n, 3.0);
/// ```
pub fn psd_matrix_norm<T: LinalgElement>(
    matrix: &Tensor<T>,
    norm_type: NormType,
    method_2norm: TwoNormMethod,
    seed: Option<u64>,
) -> Result<T> {
    match matrix.ndim() {
        0 => matrix.item(),
        1 => {
            let len = matrix.numel();
            if len == 0 {
                return Err(unsupported_shape(matrix.shape()));
            }
            match norm_type {
                NormType::TwoNorm | NormType::OneNorm => matrix.max_element(),
                NormType::AvgTrace => Ok(matrix.mean()),
                NormType::AvgFro => {
                    Ok(matrix.frobenius_norm() / T::from_f64(len as f64).sqrt_val())
                }
            }
        }
        2 if matrix.shape()[0] == matrix.shape()[1] && matrix.shape()[0] > 0 => {
            let d = matrix.shape()[0];
            match norm_type {
                NormType::AvgTrace => Ok(matrix.trace()? / T::from_f64(d as f64)),
                NormType::OneNorm => Ok(max_abs_column_sum(matrix, d)),
                NormType::AvgFro => {
                    Ok(matrix.frobenius_norm() / T::from_f64(d as f64).sqrt_val())
                }
                NormType::TwoNorm => {
                    let start = standard_normal_vector(d, seed.unwrap_or(DEFAULT_NORM_SEED));
                    let estimate = match method_2norm {
                        TwoNormMethod::Lobpcg => {
                            lobpcg_largest(matrix, &start, IterativeEigOptions::LOBPCG)?
                        }
                        TwoNormMethod::PowerIteration => {
                            power_iteration(matrix, &start, IterativeEigOptions::POWER_ITERATION)?
                        }
                    };
                    Ok(T::from_f64(estimate.eigenvalue))
                }
            }
        }
        _ => Err(unsupported_shape(matrix.shape())),
    }
}

fn unsupported_shape(shape: &[usize]) -> Error {
    Error::invalid_argument("matrix", format!("Unsupported shape {shape:?}"))
}

fn max_abs_column_sum<T: LinalgElement>(matrix: &Tensor<T>, d: usize) -> T {
    let data = matrix.as_slice();
    (0..d)
        .map(|j| (0..d).fold(T::zero(), |acc, i| acc + data[i * d + j].abs_val()))
        .fold(T::zero(), |acc, x| if x > acc { x } else { acc })
}

fn standard_normal_vector(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.sample(StandardNormal)).collect()
}
