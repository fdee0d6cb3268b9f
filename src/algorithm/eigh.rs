//! Robust eigendecomposition of PSD matrices

use crate::config::MathConfig;
use crate::dtype::LinalgElement;
use crate::error::Result;
use crate::runtime::{EigenBackend, EigenDecomposition, HostBackend};
use crate::tensor::{Tensor, square_dim};
use tracing::warn;

/// Eigendecomposition of a symmetric PSD matrix that never surfaces solver
/// NaNs as errors.
///
/// - Input containing NaN returns all-NaN eigenvalues `[d]` and eigenvectors
///   `[d, d]` without running any solver.
/// - `force_on_host` runs [`HostBackend`] directly.
/// - Otherwise the configured backend runs first; if any eigenvalue comes back
///   NaN the decomposition is repeated on [`HostBackend`].
///
/// Eigenvalues are clipped at zero and returned in ascending order.
///
/// # Errors
///
/// Returns an error if `matrix` is not a square 2D tensor.
pub fn safe_psd_eigh<T: LinalgElement>(
    config: &MathConfig,
    matrix: &Tensor<T>,
    force_on_host: bool,
) -> Result<EigenDecomposition<T>> {
    let d = square_dim(matrix.shape())?;

    if matrix.has_nan() {
        return Ok(EigenDecomposition {
            eigenvalues: Tensor::full(&[d], T::nan_val()),
            eigenvectors: Tensor::full(&[d, d], T::nan_val()),
        });
    }

    let host = HostBackend::new();
    let decomposition = if force_on_host {
        host.eigh(matrix)?
    } else {
        let backend = config.eigen_backend();
        let first = backend.eigh(matrix)?;
        if first.eigenvalues.has_nan() {
            warn!(
                backend = backend.name(),
                fallback = host.name(),
                dim = d,
                "Eigensolver produced NaN eigenvalues, recomputing on host"
            );
            host.eigh(matrix)?
        } else {
            first
        }
    };

    Ok(EigenDecomposition {
        eigenvalues: decomposition.eigenvalues.clamp_min(T::zero()),
        eigenvectors: decomposition.eigenvectors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clips_negative_noise() {
        // Rank one matrix: the zero eigenvalue may come back as -eps
        let a = Tensor::from_slice(&[1.0f64, 1.0, 1.0, 1.0], &[2, 2]);
        let eig = safe_psd_eigh(&MathConfig::default(), &a, false).unwrap();
        let s = eig.eigenvalues.to_vec();
        assert!(s[0] >= 0.0 && s[0] < 1e-12);
        assert!((s[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_non_square() {
        let a = Tensor::<f32>::zeros(&[2, 3]);
        assert!(safe_psd_eigh(&MathConfig::default(), &a, false).is_err());
    }
}
