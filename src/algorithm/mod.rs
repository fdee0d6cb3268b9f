//! Curvature algorithms
//!
//! The routines a Kronecker-factored curvature approximation is built from:
//!
//! - [`norm`] - PSD matrix norms, including iterative 2-norm estimates
//! - [`eigh`] - eigendecomposition with NaN short-circuit and host fallback
//! - [`inverse`] - Cholesky damped inverse and the pi-adjusted Kronecker inverse
//! - [`kronecker`] - Kronecker-factored matrix-vector products over axis groups
//! - [`averaging`] - memory-bounded averaging of a per-example function
//!
//! ```text
//! factors ──► norm ──► inverse ──► replacement factors
//!    │
//!    └──────► eigh ──► (Q, s) ──► kronecker eigenbasis products
//! ```

pub mod averaging;
pub mod eigh;
pub mod inverse;
pub mod iterative;
pub mod kronecker;
pub mod norm;

pub use averaging::{LoopAndParallelizeAverage, loop_and_parallelize_average};
pub use eigh::safe_psd_eigh;
pub use inverse::{InverseBranch, pi_adjusted_kronecker_inverse, psd_inv_cholesky};
pub use kronecker::{
    Transpose, kron, kronecker_eigen_basis_axis_mul_v, kronecker_eigen_basis_mul_v,
    kronecker_product_axis_mul_v, kronecker_product_mul_v,
};
pub use norm::{DEFAULT_NORM_SEED, NormType, TwoNormMethod, psd_matrix_norm};
