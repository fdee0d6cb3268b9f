//! # kronfac
//!
//! **Numerical core of Kronecker-factored approximate-curvature optimizers.**
//!
//! kronfac provides the dense linear algebra a K-FAC style optimizer needs to
//! turn Kronecker factors into preconditioners, on plain CPU tensors.
//!
//! ## Features
//!
//! - **Damped Kronecker inverses**: pi-adjusted rebalancing of damping across
//!   factors given as matrices, diagonals or scalars
//! - **Kronecker products on axis groups**: `kron(F_1, ..., F_k) · rvec(v)`
//!   without forming the product, plus the eigenbasis variant
//! - **Robust eigendecomposition**: NaN short-circuit and automatic fallback
//!   to a slower, unconditionally convergent solver
//! - **PSD norms**: trace, Frobenius, 1-norm and iterative 2-norm estimates
//! - **Batched averaging**: per-example functions averaged under a memory bound
//! - **Tree algebra**: weighted sums, inner products and norms over nested
//!   collections of tensors
//!
//! ## Quick Start
//!
//! ```rust
//! use kronfac::prelude::*;
//!
//! let config = MathConfig::default();
//! let a = Tensor::from_slice(&[2.0f64, 0.5, 0.5, 1.0], &[2, 2]);
//! let b = Tensor::from_slice(&[1.0f64, 3.0], &[2]);
//!
//! let inv = pi_adjusted_kronecker_inverse(&config, &[a, b], 1e-3)?;
//! assert_eq!(inv[0].shape(), &[2, 2]);
//! assert_eq!(inv[1].shape(), &[2]);
//! # Ok::<(), kronfac::error::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): Multi-threaded evaluation inside averaging chunks

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithm;
pub mod config;
pub mod dtype;
pub mod error;
pub mod ops;
pub mod runtime;
pub mod tensor;
pub mod tree;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::algorithm::{
        NormType, TwoNormMethod, kronecker_eigen_basis_axis_mul_v, kronecker_product_axis_mul_v,
        loop_and_parallelize_average, pi_adjusted_kronecker_inverse, psd_matrix_norm,
        safe_psd_eigh,
    };
    pub use crate::config::MathConfig;
    pub use crate::dtype::{DType, Element, LinalgElement};
    pub use crate::error::{Error, Result};
    pub use crate::runtime::{Backend, EigenBackend, EigenDecomposition};
    pub use crate::tensor::Tensor;
    pub use crate::tree::Tree;
}
