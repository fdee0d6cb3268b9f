//! Eigensolver backends
//!
//! Symmetric eigendecomposition is the one kernel in kronfac with more than
//! one implementation. Backends are interchangeable and selected through
//! [`Backend`], which the robust decomposition in
//! [`crate::algorithm::eigh`] uses to retry on the host path.
//!
//! ```text
//! Backend
//! ├── Tridiagonal (Householder + implicit QL, default)
//! └── Host        (cyclic Jacobi, reference / fallback)
//! ```

mod host;
mod jacobi;
mod tridiagonal;

pub use host::HostBackend;
pub use tridiagonal::TridiagonalBackend;

use crate::dtype::LinalgElement;
use crate::error::Result;
use crate::tensor::Tensor;

/// Eigendecomposition of a symmetric matrix: `A = V diag(λ) V^T`
#[derive(Debug, Clone, PartialEq)]
pub struct EigenDecomposition<T: LinalgElement> {
    /// Eigenvalues `[n]`, ascending
    pub eigenvalues: Tensor<T>,
    /// Orthonormal eigenvectors `[n, n]`, column `i` pairs with eigenvalue `i`
    pub eigenvectors: Tensor<T>,
}

/// A dense symmetric eigensolver
///
/// Implementations read only the lower triangle of the input and return
/// eigenvalues in ascending order.
pub trait EigenBackend {
    /// Short identifier used in log events
    fn name(&self) -> &'static str;

    /// Decompose a square symmetric matrix
    fn eigh<T: LinalgElement>(&self, a: &Tensor<T>) -> Result<EigenDecomposition<T>>;
}

/// Eigensolver selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Fast default path
    Tridiagonal(TridiagonalBackend),
    /// Slow, unconditionally convergent host path
    Host(HostBackend),
}

impl Default for Backend {
    fn default() -> Self {
        Self::Tridiagonal(TridiagonalBackend::new())
    }
}

impl From<TridiagonalBackend> for Backend {
    fn from(backend: TridiagonalBackend) -> Self {
        Self::Tridiagonal(backend)
    }
}

impl From<HostBackend> for Backend {
    fn from(backend: HostBackend) -> Self {
        Self::Host(backend)
    }
}

impl EigenBackend for Backend {
    fn name(&self) -> &'static str {
        match self {
            Self::Tridiagonal(b) => b.name(),
            Self::Host(b) => b.name(),
        }
    }

    fn eigh<T: LinalgElement>(&self, a: &Tensor<T>) -> Result<EigenDecomposition<T>> {
        match self {
            Self::Tridiagonal(b) => b.eigh(a),
            Self::Host(b) => b.eigh(a),
        }
    }
}
