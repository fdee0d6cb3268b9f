//! Numerical policy shared by the curvature routines

use crate::runtime::Backend;

/// Numerical policy passed by reference into the routines that need it.
///
/// # Example
///
/// ```
/// use kronfac::config::MathConfig;
/// use kronfac::runtime::{Backend, HostBackend};
///
/// let config = MathConfig::default()
///     .with_special_case_zero_inv(false)
///     .with_eigen_backend(Backend::Host(HostBackend::new()));
/// assert!(!config.special_case_zero_inv());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MathConfig {
    special_case_zero_inv: bool,
    eigen_backend: Backend,
}

impl MathConfig {
    /// Whether a zero or NaN Kronecker scale selects the degenerate inverse
    /// branch (default `true`)
    pub fn special_case_zero_inv(&self) -> bool {
        self.special_case_zero_inv
    }

    /// Enable or disable the degenerate inverse branch
    pub fn set_special_case_zero_inv(&mut self, value: bool) {
        self.special_case_zero_inv = value;
    }

    /// Builder form of [`Self::set_special_case_zero_inv`]
    pub fn with_special_case_zero_inv(mut self, value: bool) -> Self {
        self.special_case_zero_inv = value;
        self
    }

    /// Default eigensolver tried before the host fallback
    pub fn eigen_backend(&self) -> Backend {
        self.eigen_backend
    }

    /// Replace the default eigensolver
    pub fn with_eigen_backend(mut self, backend: impl Into<Backend>) -> Self {
        self.eigen_backend = backend.into();
        self
    }
}

impl Default for MathConfig {
    fn default() -> Self {
        Self {
            special_case_zero_inv: true,
            eigen_backend: Backend::default(),
        }
    }
}
