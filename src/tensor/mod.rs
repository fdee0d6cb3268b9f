//! Tensor types and operations
//!
//! This module provides the dense row-major `Tensor` type used for Kronecker
//! factors, eigenbases and parameter-shaped vectors, together with the small
//! set of kernels the curvature routines are built from.

mod core;
mod ops;
mod shape;

pub use self::core::Tensor;
pub(crate) use ops::square_dim;
pub use shape::Shape;
