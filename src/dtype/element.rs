//! Element traits for mapping Rust float types to DType

use super::DType;
use bytemuck::{Pod, Zeroable};
use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Trait for types that can be elements of a tensor
///
/// This trait connects Rust's type system to the runtime dtype tag.
///
/// # Bounds
/// - `Copy + Clone + Send + Sync + 'static` - Basic trait requirements
/// - `Pod + Zeroable` - Zero-initialised allocation through bytemuck
/// - `Add + Sub + Mul + Div` - Arithmetic operations (Output = Self)
/// - `PartialOrd` - Comparison for min/max operations
pub trait Element:
    Copy
    + Clone
    + Send
    + Sync
    + Pod
    + Zeroable
    + Debug
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + PartialOrd
{
    /// The corresponding DType for this Rust type
    const DTYPE: DType;

    /// Convert to f64 for generic numeric operations
    fn to_f64(self) -> f64;

    /// Convert from f64 to this type
    fn from_f64(v: f64) -> Self;

    /// Zero value
    fn zero() -> Self;

    /// One value
    fn one() -> Self;
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn one() -> Self {
        1.0
    }
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn one() -> Self {
        1.0
    }
}

/// Trait for elements that support linear algebra operations.
///
/// Extends `Element` with the float functions needed by the factorization
/// kernels. Methods like `zero()`, `one()`, `to_f64()` and `from_f64()` are
/// inherited from `Element`.
pub trait LinalgElement: Element + Neg<Output = Self> {
    /// Returns machine epsilon for this type
    fn epsilon_val() -> f64;
    /// Returns a quiet NaN
    fn nan_val() -> Self;
    /// Returns absolute value
    fn abs_val(&self) -> Self;
    /// Returns square root
    fn sqrt_val(&self) -> Self;
    /// Raises to a floating point power
    fn powf_val(&self, exponent: Self) -> Self;
    /// Returns true if the value is NaN
    fn is_nan_val(&self) -> bool;
    /// Returns true if the value is neither infinite nor NaN
    fn is_finite_val(&self) -> bool;
}

macro_rules! impl_linalg_element {
    ($t:ty) => {
        impl LinalgElement for $t {
            #[inline]
            fn epsilon_val() -> f64 {
                <$t>::EPSILON as f64
            }
            #[inline]
            fn nan_val() -> Self {
                <$t>::NAN
            }
            #[inline]
            fn abs_val(&self) -> Self {
                self.abs()
            }
            #[inline]
            fn sqrt_val(&self) -> Self {
                self.sqrt()
            }
            #[inline]
            fn powf_val(&self, exponent: Self) -> Self {
                self.powf(exponent)
            }
            #[inline]
            fn is_nan_val(&self) -> bool {
                self.is_nan()
            }
            #[inline]
            fn is_finite_val(&self) -> bool {
                self.is_finite()
            }
        }
    };
}

impl_linalg_element!(f32);
impl_linalg_element!(f64);
