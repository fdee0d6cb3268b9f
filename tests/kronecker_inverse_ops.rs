//! Integration tests for the pi-adjusted Kronecker damped inverse
//!
//! Tests verify:
//! - Exact agreement with `inverse(kron(factors) + damping * I)` in the cases
//!   where the factored form is exact (one factor, scalars, zero damping)
//! - The classic two-factor formula with π = sqrt(avg_trace(A) / avg_trace(B))
//! - Approximation quality for small damping with 2-4 mixed factors
//! - The degenerate zero-factor branch and its configuration switch

use kronfac::algorithm::{kron, pi_adjusted_kronecker_inverse, psd_inv_cholesky};
use kronfac::config::MathConfig;
use kronfac::tensor::Tensor;

mod common;

use common::{assert_allclose_f64, dense_inverse, random_psd, relative_error};

// ============================================================================
// Helper Functions
// ============================================================================

/// `inverse(kron(factors) + damping * I)` computed densely
fn dense_damped_inverse(factors: &[Tensor<f64>], damping: f64) -> Vec<f64> {
    let k = kron(factors).unwrap();
    let n = k.shape()[0];
    let damped = k.add(&Tensor::<f64>::eye(n).mul_scalar(damping)).unwrap();
    dense_inverse(damped.as_slice(), n)
}

fn factored_inverse(factors: &[Tensor<f64>], damping: f64) -> Vec<f64> {
    let inv = pi_adjusted_kronecker_inverse(&MathConfig::default(), factors, damping).unwrap();
    assert_eq!(inv.len(), factors.len());
    for (a, b) in factors.iter().zip(&inv) {
        assert_eq!(a.shape(), b.shape());
    }
    kron(&inv).unwrap().to_vec()
}

fn diagonal(values: &[f64]) -> Tensor<f64> {
    Tensor::from_slice(values, &[values.len()])
}

// ============================================================================
// Exact cases
// ============================================================================

#[test]
fn test_single_dense_factor_is_exact() {
    let a = random_psd(5, 0.0, 1);
    let expected = dense_damped_inverse(&[a.clone()], 0.3);
    assert_allclose_f64(&factored_inverse(&[a], 0.3), &expected, 1e-10, 1e-12, "single dense");
}

#[test]
fn test_single_diagonal_factor_is_exact() {
    let d = diagonal(&[0.5, 2.0, 4.0]);
    let inv = pi_adjusted_kronecker_inverse(&MathConfig::default(), &[d], 0.5).unwrap();
    assert_allclose_f64(inv[0].as_slice(), &[1.0, 0.4, 1.0 / 4.5], 1e-12, 0.0, "diag");
}

#[test]
fn test_all_scalar_factors_fold_damping() {
    let factors = [Tensor::scalar(2.0f64), Tensor::scalar(3.0), Tensor::scalar(0.5)];
    let inv = pi_adjusted_kronecker_inverse(&MathConfig::default(), &factors, 1.0).unwrap();
    // (c + d)^(-1/3) each, with c = 3
    let expected = 4.0f64.powf(-1.0 / 3.0);
    for b in &inv {
        assert_eq!(b.shape(), &[] as &[usize]);
        assert!((b.item().unwrap() - expected).abs() < 1e-14);
    }
    assert_allclose_f64(&factored_inverse(&factors, 1.0), &[0.25], 1e-12, 0.0, "scalars");
}

#[test]
fn test_one_matrix_with_scalars_is_exact() {
    let factors = [
        Tensor::scalar(2.0f64),
        random_psd(4, 0.0, 2),
        Tensor::from_slice(&[0.7f64], &[1]),
    ];
    let expected = dense_damped_inverse(&factors, 0.05);
    assert_allclose_f64(
        &factored_inverse(&factors, 0.05),
        &expected,
        1e-9,
        1e-12,
        "matrix and scalars",
    );
}

#[test]
fn test_zero_damping_mixed_factors_is_exact() {
    let pools: Vec<Vec<Tensor<f64>>> = vec![
        vec![random_psd(3, 0.1, 3)],
        vec![random_psd(3, 0.1, 4), diagonal(&[1.0, 2.0])],
        vec![diagonal(&[0.5, 1.5]), Tensor::scalar(3.0), random_psd(2, 0.2, 5)],
        vec![
            random_psd(2, 0.1, 6),
            diagonal(&[1.0, 0.25, 2.0]),
            Tensor::scalar(0.5),
            random_psd(2, 0.3, 7),
        ],
    ];
    for factors in pools {
        let expected = dense_damped_inverse(&factors, 0.0);
        let got = factored_inverse(&factors, 0.0);
        assert!(
            relative_error(&got, &expected) < 1e-9,
            "{} factors: relative error {}",
            factors.len(),
            relative_error(&got, &expected)
        );
    }
}

// ============================================================================
// Pi adjustment
// ============================================================================

#[test]
fn test_two_factor_pi_adjustment() {
    let a = random_psd(3, 0.0, 8).mul_scalar(5.0);
    let b = random_psd(4, 0.0, 9);
    let damping = 0.2f64;

    let avg_trace = |m: &Tensor<f64>| m.trace().unwrap() / m.shape()[0] as f64;
    let pi = (avg_trace(&a) / avg_trace(&b)).sqrt();
    let sqrt_d = damping.sqrt();

    let expected_a = psd_inv_cholesky(&a, pi * sqrt_d).unwrap();
    let expected_b = psd_inv_cholesky(&b, sqrt_d / pi).unwrap();

    let inv =
        pi_adjusted_kronecker_inverse(&MathConfig::default(), &[a, b], damping).unwrap();
    assert_allclose_f64(
        &kron(&inv).unwrap().to_vec(),
        &kron(&[expected_a, expected_b]).unwrap().to_vec(),
        1e-9,
        1e-12,
        "pi-adjusted two factor",
    );
}

#[test]
fn test_small_damping_approximates_dense_inverse() {
    let pools: Vec<Vec<Tensor<f64>>> = vec![
        vec![random_psd(3, 0.5, 10), random_psd(2, 0.5, 11)],
        vec![random_psd(2, 0.5, 12), diagonal(&[1.0, 2.0, 3.0]), Tensor::scalar(2.0)],
        vec![
            diagonal(&[1.0, 1.5]),
            random_psd(2, 0.5, 13),
            random_psd(3, 0.5, 14),
            Tensor::scalar(0.8),
        ],
    ];
    // The factored form differs from the exact inverse by O(d^(1/m)) terms
    for factors in pools {
        let expected = dense_damped_inverse(&factors, 1e-12);
        let got = factored_inverse(&factors, 1e-12);
        let err = relative_error(&got, &expected);
        assert!(err < 1e-2, "{} factors: relative error {err}", factors.len());
    }
}

// ============================================================================
// Degenerate factors
// ============================================================================

#[test]
fn test_zero_factor_returns_scaled_identities() {
    let factors = [
        Tensor::<f64>::zeros(&[3, 3]),
        diagonal(&[1.0, 2.0]),
        Tensor::scalar(4.0),
    ];
    let damping = 0.125f64;
    let inv = pi_adjusted_kronecker_inverse(&MathConfig::default(), &factors, damping).unwrap();

    let scale = damping.powf(-1.0 / 3.0);
    assert_allclose_f64(
        inv[0].as_slice(),
        Tensor::<f64>::eye(3).mul_scalar(scale).as_slice(),
        1e-14,
        0.0,
        "zero factor",
    );
    assert_allclose_f64(inv[1].as_slice(), &[scale, scale], 1e-14, 0.0, "diag");
    assert!((inv[2].item().unwrap() - scale).abs() < 1e-14);

    // kron of the replacements is exactly I / damping
    let dense = kron(&inv).unwrap();
    assert_allclose_f64(
        dense.as_slice(),
        Tensor::<f64>::eye(6).mul_scalar(1.0 / damping).as_slice(),
        1e-12,
        1e-14,
        "kron of zero branch",
    );
}

#[test]
fn test_nan_factor_takes_zero_branch() {
    let factors = [Tensor::from_slice(&[f64::NAN, 1.0], &[2]), random_psd(2, 0.1, 15)];
    let inv = pi_adjusted_kronecker_inverse(&MathConfig::default(), &factors, 1.0).unwrap();
    assert!(inv.iter().all(|t| t.as_slice().iter().all(|x| x.is_finite())));
}

#[test]
fn test_zero_factor_without_special_case_is_not_finite() {
    let config = MathConfig::default().with_special_case_zero_inv(false);
    let factors = [Tensor::<f64>::zeros(&[2, 2]), random_psd(2, 0.1, 16)];
    let inv = pi_adjusted_kronecker_inverse(&config, &factors, 0.5).unwrap();
    assert!(
        inv.iter()
            .any(|t| t.as_slice().iter().any(|x| !x.is_finite()))
    );
}

#[test]
fn test_f32_factors() {
    let a = Tensor::from_slice(&[2.0f32, 0.5, 0.5, 1.0], &[2, 2]);
    let inv = pi_adjusted_kronecker_inverse(&MathConfig::default(), &[a], 0.5f32).unwrap();
    // inverse([[2.5, 0.5], [0.5, 1.5]])
    let det = 2.5f32 * 1.5 - 0.25;
    common::assert_allclose_f32(
        inv[0].as_slice(),
        &[1.5 / det, -0.5 / det, -0.5 / det, 2.5 / det],
        1e-5,
        1e-6,
        "f32 single factor",
    );
}
