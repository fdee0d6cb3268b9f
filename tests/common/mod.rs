//! Common test utilities
#![allow(dead_code)]

use kronfac::tensor::Tensor;
use rand::prelude::*;
use rand_distr::StandardNormal;

/// Assert two f64 slices are close within tolerance
///
/// Uses the formula: |a - b| <= atol + rtol * |b|
pub fn assert_allclose_f64(a: &[f64], b: &[f64], rtol: f64, atol: f64, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}

/// Assert two f32 slices are close within tolerance
pub fn assert_allclose_f32(a: &[f32], b: &[f32], rtol: f32, atol: f32, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}

/// Check if a row-major `n x n` matrix is close to identity
pub fn assert_near_identity(data: &[f64], n: usize, tol: f64, msg: &str) {
    for i in 0..n {
        for j in 0..n {
            let expected = if i == j { 1.0 } else { 0.0 };
            let actual = data[i * n + j];
            let diff = (actual - expected).abs();
            assert!(
                diff <= tol,
                "{}: element [{},{}] differs: {} vs {} (diff={})",
                msg,
                i,
                j,
                actual,
                expected,
                diff
            );
        }
    }
}

/// Tensor of standard normal samples
pub fn random_normal(shape: &[usize], seed: u64) -> Tensor<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let numel: usize = shape.iter().product();
    let data: Vec<f64> = (0..numel).map(|_| rng.sample(StandardNormal)).collect();
    Tensor::from_slice(&data, shape)
}

/// Random symmetric positive definite matrix `X X^T / m + shift * I`
pub fn random_psd(n: usize, shift: f64, seed: u64) -> Tensor<f64> {
    let m = n + 2;
    let x = random_normal(&[n, m], seed);
    let xxt = x.matmul(&x.transpose().unwrap()).unwrap();
    xxt.div_scalar(m as f64)
        .add(&Tensor::<f64>::eye(n).mul_scalar(shift))
        .unwrap()
}

/// Inverse of a dense row-major matrix by Gauss-Jordan elimination with
/// partial pivoting
pub fn dense_inverse(a: &[f64], n: usize) -> Vec<f64> {
    let mut work = a.to_vec();
    let mut inv = vec![0.0; n * n];
    for i in 0..n {
        inv[i * n + i] = 1.0;
    }
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| work[i * n + col].abs().total_cmp(&work[j * n + col].abs()))
            .unwrap();
        for k in 0..n {
            work.swap(col * n + k, pivot * n + k);
            inv.swap(col * n + k, pivot * n + k);
        }
        let p = work[col * n + col];
        assert!(p.abs() > 1e-300, "singular matrix");
        for k in 0..n {
            work[col * n + k] /= p;
            inv[col * n + k] /= p;
        }
        for row in 0..n {
            if row != col {
                let f = work[row * n + col];
                for k in 0..n {
                    work[row * n + k] -= f * work[col * n + k];
                    inv[row * n + k] -= f * inv[col * n + k];
                }
            }
        }
    }
    inv
}

/// Dense matrix-vector product for a row-major `n x n` matrix
pub fn dense_matvec(a: &[f64], x: &[f64]) -> Vec<f64> {
    let n = x.len();
    (0..n)
        .map(|i| (0..n).map(|j| a[i * n + j] * x[j]).sum())
        .collect()
}

/// Relative Frobenius distance `||a - b|| / ||b||`
pub fn relative_error(a: &[f64], b: &[f64]) -> f64 {
    let num: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    let den: f64 = b.iter().map(|y| y * y).sum();
    (num / den).sqrt()
}
