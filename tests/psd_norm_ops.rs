//! Integration tests for PSD matrix norms
//!
//! Tests verify:
//! - Scalar, diagonal and dense forms for every norm type
//! - Iterative 2-norm estimates against a dense eigensolver
//! - Reproducibility of the seeded start vector
//! - Rejection of unsupported shapes and names

use kronfac::algorithm::{NormType, TwoNormMethod, psd_matrix_norm};
use kronfac::error::Error;
use kronfac::runtime::{EigenBackend, HostBackend};
use kronfac::tensor::Tensor;

mod common;

use common::random_psd;

const ALL_NORMS: [NormType; 4] = [
    NormType::TwoNorm,
    NormType::AvgTrace,
    NormType::OneNorm,
    NormType::AvgFro,
];

fn norm(m: &Tensor<f64>, norm_type: NormType) -> f64 {
    psd_matrix_norm(m, norm_type, TwoNormMethod::Lobpcg, None).unwrap()
}

// ============================================================================
// Scalar and diagonal factors
// ============================================================================

#[test]
fn test_scalar_is_its_own_norm() {
    let s = Tensor::scalar(2.5f64);
    for norm_type in ALL_NORMS {
        assert_eq!(norm(&s, norm_type), 2.5, "{norm_type}");
    }
}

#[test]
fn test_diagonal_norms() {
    let d = Tensor::from_slice(&[1.0f64, 4.0, 2.0, 2.0], &[4]);
    assert_eq!(norm(&d, NormType::TwoNorm), 4.0);
    assert_eq!(norm(&d, NormType::OneNorm), 4.0);
    assert_eq!(norm(&d, NormType::AvgTrace), 2.25);
    assert!((norm(&d, NormType::AvgFro) - (25.0f64 / 4.0).sqrt()).abs() < 1e-15);
}

#[test]
fn test_diagonal_vector_matches_dense_diagonal() {
    let d = Tensor::from_slice(&[0.5f64, 3.0, 1.5], &[3]);
    let dense = Tensor::from_slice(&[0.5f64, 0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 1.5], &[3, 3]);
    for norm_type in ALL_NORMS {
        let a = norm(&d, norm_type);
        let b = norm(&dense, norm_type);
        assert!((a - b).abs() < 1e-8 * b, "{norm_type}: {a} vs {b}");
    }
}

// ============================================================================
// Dense factors
// ============================================================================

#[test]
fn test_dense_closed_form_norms() {
    let m = Tensor::from_slice(&[4.0f64, -1.0, 0.0, -1.0, 3.0, 2.0, 0.0, 2.0, 5.0], &[3, 3]);
    assert_eq!(norm(&m, NormType::AvgTrace), 4.0);
    assert_eq!(norm(&m, NormType::OneNorm), 7.0);
    let fro = (16.0f64 + 1.0 + 1.0 + 9.0 + 4.0 + 4.0 + 25.0).sqrt();
    assert!((norm(&m, NormType::AvgFro) - fro / 3.0f64.sqrt()).abs() < 1e-14);
}

#[test]
fn test_two_norm_methods_match_dense_solver() {
    for (n, seed) in [(2, 1), (6, 2), (20, 3)] {
        let m = random_psd(n, 0.1, seed);
        let exact = *HostBackend::new()
            .eigh(&m)
            .unwrap()
            .eigenvalues
            .as_slice()
            .last()
            .unwrap();

        let lobpcg = psd_matrix_norm(&m, NormType::TwoNorm, TwoNormMethod::Lobpcg, None).unwrap();
        assert!(
            (lobpcg - exact).abs() <= 1e-6 * exact,
            "lobpcg n={n}: {lobpcg} vs {exact}"
        );

        let power =
            psd_matrix_norm(&m, NormType::TwoNorm, TwoNormMethod::PowerIteration, Some(7))
                .unwrap();
        assert!(
            (power - exact).abs() <= 1e-3 * exact,
            "power n={n}: {power} vs {exact}"
        );
    }
}

#[test]
fn test_two_norm_is_reproducible() {
    let m = random_psd(12, 0.0, 5);
    let a = psd_matrix_norm(&m, NormType::TwoNorm, TwoNormMethod::PowerIteration, None).unwrap();
    let b = psd_matrix_norm(&m, NormType::TwoNorm, TwoNormMethod::PowerIteration, None).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_f32_norms() {
    let m = Tensor::from_slice(&[2.0f32, 0.0, 0.0, 6.0], &[2, 2]);
    assert_eq!(
        psd_matrix_norm(&m, NormType::AvgTrace, TwoNormMethod::Lobpcg, None).unwrap(),
        4.0
    );
    let two = psd_matrix_norm(&m, NormType::TwoNorm, TwoNormMethod::Lobpcg, None).unwrap();
    assert!((two - 6.0).abs() < 1e-5);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unsupported_shapes() {
    let cube = Tensor::<f64>::ones(&[2, 2, 2]);
    let rect = Tensor::<f64>::ones(&[2, 3]);
    for m in [cube, rect] {
        assert!(matches!(
            psd_matrix_norm(&m, NormType::AvgTrace, TwoNormMethod::Lobpcg, None),
            Err(Error::InvalidArgument { .. })
        ));
    }
}

#[test]
fn test_unknown_names() {
    assert!(matches!(
        "nuclear".parse::<NormType>(),
        Err(Error::InvalidArgument { arg: "norm_type", .. })
    ));
    assert!(matches!(
        "arnoldi".parse::<TwoNormMethod>(),
        Err(Error::InvalidArgument { arg: "method_2norm", .. })
    ));
    assert_eq!("avg_fro".parse::<NormType>().unwrap(), NormType::AvgFro);
}
