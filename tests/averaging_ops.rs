//! Integration tests for memory-bounded batched averaging
//!
//! Tests verify:
//! - Every chunking bound gives the direct mean, including uneven remainders
//! - Multi-leaf argument and output trees
//! - Rejection of empty and inconsistent batches
//! - Errors raised by the averaged function are propagated

use kronfac::algorithm::loop_and_parallelize_average;
use kronfac::error::{Error, Result};
use kronfac::ops::outer_product;
use kronfac::tensor::Tensor;
use kronfac::tree::Tree;

mod common;

use common::{assert_allclose_f64, random_normal};

const BATCH: usize = 7;

// ============================================================================
// Helper Functions
// ============================================================================

/// Batch tree `{"x": [BATCH, 3], "y": [BATCH]}`
fn batch() -> Tree<f64> {
    Tree::dict([
        ("x", Tree::from(random_normal(&[BATCH, 3], 1))),
        ("y", Tree::from(random_normal(&[BATCH], 2))),
    ])
}

/// Per-example statistics: `x x^T` (9 elements) and `sum(x) * y` (1 element)
fn statistics(example: &Tree<f64>) -> Result<Tree<f64>> {
    let Tree::Dict(entries) = example else {
        return Err(Error::structure_mismatch("expected a dict"));
    };
    let x = entries["x"]
        .as_leaf()
        .ok_or_else(|| Error::structure_mismatch("x is not a leaf"))?;
    let y = entries["y"]
        .as_leaf()
        .ok_or_else(|| Error::structure_mismatch("y is not a leaf"))?;

    let outer = outer_product(&[x.clone(), x.clone()])?;
    let weighted = Tensor::from_slice(&[x.sum() * y.item()?], &[1]);
    Ok(Tree::dict([
        ("outer", Tree::from(outer)),
        ("sum", Tree::from(weighted)),
    ]))
}

/// Mean of `statistics` over the batch, computed one example at a time
fn direct_mean(args: &Tree<f64>) -> Tree<f64> {
    let mut sum: Option<Tree<f64>> = None;
    for i in 0..BATCH {
        let example = args.try_map(|t| t.index_leading(i)).unwrap();
        let out = statistics(&example).unwrap();
        sum = Some(match sum {
            None => out,
            Some(acc) => acc.zip_with(&out, |a, b| a.add(b)).unwrap(),
        });
    }
    sum.unwrap().map(|t| t.div_scalar(BATCH as f64))
}

fn assert_trees_close(a: &Tree<f64>, b: &Tree<f64>, msg: &str) {
    assert!(a.structure_eq(b, true), "{msg}: structure differs");
    for (x, y) in a.leaves().into_iter().zip(b.leaves()) {
        assert_allclose_f64(x.as_slice(), y.as_slice(), 1e-12, 1e-12, msg);
    }
}

// ============================================================================
// Chunking schedules
// ============================================================================

#[test]
fn test_every_bound_matches_direct_mean() {
    let args = batch();
    let expected = direct_mean(&args);

    // singleton size is 10 elements, so these cover one example per chunk,
    // uneven chunks with a remainder, and a single parallel pass
    for bound in [
        Some(1),
        Some(BATCH / 2),
        Some(BATCH),
        Some(2 * BATCH),
        Some(30),
        Some(50),
        Some(70),
        Some(1000),
        None,
    ] {
        let avg = loop_and_parallelize_average(statistics, bound)
            .average(&args)
            .unwrap();
        assert_trees_close(&avg, &expected, &format!("bound {bound:?}"));
    }
}

#[test]
fn test_single_leaf_closure() {
    let data = Tensor::from_slice(&[1.0f64, 2.0, 3.0, 4.0, 5.0], &[5]);
    let square = |x: &Tree<f64>| -> Result<Tree<f64>> { x.try_map(|t| t.mul(t)) };

    for bound in [Some(1), Some(2), Some(3), None] {
        let averager = loop_and_parallelize_average(square, bound);
        assert_eq!(averager.max_parallel_size(), bound);
        let avg = averager.average(&Tree::from(data.clone())).unwrap();
        let value = avg.as_leaf().unwrap().item().unwrap();
        assert!((value - 11.0).abs() < 1e-12, "bound {bound:?}: {value}");
    }
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_inconsistent_leading_axis() {
    let args = Tree::list([
        Tree::from(Tensor::<f64>::zeros(&[4, 2])),
        Tree::from(Tensor::<f64>::zeros(&[3])),
    ]);
    let identity = |x: &Tree<f64>| -> Result<Tree<f64>> { Ok(x.clone()) };
    let err = loop_and_parallelize_average(identity, Some(2))
        .average(&args)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { arg: "args", .. }));
    assert!(err.to_string().contains("Inconsistent leading axis sizes"));
}

#[test]
fn test_no_leaves() {
    let identity = |x: &Tree<f64>| -> Result<Tree<f64>> { Ok(x.clone()) };
    let err = loop_and_parallelize_average(identity, None)
        .average(&Tree::dict(Vec::<(String, Tree<f64>)>::new()))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { arg: "args", .. }));
}

#[test]
fn test_function_errors_propagate() {
    let failing =
        |_: &Tree<f64>| -> Result<Tree<f64>> { Err(Error::Internal("boom".to_string())) };
    for bound in [Some(1), None] {
        let result = loop_and_parallelize_average(failing, bound).average(&batch());
        assert!(matches!(result, Err(Error::Internal(msg)) if msg == "boom"));
    }
}
