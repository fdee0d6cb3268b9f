//! Vector-space operations on [`Tree`]s
//!
//! A tree stands for the vector obtained by flattening and concatenating all
//! of its leaves. Every binary operation requires structurally equal operands.

use crate::dtype::{Element, LinalgElement};
use crate::error::{Error, Result};
use crate::tensor::{Shape, Tensor};
use crate::tree::Tree;
use std::collections::BTreeMap;

/// Product of all items; one for an empty iterator
pub fn product<T: Element>(items: impl IntoIterator<Item = T>) -> T {
    items.into_iter().fold(T::one(), |acc, x| acc * x)
}

/// Outer product of any number of vectors.
///
/// The result has shape `[len_0, len_1, ...]`.
///
/// # Errors
///
/// Returns `InvalidArgument` if any input is not rank 1.
pub fn outer_product<T: Element>(vectors: &[Tensor<T>]) -> Result<Tensor<T>> {
    if let Some(bad) = vectors.iter().find(|v| v.ndim() != 1) {
        return Err(Error::invalid_argument(
            "vectors",
            format!("All arrays must be vectors, got shape {:?}", bad.shape()),
        ));
    }

    let mut data = vec![T::one()];
    for v in vectors {
        data = data
            .iter()
            .flat_map(|&acc| v.as_slice().iter().map(move |&x| acc * x))
            .collect();
    }
    let shape: Shape = vectors.iter().map(|v| v.numel()).collect();
    Tensor::from_vec(data, &shape)
}

/// Multiply every leaf by `scalar`
pub fn scalar_mul<T: Element>(tree: &Tree<T>, scalar: T) -> Tree<T> {
    if scalar == T::one() {
        return tree.clone();
    }
    tree.map(|t| t.mul_scalar(scalar))
}

/// Divide every leaf by `scalar`
pub fn scalar_div<T: Element>(tree: &Tree<T>, scalar: T) -> Tree<T> {
    if scalar == T::one() {
        return tree.clone();
    }
    tree.map(|t| t.div_scalar(scalar))
}

/// Computes `Σ_i coefficients[i] * objects[i]`.
///
/// # Errors
///
/// Returns `InvalidArgument` if the two slices differ in length or are empty,
/// and `StructureMismatch` if the objects are not structurally equal.
pub fn weighted_sum_of_objects<T: Element>(
    objects: &[Tree<T>],
    coefficients: &[T],
) -> Result<Tree<T>> {
    if objects.len() != coefficients.len() {
        return Err(Error::invalid_argument(
            "coefficients",
            format!(
                "The number of coefficients ({}) must equal the number of objects ({})",
                coefficients.len(),
                objects.len()
            ),
        ));
    }
    let Some((first, rest)) = objects.split_first() else {
        return Err(Error::invalid_argument(
            "objects",
            "The objects' sequence can not be empty",
        ));
    };

    let mut accumulator = scalar_mul(first, coefficients[0]);
    for (object, &c) in rest.iter().zip(&coefficients[1..]) {
        accumulator = accumulator.zip_with(object, |acc, o| acc.add(&o.mul_scalar(c)))?;
    }
    Ok(accumulator)
}

/// Inner product `<vec(a), vec(b)>`, accumulated in the element type.
///
/// Leaf dtypes are not compared, only nesting and leaf shapes.
///
/// # Errors
///
/// `StructureMismatch` for structurally different trees. Extended precision
/// accumulation (`in_float64 = true`) is not available and returns
/// `NotImplemented`.
pub fn inner_product<T: Element>(a: &Tree<T>, b: &Tree<T>, in_float64: bool) -> Result<T> {
    a.check_structure(b, false)?;
    if in_float64 {
        return Err(Error::NotImplemented {
            feature: "inner product accumulated in float64",
        });
    }
    a.leaves()
        .into_iter()
        .zip(b.leaves())
        .try_fold(T::zero(), |acc, (x, y)| Ok(acc + x.dot(y)?))
}

/// Matrix `m` with `m[i][j] = ip(vectors1[i], vectors2[j])` for `j >= i`,
/// mirrored below the diagonal.
///
/// # Errors
///
/// Returns `InvalidArgument` if the sequences differ in length, or whatever
/// `ip` returns.
pub fn symmetric_matrix_inner_products<T: Element>(
    vectors1: &[Tree<T>],
    vectors2: &[Tree<T>],
    ip: impl Fn(&Tree<T>, &Tree<T>) -> Result<T>,
) -> Result<Tensor<T>> {
    if vectors1.len() != vectors2.len() {
        return Err(Error::invalid_argument(
            "vectors2",
            format!(
                "The two sequences should have the same length, got {} and {}",
                vectors1.len(),
                vectors2.len()
            ),
        ));
    }

    let n = vectors1.len();
    let mut m = vec![T::zero(); n * n];
    for (i, v_i) in vectors1.iter().enumerate() {
        for (j, v_j) in vectors2.iter().enumerate() {
            m[i * n + j] = if j < i { m[j * n + i] } else { ip(v_i, v_j)? };
        }
    }
    Tensor::from_vec(m, &[n, n])
}

/// Gram matrix of `vectors` under `ip`
pub fn matrix_of_inner_products<T: Element>(
    vectors: &[Tree<T>],
    ip: impl Fn(&Tree<T>, &Tree<T>) -> Result<T>,
) -> Result<Tensor<T>> {
    symmetric_matrix_inner_products(vectors, vectors, ip)
}

/// Vector `v` with `v[i] = ip(vectors[i], base)`
pub fn vector_of_inner_products<T: Element>(
    base: &Tree<T>,
    vectors: &[Tree<T>],
    ip: impl Fn(&Tree<T>, &Tree<T>) -> Result<T>,
) -> Result<Tensor<T>> {
    let values = vectors
        .iter()
        .map(|v| ip(v, base))
        .collect::<Result<Vec<T>>>()?;
    let n = values.len();
    Tensor::from_vec(values, &[n])
}

/// Euclidean norm of the flattened tree
pub fn norm<T: LinalgElement>(tree: &Tree<T>) -> T {
    tree.leaves()
        .into_iter()
        .fold(T::zero(), |acc, t| {
            acc + t.as_slice().iter().fold(T::zero(), |s, &x| s + x * x)
        })
        .sqrt_val()
}

/// Norm of every leaf, keyed by `"{key_prefix}({path})"` where `path` joins the
/// dict keys and list indices leading to the leaf with `/`.
pub fn per_parameter_norm<T: LinalgElement>(tree: &Tree<T>, key_prefix: &str) -> BTreeMap<String, T> {
    tree.leaves_with_path()
        .into_iter()
        .map(|(path, leaf)| {
            (
                format!("{key_prefix}({})", path.join("/")),
                leaf.frobenius_norm(),
            )
        })
        .collect()
}
