//! Block permutations of square matrices

use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::tensor::{Tensor, square_dim};

/// Permute whole blocks of a square matrix, in rows and columns alike.
///
/// The matrix is split into blocks of `block_sizes` along both axes; slot `i`
/// of the result receives block `block_order[i]`:
///
/// ```text
/// [[A0, B0, C0],                   [[C2, A2, B2],
///  [A1, B1, C1],  order [2, 0, 1]   [C0, A0, B0],
///  [A2, B2, C2]]       =>           [C1, A1, B1]]
/// ```
///
/// # Errors
///
/// Returns `InvalidArgument` if `block_sizes` and `block_order` differ in
/// length, the sizes do not sum to the matrix dimension, or the order is not
/// a permutation.
pub fn block_permuted<T: Element>(
    matrix: &Tensor<T>,
    block_sizes: &[usize],
    block_order: &[usize],
) -> Result<Tensor<T>> {
    if block_sizes.len() != block_order.len() {
        return Err(Error::invalid_argument(
            "block_order",
            format!(
                "The length of `block_sizes` (=={}) and `block_order` (=={}) must be the same",
                block_sizes.len(),
                block_order.len()
            ),
        ));
    }
    if block_order.iter().enumerate().all(|(i, &j)| i == j) {
        return Ok(matrix.clone());
    }

    let n = square_dim(matrix.shape())?;
    if block_sizes.iter().sum::<usize>() != n {
        return Err(Error::invalid_argument(
            "block_sizes",
            format!("block sizes {block_sizes:?} do not sum to the matrix dimension {n}"),
        ));
    }
    let mut seen = vec![false; block_order.len()];
    for &b in block_order {
        if b >= seen.len() || std::mem::replace(&mut seen[b], true) {
            return Err(Error::invalid_argument(
                "block_order",
                format!("{block_order:?} is not a permutation"),
            ));
        }
    }

    let offsets: Vec<usize> = block_sizes
        .iter()
        .scan(0, |acc, &size| {
            let start = *acc;
            *acc += size;
            Some(start)
        })
        .collect();
    let perm: Vec<usize> = block_order
        .iter()
        .flat_map(|&b| offsets[b]..offsets[b] + block_sizes[b])
        .collect();

    let data = matrix.as_slice();
    let permuted = perm
        .iter()
        .flat_map(|&row| perm.iter().map(move |&col| data[row * n + col]))
        .collect();
    Tensor::from_vec(permuted, &[n, n])
}
