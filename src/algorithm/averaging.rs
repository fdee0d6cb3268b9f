//! Memory-bounded batched averaging of a per-example function
//!
//! The batch is split along the leading axis of every leaf into equally sized
//! chunks. Chunks are processed one after the other while the examples inside
//! a chunk are evaluated in parallel, so peak memory is bounded by one chunk's
//! worth of outputs.

use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::ops::{scalar_div, weighted_sum_of_objects};
use crate::tree::Tree;
use std::collections::BTreeSet;
use tracing::trace;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Averages `func` over the leading axis of its argument tree, evaluating at
/// most `max_parallel_size` output elements at once.
///
/// Build with [`loop_and_parallelize_average`].
#[derive(Debug, Clone)]
pub struct LoopAndParallelizeAverage<F> {
    func: F,
    max_parallel_size: Option<usize>,
}

/// Wrap `func` so that [`LoopAndParallelizeAverage::average`] returns
/// `mean_i func(args[i])` for a batch `args`.
///
/// `max_parallel_size` bounds the number of output elements held at once;
/// `None` evaluates the whole batch in a single parallel pass. The result does
/// not depend on the bound beyond floating-point summation order.
///
/// # Example
///
/// ```
/// use kronfac::algorithm::averaging::loop_and_parallelize_average;
/// use kronfac::error::Result;
/// use kronfac::tensor::Tensor;
/// use kronfac::tree::Tree;
///
/// let square = |x: &Tree<f64>| -> Result<Tree<f64>> { x.try_map(|t| t.mul(t)) };
/// let batch = Tree::from(Tensor::from_slice(&[1.0, 2.0, 3.0], &[3]));
/// let avg = loop_and_parallelize_average(square, Some(1)).average(&batch).unwrap();
/// assert!((avg.as_leaf().unwrap().item().unwrap() - 14.0 / 3.0).abs() < 1e-12);
/// ```
pub fn loop_and_parallelize_average<F>(
    func: F,
    max_parallel_size: Option<usize>,
) -> LoopAndParallelizeAverage<F> {
    LoopAndParallelizeAverage {
        func,
        max_parallel_size,
    }
}

impl<F> LoopAndParallelizeAverage<F> {
    /// The configured output-element bound
    pub fn max_parallel_size(&self) -> Option<usize> {
        self.max_parallel_size
    }

    /// Mean of `func` over the examples of `args`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `args` has no leaves, a scalar leaf, or
    /// leaves with different leading axis sizes; errors from `func` are
    /// propagated.
    pub fn average<T>(&self, args: &Tree<T>) -> Result<Tree<T>>
    where
        T: Element,
        F: Fn(&Tree<T>) -> Result<Tree<T>> + Sync,
    {
        let batch_size = leading_axis_size(args)?;

        let Some(max_parallel_size) = self.max_parallel_size else {
            return self.parallel_mean(args, batch_size);
        };

        // Output size of a single example, from a real evaluation of example 0
        let example = args.try_map(|t| t.index_leading(0))?;
        let singleton_size = (self.func)(&example)?.numel();

        if singleton_size * batch_size <= max_parallel_size {
            return self.parallel_mean(args, batch_size);
        }

        let parallel_size = (max_parallel_size / singleton_size).clamp(1, batch_size);
        let num_chunks = batch_size / parallel_size;
        let remainder = batch_size % parallel_size;
        trace!(
            batch_size,
            singleton_size,
            parallel_size,
            num_chunks,
            remainder,
            "Averaging in chunks"
        );

        let mut running_sum: Option<Tree<T>> = None;
        for chunk in 0..num_chunks {
            let start = chunk * parallel_size;
            let chunk_args = args.try_map(|t| t.slice_leading(start, start + parallel_size))?;
            let chunk_mean = self.parallel_mean(&chunk_args, parallel_size)?;
            running_sum = Some(match running_sum {
                None => chunk_mean,
                Some(sum) => sum.zip_with(&chunk_mean, |a, b| a.add(b))?,
            });
        }
        let running_sum = running_sum
            .ok_or_else(|| Error::Internal("chunked average ran zero chunks".to_string()))?;
        let chunked_mean = scalar_div(&running_sum, T::from_f64(num_chunks as f64));

        if remainder == 0 {
            return Ok(chunked_mean);
        }

        let covered = num_chunks * parallel_size;
        let remainder_args = args.try_map(|t| t.slice_leading(covered, batch_size))?;
        let remainder_mean = self.parallel_mean(&remainder_args, remainder)?;

        let total = batch_size as f64;
        weighted_sum_of_objects(
            &[chunked_mean, remainder_mean],
            &[
                T::from_f64(covered as f64 / total),
                T::from_f64(remainder as f64 / total),
            ],
        )
    }

    /// One fully parallel pass: mean of `func` over all `n` examples of `args`
    fn parallel_mean<T>(&self, args: &Tree<T>, n: usize) -> Result<Tree<T>>
    where
        T: Element,
        F: Fn(&Tree<T>) -> Result<Tree<T>> + Sync,
    {
        let evaluate = |i: usize| {
            let example = args.try_map(|t| t.index_leading(i))?;
            (self.func)(&example)
        };

        #[cfg(feature = "rayon")]
        let outputs: Vec<Tree<T>> = (0..n)
            .into_par_iter()
            .map(evaluate)
            .collect::<Result<_>>()?;
        #[cfg(not(feature = "rayon"))]
        let outputs: Vec<Tree<T>> = (0..n).map(evaluate).collect::<Result<_>>()?;

        let mut iter = outputs.into_iter();
        let first = iter
            .next()
            .ok_or_else(|| Error::invalid_argument("args", "cannot average an empty batch"))?;
        let sum = iter.try_fold(first, |acc, out| acc.zip_with(&out, |a, b| a.add(b)))?;
        Ok(scalar_div(&sum, T::from_f64(n as f64)))
    }
}

/// The leading axis size shared by every leaf of `args`
fn leading_axis_size<T: Element>(args: &Tree<T>) -> Result<usize> {
    let leaves = args.leaves();
    if leaves.iter().any(|t| t.ndim() == 0) {
        return Err(Error::invalid_argument(
            "args",
            "every leaf must have a leading batch axis",
        ));
    }

    let sizes: BTreeSet<usize> = leaves.iter().map(|t| t.shape()[0]).collect();
    let mut iter = sizes.iter();
    match (iter.next(), iter.next()) {
        (None, _) => Err(Error::invalid_argument(
            "args",
            "at least one argument must contain a tensor leaf",
        )),
        (Some(&size), None) => Ok(size),
        (Some(_), Some(_)) => Err(Error::invalid_argument(
            "args",
            format!("Inconsistent leading axis sizes seen: {sizes:?}"),
        )),
    }
}
