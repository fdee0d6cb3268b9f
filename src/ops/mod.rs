//! Operations on trees of tensors and on block matrices

mod block;
mod tree_algebra;

pub use block::block_permuted;
pub use tree_algebra::{
    inner_product, matrix_of_inner_products, norm, outer_product, per_parameter_norm, product,
    scalar_div, scalar_mul, symmetric_matrix_inner_products, vector_of_inner_products,
    weighted_sum_of_objects,
};
