//! Nested collections of tensors
//!
//! Model parameters, gradients and updates are handled as trees whose leaves
//! are tensors. Arithmetic on trees is defined position by position and
//! requires both operands to share the same structure.

use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::tensor::Tensor;
use std::collections::BTreeMap;

/// A tensor, an ordered list of trees, or a string-keyed map of trees
///
/// # Example
///
/// ```
/// use kronfac::tensor::Tensor;
/// use kronfac::tree::Tree;
///
/// let params = Tree::dict([
///     ("w", Tree::from(Tensor::<f32>::ones(&[2, 3]))),
///     ("b", Tree::from(Tensor::<f32>::zeros(&[3]))),
/// ]);
/// assert_eq!(params.numel(), 9);
/// assert_eq!(params.leaves().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Tree<T: Element> {
    /// A single tensor
    Leaf(Tensor<T>),
    /// Positional children
    List(Vec<Tree<T>>),
    /// Named children, iterated in key order
    Dict(BTreeMap<String, Tree<T>>),
}

impl<T: Element> From<Tensor<T>> for Tree<T> {
    fn from(tensor: Tensor<T>) -> Self {
        Self::Leaf(tensor)
    }
}

impl<T: Element> Tree<T> {
    /// Build a list node
    pub fn list(children: impl IntoIterator<Item = Tree<T>>) -> Self {
        Self::List(children.into_iter().collect())
    }

    /// Build a dict node
    pub fn dict<K: Into<String>>(children: impl IntoIterator<Item = (K, Tree<T>)>) -> Self {
        Self::Dict(children.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Leaf tensor, if this node is a leaf
    pub fn as_leaf(&self) -> Option<&Tensor<T>> {
        match self {
            Self::Leaf(t) => Some(t),
            _ => None,
        }
    }

    /// Leaves in traversal order (lists by index, dicts by key)
    pub fn leaves(&self) -> Vec<&Tensor<T>> {
        let mut out = Vec::new();
        self.visit(&mut Vec::new(), &mut |_, leaf| out.push(leaf));
        out
    }

    /// Leaves paired with the path of keys / indices leading to them
    pub fn leaves_with_path(&self) -> Vec<(Vec<String>, &Tensor<T>)> {
        let mut out = Vec::new();
        self.visit(&mut Vec::new(), &mut |path, leaf| out.push((path.to_vec(), leaf)));
        out
    }

    fn visit<'a>(&'a self, path: &mut Vec<String>, f: &mut impl FnMut(&[String], &'a Tensor<T>)) {
        match self {
            Self::Leaf(t) => f(path, t),
            Self::List(children) => {
                for (i, child) in children.iter().enumerate() {
                    path.push(i.to_string());
                    child.visit(path, f);
                    path.pop();
                }
            }
            Self::Dict(children) => {
                for (key, child) in children {
                    path.push(key.clone());
                    child.visit(path, f);
                    path.pop();
                }
            }
        }
    }

    /// Total number of elements over all leaves
    pub fn numel(&self) -> usize {
        self.leaves().iter().map(|t| t.numel()).sum()
    }

    /// Same structure with every leaf replaced by `f(leaf)`
    pub fn map(&self, f: impl Fn(&Tensor<T>) -> Tensor<T>) -> Self {
        self.map_ref(&f)
    }

    fn map_ref(&self, f: &impl Fn(&Tensor<T>) -> Tensor<T>) -> Self {
        match self {
            Self::Leaf(t) => Self::Leaf(f(t)),
            Self::List(children) => Self::List(children.iter().map(|c| c.map_ref(f)).collect()),
            Self::Dict(children) => Self::Dict(
                children
                    .iter()
                    .map(|(k, c)| (k.clone(), c.map_ref(f)))
                    .collect(),
            ),
        }
    }

    /// Fallible [`Self::map`]
    pub fn try_map(&self, f: impl Fn(&Tensor<T>) -> Result<Tensor<T>>) -> Result<Self> {
        self.try_map_ref(&f)
    }

    fn try_map_ref(&self, f: &impl Fn(&Tensor<T>) -> Result<Tensor<T>>) -> Result<Self> {
        Ok(match self {
            Self::Leaf(t) => Self::Leaf(f(t)?),
            Self::List(children) => Self::List(
                children
                    .iter()
                    .map(|c| c.try_map_ref(f))
                    .collect::<Result<_>>()?,
            ),
            Self::Dict(children) => Self::Dict(
                children
                    .iter()
                    .map(|(k, c)| Ok((k.clone(), c.try_map_ref(f)?)))
                    .collect::<Result<_>>()?,
            ),
        })
    }

    /// Combine two structurally equal trees leaf by leaf
    pub fn zip_with(
        &self,
        other: &Self,
        f: impl Fn(&Tensor<T>, &Tensor<T>) -> Result<Tensor<T>>,
    ) -> Result<Self> {
        self.check_structure(other, true)?;
        self.zip_ref(other, &f)
    }

    fn zip_ref(
        &self,
        other: &Self,
        f: &impl Fn(&Tensor<T>, &Tensor<T>) -> Result<Tensor<T>>,
    ) -> Result<Self> {
        Ok(match (self, other) {
            (Self::Leaf(a), Self::Leaf(b)) => Self::Leaf(f(a, b)?),
            (Self::List(a), Self::List(b)) => Self::List(
                a.iter()
                    .zip(b)
                    .map(|(x, y)| x.zip_ref(y, f))
                    .collect::<Result<_>>()?,
            ),
            (Self::Dict(a), Self::Dict(b)) => Self::Dict(
                a.iter()
                    .zip(b.values())
                    .map(|((k, x), y)| Ok((k.clone(), x.zip_ref(y, f)?)))
                    .collect::<Result<_>>()?,
            ),
            _ => return Err(Error::structure_mismatch("node kinds differ")),
        })
    }

    /// Zeros with the structure and leaf shapes of `self`
    pub fn zeros_like(&self) -> Self {
        self.map(Tensor::zeros_like)
    }

    /// True if `other` has the same nesting, keys, list lengths and leaf
    /// shapes; with `check_dtype` the element dtypes must match too.
    pub fn structure_eq<U: Element>(&self, other: &Tree<U>, check_dtype: bool) -> bool {
        self.check_structure(other, check_dtype).is_ok()
    }

    /// Like [`Self::structure_eq`] but reports where the structures differ
    pub fn check_structure<U: Element>(&self, other: &Tree<U>, check_dtype: bool) -> Result<()> {
        if check_dtype && T::DTYPE != U::DTYPE {
            return Err(dtype_mismatch(T::DTYPE, U::DTYPE));
        }
        self.check_structure_at(other, &mut Vec::new())
    }

    fn check_structure_at<U: Element>(&self, other: &Tree<U>, path: &mut Vec<String>) -> Result<()> {
        match (self, other) {
            (Self::Leaf(a), Tree::Leaf(b)) => {
                if a.shape() != b.shape() {
                    return Err(Error::structure_mismatch(format!(
                        "leaf at '{}' has shape {:?} vs {:?}",
                        path.join("/"),
                        a.shape(),
                        b.shape()
                    )));
                }
                Ok(())
            }
            (Self::List(a), Tree::List(b)) => {
                if a.len() != b.len() {
                    return Err(Error::structure_mismatch(format!(
                        "list at '{}' has length {} vs {}",
                        path.join("/"),
                        a.len(),
                        b.len()
                    )));
                }
                for (i, (x, y)) in a.iter().zip(b).enumerate() {
                    path.push(i.to_string());
                    x.check_structure_at(y, path)?;
                    path.pop();
                }
                Ok(())
            }
            (Self::Dict(a), Tree::Dict(b)) => {
                if !a.keys().eq(b.keys()) {
                    return Err(Error::structure_mismatch(format!(
                        "dict at '{}' has keys {:?} vs {:?}",
                        path.join("/"),
                        a.keys().collect::<Vec<_>>(),
                        b.keys().collect::<Vec<_>>()
                    )));
                }
                for ((key, x), y) in a.iter().zip(b.values()) {
                    path.push(key.clone());
                    x.check_structure_at(y, path)?;
                    path.pop();
                }
                Ok(())
            }
            _ => Err(Error::structure_mismatch(format!(
                "node at '{}' differs in kind",
                path.join("/")
            ))),
        }
    }
}

fn dtype_mismatch(a: DType, b: DType) -> Error {
    Error::structure_mismatch(format!("leaf dtypes differ: {a} vs {b}"))
}
