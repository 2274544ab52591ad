//! Shape - Tensor Dimension Metadata
//!
//! A `Shape` is a value type holding the ordered dimension extents of a
//! tensor together with its [`DataLayout`] tag. Tensors consume only
//! [`Shape::size`] and [`Shape::data_layout`]; the stride and offset helpers
//! here are for callers doing their own multi-dimensional indexing.
//!
//! # Key Features
//! - Small-vector storage (up to 6 dimensions inline)
//! - Row-major and column-major stride computation
//! - Outermost-axis split used by tensor slicing
//!
//! @version 0.1.0
//! @author Blitz Development Team

use core::fmt;
use core::ops::Index;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::layout::DataLayout;

// =============================================================================
// Type Aliases
// =============================================================================

/// Dimension extents. Stored inline for up to 6 dimensions.
pub type Dims = SmallVec<[usize; 6]>;

/// Element step for each dimension.
pub type Strides = SmallVec<[usize; 6]>;

// =============================================================================
// Shape Struct
// =============================================================================

/// Dimension extents plus an axis-semantics tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Shape {
    dims: Dims,
    #[serde(default)]
    layout: DataLayout,
}

impl Shape {
    /// Creates a flat-layout shape from dimension extents.
    #[must_use]
    pub fn new(dims: &[usize]) -> Self {
        Self::with_layout(dims, DataLayout::Flat)
    }

    /// Creates a shape with an explicit layout tag.
    #[must_use]
    pub fn with_layout(dims: &[usize], layout: DataLayout) -> Self {
        Self {
            dims: Dims::from_slice(dims),
            layout,
        }
    }

    /// Replaces the extents, keeping the layout tag.
    pub fn reset(&mut self, dims: &[usize]) {
        self.dims.clear();
        self.dims.extend_from_slice(dims);
    }

    /// Returns the dimension extents.
    #[must_use]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the number of dimensions.
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Returns the extent of dimension `axis`, if it exists.
    #[must_use]
    pub fn dim(&self, axis: usize) -> Option<usize> {
        self.dims.get(axis).copied()
    }

    /// Total number of elements: the product of all extents.
    ///
    /// A 0-d shape holds one element. Saturates at `usize::MAX` when the
    /// product does not fit; such a shape can never back a tensor.
    #[must_use]
    pub fn size(&self) -> usize {
        numel(&self.dims)
    }

    /// The product of all extents, or `None` if it overflows `usize`.
    #[must_use]
    pub fn checked_size(&self) -> Option<usize> {
        checked_numel(&self.dims)
    }

    /// Extent of the outermost dimension (1 for a 0-d shape).
    #[must_use]
    pub fn outermost(&self) -> usize {
        self.dims.first().copied().unwrap_or(1)
    }

    /// Number of elements in one outermost-index block.
    #[must_use]
    pub fn inner_size(&self) -> usize {
        match self.dims.split_first() {
            Some((_, rest)) => numel(rest),
            None => 1,
        }
    }

    /// Returns the axis-semantics tag.
    #[must_use]
    pub fn data_layout(&self) -> DataLayout {
        self.layout
    }

    /// Replaces the axis-semantics tag.
    pub fn set_data_layout(&mut self, layout: DataLayout) {
        self.layout = layout;
    }

    /// Contiguous strides for this shape.
    ///
    /// Row-major puts stride 1 on the last axis, column-major on the first.
    #[must_use]
    pub fn strides(&self, row_major: bool) -> Strides {
        contiguous_strides(&self.dims, row_major)
    }

    /// Linear offset of `indices` under the given ordering.
    ///
    /// Indices are not bounds-checked.
    #[must_use]
    pub fn offset(&self, indices: &[usize], row_major: bool) -> usize {
        linear_index(indices, &self.strides(row_major))
    }
}

impl Index<usize> for Shape {
    type Output = usize;

    fn index(&self, axis: usize) -> &usize {
        &self.dims[axis]
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims)
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(&dims)
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Self::new(&dims)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self.dims.as_slice(), self.layout)
    }
}

// =============================================================================
// Shape Utilities
// =============================================================================

/// Computes the total number of elements from dimension extents,
/// saturating at `usize::MAX`.
#[must_use]
pub fn numel(dims: &[usize]) -> usize {
    checked_numel(dims).unwrap_or(usize::MAX)
}

/// Computes the total number of elements, or `None` on overflow.
///
/// Any zero extent makes the count zero regardless of the others.
#[must_use]
pub fn checked_numel(dims: &[usize]) -> Option<usize> {
    if dims.contains(&0) {
        return Some(0);
    }
    dims.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

/// Computes contiguous strides for `dims`.
#[must_use]
pub fn contiguous_strides(dims: &[usize], row_major: bool) -> Strides {
    let mut strides = Strides::from_elem(0, dims.len());
    let mut stride = 1usize;

    if row_major {
        for (s, &dim) in strides.iter_mut().zip(dims.iter()).rev() {
            *s = stride;
            stride = stride.saturating_mul(dim);
        }
    } else {
        for (s, &dim) in strides.iter_mut().zip(dims.iter()) {
            *s = stride;
            stride = stride.saturating_mul(dim);
        }
    }

    strides
}

/// Computes the linear index from multi-dimensional indices.
#[must_use]
pub fn linear_index(indices: &[usize], strides: &[usize]) -> usize {
    debug_assert_eq!(indices.len(), strides.len());

    indices
        .iter()
        .zip(strides.iter())
        .map(|(&idx, &stride)| idx * stride)
        .sum()
}

// =============================================================================
// Tests
// =============================================================================
