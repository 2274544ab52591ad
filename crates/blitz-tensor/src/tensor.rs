//! Tensor - Backend-Agnostic N-Dimensional Array Interface
//!
//! Every backend tensor embeds a [`TensorBase`] (buffer pointer, capacity,
//! shape, ordering flag) and implements [`Tensor`], which supplies the
//! generic accessors and declares the backend operations: `fill`, `slice`
//! and CSV output. Owning backends also implement [`Allocate`]; tensors
//! whose buffer is host-addressable implement [`HostTensor`] for element
//! access.
//!
//! The hot paths do no runtime validation. Bounds on unchecked access and
//! slicing are debug-asserted only, and shape reassignment is `unsafe`
//! because the base type never reallocates.
//!
//! # Example
//! ```rust
//! use blitz_tensor::{CpuTensor, HostTensor, Shape, Tensor};
//!
//! let mut t = CpuTensor::<f32>::new(Shape::new(&[2, 3])).unwrap();
//! t.fill(1.0);
//! assert_eq!(t.size(), 6);
//! assert_eq!(t.slice_row(1).unwrap(), &[1.0, 1.0, 1.0]);
//! ```
//!
//! @version 0.1.0
//! @author Blitz Development Team

use core::ptr;
use std::io::Write;

use blitz_core::device::Device;
use blitz_core::dtype::{DType, Element};
use blitz_core::error::{Error, Result};

use crate::csv::CsvFormat;
use crate::layout::DataLayout;
use crate::shape::Shape;

// =============================================================================
// Tensor Base
// =============================================================================

/// State shared by every backend tensor.
///
/// The buffer is described by a raw pointer and its capacity in elements.
/// A freshly created base is unbound (null, capacity 0); backend
/// constructors bind a buffer before handing the tensor to the caller.
#[derive(Debug)]
pub struct TensorBase<T: Element> {
    data: *mut T,
    capacity: usize,
    shape: Shape,
    row_major: bool,
}

// The base only describes the buffer; ownership and aliasing rules are
// enforced by the backend type that embeds it.
unsafe impl<T: Element> Send for TensorBase<T> {}
unsafe impl<T: Element> Sync for TensorBase<T> {}

impl<T: Element> TensorBase<T> {
    /// Creates an unbound base for `shape`, row-major.
    #[must_use]
    pub fn new(shape: Shape) -> Self {
        Self {
            data: ptr::null_mut(),
            capacity: 0,
            shape,
            row_major: true,
        }
    }

    /// Binds a buffer of `capacity` elements.
    ///
    /// # Safety
    /// `data` must be valid for `capacity` elements for as long as it stays
    /// bound, `capacity` must be at least `shape().size()`, and the previous
    /// buffer (if any) must already have been released or handed back via
    /// [`unbind`](Self::unbind).
    pub unsafe fn bind(&mut self, data: *mut T, capacity: usize) {
        debug_assert!(capacity >= self.shape.size());
        self.data = data;
        self.capacity = capacity;
    }

    /// Detaches the buffer, returning its pointer and capacity.
    ///
    /// # Safety
    /// The base is left null with capacity 0 while the shape keeps its size.
    /// The caller must bind a buffer again, or stop all element access,
    /// before the tensor is used again, and is responsible for releasing the
    /// returned buffer.
    pub unsafe fn unbind(&mut self) -> (*mut T, usize) {
        let parts = (self.data, self.capacity);
        self.data = ptr::null_mut();
        self.capacity = 0;
        parts
    }

    /// Returns true while a buffer is bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        !self.data.is_null()
    }

    /// Returns the shape.
    #[must_use]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Replaces the shape without touching the buffer.
    ///
    /// # Safety
    /// The new `size()` must not exceed [`capacity`](Self::capacity) unless
    /// the caller rebinds a larger buffer before the next element access.
    pub unsafe fn set_shape(&mut self, shape: Shape) {
        self.shape = shape;
    }

    /// Buffer capacity in elements.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the raw buffer pointer.
    #[must_use]
    pub fn data(&self) -> *const T {
        self.data
    }

    /// Returns the raw mutable buffer pointer.
    #[must_use]
    pub fn data_mut(&mut self) -> *mut T {
        self.data
    }

    /// Returns the ordering flag.
    #[must_use]
    pub fn row_major(&self) -> bool {
        self.row_major
    }

    /// Sets the ordering flag.
    pub fn set_row_major(&mut self, row_major: bool) {
        self.row_major = row_major;
    }

    /// Element offset of outermost block `index`.
    #[must_use]
    pub fn slice_offset(&self, index: usize) -> usize {
        debug_assert!(
            index < self.shape.outermost(),
            "slice index {index} out of range for outermost extent {}",
            self.shape.outermost()
        );
        index * self.shape.inner_size()
    }
}

/// Element count of `shape` for a buffer on `device`.
///
/// Fails with `AllocationFailed` when the extents overflow `usize`.
pub(crate) fn checked_element_count(shape: &Shape, device: Device) -> Result<usize> {
    shape.checked_size().ok_or(Error::AllocationFailed {
        size: usize::MAX,
        device,
    })
}

// =============================================================================
// Tensor Trait
// =============================================================================

/// Uniform interface over backend tensors of element type `T`.
///
/// Implementors provide access to their [`TensorBase`] and the four backend
/// operations; everything else is shared.
pub trait Tensor<T: Element> {
    /// Shared tensor state.
    fn base(&self) -> &TensorBase<T>;

    /// Shared tensor state, mutably.
    ///
    /// # Safety
    /// The caller must not replace, swap or unbind the base, nor bind a
    /// buffer the backend does not own or borrow. Host element access relies
    /// on the bound buffer staying valid for `size()` elements.
    ///
    /// ```rust,compile_fail
    /// use blitz_tensor::{CpuTensor, Shape, Tensor};
    ///
    /// let mut t = CpuTensor::<f32>::new(Shape::new(&[2, 3])).unwrap();
    /// let _ = t.base_mut();
    /// ```
    unsafe fn base_mut(&mut self) -> &mut TensorBase<T>;

    /// Whether dropping this tensor releases its buffer.
    fn is_owned(&self) -> bool;

    // =========================================================================
    // Backend Operations
    // =========================================================================

    /// Sets every one of the `size()` elements to `value`.
    fn fill(&mut self, value: T);

    /// Pointer to the block for outermost index `index`.
    ///
    /// The block holds `shape().inner_size()` contiguous elements. `index`
    /// must be below `shape().outermost()`; this is only debug-asserted.
    fn slice(&self, index: usize) -> *const T;

    /// Mutable pointer to the block for outermost index `index`.
    fn slice_mut(&mut self, index: usize) -> *mut T;

    /// Writes every element to `writer` using `format`, ordered to match
    /// [`row_major`](Self::row_major).
    fn output_csv_with(&self, writer: &mut dyn Write, format: &CsvFormat) -> Result<()>;

    /// Writes every element to `writer` with the default CSV format.
    fn output_csv(&self, writer: &mut dyn Write) -> Result<()> {
        self.output_csv_with(writer, &CsvFormat::default())
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Returns the shape.
    fn shape(&self) -> &Shape {
        self.base().shape()
    }

    /// Stable pointer to the held shape, for identity comparisons.
    fn shape_ptr(&self) -> *const Shape {
        self.base().shape() as *const Shape
    }

    /// Returns the shape's axis-semantics tag.
    fn data_layout(&self) -> DataLayout {
        self.shape().data_layout()
    }

    /// Number of addressable elements.
    fn size(&self) -> usize {
        self.shape().size()
    }

    /// Buffer capacity in elements.
    fn capacity(&self) -> usize {
        self.base().capacity()
    }

    /// Runtime element type.
    fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// Returns true if the buffer is interpreted row-major.
    fn row_major(&self) -> bool {
        self.base().row_major()
    }

    /// Interprets the buffer as row-major. Does not move any data.
    fn set_row_major(&mut self) {
        // SAFETY: only the ordering flag changes.
        unsafe { self.base_mut() }.set_row_major(true);
    }

    /// Interprets the buffer as column-major. Does not move any data.
    fn set_column_major(&mut self) {
        // SAFETY: only the ordering flag changes.
        unsafe { self.base_mut() }.set_row_major(false);
    }

    /// Replaces the shape without reallocating.
    ///
    /// # Safety
    /// The new size must fit [`capacity`](Self::capacity), or the tensor must
    /// be reallocated (see [`Allocate`]) before any further element access,
    /// fill, slice or CSV output.
    unsafe fn set_shape(&mut self, shape: Shape) {
        self.base_mut().set_shape(shape);
    }

    /// Raw pointer to the buffer.
    fn data(&self) -> *const T {
        self.base().data()
    }

    /// Raw mutable pointer to the buffer.
    fn data_mut(&mut self) -> *mut T {
        // SAFETY: the base is only read.
        unsafe { self.base_mut() }.data_mut()
    }
}

// =============================================================================
// Allocation
// =============================================================================

/// Backend allocation hook, implemented only by owning tensors.
///
/// Backend constructors call it before returning. Calling it again releases
/// the current buffer and binds a fresh zeroed one sized to the current
/// shape, which is how a tensor recovers after an unsafe `set_shape` grew it.
pub trait Allocate {
    /// Allocates (or re-allocates) the buffer for the current shape.
    fn allocate(&mut self) -> Result<()>;
}

// =============================================================================
// Host Element Access
// =============================================================================

/// Element access for tensors whose buffer lives in host memory.
///
/// # Safety
/// Implementors guarantee that while the tensor is reachable, `data()` is a
/// non-null, aligned host pointer valid for `capacity()` initialised
/// elements.
pub unsafe trait HostTensor<T: Element>: Tensor<T> {
    /// The first `size()` elements.
    fn as_slice(&self) -> &[T] {
        // SAFETY: trait contract plus the `size() <= capacity()` invariant
        // that only an unsafe `set_shape` can break.
        unsafe { core::slice::from_raw_parts(self.data(), self.size()) }
    }

    /// The first `size()` elements, mutably.
    fn as_mut_slice(&mut self) -> &mut [T] {
        let len = self.size();
        // SAFETY: as for `as_slice`; `&mut self` makes the borrow unique.
        unsafe { core::slice::from_raw_parts_mut(self.data_mut(), len) }
    }

    /// Reads element `index` without bounds checking.
    ///
    /// # Safety
    /// `index` must be below `size()`.
    unsafe fn get_unchecked(&self, index: usize) -> &T {
        debug_assert!(index < self.size());
        &*self.data().add(index)
    }

    /// Mutable element `index` without bounds checking.
    ///
    /// # Safety
    /// `index` must be below `size()`.
    unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(index < self.size());
        &mut *self.data_mut().add(index)
    }

    /// Reads element `index`, checking bounds.
    fn get(&self, index: usize) -> Result<T> {
        self.as_slice()
            .get(index)
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                index,
                size: self.size(),
            })
    }

    /// Writes element `index`, checking bounds.
    fn set(&mut self, index: usize, value: T) -> Result<()> {
        let size = self.size();
        let slot = self
            .as_mut_slice()
            .get_mut(index)
            .ok_or(Error::IndexOutOfBounds { index, size })?;
        *slot = value;
        Ok(())
    }

    /// The block for outermost index `index` as a slice.
    fn slice_row(&self, index: usize) -> Result<&[T]> {
        let shape = self.shape();
        let (outer, inner) = (shape.outermost(), shape.inner_size());
        if index >= outer {
            return Err(Error::IndexOutOfBounds { index, size: outer });
        }
        Ok(&self.as_slice()[index * inner..(index + 1) * inner])
    }

    /// The block for outermost index `index` as a mutable slice.
    fn slice_row_mut(&mut self, index: usize) -> Result<&mut [T]> {
        let shape = self.shape();
        let (outer, inner) = (shape.outermost(), shape.inner_size());
        if index >= outer {
            return Err(Error::IndexOutOfBounds { index, size: outer });
        }
        Ok(&mut self.as_mut_slice()[index * inner..(index + 1) * inner])
    }
}

// =============================================================================
// Element Type Instantiation
// =============================================================================

/// Marks a backend tensor type as instantiated for one element type.
///
/// Implemented only through [`instantiate_tensor!`](crate::instantiate_tensor);
/// backend constructors require it, so a backend can only be built for the
/// element types it registered.
pub trait Instantiated {
    /// Every element type registered alongside this one.
    const SUPPORTED: &'static [DType];

    /// Returns the registered element types.
    fn supported_dtypes() -> &'static [DType] {
        Self::SUPPORTED
    }
}

/// Registers a backend tensor type for a fixed list of element types.
///
/// With no list, registers the full set (`f32`, `f64`, `i32`, `usize`,
/// `i16`). Types whose only generic parameters are a lifetime and the
/// element type are written `Name<'a>`.
///
/// ```rust,ignore
/// instantiate_tensor!(CpuTensor);
/// instantiate_tensor!(CpuTensorView<'a>);
/// instantiate_tensor!(DeviceTensor: f32, f64);
/// ```
#[macro_export]
macro_rules! instantiate_tensor {
    ($tensor:ident $(<$lt:lifetime>)?) => {
        $crate::instantiate_tensor!($tensor $(<$lt>)?: f32, f64, i32, usize, i16);
    };
    ($tensor:ident $(<$lt:lifetime>)?: $($ty:ty),+ $(,)?) => {
        $crate::instantiate_tensor!(@each $tensor [$($lt)?] [$($ty),+] $($ty),+);
    };
    (@each $tensor:ident $lt:tt $all:tt $($ty:ty),+) => {
        $( $crate::instantiate_tensor!(@one $tensor $lt $ty $all); )+
    };
    (@one $tensor:ident [] $ty:ty [$($all:ty),+]) => {
        impl $crate::Instantiated for $tensor<$ty> {
            const SUPPORTED: &'static [$crate::DType] =
                &[$(<$all as $crate::Element>::DTYPE),+];
        }
    };
    (@one $tensor:ident [$lt:lifetime] $ty:ty [$($all:ty),+]) => {
        impl<$lt> $crate::Instantiated for $tensor<$lt, $ty> {
            const SUPPORTED: &'static [$crate::DType] =
                &[$(<$all as $crate::Element>::DTYPE),+];
        }
    };
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_starts_unbound_and_row_major() {
        let base = TensorBase::<f32>::new(Shape::new(&[2, 3]));
        assert!(!base.is_bound());
        assert_eq!(base.capacity(), 0);
        assert!(base.row_major());
        assert_eq!(base.shape().size(), 6);
    }

    #[test]
    fn test_bind_and_unbind() {
        let mut buffer = vec![0i32; 6];
        let mut base = TensorBase::<i32>::new(Shape::new(&[3, 2]));
        unsafe { base.bind(buffer.as_mut_ptr(), buffer.len()) };
        assert!(base.is_bound());
        assert_eq!(base.capacity(), 6);

        let (ptr, capacity) = unsafe { base.unbind() };
        assert_eq!(ptr, buffer.as_mut_ptr());
        assert_eq!(capacity, 6);
        assert!(!base.is_bound());
    }

    #[test]
    fn test_checked_element_count() {
        let shape = Shape::new(&[3, 4]);
        assert_eq!(checked_element_count(&shape, Device::Cpu), Ok(12));

        let huge = Shape::new(&[usize::MAX / 2 + 1, 2]);
        assert_eq!(
            checked_element_count(&huge, Device::Cpu),
            Err(Error::AllocationFailed {
                size: usize::MAX,
                device: Device::Cpu
            })
        );
    }

    #[test]
    fn test_slice_offset() {
        let base = TensorBase::<f64>::new(Shape::new(&[4, 2, 3]));
        assert_eq!(base.slice_offset(0), 0);
        assert_eq!(base.slice_offset(1), 6);
        assert_eq!(base.slice_offset(3), 18);
    }
}
