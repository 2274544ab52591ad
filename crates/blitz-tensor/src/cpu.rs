//! CPU Tensors - Host Memory Backend
//!
//! Two host-backed tensor types share this backend:
//!
//! - [`CpuTensor`] owns a 64-byte aligned buffer from
//!   [`HostAllocator`] and frees it on drop.
//! - [`CpuTensorView`] wraps caller memory for a lifetime `'a` and never
//!   frees it; the borrow checker keeps it from outliving that memory.
//!
//! Large fills run on the rayon pool.
//!
//! @version 0.1.0
//! @author Blitz Development Team

use core::marker::PhantomData;
use core::ops::{Index, IndexMut};
use core::ptr::NonNull;
use std::io::Write;

use blitz_core::allocator::HostAllocator;
use blitz_core::device::Device;
use blitz_core::dtype::Element;
use blitz_core::error::{Error, Result};
use rayon::prelude::*;

use crate::csv::{self, CsvFormat};
use crate::shape::Shape;
use crate::tensor::{checked_element_count, Allocate, HostTensor, Instantiated, Tensor, TensorBase};

/// Threshold for using parallel processing (in elements)
const PARALLEL_THRESHOLD: usize = 1 << 16;

fn fill_host<T: Element>(values: &mut [T], value: T) {
    if values.len() >= PARALLEL_THRESHOLD {
        values.par_iter_mut().for_each(|v| *v = value);
    } else {
        values.fill(value);
    }
}

// =============================================================================
// Owning CPU Tensor
// =============================================================================

/// Host tensor that owns its buffer.
#[derive(Debug)]
pub struct CpuTensor<T: Element> {
    base: TensorBase<T>,
    allocator: HostAllocator,
}

crate::instantiate_tensor!(CpuTensor);

impl<T: Element> CpuTensor<T>
where
    Self: Instantiated,
{
    /// Allocates a zero-initialised tensor for `shape`.
    pub fn new(shape: Shape) -> Result<Self> {
        let mut tensor = Self {
            base: TensorBase::new(shape),
            allocator: HostAllocator::new(),
        };
        tensor.allocate()?;
        Ok(tensor)
    }

    /// Creates a tensor filled with zeros.
    pub fn zeros(shape: Shape) -> Result<Self> {
        Self::new(shape)
    }

    /// Creates a tensor filled with ones.
    pub fn ones(shape: Shape) -> Result<Self> {
        Self::full(shape, T::one())
    }

    /// Creates a tensor filled with `value`.
    pub fn full(shape: Shape, value: T) -> Result<Self> {
        let mut tensor = Self::new(shape)?;
        tensor.fill(value);
        Ok(tensor)
    }

    /// Creates a tensor holding a copy of `data`.
    ///
    /// `data.len()` must equal `shape.size()`.
    pub fn from_vec(data: Vec<T>, shape: Shape) -> Result<Self> {
        if data.len() != shape.size() {
            return Err(Error::shape_mismatch(&[shape.size()], &[data.len()]));
        }
        let mut tensor = Self::new(shape)?;
        tensor.as_mut_slice().copy_from_slice(&data);
        Ok(tensor)
    }
}

impl<T: Element> CpuTensor<T> {
    /// Changes the shape, growing the buffer only when it is too small.
    ///
    /// Elements up to the smaller of the old and new sizes are preserved;
    /// elements past the old size read as zero after growth.
    pub fn resize(&mut self, shape: Shape) -> Result<()> {
        let new_size = checked_element_count(&shape, Device::Cpu)?;
        if new_size <= self.base.capacity() {
            // SAFETY: the new size fits the bound buffer.
            unsafe { self.base.set_shape(shape) };
            return Ok(());
        }

        let old_size = self.base.shape().size();
        let fresh = self.allocator.allocate_zeroed::<T>(new_size)?;
        // SAFETY: `fresh` holds `new_size > old_capacity >= old_size`
        // elements, `old` holds `old_capacity`, and the two never overlap.
        // The base is rebound before returning.
        unsafe {
            let (old, old_capacity) = self.base.unbind();
            self.allocator.copy(fresh.as_ptr(), old, old_size.min(old_capacity));
            if let Some(old) = NonNull::new(old) {
                self.allocator.deallocate(old, old_capacity);
            }
            self.base.set_shape(shape);
            self.base.bind(fresh.as_ptr(), new_size);
        }
        tracing::debug!(old_size, new_size, "grew cpu tensor buffer");
        Ok(())
    }

    /// Frees the bound buffer. The caller rebinds or drops the tensor.
    fn release(&mut self) {
        // SAFETY: callers rebind straight after, or are dropping the tensor.
        let (data, capacity) = unsafe { self.base.unbind() };
        if let Some(data) = NonNull::new(data) {
            // SAFETY: every bound buffer of a CpuTensor came from its own
            // allocator with this capacity.
            unsafe { self.allocator.deallocate(data, capacity) };
        }
    }
}

impl<T: Element> Allocate for CpuTensor<T> {
    fn allocate(&mut self) -> Result<()> {
        let count = checked_element_count(self.base.shape(), Device::Cpu)?;
        let data = self.allocator.allocate_zeroed::<T>(count)?;
        self.release();
        // SAFETY: freshly allocated for exactly `count` elements.
        unsafe { self.base.bind(data.as_ptr(), count) };
        Ok(())
    }
}

impl<T: Element> Drop for CpuTensor<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: Element> Tensor<T> for CpuTensor<T> {
    fn base(&self) -> &TensorBase<T> {
        &self.base
    }

    unsafe fn base_mut(&mut self) -> &mut TensorBase<T> {
        &mut self.base
    }

    fn is_owned(&self) -> bool {
        true
    }

    fn fill(&mut self, value: T) {
        fill_host(self.as_mut_slice(), value);
    }

    fn slice(&self, index: usize) -> *const T {
        self.base.data().wrapping_add(self.base.slice_offset(index))
    }

    fn slice_mut(&mut self, index: usize) -> *mut T {
        let offset = self.base.slice_offset(index);
        self.base.data_mut().wrapping_add(offset)
    }

    fn output_csv_with(&self, writer: &mut dyn Write, format: &CsvFormat) -> Result<()> {
        csv::write_csv(self.as_slice(), self.shape(), self.row_major(), writer, format)
    }
}

// SAFETY: the buffer comes from the host allocator, is zero-initialised on
// allocation, and stays bound (non-null) for the tensor's whole life.
unsafe impl<T: Element> HostTensor<T> for CpuTensor<T> {}

impl<T: Element> Index<usize> for CpuTensor<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T: Element> IndexMut<usize> for CpuTensor<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.as_mut_slice()[index]
    }
}

// =============================================================================
// Borrowing CPU View
// =============================================================================

/// Host tensor over caller-owned memory. Never frees its buffer.
#[derive(Debug)]
pub struct CpuTensorView<'a, T: Element> {
    base: TensorBase<T>,
    _buffer: PhantomData<&'a mut [T]>,
}

crate::instantiate_tensor!(CpuTensorView<'a>);

impl<'a, T: Element> CpuTensorView<'a, T>
where
    Self: Instantiated,
{
    /// Wraps `buffer` as a tensor of `shape`.
    ///
    /// The buffer may be longer than `shape.size()`; the extra capacity is
    /// what lets a later `set_shape` grow the view.
    pub fn wrap(buffer: &'a mut [T], shape: Shape) -> Result<Self> {
        let required = checked_element_count(&shape, Device::Cpu)?;
        if buffer.len() < required {
            return Err(Error::BufferTooSmall {
                required,
                capacity: buffer.len(),
            });
        }

        let mut base = TensorBase::new(shape);
        // SAFETY: the slice is valid and exclusively borrowed for 'a.
        unsafe { base.bind(buffer.as_mut_ptr(), buffer.len()) };
        Ok(Self {
            base,
            _buffer: PhantomData,
        })
    }

    /// Wraps raw memory as a tensor of `shape`.
    ///
    /// # Safety
    /// `data` must be non-null, aligned, and valid for reads and writes of
    /// `capacity` initialised elements for all of `'a`, with no other access
    /// to that memory while the view is alive. `capacity` must be at least
    /// `shape.size()`.
    pub unsafe fn from_raw_parts(data: NonNull<T>, capacity: usize, shape: Shape) -> Self {
        let mut base = TensorBase::new(shape);
        base.bind(data.as_ptr(), capacity);
        Self {
            base,
            _buffer: PhantomData,
        }
    }
}

impl<T: Element> Tensor<T> for CpuTensorView<'_, T> {
    fn base(&self) -> &TensorBase<T> {
        &self.base
    }

    unsafe fn base_mut(&mut self) -> &mut TensorBase<T> {
        &mut self.base
    }

    fn is_owned(&self) -> bool {
        false
    }

    fn fill(&mut self, value: T) {
        fill_host(self.as_mut_slice(), value);
    }

    fn slice(&self, index: usize) -> *const T {
        self.base.data().wrapping_add(self.base.slice_offset(index))
    }

    fn slice_mut(&mut self, index: usize) -> *mut T {
        let offset = self.base.slice_offset(index);
        self.base.data_mut().wrapping_add(offset)
    }

    fn output_csv_with(&self, writer: &mut dyn Write, format: &CsvFormat) -> Result<()> {
        csv::write_csv(self.as_slice(), self.shape(), self.row_major(), writer, format)
    }
}

// SAFETY: the wrapped memory is host memory borrowed for the view's lifetime.
unsafe impl<T: Element> HostTensor<T> for CpuTensorView<'_, T> {}

impl<T: Element> Index<usize> for CpuTensorView<'_, T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T: Element> IndexMut<usize> for CpuTensorView<'_, T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.as_mut_slice()[index]
    }
}

// =============================================================================
// Tests
// =============================================================================
