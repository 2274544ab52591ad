//! Allocator - Host Buffer Allocation
//!
//! Provides the aligned host allocator owning CPU tensors draw their buffers
//! from. Buffers are 64-byte aligned so rows handed to SIMD kernels start on
//! a cache line.
//!
//! @version 0.1.0
//! @author Blitz Development Team

use core::ptr::NonNull;
use std::alloc::{self, Layout};

use crate::device::{self, Device};
use crate::dtype::Element;
use crate::error::{Error, Result};

/// Alignment of every host buffer, in bytes.
pub const HOST_ALIGNMENT: usize = 64;

// =============================================================================
// Host Allocator
// =============================================================================

/// Allocator for host (CPU) tensor buffers.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostAllocator;

impl HostAllocator {
    /// Creates a new host allocator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn layout<T: Element>(count: usize) -> Result<Layout> {
        let size = count
            .checked_mul(core::mem::size_of::<T>())
            .ok_or(Error::AllocationFailed {
                size: usize::MAX,
                device: Device::Cpu,
            })?;
        let align = HOST_ALIGNMENT.max(core::mem::align_of::<T>());
        Layout::from_size_align(size, align).map_err(|_| Error::AllocationFailed {
            size,
            device: Device::Cpu,
        })
    }

    /// Allocates a zero-initialised buffer for `count` elements of type T.
    ///
    /// A zero-length request returns a dangling, well-aligned pointer that
    /// must still be passed back to [`deallocate`](Self::deallocate).
    pub fn allocate_zeroed<T: Element>(&self, count: usize) -> Result<NonNull<T>> {
        let layout = Self::layout::<T>(count)?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }

        // SAFETY: layout has a non-zero size.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let dtype = T::DTYPE;
        let Some(ptr) = NonNull::new(raw.cast::<T>()) else {
            tracing::warn!(
                bytes = layout.size(),
                available = device::available_memory(),
                dtype = %dtype,
                "host allocation failed"
            );
            return Err(Error::AllocationFailed {
                size: layout.size(),
                device: Device::Cpu,
            });
        };

        tracing::trace!(
            bytes = layout.size(),
            align = layout.align(),
            dtype = %dtype,
            "allocated host buffer"
        );
        Ok(ptr)
    }

    /// Deallocates memory previously allocated.
    ///
    /// # Safety
    /// `ptr` must come from [`allocate_zeroed`](Self::allocate_zeroed) with
    /// the same `T` and `count`, and must not be used afterwards.
    pub unsafe fn deallocate<T: Element>(&self, ptr: NonNull<T>, count: usize) {
        let Ok(layout) = Self::layout::<T>(count) else {
            return;
        };
        if layout.size() == 0 {
            return;
        }
        alloc::dealloc(ptr.as_ptr().cast::<u8>(), layout);
        let dtype = T::DTYPE;
        tracing::trace!(bytes = layout.size(), dtype = %dtype, "released host buffer");
    }

    /// Copies memory from one location to another.
    ///
    /// # Safety
    /// Both pointers must be valid for `count` elements and must not overlap.
    pub unsafe fn copy<T: Element>(&self, dst: *mut T, src: *const T, count: usize) {
        core::ptr::copy_nonoverlapping(src, dst, count);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_zeroed_is_aligned_and_zero() {
        let alloc = HostAllocator::new();

        let ptr = alloc.allocate_zeroed::<f64>(100).unwrap();
        assert_eq!(ptr.as_ptr() as usize % HOST_ALIGNMENT, 0);

        unsafe {
            for i in 0..100 {
                assert_eq!(*ptr.as_ptr().add(i), 0.0);
            }
            alloc.deallocate(ptr, 100);
        }
    }

    #[test]
    fn test_zero_length_allocation() {
        let alloc = HostAllocator::new();
        let ptr = alloc.allocate_zeroed::<i16>(0).unwrap();
        unsafe { alloc.deallocate(ptr, 0) };
    }

    #[test]
    fn test_overflowing_allocation_fails() {
        let alloc = HostAllocator::new();
        let result = alloc.allocate_zeroed::<f32>(usize::MAX);
        assert!(matches!(result, Err(Error::AllocationFailed { .. })));
    }

    #[test]
    fn test_copy() {
        let alloc = HostAllocator::new();

        let src = alloc.allocate_zeroed::<i32>(10).unwrap();
        let dst = alloc.allocate_zeroed::<i32>(10).unwrap();

        unsafe {
            for i in 0..10 {
                *src.as_ptr().add(i) = i as i32;
            }

            alloc.copy(dst.as_ptr(), src.as_ptr(), 10);

            for i in 0..10 {
                assert_eq!(*dst.as_ptr().add(i), i as i32);
            }

            alloc.deallocate(src, 10);
            alloc.deallocate(dst, 10);
        }
    }
}
