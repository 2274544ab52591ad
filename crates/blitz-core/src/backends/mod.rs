//! Backends - Device Memory Contracts
//!
//! A backend owns a memory space and knows how to allocate, release, fill and
//! copy raw bytes in it. Device-resident tensors are generic over this trait,
//! so adding an accelerator means implementing `Backend` once.
//!
//! # Available Backends
//! - `cpu` - host memory (always available)
//!
//! @version 0.1.0
//! @author Blitz Development Team

use crate::device::{Device, DeviceCapabilities};

// =============================================================================
// Backend Modules
// =============================================================================

pub mod cpu;

// =============================================================================
// Re-exports
// =============================================================================

pub use cpu::CpuBackend;

// =============================================================================
// Backend Trait
// =============================================================================

/// Common trait for all memory backends.
///
/// Pointers handed to and returned from these methods address the backend's
/// own memory space; only `copy_to_device` and `copy_to_host` mix host and
/// device pointers.
pub trait Backend: Send + Sync {
    /// Returns the name of this backend.
    fn name(&self) -> &'static str;

    /// Returns the device whose memory this backend manages.
    fn device(&self) -> Device;

    /// Returns whether this backend is available on the current system.
    fn is_available(&self) -> bool;

    /// Returns the device capabilities.
    fn capabilities(&self) -> DeviceCapabilities;

    /// Allocates `size` bytes on this backend. Returns null on failure or
    /// when `size` is zero.
    fn allocate(&self, size: usize) -> *mut u8;

    /// Deallocates memory on this backend.
    ///
    /// # Safety
    /// `ptr` must be null or come from [`allocate`](Self::allocate) on this
    /// backend with the same `size`, and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: *mut u8, size: usize);

    /// Sets `size` bytes starting at `dst` to `value`.
    ///
    /// # Safety
    /// `dst` must be a device pointer valid for writes of `size` bytes.
    unsafe fn memset(&self, dst: *mut u8, value: u8, size: usize);

    /// Copies data from host to device.
    ///
    /// # Safety
    /// `dst` must be a device pointer valid for `size` bytes, `src` a host
    /// pointer valid for `size` bytes, and the ranges must not overlap.
    unsafe fn copy_to_device(&self, dst: *mut u8, src: *const u8, size: usize);

    /// Copies data from device to host.
    ///
    /// # Safety
    /// `dst` must be a host pointer valid for `size` bytes, `src` a device
    /// pointer valid for `size` bytes, and the ranges must not overlap.
    unsafe fn copy_to_host(&self, dst: *mut u8, src: *const u8, size: usize);

    /// Synchronizes the device (waits for all operations to complete).
    fn synchronize(&self);
}
