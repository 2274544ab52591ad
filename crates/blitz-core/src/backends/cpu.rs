//! CPU Backend - Host Memory Operations
//!
//! Implements the `Backend` contract over host memory. Device tensors built
//! on it behave exactly like accelerator tensors (staged fills, explicit
//! host copies) while running on any machine.
//!
//! @version 0.1.0
//! @author Blitz Development Team

use super::Backend;
use crate::allocator::HOST_ALIGNMENT;
use crate::device::{Device, DeviceCapabilities};

// =============================================================================
// CPU Backend Struct
// =============================================================================

/// CPU backend for raw buffer management.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend;

impl CpuBackend {
    /// Creates a new CPU backend.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

// =============================================================================
// Backend Trait Implementation
// =============================================================================

impl Backend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn device(&self) -> Device {
        Device::Cpu
    }

    fn is_available(&self) -> bool {
        true // CPU is always available
    }

    fn capabilities(&self) -> DeviceCapabilities {
        Device::Cpu.capabilities()
    }

    fn allocate(&self, size: usize) -> *mut u8 {
        if size == 0 {
            return std::ptr::null_mut();
        }
        match std::alloc::Layout::from_size_align(size, HOST_ALIGNMENT) {
            // SAFETY: layout has a non-zero size.
            Ok(layout) => unsafe { std::alloc::alloc(layout) },
            Err(_) => std::ptr::null_mut(),
        }
    }

    unsafe fn deallocate(&self, ptr: *mut u8, size: usize) {
        if ptr.is_null() || size == 0 {
            return;
        }
        let layout = std::alloc::Layout::from_size_align_unchecked(size, HOST_ALIGNMENT);
        std::alloc::dealloc(ptr, layout);
    }

    unsafe fn memset(&self, dst: *mut u8, value: u8, size: usize) {
        if size == 0 {
            return;
        }
        std::ptr::write_bytes(dst, value, size);
    }

    unsafe fn copy_to_device(&self, dst: *mut u8, src: *const u8, size: usize) {
        if size == 0 {
            return;
        }
        // Device memory is host memory here.
        std::ptr::copy_nonoverlapping(src, dst, size);
    }

    unsafe fn copy_to_host(&self, dst: *mut u8, src: *const u8, size: usize) {
        if size == 0 {
            return;
        }
        std::ptr::copy_nonoverlapping(src, dst, size);
    }

    fn synchronize(&self) {
        // No-op for CPU - operations are synchronous
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_backend_identity() {
        let backend = CpuBackend::new();
        assert_eq!(backend.name(), "cpu");
        assert_eq!(backend.device(), Device::Cpu);
        assert!(backend.is_available());
        assert_eq!(backend.capabilities().name, "CPU");
    }

    #[test]
    fn test_zero_sized_allocation_is_null() {
        let backend = CpuBackend::new();
        let ptr = backend.allocate(0);
        assert!(ptr.is_null());
        unsafe { backend.deallocate(ptr, 0) };
    }

    #[test]
    fn test_memset_and_round_trip() {
        let backend = CpuBackend::new();
        let ptr = backend.allocate(16);
        assert!(!ptr.is_null());
        assert_eq!(ptr as usize % HOST_ALIGNMENT, 0);

        let mut host = [0u8; 16];
        let src: Vec<u8> = (0..16).collect();
        unsafe {
            backend.memset(ptr, 0xAB, 16);
            backend.copy_to_host(host.as_mut_ptr(), ptr, 16);
            assert!(host.iter().all(|&b| b == 0xAB));

            backend.copy_to_device(ptr, src.as_ptr(), 16);
            backend.synchronize();
            backend.copy_to_host(host.as_mut_ptr(), ptr, 16);
            assert_eq!(&host[..], &src[..]);

            backend.deallocate(ptr, 16);
        }
    }

    #[test]
    fn test_zero_sized_transfers_ignore_pointers() {
        let backend = CpuBackend::new();
        unsafe {
            backend.memset(std::ptr::null_mut(), 1, 0);
            backend.copy_to_device(std::ptr::null_mut(), std::ptr::null(), 0);
            backend.copy_to_host(std::ptr::null_mut(), std::ptr::null(), 0);
        }
    }
}
