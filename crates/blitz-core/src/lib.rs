//! Blitz Core - Foundation Layer for Blitz Tensors
//!
//! This crate provides the pieces every tensor backend builds on: the closed
//! set of element types, the device and backend memory contracts, the aligned
//! host allocator, and the shared error type.
//!
//! # Key Features
//! - Sealed element type set (f32, f64, i32, usize, i16)
//! - Device abstraction with capability queries
//! - Pluggable backend architecture for device memory
//! - 64-byte aligned host allocation
//!
//! # Example
//! ```rust
//! use blitz_core::{DType, Element, HostAllocator, HOST_ALIGNMENT};
//!
//! assert_eq!(f32::DTYPE, DType::F32);
//!
//! let alloc = HostAllocator::new();
//! let ptr = alloc.allocate_zeroed::<f32>(1024).unwrap();
//! assert_eq!(ptr.as_ptr() as usize % HOST_ALIGNMENT, 0);
//! unsafe { alloc.deallocate(ptr, 1024) };
//! ```
//!
//! @version 0.1.0
//! @author Blitz Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

// =============================================================================
// Modules
// =============================================================================

pub mod allocator;
pub mod backends;
pub mod device;
pub mod dtype;
pub mod error;

// =============================================================================
// Re-exports
// =============================================================================

pub use allocator::{HostAllocator, HOST_ALIGNMENT};
pub use backends::{Backend, CpuBackend};
pub use device::{Device, DeviceCapabilities};
pub use dtype::{DType, Element};
pub use error::{Error, Result};

// =============================================================================
// Prelude
// =============================================================================

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::backends::{Backend, CpuBackend};
    pub use crate::device::Device;
    pub use crate::dtype::{DType, Element};
    pub use crate::error::{Error, Result};
}
