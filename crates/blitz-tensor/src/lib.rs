//! Blitz Tensor - Backend-Agnostic N-Dimensional Arrays
//!
//! This crate provides the `Tensor` abstraction every Blitz operator works
//! on: a typed, shaped, contiguous buffer whose allocation, filling, slicing
//! and serialisation are supplied by a backend.
//!
//! # Key Features
//! - `Shape` value type with an axis-semantics `DataLayout` tag
//! - One `Tensor` trait, flat backend implementations
//! - Owning (`CpuTensor`, `DeviceTensor`) and borrowing (`CpuTensorView`)
//!   tensors as distinct types
//! - Unchecked fast paths with checked accessors alongside
//! - Compile-time element type registration via `instantiate_tensor!`
//!
//! # Example
//! ```rust
//! use blitz_tensor::{CpuTensor, CpuTensorView, HostTensor, Shape, Tensor};
//!
//! let mut owned = CpuTensor::<f32>::new(Shape::new(&[2, 3])).unwrap();
//! owned.fill(1.0);
//! assert_eq!(owned.as_slice(), &[1.0; 6]);
//!
//! let mut buffer = vec![0_i32; 4];
//! let mut view = CpuTensorView::wrap(&mut buffer, Shape::new(&[2, 2])).unwrap();
//! view.fill(7);
//! drop(view);
//! assert_eq!(buffer, vec![7; 4]);
//! ```
//!
//! @version 0.1.0
//! @author Blitz Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

// =============================================================================
// Modules
// =============================================================================

pub mod cpu;
pub mod csv;
pub mod device;
pub mod layout;
pub mod shape;
pub mod tensor;

// =============================================================================
// Re-exports
// =============================================================================

pub use blitz_core::{Backend, CpuBackend, DType, Device, Element, Error, Result};
pub use cpu::{CpuTensor, CpuTensorView};
pub use csv::{write_csv_file, CsvFormat};
pub use device::DeviceTensor;
pub use layout::DataLayout;
pub use shape::{Shape, Strides};
pub use tensor::{Allocate, HostTensor, Instantiated, Tensor, TensorBase};

// =============================================================================
// Prelude
// =============================================================================

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::cpu::{CpuTensor, CpuTensorView};
    pub use crate::csv::CsvFormat;
    pub use crate::device::DeviceTensor;
    pub use crate::layout::DataLayout;
    pub use crate::shape::Shape;
    pub use crate::tensor::{Allocate, HostTensor, Tensor};
    pub use blitz_core::{DType, Element, Error, Result};
}
