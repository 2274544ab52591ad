//! Data Types - Blitz Element Type System
//!
//! Tensors are generic over a small, closed set of element types: `f32`,
//! `f64`, `i32`, `usize` and `i16`. The set is sealed, so selection happens
//! entirely at compile time and no runtime type dispatch is needed. `DType`
//! is the runtime mirror of that set, used for diagnostics and for listing
//! what a backend was instantiated for.
//!
//! @version 0.1.0
//! @author Blitz Development Team

use core::fmt::{Debug, Display};

use bytemuck::Pod;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

// =============================================================================
// DType Enum
// =============================================================================

/// Runtime representation of tensor element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    /// 32-bit floating point (single precision).
    F32,
    /// 64-bit floating point (double precision).
    F64,
    /// 32-bit signed integer.
    I32,
    /// Pointer-sized unsigned integer.
    USize,
    /// 16-bit signed integer.
    I16,
}

impl DType {
    /// Every element type a tensor can hold.
    pub const ALL: [Self; 5] = [Self::F32, Self::F64, Self::I32, Self::USize, Self::I16];

    /// Returns the size in bytes of this data type.
    #[must_use]
    pub const fn size_of(self) -> usize {
        match self {
            Self::I16 => 2,
            Self::F32 | Self::I32 => 4,
            Self::F64 => 8,
            Self::USize => core::mem::size_of::<usize>(),
        }
    }

    /// Returns true if this is a floating point type.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Returns the name of this data type as a string.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::I32 => "i32",
            Self::USize => "usize",
            Self::I16 => "i16",
        }
    }
}

impl Default for DType {
    fn default() -> Self {
        Self::F32
    }
}

impl core::fmt::Display for DType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// Element Trait
// =============================================================================

mod sealed {
    pub trait Sealed {}
}

/// Trait for all types that can be stored in a tensor.
///
/// Sealed: only the five types listed in [`DType::ALL`] implement it.
/// `Pod` lets backends move elements as raw bytes between memory spaces.
pub trait Element:
    sealed::Sealed
    + Copy
    + Debug
    + Display
    + Default
    + PartialEq
    + Send
    + Sync
    + Pod
    + Zero
    + One
    + 'static
{
    /// The runtime dtype for this element type.
    const DTYPE: DType;

    /// Returns the dtype for this type.
    #[must_use]
    fn dtype() -> DType {
        Self::DTYPE
    }
}

macro_rules! impl_element {
    ($ty:ty, $dtype:expr) => {
        impl sealed::Sealed for $ty {}

        impl Element for $ty {
            const DTYPE: DType = $dtype;
        }
    };
}

impl_element!(f32, DType::F32);
impl_element!(f64, DType::F64);
impl_element!(i32, DType::I32);
impl_element!(usize, DType::USize);
impl_element!(i16, DType::I16);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_size() {
        assert_eq!(DType::F32.size_of(), 4);
        assert_eq!(DType::F64.size_of(), 8);
        assert_eq!(DType::I32.size_of(), 4);
        assert_eq!(DType::I16.size_of(), 2);
        assert_eq!(DType::USize.size_of(), core::mem::size_of::<usize>());
    }

    #[test]
    fn test_dtype_size_matches_element() {
        assert_eq!(f32::DTYPE.size_of(), core::mem::size_of::<f32>());
        assert_eq!(f64::DTYPE.size_of(), core::mem::size_of::<f64>());
        assert_eq!(i32::DTYPE.size_of(), core::mem::size_of::<i32>());
        assert_eq!(usize::DTYPE.size_of(), core::mem::size_of::<usize>());
        assert_eq!(i16::DTYPE.size_of(), core::mem::size_of::<i16>());
    }

    #[test]
    fn test_dtype_classes() {
        assert!(DType::F32.is_float());
        assert!(DType::F64.is_float());
        assert!(!DType::I32.is_float());
        assert!(!DType::USize.is_float());
        assert!(!DType::I16.is_float());
    }

    #[test]
    fn test_element_dtype() {
        assert_eq!(f32::dtype(), DType::F32);
        assert_eq!(f64::dtype(), DType::F64);
        assert_eq!(i32::dtype(), DType::I32);
        assert_eq!(usize::dtype(), DType::USize);
        assert_eq!(i16::dtype(), DType::I16);
    }

    #[test]
    fn test_dtype_display_and_serde() {
        assert_eq!(DType::USize.to_string(), "usize");
        let json = serde_json::to_string(&DType::F64).unwrap();
        assert_eq!(json, "\"f64\"");
        let back: DType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DType::F64);
    }
}
