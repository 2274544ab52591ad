//! Error Types - Blitz Core Error Handling
//!
//! Errors surface only at the fallible edges of the tensor layer: buffer
//! allocation, wrapping caller memory, checked accessors, and CSV output.
//! Element access, filling, and slicing stay unchecked and never return
//! a `Result`.
//!
//! @version 0.1.0
//! @author Blitz Development Team

use thiserror::Error;

use crate::device::Device;

// =============================================================================
// Error Types
// =============================================================================

/// The main error type for Blitz operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Element count does not match the shape it was paired with.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// The expected extents.
        expected: Vec<usize>,
        /// The actual extents.
        actual: Vec<usize>,
    },

    /// A caller-supplied buffer cannot hold the requested shape.
    #[error("Buffer too small: shape needs {required} elements, buffer holds {capacity}")]
    BufferTooSmall {
        /// Elements required by the shape.
        required: usize,
        /// Elements available in the buffer.
        capacity: usize,
    },

    /// Index out of bounds (checked accessors only).
    #[error("Index out of bounds: index {index} for dimension of size {size}")]
    IndexOutOfBounds {
        /// The invalid index.
        index: usize,
        /// The size of the dimension.
        size: usize,
    },

    /// Memory allocation failed.
    #[error("Memory allocation failed: requested {size} bytes on {device}")]
    AllocationFailed {
        /// The requested size in bytes.
        size: usize,
        /// The device on which allocation failed.
        device: Device,
    },

    /// Device not available.
    #[error("Device not available: {device}")]
    DeviceNotAvailable {
        /// The unavailable device.
        device: Device,
    },

    /// Writing tensor contents to a stream failed.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the underlying I/O failure.
        message: String,
    },

    /// Invalid operation for the given tensor.
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },

    /// Internal error (should not happen).
    #[error("Internal error: {message}")]
    InternalError {
        /// Description of the internal error.
        message: String,
    },
}

// =============================================================================
// Result Type
// =============================================================================

/// A specialized Result type for Blitz operations.
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// Helper Functions
// =============================================================================

impl Error {
    /// Creates a new shape mismatch error.
    #[must_use]
    pub fn shape_mismatch(expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Creates a new invalid operation error.
    #[must_use]
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

// Only the message of the I/O error is kept.
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::shape_mismatch(&[6], &[4]);
        assert!(err.to_string().contains("Shape mismatch"));

        let err = Error::AllocationFailed {
            size: 64,
            device: Device::Cpu,
        };
        assert_eq!(
            err.to_string(),
            "Memory allocation failed: requested 64 bytes on cpu"
        );
    }

    #[test]
    fn test_error_equality() {
        let err1 = Error::BufferTooSmall {
            required: 6,
            capacity: 4,
        };
        let err2 = Error::BufferTooSmall {
            required: 6,
            capacity: 4,
        };
        assert_eq!(err1, err2);
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = Error::from(io);
        assert!(matches!(err, Error::Io { ref message } if message.contains("pipe closed")));
    }
}
