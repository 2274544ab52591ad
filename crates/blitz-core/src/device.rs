//! Device Abstraction - Memory Spaces for Tensor Buffers
//!
//! A `Device` names the memory space a buffer lives in. Only host memory is
//! built in; accelerator backends report their own device through the
//! [`Backend`](crate::backends::Backend) trait.
//!
//! # Example
//! ```rust
//! use blitz_core::Device;
//!
//! let cpu = Device::default();
//! assert_eq!(cpu, Device::Cpu);
//! assert!(cpu.capabilities().supports_f64);
//! ```
//!
//! @version 0.1.0
//! @author Blitz Development Team

use core::fmt;

use serde::{Deserialize, Serialize};
use sysinfo::System;

// =============================================================================
// Device Enum
// =============================================================================

/// Represents the memory space a tensor buffer is allocated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Device {
    /// Host memory (always available).
    Cpu,
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
        }
    }
}

// =============================================================================
// Device Capabilities
// =============================================================================

/// Information about a device's capabilities.
#[derive(Debug, Clone)]
pub struct DeviceCapabilities {
    /// Name of the device.
    pub name: String,
    /// Total memory in bytes.
    pub total_memory: usize,
    /// Available memory in bytes.
    pub available_memory: usize,
    /// Whether the device supports f64.
    pub supports_f64: bool,
}

impl Device {
    /// Returns the capabilities of this device.
    #[must_use]
    pub fn capabilities(self) -> DeviceCapabilities {
        match self {
            Self::Cpu => DeviceCapabilities {
                name: "CPU".to_string(),
                total_memory: system_memory(),
                available_memory: available_memory(),
                supports_f64: true,
            },
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn memory_snapshot() -> System {
    let mut sys = System::new();
    sys.refresh_memory();
    sys
}

/// Returns the total system memory in bytes.
pub(crate) fn system_memory() -> usize {
    memory_snapshot().total_memory() as usize
}

/// Returns the available system memory in bytes.
pub(crate) fn available_memory() -> usize {
    memory_snapshot().available_memory() as usize
}

// =============================================================================
// Tests
// =============================================================================
