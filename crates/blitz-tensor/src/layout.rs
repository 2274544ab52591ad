//! Data Layout - Axis Semantics Tags
//!
//! A `DataLayout` records what each axis of a shape means (batch, channel,
//! filter height, ...). Tensors carry it along and hand it back unchanged;
//! only kernels interpret it.
//!
//! @version 0.1.0
//! @author Blitz Development Team

use core::fmt;

use serde::{Deserialize, Serialize};

/// Axis-semantics tag attached to a [`Shape`](crate::Shape).
///
/// Letters follow the usual convolution naming: N batch, C channel, H/W
/// input height and width, K output channel, R/S filter height and width,
/// P/Q output height and width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataLayout {
    /// Plain flat data with no axis semantics.
    #[default]
    Flat,
    /// Activation buffer, batch-channel-height-width.
    BufferNchw,
    /// Activation buffer, batch-height-width-channel.
    BufferNhwc,
    /// Filter, output channel-input channel-height-width.
    FilterKcrs,
    /// Filter, height-width-input channel-output channel.
    FilterRsck,
    /// Unpacked convolution workspace, PQ-major then RSC.
    PackPqrsc,
    /// Unpacked convolution workspace, PQ-major then CRS.
    PackPqcrs,
    /// Unpacked convolution workspace, CRS-major then PQ.
    PackCrspq,
    /// Unpacked convolution workspace, RSC-major then PQ.
    PackRscpq,
    /// Layout not known.
    Undefined,
}

impl DataLayout {
    /// Returns the name of this layout.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::BufferNchw => "nchw",
            Self::BufferNhwc => "nhwc",
            Self::FilterKcrs => "kcrs",
            Self::FilterRsck => "rsck",
            Self::PackPqrsc => "pqrsc",
            Self::PackPqcrs => "pqcrs",
            Self::PackCrspq => "crspq",
            Self::PackRscpq => "rscpq",
            Self::Undefined => "undefined",
        }
    }

    /// Returns true for activation buffer layouts.
    #[must_use]
    pub const fn is_buffer(self) -> bool {
        matches!(self, Self::BufferNchw | Self::BufferNhwc)
    }

    /// Returns true for filter layouts.
    #[must_use]
    pub const fn is_filter(self) -> bool {
        matches!(self, Self::FilterKcrs | Self::FilterRsck)
    }

    /// Returns true for packed convolution workspace layouts.
    #[must_use]
    pub const fn is_pack(self) -> bool {
        matches!(
            self,
            Self::PackPqrsc | Self::PackPqcrs | Self::PackCrspq | Self::PackRscpq
        )
    }
}

impl fmt::Display for DataLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_flat() {
        assert_eq!(DataLayout::default(), DataLayout::Flat);
    }

    #[test]
    fn test_layout_classes() {
        assert!(DataLayout::BufferNchw.is_buffer());
        assert!(DataLayout::FilterRsck.is_filter());
        assert!(DataLayout::PackCrspq.is_pack());
        assert!(!DataLayout::Flat.is_buffer());
        assert!(!DataLayout::Undefined.is_pack());
    }

    #[test]
    fn test_layout_serde_names() {
        let json = serde_json::to_string(&DataLayout::BufferNhwc).unwrap();
        assert_eq!(json, "\"buffer_nhwc\"");
        assert_eq!(DataLayout::BufferNhwc.to_string(), "nhwc");
    }
}
