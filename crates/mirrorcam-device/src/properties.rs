//! Static device capability model.
//!
//! The OS queries provider/device/stream properties on demand; this
//! pipeline never mutates them at runtime. The duck-typed property
//! dictionaries of the host API are modeled as a fixed capability set
//! with pure query functions. Property-set requests are accepted but
//! have no effect: identity is immutable after construction.

use mirrorcam_protocol::{BYTES_PER_PIXEL, FRAME_HEIGHT, FRAME_WIDTH};

/// Provider manufacturer string.
pub const MANUFACTURER: &str = "Mirrorcam";

/// Device model string.
pub const DEVICE_MODEL: &str = "Mirrorcam Virtual Camera";

/// Device transport type string.
pub const TRANSPORT_TYPE: &str = "virtual";

/// Human-visible device name.
pub const DEVICE_NAME: &str = "Mirrorcam Webcam";

/// Human-visible stream name.
pub const STREAM_NAME: &str = "Mirrorcam Video";

/// Properties the triad can be asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Manufacturer of the provider.
    ProviderManufacturer,

    /// Transport type of the device.
    DeviceTransportType,

    /// Model string of the device.
    DeviceModel,

    /// Pixel format and geometry of the stream.
    StreamFormat,
}

/// Value of a queried capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityValue {
    /// A static text property.
    Text(&'static str),

    /// The stream's frame format.
    Format(StreamFormat),
}

/// The fixed frame format a stream declares to its consumers.
///
/// Frames published to the stream must match this format; changing it
/// mid-session is not supported (the stream would have to be
/// re-declared).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,

    /// 32-bit packed pixel format, byte order fixed for the device's
    /// lifetime.
    pub fourcc: &'static str,
}

impl StreamFormat {
    /// Minimum row stride for this format.
    pub fn min_bytes_per_row(&self) -> u32 {
        self.width * BYTES_PER_PIXEL
    }
}

impl Default for StreamFormat {
    fn default() -> Self {
        Self {
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
            fourcc: "BGRA",
        }
    }
}

impl std::fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{} {}", self.width, self.height, self.fourcc)
    }
}
