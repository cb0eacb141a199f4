//! Error types for the device provider.

use thiserror::Error;

/// Errors that can occur in the device-provider runtime.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The stream endpoint could not be bound.
    #[error("failed to bind stream endpoint: {0}")]
    Bind(String),

    /// A published frame does not match the stream's declared format.
    #[error("frame does not match the declared stream format: {0}")]
    FormatMismatch(String),

    /// The device already has a stream attached.
    #[error("device already has a stream attached")]
    StreamAlreadyAttached,

    /// The provider already has a device attached.
    #[error("provider already has a device attached")]
    DeviceAlreadyAttached,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
