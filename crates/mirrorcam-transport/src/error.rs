//! Error types for the transport module.

use thiserror::Error;

/// Errors that can occur during transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Already connected.
    #[error("already connected")]
    AlreadyConnected,

    /// Not connected.
    #[error("not connected")]
    NotConnected,

    /// The frame does not satisfy its own layout metadata.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    /// Wire framing error.
    #[error(transparent)]
    Protocol(#[from] mirrorcam_protocol::ProtocolError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
