//! Error types for the wire protocol.

use thiserror::Error;

/// Errors that can occur while framing or deframing messages.
///
/// Every variant except [`ProtocolError::ConnectionClosed`] is fatal for
/// the connection it occurred on: the protocol has no resync marker, so
/// the only safe recovery is to discard the connection.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A message declared a zero-byte payload.
    #[error("message declared a zero-length payload")]
    ZeroLength,

    /// A message declared a payload larger than any valid frame.
    #[error("declared payload of {len} bytes exceeds the {max} byte ceiling")]
    Oversized { len: u32, max: usize },

    /// The peer closed the connection mid-message.
    #[error("connection closed mid-message ({expected} bytes expected)")]
    Truncated { expected: usize },

    /// The peer closed the connection at a message boundary.
    #[error("connection closed")]
    ConnectionClosed,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
