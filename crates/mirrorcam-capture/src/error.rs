//! Error types for the capture module.

use thiserror::Error;

/// Errors that can occur during capture operations.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// No on-screen window title contained the requested substring.
    #[error("no on-screen window title contains {0:?}")]
    WindowNotFound(String),

    /// The capture subsystem's window query failed.
    #[error("capture subsystem query failed: {0}")]
    BackendQuery(String),

    /// Screen capture is not available on this host.
    #[error("screen capture is not supported on this host")]
    Unsupported,

    /// A session is already starting or active.
    #[error("a capture session is already starting or active")]
    SessionBusy,

    /// The session is not in the state this operation requires.
    #[error("capture session is not {0}")]
    InvalidState(&'static str),

    /// The host capture stream could not be opened or started.
    #[error("failed to start capture stream: {0}")]
    StreamOpen(String),

    /// The host capture stream failed to stop cleanly.
    #[error("failed to stop capture stream: {0}")]
    StreamStop(String),
}
