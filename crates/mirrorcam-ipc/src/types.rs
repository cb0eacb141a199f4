//! Common types used across control messages.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error codes surfaced to the shell, matching the method-call
/// bridge's wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Bad or missing arguments.
    InvalidArgs,

    /// No on-screen window matched the requested title.
    WindowNotFound,

    /// The capture subsystem's window query failed.
    ScError,

    /// Capture could not start or failed mid-session.
    CaptureError,

    /// The capture stream could not be initialized.
    CaptureInitError,

    /// The host capture API is unavailable on this OS.
    UnsupportedOs,
}

impl ErrorCode {
    /// The code's wire name as seen by the shell.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgs => "INVALID_ARGS",
            Self::WindowNotFound => "WINDOW_NOT_FOUND",
            Self::ScError => "SC_ERROR",
            Self::CaptureError => "CAPTURE_ERROR",
            Self::CaptureInitError => "CAPTURE_INIT_ERROR",
            Self::UnsupportedOs => "UNSUPPORTED_OS",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured control-plane error: code plus human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code}: {message}")]
pub struct ControlError {
    /// Machine-readable error code.
    pub code: ErrorCode,

    /// Human-readable message.
    pub message: String,
}

impl ControlError {
    /// Create a new control error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Configuration for the capture engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Loopback endpoint of the device-provider's stream server.
    pub endpoint: SocketAddr,

    /// Capture width in pixels.
    pub width: u32,

    /// Capture height in pixels.
    pub height: u32,

    /// Target frames per second (minimum inter-frame interval).
    pub fps: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: mirrorcam_protocol::default_endpoint(),
            width: mirrorcam_protocol::FRAME_WIDTH,
            height: mirrorcam_protocol::FRAME_HEIGHT,
            fps: mirrorcam_protocol::TARGET_FPS,
        }
    }
}
