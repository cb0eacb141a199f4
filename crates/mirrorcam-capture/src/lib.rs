//! Window capture session management.
//!
//! This crate owns the capture side of the pipeline: looking up the
//! target window, driving the session state machine and handing each
//! captured frame to a sink. The host screen-capture API sits behind
//! the [`CaptureBackend`] trait; the pipeline never touches it directly.

mod backend;
mod error;
mod session;
mod stub;
mod window;

pub use backend::{CaptureBackend, CaptureConfig, CaptureStream, FrameDelivery, FrameSink};
pub use error::CaptureError;
pub use session::CaptureSession;
pub use stub::{StubBackend, StubStream};
pub use window::{find_target_window, WindowInfo};

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;
