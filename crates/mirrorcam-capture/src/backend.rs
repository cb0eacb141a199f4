//! The seam to the host screen-capture API.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{trace, warn};

use mirrorcam_ipc::SessionState;
use mirrorcam_protocol::FrameBuffer;

use crate::window::WindowInfo;
use crate::CaptureResult;

/// Fixed configuration for a capture stream.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Capture width in pixels.
    pub width: u32,

    /// Capture height in pixels.
    pub height: u32,

    /// Minimum interval between delivered frames. The host API may
    /// deliver at a lower or irregular rate.
    pub min_frame_interval: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: mirrorcam_protocol::FRAME_WIDTH,
            height: mirrorcam_protocol::FRAME_HEIGHT,
            min_frame_interval: mirrorcam_protocol::min_frame_interval(),
        }
    }
}

/// Receives captured frames, one at a time, on the backend's delivery
/// thread. The frame is owned by the sink for the duration of the call.
pub trait FrameSink: Send + Sync {
    /// Hand one frame downstream. Must not block beyond the time it
    /// takes to enqueue the frame.
    fn deliver(&self, frame: FrameBuffer);
}

/// Handed to a backend when a stream opens. The backend invokes it from
/// its own delivery thread for each captured frame or fatal error.
#[derive(Clone)]
pub struct FrameDelivery {
    sink: Arc<dyn FrameSink>,
    state: Arc<RwLock<SessionState>>,
}

impl FrameDelivery {
    pub(crate) fn new(sink: Arc<dyn FrameSink>, state: Arc<RwLock<SessionState>>) -> Self {
        Self { sink, state }
    }

    /// Deliver one captured frame. Frames arriving outside the Active
    /// state are dropped: nothing may flow after stop() begins.
    pub fn frame(&self, frame: FrameBuffer) {
        if self.state.read().is_active() {
            self.sink.deliver(frame);
        } else {
            trace!("dropping frame delivered outside Active state");
        }
    }

    /// Report an unrecoverable capture failure (e.g. the target window
    /// closed). Transitions the session to Failed; the shell observes it
    /// on its next start/stop exchange.
    pub fn failed(&self, reason: impl Into<String>) {
        let reason = reason.into();
        let mut state = self.state.write();
        if state.is_active() || state.is_starting() {
            warn!(%reason, "capture stream failed");
            *state = SessionState::Failed { message: reason };
        }
    }
}

/// A running host capture stream.
pub trait CaptureStream: Send {
    /// Stop the stream. No frames are delivered after this returns.
    fn stop(&mut self) -> CaptureResult<()>;
}

/// The host screen-capture API.
pub trait CaptureBackend: Send + Sync {
    /// Whether the host capture API is available at all.
    fn is_supported(&self) -> bool;

    /// Enumerate currently visible windows.
    fn list_windows(&self) -> CaptureResult<Vec<WindowInfo>>;

    /// Open a capture stream for the given window. Frames and failures
    /// flow through `delivery` on the backend's own thread.
    fn open(
        &self,
        window: &WindowInfo,
        config: &CaptureConfig,
        delivery: FrameDelivery,
    ) -> CaptureResult<Box<dyn CaptureStream>>;
}
