//! In-process capture backend stub.
//!
//! Stands in for the host capture API where none is wired up (CI, tests,
//! and the bridge binary until a host backend lands). Windows are injected
//! at construction and frames are pushed by the caller.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use mirrorcam_protocol::FrameBuffer;

use crate::backend::{CaptureBackend, CaptureConfig, CaptureStream, FrameDelivery};
use crate::window::WindowInfo;
use crate::{CaptureError, CaptureResult};

/// A capture backend with a fixed window list and caller-driven frames.
pub struct StubBackend {
    supported: bool,
    windows: RwLock<Vec<WindowInfo>>,
    delivery: Arc<Mutex<Option<FrameDelivery>>>,
}

impl StubBackend {
    /// Create a stub backend reporting the given windows.
    pub fn new(windows: Vec<WindowInfo>) -> Self {
        Self {
            supported: true,
            windows: RwLock::new(windows),
            delivery: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a stub backend that reports capture as unsupported.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            windows: RwLock::new(Vec::new()),
            delivery: Arc::new(Mutex::new(None)),
        }
    }

    /// Replace the reported window list.
    pub fn set_windows(&self, windows: Vec<WindowInfo>) {
        *self.windows.write() = windows;
    }

    /// Push one frame into the open stream, as the host delivery thread
    /// would. Returns false if no stream is open.
    pub fn push_frame(&self, frame: FrameBuffer) -> bool {
        match self.delivery.lock().as_ref() {
            Some(delivery) => {
                delivery.frame(frame);
                true
            }
            None => false,
        }
    }

    /// Report a fatal capture failure into the open stream.
    pub fn fail_capture(&self, reason: &str) -> bool {
        match self.delivery.lock().as_ref() {
            Some(delivery) => {
                delivery.failed(reason);
                true
            }
            None => false,
        }
    }

    /// Whether a stream is currently open.
    pub fn stream_open(&self) -> bool {
        self.delivery.lock().is_some()
    }
}

impl CaptureBackend for StubBackend {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn list_windows(&self) -> CaptureResult<Vec<WindowInfo>> {
        if !self.supported {
            return Err(CaptureError::Unsupported);
        }
        Ok(self.windows.read().clone())
    }

    fn open(
        &self,
        window: &WindowInfo,
        config: &CaptureConfig,
        delivery: FrameDelivery,
    ) -> CaptureResult<Box<dyn CaptureStream>> {
        debug!(
            window = %window.title,
            width = config.width,
            height = config.height,
            "opening stub capture stream"
        );
        *self.delivery.lock() = Some(delivery);
        Ok(Box::new(StubStream {
            delivery: Arc::clone(&self.delivery),
        }))
    }
}

/// Stream handle returned by [`StubBackend::open`].
pub struct StubStream {
    delivery: Arc<Mutex<Option<FrameDelivery>>>,
}

impl CaptureStream for StubStream {
    fn stop(&mut self) -> CaptureResult<()> {
        *self.delivery.lock() = None;
        Ok(())
    }
}
