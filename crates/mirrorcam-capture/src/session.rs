//! Capture session management.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

use mirrorcam_ipc::{SessionState, ShutdownPhase, StartupPhase};

use crate::backend::{CaptureBackend, CaptureConfig, CaptureStream, FrameDelivery, FrameSink};
use crate::window::{find_target_window, WindowInfo};
use crate::{CaptureError, CaptureResult};

/// A capture session for one target window.
///
/// The session owns the state machine (Idle → Starting → Active →
/// Stopping → Idle, with Failed on mid-flight errors) and enforces the
/// at-most-one-active-session invariant: starting while a session is
/// Starting or Active is rejected, not queued. Start is two-phase so the
/// caller can open the frame connection between window resolution and
/// capture start: [`CaptureSession::resolve`] then
/// [`CaptureSession::begin_streaming`]. Each start attempt reports its
/// outcome exactly once, through the returned `Result`.
pub struct CaptureSession {
    backend: Arc<dyn CaptureBackend>,
    config: CaptureConfig,
    state: Arc<RwLock<SessionState>>,
    stream: Mutex<Option<Box<dyn CaptureStream>>>,
    target: Mutex<Option<WindowInfo>>,
}

impl CaptureSession {
    /// Create a new session against the given backend.
    pub fn new(backend: Arc<dyn CaptureBackend>, config: CaptureConfig) -> Self {
        Self {
            backend,
            config,
            state: Arc::new(RwLock::new(SessionState::Idle)),
            stream: Mutex::new(None),
            target: Mutex::new(None),
        }
    }

    /// Get the current session state.
    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    /// Check if the session is actively streaming.
    pub fn is_active(&self) -> bool {
        self.state.read().is_active()
    }

    /// Resolve the target window and move the session to Starting.
    ///
    /// Picks the first on-screen window whose title contains
    /// `target_title` (case-sensitive). Fails with `WindowNotFound` if
    /// none matches, `Unsupported` if the host capture API is
    /// unavailable, and `SessionBusy` while a session is already
    /// Starting or Active. A Failed session must be stopped before it
    /// can be restarted. On failure the session returns to Idle.
    #[instrument(name = "session_resolve", skip(self))]
    pub fn resolve(&self, target_title: &str) -> CaptureResult<WindowInfo> {
        {
            let mut state = self.state.write();
            match &*state {
                SessionState::Idle => {}
                SessionState::Starting { .. } | SessionState::Active { .. } => {
                    return Err(CaptureError::SessionBusy);
                }
                _ => return Err(CaptureError::InvalidState("idle")),
            }
            *state = SessionState::Starting {
                phase: StartupPhase::ResolveWindow,
            };
        }

        let window = match self.lookup(target_title) {
            Ok(window) => window,
            Err(e) => {
                *self.state.write() = SessionState::Idle;
                return Err(e);
            }
        };

        info!(window = %window.title, "resolved capture target");

        *self.target.lock() = Some(window.clone());
        self.advance_phase();

        Ok(window)
    }

    fn lookup(&self, target_title: &str) -> CaptureResult<WindowInfo> {
        if !self.backend.is_supported() {
            return Err(CaptureError::Unsupported);
        }

        let windows = self
            .backend
            .list_windows()
            .map_err(|e| CaptureError::BackendQuery(e.to_string()))?;

        Ok(find_target_window(&windows, target_title)
            .ok_or_else(|| CaptureError::WindowNotFound(target_title.to_string()))?
            .clone())
    }

    /// Walk a Starting or Stopping state one phase forward.
    fn advance_phase(&self) {
        let mut state = self.state.write();
        *state = match &*state {
            SessionState::Starting { phase } => match phase.next() {
                Some(next) => SessionState::Starting { phase: next },
                None => return,
            },
            SessionState::Stopping { phase } => match phase.next() {
                Some(next) => SessionState::Stopping { phase: next },
                None => return,
            },
            _ => return,
        };
    }

    /// Open the host capture stream and move the session to Active.
    ///
    /// Requires a prior successful [`CaptureSession::resolve`]. On
    /// failure the session returns to Idle.
    #[instrument(name = "session_begin", skip_all)]
    pub fn begin_streaming(&self, sink: Arc<dyn FrameSink>) -> CaptureResult<()> {
        {
            let state = self.state.read();
            if !state.is_starting() {
                return Err(CaptureError::InvalidState("starting"));
            }
        }
        self.advance_phase();

        let window = self
            .target
            .lock()
            .clone()
            .ok_or(CaptureError::InvalidState("starting"))?;

        let delivery = FrameDelivery::new(sink, Arc::clone(&self.state));

        let stream = match self.backend.open(&window, &self.config, delivery) {
            Ok(stream) => stream,
            Err(e) => {
                *self.state.write() = SessionState::Idle;
                *self.target.lock() = None;
                return Err(e);
            }
        };

        *self.stream.lock() = Some(stream);
        *self.state.write() = SessionState::Active {
            window_title: window.title.clone(),
        };

        info!(window = %window.title, "capture session active");
        Ok(())
    }

    /// Mark an in-flight session as failed (e.g. the frame connection
    /// was lost). Delivery is gated off immediately; an explicit stop is
    /// required before the next start.
    pub fn fail(&self, message: impl Into<String>) {
        let mut state = self.state.write();
        if state.is_active() || state.is_starting() {
            let message = message.into();
            warn!("capture session failed: {}", message);
            *state = SessionState::Failed { message };
        }
    }

    /// Roll a Starting session back to Idle.
    pub fn abort(&self) {
        let mut state = self.state.write();
        if state.is_starting() {
            debug!("aborting session startup");
            *state = SessionState::Idle;
            *self.target.lock() = None;
        }
    }

    /// Stop the session. Idempotent: returns success when nothing is
    /// active. Frame delivery is suppressed from the moment the state
    /// leaves Active, before the host stream finishes tearing down.
    #[instrument(name = "session_stop", skip(self))]
    pub fn stop(&self) -> CaptureResult<()> {
        {
            let mut state = self.state.write();
            if state.is_idle() {
                return Ok(());
            }
            *state = SessionState::Stopping {
                phase: ShutdownPhase::StopCapture,
            };
        }

        if let Some(mut stream) = self.stream.lock().take() {
            if let Err(e) = stream.stop() {
                warn!("capture stream did not stop cleanly: {}", e);
            }
        }

        // Capture is down; detach the downstream sink before going idle.
        self.advance_phase();
        *self.target.lock() = None;
        *self.state.write() = SessionState::Idle;

        info!("capture session stopped");
        Ok(())
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubBackend;
    use bytes::Bytes;
    use mirrorcam_protocol::FrameBuffer;

    struct CollectingSink {
        frames: Mutex<Vec<FrameBuffer>>,
    }

    impl CollectingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                frames: Mutex::new(Vec::new()),
            })
        }

        fn count(&self) -> usize {
            self.frames.lock().len()
        }
    }

    impl FrameSink for CollectingSink {
        fn deliver(&self, frame: FrameBuffer) {
            self.frames.lock().push(frame);
        }
    }

    fn scrcpy_window() -> WindowInfo {
        WindowInfo {
            id: "window:42".into(),
            title: "Pixel 7 — scrcpy".into(),
            width: 1080,
            height: 2400,
            on_screen: true,
        }
    }

    fn test_frame() -> FrameBuffer {
        FrameBuffer::new(4, 2, 16, Bytes::from(vec![0xAB; 32]))
    }

    fn started_session() -> (Arc<StubBackend>, CaptureSession, Arc<CollectingSink>) {
        let backend = Arc::new(StubBackend::new(vec![scrcpy_window()]));
        let session = CaptureSession::new(backend.clone(), CaptureConfig::default());
        let sink = CollectingSink::new();
        session.resolve("Pixel 7").unwrap();
        session.begin_streaming(sink.clone()).unwrap();
        (backend, session, sink)
    }

    #[test]
    fn start_reaches_active_and_delivers_frames() {
        let (backend, session, sink) = started_session();
        assert!(session.is_active());

        assert!(backend.push_frame(test_frame()));
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn startup_walks_the_phases_in_order() {
        let backend = Arc::new(StubBackend::new(vec![scrcpy_window()]));
        let session = CaptureSession::new(backend, CaptureConfig::default());

        // Window resolution lands one phase short of capture start, so
        // the caller can open the frame connection in between.
        session.resolve("Pixel 7").unwrap();
        assert_eq!(
            session.state(),
            SessionState::Starting {
                phase: StartupPhase::OpenConnection
            }
        );

        session.begin_streaming(CollectingSink::new()).unwrap();
        assert!(session.state().is_active());
    }

    #[test]
    fn second_start_is_rejected_without_disturbing_the_first() {
        let (backend, session, sink) = started_session();

        assert!(matches!(
            session.resolve("Pixel 7"),
            Err(CaptureError::SessionBusy)
        ));

        // The active session keeps delivering.
        backend.push_frame(test_frame());
        assert_eq!(sink.count(), 1);
        assert!(session.is_active());
    }

    #[test]
    fn stop_is_idempotent() {
        let backend = Arc::new(StubBackend::new(vec![scrcpy_window()]));
        let session = CaptureSession::new(backend, CaptureConfig::default());

        assert!(session.stop().is_ok());
        assert!(session.state().is_idle());
        assert!(session.stop().is_ok());
    }

    #[test]
    fn no_frames_after_stop() {
        let (backend, session, sink) = started_session();

        backend.push_frame(test_frame());
        session.stop().unwrap();
        assert!(session.state().is_idle());
        assert!(!backend.stream_open());

        backend.push_frame(test_frame());
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn window_not_found_leaves_session_idle() {
        let backend = Arc::new(StubBackend::new(vec![scrcpy_window()]));
        let session = CaptureSession::new(backend, CaptureConfig::default());

        assert!(matches!(
            session.resolve("NoSuchWindow"),
            Err(CaptureError::WindowNotFound(_))
        ));
        assert!(session.state().is_idle());

        // A later start with a valid title still succeeds.
        session.resolve("Pixel 7").unwrap();
        session.begin_streaming(CollectingSink::new()).unwrap();
        assert!(session.is_active());
    }

    #[test]
    fn unsupported_backend_is_reported_at_start() {
        let backend = Arc::new(StubBackend::unsupported());
        let session = CaptureSession::new(backend, CaptureConfig::default());

        assert!(matches!(
            session.resolve("Pixel 7"),
            Err(CaptureError::Unsupported)
        ));
        assert!(session.state().is_idle());
    }

    #[test]
    fn capture_failure_transitions_to_failed_and_gates_delivery() {
        let (backend, session, sink) = started_session();

        backend.fail_capture("target window closed");
        assert!(session.state().is_failed());

        backend.push_frame(test_frame());
        assert_eq!(sink.count(), 0);

        // Recovery requires an explicit stop before the next start.
        assert!(matches!(
            session.resolve("Pixel 7"),
            Err(CaptureError::InvalidState(_))
        ));
        session.stop().unwrap();
        assert!(session.resolve("Pixel 7").is_ok());
    }

    #[test]
    fn external_failure_gates_delivery() {
        let (backend, session, sink) = started_session();

        session.fail("frame connection lost");
        assert!(session.state().is_failed());

        backend.push_frame(test_frame());
        assert_eq!(sink.count(), 0);

        // fail() on a settled session is a no-op.
        session.stop().unwrap();
        session.fail("late failure report");
        assert!(session.state().is_idle());
    }

    #[test]
    fn abort_rolls_starting_back_to_idle() {
        let backend = Arc::new(StubBackend::new(vec![scrcpy_window()]));
        let session = CaptureSession::new(backend, CaptureConfig::default());

        session.resolve("Pixel 7").unwrap();
        assert!(session.state().is_starting());

        session.abort();
        assert!(session.state().is_idle());
    }
}
