//! Session resource lifecycle.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use mirrorcam_capture::{CaptureBackend, CaptureConfig, CaptureError, CaptureSession, FrameSink};
use mirrorcam_ipc::{ControlError, EngineConfig, ErrorCode, SessionState};
use mirrorcam_protocol::FrameBuffer;
use mirrorcam_transport::StreamClient;

/// Everything one running session owns.
struct ActiveResources {
    session: Arc<CaptureSession>,
    client: Arc<StreamClient>,
}

/// Creates and tears down session resources in dependency order.
///
/// Startup is phased: resolve the target window, open the frame
/// connection, start the capture stream. A failure in any phase rolls
/// back the phases before it, so a failed start never leaks a connection
/// or a half-open capture stream. Shutdown runs the reverse order.
pub struct ResourceManager {
    backend: Arc<dyn CaptureBackend>,
    config: EngineConfig,
    active: Option<ActiveResources>,
}

impl ResourceManager {
    /// Create a manager with no active session.
    pub fn new(backend: Arc<dyn CaptureBackend>, config: EngineConfig) -> Self {
        Self {
            backend,
            config,
            active: None,
        }
    }

    /// The observable session state.
    pub fn session_state(&self) -> SessionState {
        match &self.active {
            Some(active) => active.session.state(),
            None => SessionState::Idle,
        }
    }

    /// Start a session for the given window title.
    #[instrument(name = "resources_start", skip(self))]
    pub fn start(&mut self, window_title: &str) -> Result<(), ControlError> {
        match self.session_state() {
            SessionState::Idle => {}
            SessionState::Failed { message } => {
                return Err(ControlError::new(
                    ErrorCode::CaptureError,
                    format!("previous session failed ({}); stop it before starting", message),
                ));
            }
            state => {
                return Err(ControlError::new(
                    ErrorCode::CaptureError,
                    format!("a capture session is already {}", state.name()),
                ));
            }
        }

        // A stopped session's resources may still be held; release them
        // before building the next set.
        self.shutdown();

        let session = Arc::new(CaptureSession::new(
            Arc::clone(&self.backend),
            capture_config(&self.config),
        ));
        session.resolve(window_title).map_err(control_error)?;

        let client = Arc::new(StreamClient::new(self.config.endpoint));
        if let Err(e) = client.connect() {
            session.abort();
            return Err(ControlError::new(
                ErrorCode::CaptureInitError,
                format!("failed to open frame connection: {}", e),
            ));
        }
        if let Err(e) = wait_for_connection(&client) {
            let _ = client.disconnect();
            session.abort();
            return Err(e);
        }

        let sink = Arc::new(ClientSink {
            client: Arc::clone(&client),
        });
        if let Err(e) = session.begin_streaming(sink) {
            let _ = client.disconnect();
            session.abort();
            return Err(control_error(e));
        }

        info!(window_title, "session resources up");
        self.active = Some(ActiveResources { session, client });
        Ok(())
    }

    /// Tear down whatever is active: capture stream first so frame
    /// delivery stops, then the connection. Safe to call when nothing is
    /// active.
    #[instrument(name = "resources_shutdown", skip(self))]
    pub fn shutdown(&mut self) {
        if let Some(active) = self.active.take() {
            if let Err(e) = active.session.stop() {
                warn!("session did not stop cleanly: {}", e);
            }
            if let Err(e) = active.client.disconnect() {
                warn!("connection did not close cleanly: {}", e);
            }
            info!("session resources released");
        }
    }

    /// Reconcile state reported by the capture and transport threads.
    ///
    /// A session that failed mid-flight keeps its Failed state until the
    /// shell stops it, but its connection is released immediately. A
    /// session whose connection died is marked Failed.
    pub fn reconcile(&mut self) {
        let Some(active) = &self.active else {
            return;
        };

        let state = active.session.state();

        if state.is_active() && active.client.state().is_disconnected() {
            active.session.fail("frame connection lost");
            return;
        }

        if state.is_failed() && !active.client.state().is_disconnected() {
            debug!("releasing connection of failed session");
            let _ = active.client.disconnect();
        }
    }
}

impl Drop for ResourceManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Bridges captured frames into the stream client.
struct ClientSink {
    client: Arc<StreamClient>,
}

impl FrameSink for ClientSink {
    fn deliver(&self, frame: FrameBuffer) {
        if let Err(e) = self.client.send(frame) {
            debug!("frame not enqueued: {}", e);
        }
    }
}

/// How long a start waits for the frame connection to establish.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Block until the client reports Connected. The connect itself runs on
/// the client's runtime; this only observes the outcome.
fn wait_for_connection(client: &StreamClient) -> Result<(), ControlError> {
    let deadline = std::time::Instant::now() + CONNECT_TIMEOUT;
    loop {
        let state = client.state();
        if state.is_connected() {
            return Ok(());
        }
        if state.is_disconnected() {
            return Err(ControlError::new(
                ErrorCode::CaptureInitError,
                "frame connection refused by the device provider",
            ));
        }
        if std::time::Instant::now() >= deadline {
            return Err(ControlError::new(
                ErrorCode::CaptureInitError,
                "timed out opening the frame connection",
            ));
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

fn capture_config(config: &EngineConfig) -> CaptureConfig {
    CaptureConfig {
        width: config.width,
        height: config.height,
        min_frame_interval: Duration::from_nanos(1_000_000_000 / u64::from(config.fps.max(1))),
    }
}

/// Map a capture-side failure to the structured code the shell expects.
fn control_error(e: CaptureError) -> ControlError {
    let code = match &e {
        CaptureError::WindowNotFound(_) => ErrorCode::WindowNotFound,
        CaptureError::BackendQuery(_) => ErrorCode::ScError,
        CaptureError::Unsupported => ErrorCode::UnsupportedOs,
        CaptureError::StreamOpen(_) => ErrorCode::CaptureInitError,
        CaptureError::SessionBusy
        | CaptureError::InvalidState(_)
        | CaptureError::StreamStop(_) => ErrorCode::CaptureError,
    };
    ControlError::new(code, e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_errors_map_to_bridge_codes() {
        let cases = [
            (
                control_error(CaptureError::WindowNotFound("Pixel".into())),
                ErrorCode::WindowNotFound,
            ),
            (
                control_error(CaptureError::BackendQuery("denied".into())),
                ErrorCode::ScError,
            ),
            (control_error(CaptureError::Unsupported), ErrorCode::UnsupportedOs),
            (
                control_error(CaptureError::StreamOpen("busy".into())),
                ErrorCode::CaptureInitError,
            ),
            (control_error(CaptureError::SessionBusy), ErrorCode::CaptureError),
        ];

        for (error, expected) in cases {
            assert_eq!(error.code, expected);
            assert!(!error.message.is_empty());
        }
    }

    #[test]
    fn capture_config_derives_frame_interval() {
        let config = capture_config(&EngineConfig::default());
        assert_eq!((config.width, config.height), (1920, 1080));
        assert_eq!(config.min_frame_interval, Duration::from_nanos(33_333_333));
    }
}
