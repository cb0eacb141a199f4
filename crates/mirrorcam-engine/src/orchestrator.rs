//! Engine command loop.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info, instrument, warn};

use mirrorcam_capture::CaptureBackend;
use mirrorcam_ipc::{
    BridgeCommand, BridgeEvent, ControlError, EngineConfig, ErrorCode, SessionState,
};

use crate::resources::ResourceManager;
use crate::TICK_INTERVAL_MS;

/// The capture engine.
///
/// Runs a blocking command loop on its own thread: commands in, events
/// out. Every observable state transition is reported exactly once as a
/// `StateChanged` event, and every start attempt gets exactly one
/// `StartCompleted`.
pub struct Engine {
    command_rx: Receiver<BridgeCommand>,
    event_tx: Sender<BridgeEvent>,
    resources: ResourceManager,
    last_state: SessionState,
}

impl Engine {
    /// Create a new engine over the given control channels.
    pub fn new(
        command_rx: Receiver<BridgeCommand>,
        event_tx: Sender<BridgeEvent>,
        config: EngineConfig,
        backend: Arc<dyn CaptureBackend>,
    ) -> Self {
        Self {
            command_rx,
            event_tx,
            resources: ResourceManager::new(backend, config),
            last_state: SessionState::Idle,
        }
    }

    /// Run the command loop until a shutdown command arrives or the
    /// command channel closes. Consumes the engine; resources are torn
    /// down before this returns.
    #[instrument(name = "engine", skip(self))]
    pub fn run(mut self) {
        info!("engine starting");
        self.emit(BridgeEvent::Ready);

        loop {
            match self
                .command_rx
                .recv_timeout(Duration::from_millis(TICK_INTERVAL_MS))
            {
                Ok(BridgeCommand::Shutdown) => {
                    info!("shutdown requested");
                    self.resources.shutdown();
                    self.publish_state();
                    self.emit(BridgeEvent::Shutdown);
                    break;
                }
                Ok(command) => {
                    self.handle(command);
                    self.publish_state();
                }
                Err(RecvTimeoutError::Timeout) => {
                    self.resources.reconcile();
                    self.publish_state();
                }
                Err(RecvTimeoutError::Disconnected) => {
                    info!("command channel closed, shutting down");
                    self.resources.shutdown();
                    break;
                }
            }
        }

        info!("engine stopped");
    }

    fn handle(&mut self, command: BridgeCommand) {
        debug!(?command, "handling command");
        match command {
            BridgeCommand::Start { window_title } => {
                let result = self.start(&window_title);
                if let Err(e) = &result {
                    warn!("start failed: {}", e);
                }
                self.emit(BridgeEvent::StartCompleted { result });
            }
            BridgeCommand::Stop => {
                self.resources.shutdown();
                self.emit(BridgeEvent::StopCompleted);
            }
            BridgeCommand::GetState => {
                self.emit(BridgeEvent::State(self.resources.session_state()));
            }
            BridgeCommand::Shutdown => unreachable!("handled by the loop"),
        }
    }

    fn start(&mut self, window_title: &str) -> Result<(), ControlError> {
        let window_title = window_title.trim();
        if window_title.is_empty() {
            return Err(ControlError::new(
                ErrorCode::InvalidArgs,
                "window title missing",
            ));
        }
        self.resources.start(window_title)
    }

    /// Report a state transition if one happened since the last look.
    fn publish_state(&mut self) {
        let current = self.resources.session_state();
        if current != self.last_state {
            let previous = std::mem::replace(&mut self.last_state, current.clone());
            debug!(from = previous.name(), to = current.name(), "state changed");
            self.emit(BridgeEvent::StateChanged { previous, current });
        }
    }

    fn emit(&self, event: BridgeEvent) {
        if self.event_tx.send(event).is_err() {
            warn!("event receiver is gone");
        }
    }
}
