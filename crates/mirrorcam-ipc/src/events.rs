//! Events sent from the engine to the shell bridge.

use serde::{Deserialize, Serialize};

use crate::state::SessionState;
use crate::types::ControlError;

/// Events that the engine can send to the shell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BridgeEvent {
    /// Engine is ready to accept commands.
    Ready,

    /// Session state has changed.
    StateChanged {
        /// Previous state.
        previous: SessionState,

        /// Current state.
        current: SessionState,
    },

    /// A start command finished, successfully or not.
    StartCompleted { result: Result<(), ControlError> },

    /// A stop command finished. Stop always succeeds.
    StopCompleted,

    /// Current session state, in response to a state query.
    State(SessionState),

    /// Engine has shut down.
    Shutdown,
}
