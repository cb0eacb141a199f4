//! Commands sent from the shell bridge to the engine.

use serde::{Deserialize, Serialize};

/// Commands that the shell can send to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BridgeCommand {
    /// Start mirroring the first on-screen window whose title contains
    /// `window_title` (case-sensitive substring match).
    Start { window_title: String },

    /// Stop the current session. Safe to send when no session is active.
    Stop,

    /// Request the current session state.
    GetState,

    /// Shutdown the engine completely.
    Shutdown,
}
