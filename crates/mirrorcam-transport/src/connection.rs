//! Connection state management.

use serde::{Deserialize, Serialize};

/// Connection state for the frame stream client.
///
/// A connection is single-session: there is no reconnect within a
/// session, and a dropped connection is fatal for that session. State
/// transitions are logged for diagnostics only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Not connected.
    #[default]
    Disconnected,

    /// Connecting to the device provider.
    Connecting,

    /// Connected and able to carry frames.
    Connected,

    /// Tearing down; further sends are suppressed.
    Closing,
}

impl ConnectionState {
    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Check if disconnected.
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected)
    }

    /// Check if the connection can still accept frames for sending.
    pub fn accepts_frames(&self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }

    /// Get a status message for diagnostics.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting...",
            Self::Connected => "Connected",
            Self::Closing => "Closing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_acceptance_by_state() {
        assert!(ConnectionState::Connecting.accepts_frames());
        assert!(ConnectionState::Connected.accepts_frames());
        assert!(!ConnectionState::Closing.accepts_frames());
        assert!(!ConnectionState::Disconnected.accepts_frames());
    }

    #[test]
    fn default_is_disconnected() {
        assert!(ConnectionState::default().is_disconnected());
    }
}
