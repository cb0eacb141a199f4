//! Capture session state machine types.

use serde::{Deserialize, Serialize};

/// The state of the capture session. At most one session is ever
/// Starting or Active per process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No session; ready to start.
    #[default]
    Idle,

    /// A session is starting up.
    Starting {
        /// Current startup phase.
        phase: StartupPhase,
    },

    /// A session is capturing and streaming frames.
    Active {
        /// Title of the mirrored window.
        window_title: String,
    },

    /// A session is tearing down.
    Stopping {
        /// Current shutdown phase.
        phase: ShutdownPhase,
    },

    /// The session failed mid-flight (window closed, connection lost).
    /// An explicit stop is required before the next start.
    Failed {
        /// Failure description.
        message: String,
    },
}

impl SessionState {
    /// Returns true if no session is active or pending.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns true if a session is starting.
    pub fn is_starting(&self) -> bool {
        matches!(self, Self::Starting { .. })
    }

    /// Returns true if a session is actively streaming.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    /// Returns true if a session is stopping.
    pub fn is_stopping(&self) -> bool {
        matches!(self, Self::Stopping { .. })
    }

    /// Returns true if the session has failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Returns a simple string representation of the state.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Starting { .. } => "Starting",
            Self::Active { .. } => "Active",
            Self::Stopping { .. } => "Stopping",
            Self::Failed { .. } => "Failed",
        }
    }
}

/// Startup phases for a session, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartupPhase {
    /// Looking up the target window.
    ResolveWindow,

    /// Opening the frame connection to the device provider.
    OpenConnection,

    /// Starting the host capture stream.
    StartCapture,
}

impl StartupPhase {
    /// Returns the next phase, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::ResolveWindow => Some(Self::OpenConnection),
            Self::OpenConnection => Some(Self::StartCapture),
            Self::StartCapture => None,
        }
    }
}

/// Shutdown phases for a session, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShutdownPhase {
    /// Stopping the host capture stream.
    StopCapture,

    /// Closing the frame connection.
    CloseConnection,
}

impl ShutdownPhase {
    /// Returns the next phase, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::StopCapture => Some(Self::CloseConnection),
            Self::CloseConnection => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_walk_in_order() {
        assert_eq!(
            StartupPhase::ResolveWindow.next(),
            Some(StartupPhase::OpenConnection)
        );
        assert_eq!(
            StartupPhase::OpenConnection.next(),
            Some(StartupPhase::StartCapture)
        );
        assert_eq!(StartupPhase::StartCapture.next(), None);

        assert_eq!(
            ShutdownPhase::StopCapture.next(),
            Some(ShutdownPhase::CloseConnection)
        );
        assert_eq!(ShutdownPhase::CloseConnection.next(), None);
    }

    #[test]
    fn state_predicates() {
        assert!(SessionState::Idle.is_idle());
        assert!(SessionState::Active {
            window_title: "Pixel 7".into()
        }
        .is_active());
        assert!(SessionState::Failed {
            message: "window closed".into()
        }
        .is_failed());
        assert_eq!(SessionState::default().name(), "Idle");
    }
}
