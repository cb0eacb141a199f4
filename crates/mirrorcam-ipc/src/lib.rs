//! Typed shell<->engine control messages for mirrorcam.
//!
//! This crate defines the message types used between the GUI shell's
//! method-call bridge and the capture engine, plus the capture session
//! state machine they both observe.

mod commands;
mod events;
mod state;
mod types;

pub use commands::BridgeCommand;
pub use events::BridgeEvent;
pub use state::{SessionState, ShutdownPhase, StartupPhase};
pub use types::{ControlError, EngineConfig, ErrorCode};

use crossbeam_channel::{Receiver, Sender};

/// Channel capacity for commands (shell → engine).
pub const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Channel capacity for events (engine → shell).
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Creates a bounded command channel.
pub fn command_channel() -> (Sender<BridgeCommand>, Receiver<BridgeCommand>) {
    crossbeam_channel::bounded(COMMAND_CHANNEL_CAPACITY)
}

/// Creates a bounded event channel.
pub fn event_channel() -> (Sender<BridgeEvent>, Receiver<BridgeEvent>) {
    crossbeam_channel::bounded(EVENT_CHANNEL_CAPACITY)
}
