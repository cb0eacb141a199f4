//! Capture engine.
//!
//! Wires the capture session and the frame transport together and drives
//! them from a command loop: the shell bridge sends [`BridgeCommand`]s
//! over a channel, the engine answers with [`BridgeEvent`]s. The engine
//! owns all session resources; the bridge never touches the session or
//! the connection directly.
//!
//! [`BridgeCommand`]: mirrorcam_ipc::BridgeCommand
//! [`BridgeEvent`]: mirrorcam_ipc::BridgeEvent

mod orchestrator;
mod resources;

pub use orchestrator::Engine;
pub use resources::ResourceManager;

/// Command loop tick interval in milliseconds. Each tick reconciles
/// session state the engine cannot observe synchronously (mid-session
/// failures reported on capture or transport threads).
pub const TICK_INTERVAL_MS: u64 = 100;
