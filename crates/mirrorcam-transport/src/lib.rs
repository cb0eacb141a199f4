//! Loopback frame stream client.
//!
//! This crate owns the capture process's side of the frame connection:
//! a reliable, ordered byte stream to the device-provider process, with
//! a depth-1 newest-frame-wins outbound queue in front of it.

mod client;
mod connection;
mod error;
mod slot;

pub use client::{ClientStatistics, StreamClient};
pub use connection::ConnectionState;
pub use error::TransportError;
pub use slot::{FrameSlot, SlotPop, SlotPush};

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// How long the sender loop waits for a frame before re-checking for
/// shutdown.
pub const SEND_POLL_INTERVAL_MS: u64 = 100;
