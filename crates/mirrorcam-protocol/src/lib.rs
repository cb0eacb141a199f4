//! Frame transport wire format for the capture ↔ device-provider link.
//!
//! One logical connection carries a stream of messages, each a 4-byte
//! big-endian length header followed by exactly that many bytes of raw
//! frame payload. There is no handshake, no per-message format header and
//! no resync marker: both processes compile against the constants below,
//! and any framing violation is fatal for the connection.

mod error;
mod frame;
mod wire;

pub use error::ProtocolError;
pub use frame::FrameBuffer;
pub use wire::{decode_header, encode_header, read_message, validate_len, write_message};

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Fixed loopback port for the frame stream.
pub const STREAM_PORT: u16 = 49152;

/// Fixed capture resolution, agreed out-of-band by both processes.
pub const FRAME_WIDTH: u32 = 1920;
pub const FRAME_HEIGHT: u32 = 1080;

/// 32-bit packed BGRA pixels.
pub const BYTES_PER_PIXEL: u32 = 4;

/// Target frame cadence, expressed as a minimum inter-frame interval.
/// The host capture API may deliver frames at a lower or irregular rate.
pub const TARGET_FPS: u32 = 30;

/// Size of the length header on the wire.
pub const HEADER_LEN: usize = 4;

/// Upper bound on bytes-per-row. The OS may pad rows past `width * 4`
/// for alignment; anything beyond this is a framing error.
pub const MAX_BYTES_PER_ROW: u32 = 16384;

/// Sanity ceiling for a declared payload length. A header above this
/// magnitude cannot be a frame of the agreed format.
pub const MAX_WIRE_LEN: usize = (FRAME_HEIGHT * MAX_BYTES_PER_ROW) as usize;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// The loopback endpoint both processes use by default.
pub fn default_endpoint() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), STREAM_PORT)
}

/// Minimum interval between delivered frames at the target cadence.
pub fn min_frame_interval() -> Duration {
    Duration::from_nanos(1_000_000_000 / TARGET_FPS as u64)
}
