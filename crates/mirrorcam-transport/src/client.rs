//! Frame stream client implementation.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::net::TcpStream;
use tokio::runtime::Runtime;
use tracing::{debug, error, info, instrument, trace};

use mirrorcam_protocol::{write_message, FrameBuffer};

use crate::connection::ConnectionState;
use crate::error::TransportError;
use crate::slot::{FrameSlot, SlotPop, SlotPush};
use crate::{TransportResult, SEND_POLL_INTERVAL_MS};

/// Client side of the frame connection.
///
/// Owns one connection to the device provider's loopback endpoint.
/// `send` is fire-and-forget from the capture callback's perspective:
/// frames pass through a depth-1 newest-frame-wins slot to a sender loop
/// that writes each frame as header-then-payload, strictly in FIFO
/// order. A connection is not reusable across sessions; any I/O error is
/// fatal for the session and is not retried.
pub struct StreamClient {
    endpoint: SocketAddr,
    state: Arc<RwLock<ConnectionState>>,
    slot: RwLock<Arc<FrameSlot>>,
    runtime: Mutex<Option<Runtime>>,
    should_stop: Arc<AtomicBool>,
    frames_sent: Arc<AtomicU64>,
    bytes_sent: Arc<AtomicU64>,
    frames_dropped: AtomicU64,
}

impl StreamClient {
    /// Create a new client for the given loopback endpoint.
    pub fn new(endpoint: SocketAddr) -> Self {
        Self {
            endpoint,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            slot: RwLock::new(Arc::new(FrameSlot::new())),
            runtime: Mutex::new(None),
            should_stop: Arc::new(AtomicBool::new(false)),
            frames_sent: Arc::new(AtomicU64::new(0)),
            bytes_sent: Arc::new(AtomicU64::new(0)),
            frames_dropped: AtomicU64::new(0),
        }
    }

    /// Open the connection and start the sender loop.
    #[instrument(name = "stream_connect", skip(self), fields(endpoint = %self.endpoint))]
    pub fn connect(&self) -> TransportResult<()> {
        if !self.state.read().is_disconnected() {
            return Err(TransportError::AlreadyConnected);
        }

        info!("connecting to device provider");
        *self.state.write() = ConnectionState::Connecting;
        self.should_stop.store(false, Ordering::SeqCst);

        // Fresh slot per connection; the old one stays closed.
        let slot = Arc::new(FrameSlot::new());
        *self.slot.write() = Arc::clone(&slot);

        let runtime = Runtime::new().map_err(TransportError::Io)?;

        let endpoint = self.endpoint;
        let state = Arc::clone(&self.state);
        let should_stop = Arc::clone(&self.should_stop);
        let frames_sent = Arc::clone(&self.frames_sent);
        let bytes_sent = Arc::clone(&self.bytes_sent);

        runtime.spawn(async move {
            run_stream_connection(endpoint, slot, state, should_stop, frames_sent, bytes_sent)
                .await;
        });

        *self.runtime.lock() = Some(runtime);
        Ok(())
    }

    /// Enqueue one frame for transmission.
    ///
    /// Never blocks beyond the slot swap. If an unsent frame is already
    /// queued it is displaced (newest-frame-wins) and counted as a drop.
    pub fn send(&self, frame: FrameBuffer) -> TransportResult<()> {
        if !frame.is_valid() {
            return Err(TransportError::InvalidFrame(format!(
                "{} bytes for {}x{} stride {}",
                frame.data.len(),
                frame.width,
                frame.height,
                frame.bytes_per_row
            )));
        }

        if !self.state.read().accepts_frames() {
            self.frames_dropped.fetch_add(1, Ordering::Relaxed);
            return Err(TransportError::NotConnected);
        }

        match self.slot.read().push(frame) {
            SlotPush::Queued => Ok(()),
            SlotPush::Replaced => {
                trace!("displaced unsent frame (newest wins)");
                self.frames_dropped.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            SlotPush::Closed => {
                self.frames_dropped.fetch_add(1, Ordering::Relaxed);
                Err(TransportError::NotConnected)
            }
        }
    }

    /// Close the connection and discard any unsent frame.
    ///
    /// The connection is marked Closing before anything else, so no
    /// frame accepted after this call begins can reach the wire.
    /// Idempotent.
    #[instrument(name = "stream_disconnect", skip(self))]
    pub fn disconnect(&self) -> TransportResult<()> {
        {
            let mut state = self.state.write();
            if state.is_disconnected() {
                return Ok(());
            }
            *state = ConnectionState::Closing;
        }

        self.should_stop.store(true, Ordering::SeqCst);
        self.slot.read().close();

        if let Some(runtime) = self.runtime.lock().take() {
            runtime.shutdown_timeout(Duration::from_secs(5));
        }

        *self.state.write() = ConnectionState::Disconnected;
        info!("disconnected from device provider");
        Ok(())
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state.read().clone()
    }

    /// Check if connected.
    pub fn is_connected(&self) -> bool {
        self.state.read().is_connected()
    }

    /// Get transport statistics.
    pub fn statistics(&self) -> ClientStatistics {
        ClientStatistics {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
        }
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}

/// Transport statistics.
#[derive(Debug, Clone, Default)]
pub struct ClientStatistics {
    pub frames_sent: u64,
    pub bytes_sent: u64,
    pub frames_dropped: u64,
}

async fn run_stream_connection(
    endpoint: SocketAddr,
    slot: Arc<FrameSlot>,
    state: Arc<RwLock<ConnectionState>>,
    should_stop: Arc<AtomicBool>,
    frames_sent: Arc<AtomicU64>,
    bytes_sent: Arc<AtomicU64>,
) {
    let mut stream = match TcpStream::connect(endpoint).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("connect to {} failed: {}", endpoint, e);
            *state.write() = ConnectionState::Disconnected;
            slot.close();
            return;
        }
    };

    if should_stop.load(Ordering::SeqCst) {
        // disconnect() raced the connect; it owns the state transition.
        return;
    }

    // Frames are latency-sensitive; do not coalesce small writes.
    let _ = stream.set_nodelay(true);

    *state.write() = ConnectionState::Connected;
    info!("frame connection established");

    loop {
        if should_stop.load(Ordering::SeqCst) {
            break;
        }

        match slot.pop_timeout(Duration::from_millis(SEND_POLL_INTERVAL_MS)) {
            SlotPop::Frame(frame) => {
                if let Err(e) = write_message(&mut stream, &frame.data).await {
                    error!("frame send failed, connection is dead for this session: {}", e);
                    *state.write() = ConnectionState::Disconnected;
                    slot.close();
                    return;
                }
                frames_sent.fetch_add(1, Ordering::Relaxed);
                bytes_sent.fetch_add(frame.data.len() as u64, Ordering::Relaxed);
            }
            SlotPop::Empty => continue,
            SlotPop::Closed => break,
        }
    }

    debug!("sender loop exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::io::Read;
    use std::net::TcpListener;
    use std::time::Instant;

    fn test_frame(fill: u8) -> FrameBuffer {
        FrameBuffer::new(4, 2, 16, Bytes::from(vec![fill; 32]))
    }

    fn wait_for<F: Fn() -> bool>(pred: F, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if pred() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn frames_arrive_header_then_payload() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = listener.local_addr().unwrap();

        let reader = std::thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();

            let mut header = [0u8; 4];
            socket.read_exact(&mut header).unwrap();
            let len = u32::from_be_bytes(header) as usize;

            let mut payload = vec![0u8; len];
            socket.read_exact(&mut payload).unwrap();

            // After disconnect the peer closes; read returns EOF.
            let mut rest = Vec::new();
            let eof = socket.read_to_end(&mut rest).unwrap();

            (len, payload, eof)
        });

        let client = StreamClient::new(endpoint);
        client.connect().unwrap();
        assert!(wait_for(|| client.is_connected(), Duration::from_secs(5)));

        client.send(test_frame(0x5A)).unwrap();
        assert!(wait_for(
            || client.statistics().frames_sent == 1,
            Duration::from_secs(5)
        ));

        client.disconnect().unwrap();
        assert!(client.state().is_disconnected());

        let (len, payload, eof) = reader.join().unwrap();
        assert_eq!(len, 32);
        assert_eq!(payload, vec![0x5A; 32]);
        assert_eq!(eof, 0);
    }

    #[test]
    fn second_connect_is_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = StreamClient::new(listener.local_addr().unwrap());

        client.connect().unwrap();
        assert!(matches!(
            client.connect(),
            Err(TransportError::AlreadyConnected)
        ));
        client.disconnect().unwrap();
    }

    #[test]
    fn send_requires_a_connection() {
        let client = StreamClient::new("127.0.0.1:49152".parse().unwrap());
        assert!(matches!(
            client.send(test_frame(1)),
            Err(TransportError::NotConnected)
        ));
        assert_eq!(client.statistics().frames_dropped, 1);
    }

    #[test]
    fn sends_are_suppressed_after_disconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = StreamClient::new(listener.local_addr().unwrap());

        client.connect().unwrap();
        assert!(wait_for(|| client.is_connected(), Duration::from_secs(5)));
        client.disconnect().unwrap();

        assert!(matches!(
            client.send(test_frame(1)),
            Err(TransportError::NotConnected)
        ));
    }

    #[test]
    fn refused_connection_ends_disconnected() {
        // Bind then drop to get a port nothing is listening on.
        let endpoint = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        let client = StreamClient::new(endpoint);
        client.connect().unwrap();

        assert!(wait_for(
            || client.state().is_disconnected(),
            Duration::from_secs(5)
        ));
    }

    #[test]
    fn invalid_frame_is_rejected() {
        let client = StreamClient::new("127.0.0.1:49152".parse().unwrap());
        let bad = FrameBuffer::new(4, 2, 16, Bytes::from(vec![0u8; 3]));
        assert!(matches!(
            client.send(bad),
            Err(TransportError::InvalidFrame(_))
        ));
    }
}
