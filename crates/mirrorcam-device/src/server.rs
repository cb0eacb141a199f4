//! Frame stream server.
//!
//! Listens on the loopback endpoint, accepts the capture process's
//! connection, decodes length-prefixed frame messages, and publishes the
//! frames to the virtual stream. At most one connection is served at a
//! time; any framing error or disconnect returns the stream to Idle and
//! the server goes back to accepting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, instrument, warn};

use mirrorcam_protocol::{read_message, FrameBuffer, ProtocolError, BYTES_PER_PIXEL};

use crate::properties::StreamFormat;
use crate::stream::VirtualStream;
use crate::{DeviceError, DeviceResult};

/// Accepts frame connections and feeds decoded frames to a stream.
pub struct StreamServer {
    stream: Arc<VirtualStream>,
    endpoint: String,
}

impl StreamServer {
    /// Create a server publishing to the given stream.
    pub fn new(stream: Arc<VirtualStream>, endpoint: impl Into<String>) -> Self {
        Self {
            stream,
            endpoint: endpoint.into(),
        }
    }

    /// Bind the endpoint and serve connections until the task is dropped.
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn run(&self) -> DeviceResult<()> {
        let listener = TcpListener::bind(&self.endpoint)
            .await
            .map_err(|e| DeviceError::Bind(format!("{}: {}", self.endpoint, e)))?;
        info!("stream server listening");
        self.serve(listener).await
    }

    /// Accept loop over an already-bound listener.
    ///
    /// Only one connection is served at a time; while one is active,
    /// further accepts are dropped immediately.
    pub async fn serve(&self, listener: TcpListener) -> DeviceResult<()> {
        let busy = Arc::new(AtomicBool::new(false));

        loop {
            let (socket, peer) = listener.accept().await?;

            if busy.swap(true, Ordering::SeqCst) {
                warn!(%peer, "rejecting connection, a sender is already active");
                drop(socket);
                continue;
            }

            debug!(%peer, "sender connected");
            let stream = Arc::clone(&self.stream);
            let busy = Arc::clone(&busy);
            tokio::spawn(async move {
                serve_connection(socket, stream).await;
                busy.store(false, Ordering::SeqCst);
            });
        }
    }
}

/// Decode frames from one connection until it ends, then idle the stream.
async fn serve_connection(mut socket: TcpStream, stream: Arc<VirtualStream>) {
    loop {
        match read_message(&mut socket).await {
            Ok(payload) => {
                let frame = match frame_from_payload(stream.format(), payload) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!(error = %e, "dropping connection, undecodable frame");
                        break;
                    }
                };
                if let Err(e) = stream.publish(frame) {
                    warn!(error = %e, "dropping connection, frame rejected by stream");
                    break;
                }
            }
            Err(ProtocolError::ConnectionClosed) => {
                debug!("sender disconnected");
                break;
            }
            Err(e) => {
                warn!(error = %e, "dropping connection, framing error");
                break;
            }
        }
    }

    stream.idle();
}

/// Reconstruct a frame from a raw payload.
///
/// The wire carries no layout metadata, so the row stride is inferred:
/// the payload must divide evenly into the declared frame height, and
/// the resulting stride must cover at least one full row of pixels.
fn frame_from_payload(format: StreamFormat, payload: Bytes) -> DeviceResult<FrameBuffer> {
    let len = payload.len();
    let height = format.height as usize;

    if len % height != 0 {
        return Err(DeviceError::FormatMismatch(format!(
            "payload of {} bytes does not divide into {} rows",
            len, height
        )));
    }

    let bytes_per_row = (len / height) as u32;
    if bytes_per_row < format.width * BYTES_PER_PIXEL {
        return Err(DeviceError::FormatMismatch(format!(
            "row stride {} too small for {} pixels",
            bytes_per_row, format.width
        )));
    }

    Ok(FrameBuffer::new(
        format.width,
        format.height,
        bytes_per_row,
        payload,
    ))
}
