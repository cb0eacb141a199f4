//! The OS-facing video stream.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::Sender;
use parking_lot::RwLock;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use mirrorcam_protocol::FrameBuffer;

use crate::properties::{Capability, CapabilityValue, StreamFormat, STREAM_NAME};
use crate::{DeviceError, DeviceResult};

/// Whether the stream is currently emitting frames to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishingState {
    /// Advertised but not emitting frames.
    Idle,

    /// Emitting frames to consumers.
    Publishing,
}

/// A decoded frame stamped for presentation.
#[derive(Debug, Clone)]
pub struct PublishedFrame {
    /// The frame payload and layout.
    pub buffer: FrameBuffer,

    /// Presentation timestamp in 100ns units, derived from arrival time.
    pub pts_100ns: u64,

    /// Monotonically increasing sequence number.
    pub sequence: u64,
}

/// A downstream consumer of published frames (an application that has
/// opened the virtual camera).
pub trait FrameConsumer: Send + Sync {
    /// One frame is available.
    fn frame(&self, frame: &PublishedFrame);

    /// The stream returned to Idle; no more frames until it publishes
    /// again.
    fn idled(&self) {}
}

/// The virtual camera's video stream.
///
/// Owned by exactly one [`crate::VirtualDevice`]. Its identity and
/// declared format are fixed at construction; frames that do not match
/// the format are rejected rather than republished in a new format.
pub struct VirtualStream {
    stream_id: Uuid,
    localized_name: &'static str,
    format: StreamFormat,
    state: RwLock<PublishingState>,
    epoch: Instant,
    sequence: AtomicU64,
    consumers: RwLock<Vec<Arc<dyn FrameConsumer>>>,
}

impl VirtualStream {
    /// Create a stream with the agreed fixed format.
    pub fn new() -> Self {
        Self::with_format(StreamFormat::default())
    }

    /// Create a stream declaring the given format.
    pub fn with_format(format: StreamFormat) -> Self {
        Self {
            stream_id: Uuid::new_v4(),
            localized_name: STREAM_NAME,
            format,
            state: RwLock::new(PublishingState::Idle),
            epoch: Instant::now(),
            sequence: AtomicU64::new(0),
            consumers: RwLock::new(Vec::new()),
        }
    }

    /// Stable stream identity, generated once per provider lifetime.
    pub fn id(&self) -> Uuid {
        self.stream_id
    }

    /// Human-visible stream name.
    pub fn name(&self) -> &'static str {
        self.localized_name
    }

    /// The stream's declared frame format.
    pub fn format(&self) -> StreamFormat {
        self.format
    }

    /// Current publishing state.
    pub fn publishing_state(&self) -> PublishingState {
        *self.state.read()
    }

    /// Attach a consumer. Consumers receive every frame published after
    /// attachment.
    pub fn attach_consumer(&self, consumer: Arc<dyn FrameConsumer>) {
        self.consumers.write().push(consumer);
    }

    /// Publish one decoded frame to all consumers, stamped with an
    /// arrival-time presentation timestamp. The first publish moves the
    /// stream from Idle to Publishing.
    pub fn publish(&self, buffer: FrameBuffer) -> DeviceResult<()> {
        if buffer.width != self.format.width
            || buffer.height != self.format.height
            || buffer.bytes_per_row < self.format.min_bytes_per_row()
            || !buffer.is_valid()
        {
            return Err(DeviceError::FormatMismatch(format!(
                "{}x{} stride {} against {}",
                buffer.width, buffer.height, buffer.bytes_per_row, self.format
            )));
        }

        {
            let mut state = self.state.write();
            if *state == PublishingState::Idle {
                info!(stream = %self.stream_id, "stream publishing");
                *state = PublishingState::Publishing;
            }
        }

        let frame = PublishedFrame {
            buffer,
            pts_100ns: (self.epoch.elapsed().as_nanos() / 100) as u64,
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
        };

        for consumer in self.consumers.read().iter() {
            consumer.frame(&frame);
        }

        trace!(sequence = frame.sequence, "published frame");
        Ok(())
    }

    /// Return the stream to Idle. Consumers see no further frames until
    /// the next publish.
    pub fn idle(&self) {
        {
            let mut state = self.state.write();
            if *state == PublishingState::Idle {
                return;
            }
            *state = PublishingState::Idle;
        }

        debug!(stream = %self.stream_id, "stream idle");
        for consumer in self.consumers.read().iter() {
            consumer.idled();
        }
    }

    /// The capability set this stream can be asked about.
    pub fn capabilities(&self) -> &'static [Capability] {
        &[Capability::StreamFormat]
    }

    /// Query a capability. Pure: answers never change at runtime.
    pub fn describe(&self, capability: Capability) -> Option<CapabilityValue> {
        match capability {
            Capability::StreamFormat => Some(CapabilityValue::Format(self.format)),
            _ => None,
        }
    }

    /// Accept a property-set request. Deliberately a no-op: the stream's
    /// declared identity and format are immutable after construction.
    pub fn set_property(&self, _capability: Capability, _value: CapabilityValue) -> DeviceResult<()> {
        warn!("ignoring property-set request; stream properties are immutable");
        Ok(())
    }
}

impl Default for VirtualStream {
    fn default() -> Self {
        Self::new()
    }
}

/// A consumer backed by a crossbeam channel. Frames are dropped, not
/// queued, when the receiver lags.
pub struct ChannelConsumer {
    tx: Sender<PublishedFrame>,
}

impl ChannelConsumer {
    /// Create a consumer feeding the given sender.
    pub fn new(tx: Sender<PublishedFrame>) -> Self {
        Self { tx }
    }
}

impl FrameConsumer for ChannelConsumer {
    fn frame(&self, frame: &PublishedFrame) {
        if self.tx.try_send(frame.clone()).is_err() {
            trace!("consumer lagging, dropping frame");
        }
    }
}
