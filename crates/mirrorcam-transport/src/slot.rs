//! Depth-1 newest-frame-wins outbound queue.

use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use mirrorcam_protocol::FrameBuffer;

/// Result of pushing a frame into the slot.
#[derive(Debug, PartialEq, Eq)]
pub enum SlotPush {
    /// The slot was empty; the frame is queued.
    Queued,

    /// An unsent frame was displaced by this one.
    Replaced,

    /// The slot is closed; the frame was discarded.
    Closed,
}

/// Result of popping a frame from the slot.
#[derive(Debug)]
pub enum SlotPop {
    /// A frame was dequeued.
    Frame(FrameBuffer),

    /// The wait timed out with no frame queued.
    Empty,

    /// The slot is closed and drained.
    Closed,
}

struct SlotInner {
    frame: Option<FrameBuffer>,
    closed: bool,
}

/// A bounded queue of depth 1 with newest-frame-wins replacement.
///
/// The producer (capture delivery thread) never blocks beyond the swap:
/// an arriving frame replaces any frame the sender loop has not yet
/// taken. Frame cadence matters more than completeness, so the stale
/// frame is the one dropped.
pub struct FrameSlot {
    inner: Mutex<SlotInner>,
    available: Condvar,
}

impl FrameSlot {
    /// Create an open, empty slot.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SlotInner {
                frame: None,
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Queue a frame, displacing any unsent one.
    pub fn push(&self, frame: FrameBuffer) -> SlotPush {
        let mut inner = self.inner.lock();
        if inner.closed {
            return SlotPush::Closed;
        }
        let displaced = inner.frame.replace(frame).is_some();
        drop(inner);
        self.available.notify_one();

        if displaced {
            SlotPush::Replaced
        } else {
            SlotPush::Queued
        }
    }

    /// Wait up to `timeout` for a frame.
    pub fn pop_timeout(&self, timeout: Duration) -> SlotPop {
        let mut inner = self.inner.lock();
        if inner.frame.is_none() && !inner.closed {
            self.available.wait_for(&mut inner, timeout);
        }
        match inner.frame.take() {
            Some(frame) => SlotPop::Frame(frame),
            None if inner.closed => SlotPop::Closed,
            None => SlotPop::Empty,
        }
    }

    /// Close the slot, discarding any unsent frame and waking waiters.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.frame = None;
        drop(inner);
        self.available.notify_all();
    }

    /// Whether the slot has been closed.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }
}

impl Default for FrameSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn frame(fill: u8) -> FrameBuffer {
        FrameBuffer::new(4, 2, 16, Bytes::from(vec![fill; 32]))
    }

    #[test]
    fn newest_frame_wins() {
        let slot = FrameSlot::new();

        assert_eq!(slot.push(frame(1)), SlotPush::Queued);
        assert_eq!(slot.push(frame(2)), SlotPush::Replaced);

        // Only the newest frame is ever transmitted.
        match slot.pop_timeout(Duration::from_millis(10)) {
            SlotPop::Frame(f) => assert_eq!(f.data[0], 2),
            other => panic!("expected frame, got {:?}", other),
        }
        assert!(matches!(
            slot.pop_timeout(Duration::from_millis(10)),
            SlotPop::Empty
        ));
    }

    #[test]
    fn pop_times_out_when_empty() {
        let slot = FrameSlot::new();
        assert!(matches!(
            slot.pop_timeout(Duration::from_millis(10)),
            SlotPop::Empty
        ));
    }

    #[test]
    fn close_discards_unsent_frame_and_wakes_poppers() {
        let slot = std::sync::Arc::new(FrameSlot::new());
        slot.push(frame(1));
        slot.close();
        assert!(slot.is_closed());

        assert!(matches!(
            slot.pop_timeout(Duration::from_millis(10)),
            SlotPop::Closed
        ));
        assert_eq!(slot.push(frame(2)), SlotPush::Closed);
    }

    #[test]
    fn push_wakes_a_waiting_popper() {
        let slot = std::sync::Arc::new(FrameSlot::new());
        let popper = {
            let slot = std::sync::Arc::clone(&slot);
            std::thread::spawn(move || slot.pop_timeout(Duration::from_secs(5)))
        };

        std::thread::sleep(Duration::from_millis(50));
        slot.push(frame(9));

        match popper.join().unwrap() {
            SlotPop::Frame(f) => assert_eq!(f.data[0], 9),
            other => panic!("expected frame, got {:?}", other),
        }
    }
}
