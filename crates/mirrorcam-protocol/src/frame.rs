//! Captured frame buffer type.

use bytes::Bytes;

use crate::{BYTES_PER_PIXEL, FRAME_HEIGHT, FRAME_WIDTH};

/// One captured frame: raw 32-bit packed pixels plus layout metadata.
///
/// `bytes_per_row` may exceed `width * 4` because the OS aligns capture
/// buffers; the payload is always exactly `height * bytes_per_row` bytes,
/// row-major, with no padding or trailer beyond the row stride.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,

    /// Row stride in bytes (>= width * 4).
    pub bytes_per_row: u32,

    /// Raw pixel payload of `height * bytes_per_row` bytes.
    pub data: Bytes,
}

impl FrameBuffer {
    /// Create a new frame buffer.
    pub fn new(width: u32, height: u32, bytes_per_row: u32, data: Bytes) -> Self {
        Self {
            width,
            height,
            bytes_per_row,
            data,
        }
    }

    /// Create a frame at the agreed fixed resolution with a packed stride.
    pub fn packed(data: Bytes) -> Self {
        Self::new(
            FRAME_WIDTH,
            FRAME_HEIGHT,
            FRAME_WIDTH * BYTES_PER_PIXEL,
            data,
        )
    }

    /// Expected payload size for the given layout.
    pub fn expected_len(height: u32, bytes_per_row: u32) -> usize {
        height as usize * bytes_per_row as usize
    }

    /// Validate that the payload matches the declared layout.
    pub fn is_valid(&self) -> bool {
        self.bytes_per_row >= self.width * BYTES_PER_PIXEL
            && self.data.len() == Self::expected_len(self.height, self.bytes_per_row)
    }

    /// Payload size implied by the layout metadata.
    pub fn payload_len(&self) -> usize {
        Self::expected_len(self.height, self.bytes_per_row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_frame_is_valid() {
        let len = FrameBuffer::expected_len(FRAME_HEIGHT, FRAME_WIDTH * BYTES_PER_PIXEL);
        let frame = FrameBuffer::packed(Bytes::from(vec![0u8; len]));
        assert!(frame.is_valid());
        assert_eq!(frame.payload_len(), len);
    }

    #[test]
    fn aligned_stride_is_valid() {
        // Stride padded past width * 4, as OS capture buffers do.
        let frame = FrameBuffer::new(30, 4, 128, Bytes::from(vec![0u8; 512]));
        assert!(frame.is_valid());
    }

    #[test]
    fn short_payload_is_invalid() {
        let frame = FrameBuffer::new(30, 4, 128, Bytes::from(vec![0u8; 511]));
        assert!(!frame.is_valid());
    }

    #[test]
    fn undersized_stride_is_invalid() {
        let frame = FrameBuffer::new(32, 4, 64, Bytes::from(vec![0u8; 256]));
        assert!(!frame.is_valid());
    }
}
