//! Length-prefixed message framing.
//!
//! Each message is a 4-byte big-endian unsigned length followed by exactly
//! that many payload bytes. The header is fully transmitted before the
//! payload begins; a short read anywhere is fatal for the connection.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::error::ProtocolError;
use crate::{ProtocolResult, HEADER_LEN, MAX_WIRE_LEN};

/// Encode the length header for a payload.
pub fn encode_header(len: usize) -> ProtocolResult<[u8; HEADER_LEN]> {
    let len = u32::try_from(len).map_err(|_| ProtocolError::Oversized {
        len: u32::MAX,
        max: MAX_WIRE_LEN,
    })?;
    validate_len(len)?;
    Ok(len.to_be_bytes())
}

/// Decode a length header.
pub fn decode_header(header: [u8; HEADER_LEN]) -> u32 {
    u32::from_be_bytes(header)
}

/// Check a declared payload length against the protocol's sanity bounds.
pub fn validate_len(len: u32) -> ProtocolResult<usize> {
    if len == 0 {
        return Err(ProtocolError::ZeroLength);
    }
    let len = len as usize;
    if len > MAX_WIRE_LEN {
        return Err(ProtocolError::Oversized {
            len: len as u32,
            max: MAX_WIRE_LEN,
        });
    }
    Ok(len)
}

/// Write one message: header first, then the payload, as two sequential
/// writes. Both complete before the call returns.
pub async fn write_message<W>(writer: &mut W, payload: &[u8]) -> ProtocolResult<()>
where
    W: AsyncWrite + Unpin,
{
    let header = encode_header(payload.len())?;
    writer.write_all(&header).await?;
    writer.write_all(payload).await?;
    trace!(len = payload.len(), "wrote message");
    Ok(())
}

/// Read one complete message.
///
/// Returns [`ProtocolError::ConnectionClosed`] if the peer closed cleanly
/// at a message boundary, and [`ProtocolError::Truncated`] if it closed
/// partway through a header or payload. A partial message is never
/// returned to the caller.
pub async fn read_message<R>(reader: &mut R) -> ProtocolResult<Bytes>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    let mut filled = 0;
    while filled < HEADER_LEN {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            return Err(if filled == 0 {
                ProtocolError::ConnectionClosed
            } else {
                ProtocolError::Truncated {
                    expected: HEADER_LEN,
                }
            });
        }
        filled += n;
    }

    let len = validate_len(decode_header(header))?;

    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => ProtocolError::Truncated { expected: len },
            _ => ProtocolError::Io(e),
        })?;

    trace!(len, "read message");
    Ok(Bytes::from(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip_preserves_payload() {
        // 4x2 frame with a padded 24-byte stride.
        let payload: Vec<u8> = (0..48).map(|i| i as u8).collect();

        let mut wire = Vec::new();
        write_message(&mut wire, &payload).await.unwrap();
        assert_eq!(wire.len(), HEADER_LEN + payload.len());
        assert_eq!(&wire[..HEADER_LEN], &48u32.to_be_bytes());

        let mut reader: &[u8] = &wire;
        let decoded = read_message(&mut reader).await.unwrap();
        assert_eq!(decoded.as_ref(), payload.as_slice());
    }

    #[tokio::test]
    async fn back_to_back_messages_stay_framed() {
        let mut wire = Vec::new();
        write_message(&mut wire, &[1u8; 16]).await.unwrap();
        write_message(&mut wire, &[2u8; 32]).await.unwrap();

        let mut reader: &[u8] = &wire;
        let first = read_message(&mut reader).await.unwrap();
        let second = read_message(&mut reader).await.unwrap();
        assert_eq!(first.as_ref(), &[1u8; 16]);
        assert_eq!(second.as_ref(), &[2u8; 32]);
    }

    #[tokio::test]
    async fn truncated_payload_is_fatal() {
        let mut wire = Vec::new();
        write_message(&mut wire, &[7u8; 64]).await.unwrap();
        wire.truncate(HEADER_LEN + 10);

        let mut reader: &[u8] = &wire;
        match read_message(&mut reader).await {
            Err(ProtocolError::Truncated { expected }) => assert_eq!(expected, 64),
            other => panic!("expected Truncated, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn truncated_header_is_fatal() {
        let wire = [0u8, 0u8];
        let mut reader: &[u8] = &wire;
        assert!(matches!(
            read_message(&mut reader).await,
            Err(ProtocolError::Truncated { .. })
        ));
    }

    #[tokio::test]
    async fn clean_close_at_boundary() {
        let mut reader: &[u8] = &[];
        assert!(matches!(
            read_message(&mut reader).await,
            Err(ProtocolError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn zero_length_is_rejected() {
        let wire = 0u32.to_be_bytes();
        let mut reader: &[u8] = &wire;
        assert!(matches!(
            read_message(&mut reader).await,
            Err(ProtocolError::ZeroLength)
        ));
    }

    #[tokio::test]
    async fn oversized_length_is_rejected() {
        let wire = u32::MAX.to_be_bytes();
        let mut reader: &[u8] = &wire;
        assert!(matches!(
            read_message(&mut reader).await,
            Err(ProtocolError::Oversized { .. })
        ));
    }

    #[test]
    fn encode_header_rejects_invalid_lengths() {
        assert!(matches!(encode_header(0), Err(ProtocolError::ZeroLength)));
        assert!(matches!(
            encode_header(MAX_WIRE_LEN + 1),
            Err(ProtocolError::Oversized { .. })
        ));
        assert_eq!(encode_header(48).unwrap(), 48u32.to_be_bytes());
    }
}
