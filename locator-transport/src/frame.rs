//! Wire frames for the forwarder connection.
//!
//! Frames are MessagePack payloads behind a 4-byte big-endian length
//! prefix. This is the client protocol spoken to a forwarder daemon, not
//! a general named-data codec.

use crate::{TransportError, TransportResult};
use locator_types::Name;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Ceiling on a single frame body. Content bodies cap at 64 KiB, so this
/// leaves generous room for framing overhead.
pub const MAX_FRAME_BYTES: usize = 128 * 1024;

/// Messages exchanged with a forwarder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Frame {
    /// Ask the forwarder to deliver interests under `prefix` to us.
    RegisterPrefix {
        /// The prefix to serve.
        prefix: Name,
    },
    /// A named request.
    Interest {
        /// The full interest name.
        name: Name,
    },
    /// A signed response.
    Content {
        /// The interest name this content answers.
        name: Name,
        /// Response body.
        payload: Vec<u8>,
        /// Freshness hint in seconds.
        freshness_secs: Option<u32>,
        /// Digest tag over name and payload.
        signature: Vec<u8>,
    },
}

impl Frame {
    /// Serialize to MessagePack bytes.
    pub fn to_bytes(&self) -> TransportResult<Vec<u8>> {
        Ok(rmp_serde::to_vec(self)?)
    }

    /// Deserialize from MessagePack bytes.
    pub fn from_bytes(bytes: &[u8]) -> TransportResult<Self> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

/// Write one length-prefixed frame.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, frame: &Frame) -> TransportResult<()> {
    let bytes = frame.to_bytes()?;
    let len = (bytes.len() as u32).to_be_bytes();
    writer.write_all(&len).await?;
    writer.write_all(&bytes).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> TransportResult<Frame> {
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes).await?;
    let len = u32::from_be_bytes(len_bytes) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(TransportError::OversizedFrame {
            size: len,
            limit: MAX_FRAME_BYTES,
        });
    }
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes).await?;
    Frame::from_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frame_survives_the_wire() {
        let (mut a, mut b) = tokio::io::duplex(1024);

        let frame = Frame::Interest {
            name: Name::from_uri("/edu/campus/where/a.txt/0011").unwrap(),
        };
        write_frame(&mut a, &frame).await.unwrap();

        let received = read_frame(&mut b).await.unwrap();
        assert_eq!(received, frame);
    }

    #[tokio::test]
    async fn consecutive_frames_stay_separate() {
        let (mut a, mut b) = tokio::io::duplex(4096);

        let first = Frame::RegisterPrefix {
            prefix: Name::from_uri("/edu/campus/server").unwrap(),
        };
        let second = Frame::Content {
            name: Name::from_uri("/edu/campus/server/ff").unwrap(),
            payload: b"10.0.0.5:9000".to_vec(),
            freshness_secs: Some(1),
            signature: vec![0xAB; 32],
        };
        write_frame(&mut a, &first).await.unwrap();
        write_frame(&mut a, &second).await.unwrap();

        assert_eq!(read_frame(&mut b).await.unwrap(), first);
        assert_eq!(read_frame(&mut b).await.unwrap(), second);
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected_before_allocation() {
        let (mut a, mut b) = tokio::io::duplex(64);
        let len = ((MAX_FRAME_BYTES + 1) as u32).to_be_bytes();
        tokio::io::AsyncWriteExt::write_all(&mut a, &len).await.unwrap();

        let err = read_frame(&mut b).await.unwrap_err();
        assert!(matches!(err, TransportError::OversizedFrame { .. }));
    }
}
