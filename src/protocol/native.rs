// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Native messaging framing: a 4-byte little-endian length, then that many
//! bytes of UTF-8 JSON.

use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest frame accepted in either direction.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame of {0} bytes exceeds limit")]
    TooLarge(usize),
}

/// Read one frame. `Ok(None)` on clean EOF before a frame starts.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>, FrameError> {
    let mut header = [0u8; 4];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(header) as usize;
    if len > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(len));
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, body: &[u8]) -> Result<(), FrameError> {
    if body.len() > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(body.len()));
    }
    writer.write_all(&(body.len() as u32).to_le_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_message<T, R>(reader: &mut R) -> Result<Option<T>, FrameError>
where
    T: DeserializeOwned,
    R: AsyncRead + Unpin,
{
    match read_frame(reader).await? {
        Some(body) => Ok(Some(serde_json::from_slice(&body)?)),
        None => Ok(None),
    }
}

pub async fn write_message<T, W>(writer: &mut W, message: &T) -> Result<(), FrameError>
where
    T: Serialize,
    W: AsyncWrite + Unpin,
{
    write_frame(writer, &serde_json::to_vec(message)?).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::wire::PortRequest;
    use serde_json::json;

    #[tokio::test]
    async fn frames_are_length_prefixed_le() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"{}").await.unwrap();
        assert_eq!(buf, vec![2, 0, 0, 0, b'{', b'}']);
    }

    #[tokio::test]
    async fn reads_messages_until_eof() {
        let mut buf = Vec::new();
        write_message(
            &mut buf,
            &json!({"action": "hasWallet", "messageId": 1}),
        )
        .await
        .unwrap();

        let mut reader = buf.as_slice();
        let request: PortRequest = read_message(&mut reader).await.unwrap().unwrap();
        assert_eq!(request.action, "hasWallet");
        assert!(read_message::<PortRequest, _>(&mut reader)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn rejects_oversized_and_truncated_frames() {
        let header = ((MAX_FRAME_LEN + 1) as u32).to_le_bytes();
        let mut huge = header.as_slice();
        assert!(matches!(
            read_frame(&mut huge).await,
            Err(FrameError::TooLarge(_))
        ));

        let mut truncated: &[u8] = &[5, 0, 0, 0, b'{'];
        assert!(matches!(read_frame(&mut truncated).await, Err(FrameError::Io(_))));
    }
}
