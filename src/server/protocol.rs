//! Wire Protocol
//!
//! One request per connection: a fixed 255-byte NUL-padded file name from the
//! client, answered by an 8-byte big-endian length and then the file body.

use std::io::ErrorKind;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Result, ServeError};

/// Width of the request frame carrying the file name.
pub const NAME_FRAME_LEN: usize = 255;

// == Read Request ==
/// Reads one request frame and returns the requested name.
///
/// A peer that closes early, or has not sent the full frame within
/// `timeout`, gets a `MalformedRequest`.
pub async fn read_request_name<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<String> {
    let mut frame = [0u8; NAME_FRAME_LEN];
    match tokio::time::timeout(timeout, reader.read_exact(&mut frame)).await {
        Err(_) => Err(ServeError::MalformedRequest(format!(
            "no complete name frame within {:?}",
            timeout
        ))),
        Ok(Ok(_)) => parse_name_frame(&frame),
        Ok(Err(e)) if e.kind() == ErrorKind::UnexpectedEof => Err(ServeError::MalformedRequest(
            format!("expected a {} byte name frame", NAME_FRAME_LEN),
        )),
        Ok(Err(e)) => Err(e.into()),
    }
}

/// Decodes a name frame, trimming NUL padding from both ends.
pub fn parse_name_frame(frame: &[u8]) -> Result<String> {
    let start = frame.iter().position(|&b| b != 0).unwrap_or(frame.len());
    let end = frame.iter().rposition(|&b| b != 0).map_or(start, |i| i + 1);
    String::from_utf8(frame[start..end].to_vec())
        .map_err(|_| ServeError::InvalidName("name is not valid UTF-8".to_string()))
}

/// Builds the request frame a client sends for `name`.
pub fn encode_name_frame(name: &str) -> Result<[u8; NAME_FRAME_LEN]> {
    let bytes = name.as_bytes();
    if bytes.len() > NAME_FRAME_LEN {
        return Err(ServeError::InvalidName(format!(
            "name longer than {} bytes",
            NAME_FRAME_LEN
        )));
    }
    let mut frame = [0u8; NAME_FRAME_LEN];
    frame[..bytes.len()].copy_from_slice(bytes);
    Ok(frame)
}

// == Write Header ==
/// Writes the big-endian byte length that precedes the body.
pub async fn write_length_header<W: AsyncWrite + Unpin>(writer: &mut W, len: u64) -> Result<()> {
    writer.write_u64(len).await?;
    Ok(())
}
