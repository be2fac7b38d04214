//! # Overview
//!
//! Newline-delimited JSON framing over any ordered byte-stream (§4.J,
//! §6): one frame per line, each frame a complete JSON object no larger
//! than [`MAX_FRAME_LEN`].

use std::io::{BufRead, Write};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{ProtocolError, Result};

/// Maximum size in bytes of a single frame (§6).
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Reads one frame from `reader` and deserializes it as `T`.
///
/// Returns `Ok(None)` on a clean EOF (the peer closed the connection
/// between frames) or a blank line, either of which the agent treats as
/// [`core::Error::TransportClosed`] one layer up.
///
/// # Errors
///
/// Returns [`ProtocolError::FrameTooLarge`] if the line exceeds
/// [`MAX_FRAME_LEN`], [`ProtocolError::MalformedRequest`] if it is not
/// valid JSON for `T`, and [`ProtocolError::Io`] for any read failure.
pub fn read_frame<R: BufRead, T: DeserializeOwned>(reader: &mut R) -> Result<Option<T>> {
    let mut line = String::new();
    let read = reader.read_line(&mut line)?;
    if read == 0 {
        return Ok(None);
    }
    let trimmed = line.trim_end_matches(['\n', '\r']);
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge {
            size: trimmed.len(),
            limit: MAX_FRAME_LEN,
        });
    }

    let value = serde_json::from_str(trimmed)?;
    Ok(Some(value))
}

/// Writes `value` as one newline-terminated JSON frame to `writer` and
/// flushes it, so the peer observes each response as soon as it is
/// produced (§5 "single command at a time").
///
/// # Errors
///
/// Returns [`ProtocolError::Io`] if serialization or the write fails.
pub fn write_frame<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
    let encoded = serde_json::to_string(value)?;
    writer.write_all(encoded.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
