//! Newline-delimited JSON framing.
//!
//! Each frame is one JSON document followed by `\n`. Decoding stops at the
//! document level: turning a document into an [`RpcMessage`] is left to the
//! receiver so that non-envelope frames can be reported separately from
//! undecodable bytes.

use thiserror::Error;

use crate::message::RpcMessage;

/// Maximum frame size (1 MB)
pub const MAX_FRAME_SIZE: usize = 1_048_576;

/// Encodes an envelope as a single newline-terminated line.
pub fn encode_frame(message: &RpcMessage) -> Result<String, CodecError> {
    let mut line = serde_json::to_string(message).map_err(|e| CodecError::Encode(e.to_string()))?;
    line.push('\n');
    Ok(line)
}

/// Decodes one line into a JSON document.
///
/// Trailing whitespace (including the line terminator) is ignored.
pub fn decode_frame(line: &str) -> Result<serde_json::Value, CodecError> {
    if line.len() > MAX_FRAME_SIZE {
        return Err(CodecError::FrameTooLarge {
            size: line.len(),
            max: MAX_FRAME_SIZE,
        });
    }

    let trimmed = line.trim_end();
    if trimmed.is_empty() {
        return Err(CodecError::EmptyFrame);
    }

    serde_json::from_str(trimmed).map_err(|e| CodecError::Decode(e.to_string()))
}

/// Errors produced while encoding or decoding frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Failed to encode message: {0}")]
    Encode(String),

    #[error("Failed to decode frame: {0}")]
    Decode(String),

    #[error("Frame is not an RPC envelope: {0}")]
    NotAnEnvelope(String),

    #[error("Empty frame")]
    EmptyFrame,

    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },
}
