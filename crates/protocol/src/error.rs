//! Error type for the agent protocol (§4.J, §4.K).

use core::Error as CoreError;

/// Errors raised while framing or parsing a request over the wire.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A frame exceeded the 16 MiB cap (§6).
    #[error("frame of {size} bytes exceeds the {limit}-byte cap")]
    FrameTooLarge {
        /// The frame's actual size in bytes.
        size: usize,
        /// The configured cap, [`crate::frame::MAX_FRAME_LEN`].
        limit: usize,
    },

    /// The frame was not valid JSON, or did not match any known request
    /// shape.
    #[error("malformed request: {0}")]
    MalformedRequest(#[from] serde_json::Error),

    /// Underlying I/O failure reading or writing the transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ProtocolError> for CoreError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::FrameTooLarge { size, limit } => Self::ProtocolError {
                reason: format!("frame of {size} bytes exceeds the {limit}-byte cap"),
            },
            ProtocolError::MalformedRequest(json_err) => Self::ProtocolError {
                reason: json_err.to_string(),
            },
            ProtocolError::Io(io_err) => Self::Io(io_err),
        }
    }
}

/// Convenience alias for fallible protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
