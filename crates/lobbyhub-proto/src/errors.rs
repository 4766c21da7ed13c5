//! Protocol error types.
//!
//! Decoding is strict: a malformed frame is rejected with a typed error
//! rather than being partially consumed. Encoding can only fail on input
//! that cannot be represented on the wire (overlong strings).

use thiserror::Error;

/// Convenience alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding protocol frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// String exceeds the one-byte length prefix (255 bytes).
    ///
    /// Raised on encode before any bytes are written, and on decode if a
    /// declared length runs past the end of the frame.
    #[error("string too long for wire format: {len} bytes (max {max})")]
    StringTooLong {
        /// Actual byte length of the offending string
        len: usize,
        /// Maximum representable length
        max: usize,
    },

    /// Frame ended before a declared field was complete.
    #[error("truncated frame: needed {expected} more bytes, had {actual}")]
    Truncated {
        /// Bytes the field still required
        expected: usize,
        /// Bytes remaining in the frame
        actual: usize,
    },

    /// First byte of the frame is not a known tag.
    #[error("unknown tag byte: {0:#04x}")]
    InvalidTag(u8),

    /// Frame is missing the trailing tab terminator.
    #[error("frame missing 0x09 terminator")]
    MissingTerminator,

    /// Timestamp bytes do not follow the 15-byte binary layout.
    #[error("invalid binary timestamp: {0}")]
    InvalidTimestamp(&'static str),

    /// A string field held invalid UTF-8.
    #[error("invalid utf-8 in string field")]
    InvalidUtf8,

    /// Message body carried an unknown message type string.
    #[error("unknown message type: {0:?}")]
    UnknownMessageType(String),
}
