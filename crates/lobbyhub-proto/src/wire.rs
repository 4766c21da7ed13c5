//! Low-level wire primitives shared by command and response codecs.

use bytes::{Buf, BufMut};

use crate::errors::{ProtocolError, Result};

/// ASCII tab byte that terminates every frame.
pub const FRAME_TERMINATOR: u8 = 0x09;

/// Maximum byte length of any string field (one-byte length prefix).
pub const MAX_STRING_LEN: usize = u8::MAX as usize;

/// Write a length-prefixed string.
///
/// # Errors
///
/// [`ProtocolError::StringTooLong`] if the string exceeds 255 bytes;
/// nothing is written in that case.
pub fn put_string(dst: &mut impl BufMut, s: &str) -> Result<()> {
    if s.len() > MAX_STRING_LEN {
        return Err(ProtocolError::StringTooLong { len: s.len(), max: MAX_STRING_LEN });
    }

    dst.put_u8(s.len() as u8);
    dst.put_slice(s.as_bytes());
    Ok(())
}

/// Read a length-prefixed string.
///
/// # Errors
///
/// - [`ProtocolError::Truncated`] if the declared length runs past the
///   end of the buffer
/// - [`ProtocolError::InvalidUtf8`] if the bytes are not valid UTF-8
pub fn get_string(src: &mut impl Buf) -> Result<String> {
    if src.remaining() < 1 {
        return Err(ProtocolError::Truncated { expected: 1, actual: 0 });
    }

    let len = src.get_u8() as usize;
    if src.remaining() < len {
        return Err(ProtocolError::Truncated { expected: len, actual: src.remaining() });
    }

    let mut raw = vec![0u8; len];
    src.copy_to_slice(&mut raw);

    String::from_utf8(raw).map_err(|_| ProtocolError::InvalidUtf8)
}

/// Strip the trailing frame terminator, rejecting unterminated frames.
pub(crate) fn strip_terminator(frame: &[u8]) -> Result<&[u8]> {
    match frame.split_last() {
        Some((&FRAME_TERMINATOR, body)) => Ok(body),
        _ => Err(ProtocolError::MissingTerminator),
    }
}
