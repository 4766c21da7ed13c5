//! Fixed 15-byte binary timestamp codec.
//!
//! Layout (big-endian, in order):
//!
//! | bytes | field                                            |
//! |-------|--------------------------------------------------|
//! | 0     | version, always `0x01`                           |
//! | 1-8   | `i64` seconds counted from January 1, year 1     |
//! | 9-12  | `i32` nanoseconds within the second              |
//! | 13-14 | `i16` zone offset in minutes, `-1` meaning UTC   |
//!
//! The second count is absolute, so the zone offset carries no information
//! beyond presentation. Encoding always writes UTC (`-1`); decoding accepts
//! any offset and normalizes to UTC.

use bytes::{Buf, BufMut};
use chrono::{DateTime, Utc};

use crate::errors::{ProtocolError, Result};

/// Serialized size of a timestamp.
pub const TIMESTAMP_LEN: usize = 15;

/// Version byte written at offset 0.
pub const TIMESTAMP_VERSION: u8 = 1;

/// Seconds between year 1 and the Unix epoch.
const UNIX_TO_ABSOLUTE: i64 = 62_135_596_800;

/// Zone offset sentinel for UTC.
const UTC_OFFSET: i16 = -1;

/// Encode a timestamp into the 15-byte wire layout.
pub fn put_timestamp(dst: &mut impl BufMut, ts: DateTime<Utc>) {
    dst.put_u8(TIMESTAMP_VERSION);
    dst.put_i64(ts.timestamp() + UNIX_TO_ABSOLUTE);
    dst.put_i32(ts.timestamp_subsec_nanos() as i32);
    dst.put_i16(UTC_OFFSET);
}

/// Decode a 15-byte wire timestamp, normalizing to UTC.
///
/// # Errors
///
/// - [`ProtocolError::Truncated`] if fewer than 15 bytes remain
/// - [`ProtocolError::InvalidTimestamp`] on a bad version byte, an
///   out-of-range nanosecond count, or seconds outside the representable
///   range
pub fn get_timestamp(src: &mut impl Buf) -> Result<DateTime<Utc>> {
    if src.remaining() < TIMESTAMP_LEN {
        return Err(ProtocolError::Truncated {
            expected: TIMESTAMP_LEN,
            actual: src.remaining(),
        });
    }

    let version = src.get_u8();
    if version != TIMESTAMP_VERSION {
        return Err(ProtocolError::InvalidTimestamp("unsupported version byte"));
    }

    let absolute_secs = src.get_i64();
    let nanos = src.get_i32();
    let _offset_minutes = src.get_i16(); // presentation only, always normalized to UTC

    if !(0..1_000_000_000).contains(&nanos) {
        return Err(ProtocolError::InvalidTimestamp("nanoseconds out of range"));
    }

    let unix_secs = absolute_secs.checked_sub(UNIX_TO_ABSOLUTE).ok_or(
        ProtocolError::InvalidTimestamp("seconds out of range"),
    )?;

    DateTime::from_timestamp(unix_secs, nanos as u32)
        .ok_or(ProtocolError::InvalidTimestamp("seconds out of range"))
}
