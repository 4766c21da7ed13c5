//! Binary wire protocol for the lobbyhub TCP transport.
//!
//! Every command and response travels as a single *frame*: a one-byte tag,
//! a tag-specific payload, and the ASCII tab byte (`0x09`) as terminator.
//! Readers buffer until they observe the terminator; there is no maximum
//! frame size beyond the per-field string limit.
//!
//! # Wire rules
//!
//! - Strings are length-prefixed with a single byte, so no string field may
//!   exceed 255 bytes. Oversized strings are rejected before any bytes are
//!   written ([`ProtocolError::StringTooLong`]).
//! - Timestamps are the fixed 15-byte binary layout described in
//!   [`timestamp`].
//! - Subscriber counts are little-endian: `u32` in lobby-list records,
//!   `i32` in meta message bodies.
//!
//! This crate is a pure codec: it owns the byte layout and nothing else.
//! The TCP server encodes responses and decodes commands; clients and tests
//! use the mirror-image paths. Both directions round-trip exactly.

mod command;
mod errors;
mod response;
mod tags;
pub mod timestamp;
mod wire;

pub use command::Command;
pub use errors::{ProtocolError, Result};
pub use response::{LobbyRecord, Response, WireMessage};
pub use tags::{CommandTag, ResponseTag};
pub use wire::{FRAME_TERMINATOR, MAX_STRING_LEN, get_string, put_string};
