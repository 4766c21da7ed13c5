//! Transport layer for the lobbyhub masterserver.
//!
//! Two transports front the same [`lobbyhub_core::LobbyService`]:
//!
//! - [`tcp`]: the binary protocol (tab-terminated frames from
//!   `lobbyhub-proto`), one task per connection.
//! - [`http`]: JSON over HTTP plus WebSocket subscriptions.
//!
//! The binary in `main.rs` wires both to one shared service.

pub mod dto;
mod error;
pub mod http;
pub mod tcp;

pub use error::ServerError;
