//! Domain types for lobbies and broadcast messages.
//!
//! These are plain structs; wire encodings (JSON for the HTTP transport,
//! binary frames for the TCP transport) live with their transports.

use chrono::{DateTime, Utc};

/// A named broadcast channel with a stable identifier.
///
/// Immutable after creation except for deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lobby {
    /// Opaque unique identifier, generated at creation
    pub id: String,
    /// Display name
    pub name: String,
    /// Creation time
    pub created: DateTime<Utc>,
}

/// A lobby plus its live subscriber count, as returned by list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbySummary {
    /// Opaque unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Creation time
    pub created: DateTime<Utc>,
    /// Subscriber count at the time of the call (best-effort snapshot)
    pub subscribers: usize,
}

/// A broadcast text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    /// Message content
    pub content: String,
    /// When the message was published
    pub created: DateTime<Utc>,
}

/// Lobby state announcement, sent once to each new subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaMessage {
    /// Lobby identifier
    pub id: String,
    /// Lobby display name
    pub name: String,
    /// Subscriber count at announcement time (includes the new subscriber)
    pub subscribers: i32,
}

/// A message flowing through a lobby stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Broadcast text published to the lobby
    Text(TextMessage),
    /// Lobby state announcement
    Meta(MetaMessage),
}
