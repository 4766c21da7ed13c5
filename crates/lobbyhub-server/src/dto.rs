//! JSON shapes for the HTTP API.
//!
//! Domain types stay serde-free; everything the HTTP transport puts on
//! the wire goes through these DTOs.

use chrono::{DateTime, Utc};
use lobbyhub_core::{LobbySummary, Message};
use serde::{Deserialize, Serialize};

/// One lobby in the `GET /lobby` listing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LobbyDto {
    /// Lobby identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Creation time, RFC 3339
    pub created: DateTime<Utc>,
    /// Live subscriber count
    pub subscribers: usize,
}

impl From<LobbySummary> for LobbyDto {
    fn from(summary: LobbySummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            created: summary.created,
            subscribers: summary.subscribers,
        }
    }
}

/// Body of `POST /lobby`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateLobbyRequest {
    /// Requested lobby name
    pub name: String,
}

/// A broadcast text message body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TextDto {
    /// Message content
    pub content: String,
    /// When the message was published, RFC 3339
    pub created: DateTime<Utc>,
}

/// A lobby state announcement body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MetaDto {
    /// Lobby identifier
    pub id: String,
    /// Lobby display name
    pub name: String,
    /// Subscriber count at announcement time
    pub subscribers: i32,
}

/// One WebSocket text frame: a tagged union of the two message kinds.
///
/// Exactly one of `text`/`meta` is present, matching `type`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MessageDto {
    /// Message kind: `"text"` or `"meta"`
    #[serde(rename = "type")]
    pub kind: String,
    /// Text body, present when `type == "text"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextDto>,
    /// Meta body, present when `type == "meta"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaDto>,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        match message {
            Message::Text(text) => Self {
                kind: "text".to_owned(),
                text: Some(TextDto { content: text.content.clone(), created: text.created }),
                meta: None,
            },
            Message::Meta(meta) => Self {
                kind: "meta".to_owned(),
                text: None,
                meta: Some(MetaDto {
                    id: meta.id.clone(),
                    name: meta.name.clone(),
                    subscribers: meta.subscribers,
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use lobbyhub_core::{MetaMessage, TextMessage};

    use super::*;

    #[test]
    fn text_message_serializes_without_meta_field() {
        let message = Message::Text(TextMessage {
            content: "hello".to_owned(),
            created: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        });

        let json = serde_json::to_value(MessageDto::from(&message)).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["text"]["content"], "hello");
        assert!(json.get("meta").is_none());
    }

    #[test]
    fn meta_message_serializes_without_text_field() {
        let message = Message::Meta(MetaMessage {
            id: "l-1".to_owned(),
            name: "general".to_owned(),
            subscribers: 3,
        });

        let json = serde_json::to_value(MessageDto::from(&message)).unwrap();
        assert_eq!(json["type"], "meta");
        assert_eq!(json["meta"]["subscribers"], 3);
        assert!(json.get("text").is_none());
    }
}
