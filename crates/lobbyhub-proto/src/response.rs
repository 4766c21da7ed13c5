//! Server-to-client response and push frames.

use bytes::{Buf, BufMut};
use chrono::{DateTime, Utc};

use crate::{
    errors::{ProtocolError, Result},
    tags::ResponseTag,
    timestamp::{get_timestamp, put_timestamp},
    wire::{FRAME_TERMINATOR, get_string, put_string, strip_terminator},
};

/// Message type string for text messages.
const TEXT_TYPE: &str = "text";

/// Message type string for meta messages.
const META_TYPE: &str = "meta";

/// One lobby entry in a [`Response::LobbyList`] frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyRecord {
    /// Lobby identifier
    pub id: String,
    /// Lobby display name
    pub name: String,
    /// Creation time
    pub created: DateTime<Utc>,
    /// Live subscriber count
    pub subscribers: u32,
}

/// Body of a [`Response::LobbyMessage`] push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireMessage {
    /// A broadcast text message.
    Text {
        /// When the message was published
        created: DateTime<Utc>,
        /// Message content
        content: String,
    },
    /// Lobby state announcement, sent once to each new subscriber.
    Meta {
        /// Lobby identifier
        id: String,
        /// Lobby display name
        name: String,
        /// Subscriber count at announcement time
        subscribers: i32,
    },
}

/// A decoded server response or push frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Server-side error report.
    ServerError {
        /// Free-form error detail
        detail: String,
    },
    /// Lobby list, zero or more records.
    LobbyList(Vec<LobbyRecord>),
    /// Acknowledges lobby creation with the new id.
    LobbyCreated {
        /// Identifier of the created lobby
        id: String,
    },
    /// Asynchronous message push from a joined lobby.
    LobbyMessage(WireMessage),
}

impl Response {
    /// Encode this response as a complete frame, terminator included.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::StringTooLong`] if any string field exceeds 255
    /// bytes. The destination buffer may hold a partial frame in that case;
    /// callers must discard it rather than send it.
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        match self {
            Self::ServerError { detail } => {
                dst.put_u8(ResponseTag::ServerError.to_u8());
                put_string(dst, detail)?;
            },
            Self::LobbyList(records) => {
                dst.put_u8(ResponseTag::LobbyList.to_u8());
                for record in records {
                    put_string(dst, &record.id)?;
                    put_string(dst, &record.name)?;
                    put_timestamp(dst, record.created);
                    dst.put_u32_le(record.subscribers);
                }
            },
            Self::LobbyCreated { id } => {
                dst.put_u8(ResponseTag::LobbyCreated.to_u8());
                put_string(dst, id)?;
            },
            Self::LobbyMessage(message) => {
                dst.put_u8(ResponseTag::LobbyMessage.to_u8());
                match message {
                    WireMessage::Text { created, content } => {
                        put_string(dst, TEXT_TYPE)?;
                        put_timestamp(dst, *created);
                        put_string(dst, content)?;
                    },
                    WireMessage::Meta { id, name, subscribers } => {
                        put_string(dst, META_TYPE)?;
                        put_string(dst, id)?;
                        put_string(dst, name)?;
                        dst.put_i32_le(*subscribers);
                    },
                }
            },
        }

        dst.put_u8(FRAME_TERMINATOR);
        Ok(())
    }

    /// Decode a complete frame (terminator included) into a response.
    pub fn decode(frame: &[u8]) -> Result<Self> {
        let body = strip_terminator(frame)?;
        let (&tag_byte, mut src) = body
            .split_first()
            .ok_or(ProtocolError::Truncated { expected: 1, actual: 0 })?;

        let tag = ResponseTag::from_u8(tag_byte).ok_or(ProtocolError::InvalidTag(tag_byte))?;

        match tag {
            ResponseTag::ServerError => {
                let detail = get_string(&mut src)?;
                Ok(Self::ServerError { detail })
            },
            ResponseTag::LobbyList => {
                let mut records = Vec::new();
                while src.has_remaining() {
                    let id = get_string(&mut src)?;
                    let name = get_string(&mut src)?;
                    let created = get_timestamp(&mut src)?;
                    if src.remaining() < 4 {
                        return Err(ProtocolError::Truncated {
                            expected: 4,
                            actual: src.remaining(),
                        });
                    }
                    let subscribers = src.get_u32_le();
                    records.push(LobbyRecord { id, name, created, subscribers });
                }
                Ok(Self::LobbyList(records))
            },
            ResponseTag::LobbyCreated => {
                let id = get_string(&mut src)?;
                Ok(Self::LobbyCreated { id })
            },
            ResponseTag::LobbyMessage => {
                let message_type = get_string(&mut src)?;
                match message_type.as_str() {
                    TEXT_TYPE => {
                        let created = get_timestamp(&mut src)?;
                        let content = get_string(&mut src)?;
                        Ok(Self::LobbyMessage(WireMessage::Text { created, content }))
                    },
                    META_TYPE => {
                        let id = get_string(&mut src)?;
                        let name = get_string(&mut src)?;
                        if src.remaining() < 4 {
                            return Err(ProtocolError::Truncated {
                                expected: 4,
                                actual: src.remaining(),
                            });
                        }
                        let subscribers = src.get_i32_le();
                        Ok(Self::LobbyMessage(WireMessage::Meta { id, name, subscribers }))
                    },
                    other => Err(ProtocolError::UnknownMessageType(other.to_owned())),
                }
            },
        }
    }
}
