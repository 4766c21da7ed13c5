//! Client-to-server command frames.
//!
//! Command payloads are plain UTF-8 between the tag byte and the frame
//! terminator, trimmed of surrounding whitespace on decode. (The trim also
//! absorbs the trailing newline interactive clients tend to send.)

use bytes::BufMut;

use crate::{
    errors::{ProtocolError, Result},
    tags::CommandTag,
    wire::{FRAME_TERMINATOR, strip_terminator},
};

/// A decoded client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Client-side error report; the server only logs these.
    ClientError {
        /// Free-form error detail from the client
        detail: String,
    },
    /// Request the current lobby list.
    ListLobbies,
    /// Create a lobby with the given name.
    CreateLobby {
        /// Lobby name, already trimmed
        name: String,
    },
    /// Join the lobby with the given id, switching the connection into
    /// push-receiving mode.
    JoinLobby {
        /// Lobby id, already trimmed
        id: String,
    },
    /// Publish a message to the joined lobby.
    SendMessage {
        /// Message payload, already trimmed
        payload: String,
    },
}

impl Command {
    /// Encode this command as a complete frame, terminator included.
    pub fn encode(&self, dst: &mut impl BufMut) {
        let (tag, payload) = match self {
            Self::ClientError { detail } => (CommandTag::ClientError, detail.as_str()),
            Self::ListLobbies => (CommandTag::ListLobbies, ""),
            Self::CreateLobby { name } => (CommandTag::CreateLobby, name.as_str()),
            Self::JoinLobby { id } => (CommandTag::JoinLobby, id.as_str()),
            Self::SendMessage { payload } => (CommandTag::SendMessage, payload.as_str()),
        };

        dst.put_u8(tag.to_u8());
        dst.put_slice(payload.as_bytes());
        dst.put_u8(FRAME_TERMINATOR);
    }

    /// Decode a complete frame (terminator included) into a command.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::MissingTerminator`] if the frame does not end in
    ///   `0x09`
    /// - [`ProtocolError::InvalidTag`] for an unknown tag byte
    /// - [`ProtocolError::InvalidUtf8`] if the payload is not UTF-8
    pub fn decode(frame: &[u8]) -> Result<Self> {
        let body = strip_terminator(frame)?;
        let (&tag_byte, payload) = body
            .split_first()
            .ok_or(ProtocolError::Truncated { expected: 1, actual: 0 })?;

        let tag = CommandTag::from_u8(tag_byte).ok_or(ProtocolError::InvalidTag(tag_byte))?;

        let payload = std::str::from_utf8(payload)
            .map_err(|_| ProtocolError::InvalidUtf8)?
            .trim()
            .to_owned();

        Ok(match tag {
            CommandTag::ClientError => Self::ClientError { detail: payload },
            CommandTag::ListLobbies => Self::ListLobbies,
            CommandTag::CreateLobby => Self::CreateLobby { name: payload },
            CommandTag::JoinLobby => Self::JoinLobby { id: payload },
            CommandTag::SendMessage => Self::SendMessage { payload },
        })
    }
}
