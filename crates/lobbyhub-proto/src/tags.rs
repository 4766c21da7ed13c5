//! Command and response tag bytes.
//!
//! Both enums start at 1; direction disambiguates them on the wire (there
//! is no handshake or version byte). Clients send [`CommandTag`]s, the
//! server sends [`ResponseTag`]s.

/// Tag byte of a client-to-server command frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandTag {
    /// Client-side error report (reserved, never dispatched by the server)
    ClientError = 1,
    /// Request the current lobby list
    ListLobbies = 2,
    /// Create a lobby; payload is the UTF-8 name
    CreateLobby = 3,
    /// Join a lobby; payload is the UTF-8 lobby id
    JoinLobby = 4,
    /// Publish to the joined lobby; payload is the UTF-8 message
    SendMessage = 5,
}

impl CommandTag {
    /// Parse a tag byte. `None` if unrecognized.
    #[must_use]
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::ClientError),
            2 => Some(Self::ListLobbies),
            3 => Some(Self::CreateLobby),
            4 => Some(Self::JoinLobby),
            5 => Some(Self::SendMessage),
            _ => None,
        }
    }

    /// Wire representation of this tag.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Tag byte of a server-to-client response or push frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ResponseTag {
    /// Server-side error report
    ServerError = 1,
    /// Lobby list; payload is zero or more lobby records
    LobbyList = 2,
    /// Lobby created; payload is the new lobby id
    LobbyCreated = 3,
    /// Asynchronous message push from a joined lobby
    LobbyMessage = 4,
}

impl ResponseTag {
    /// Parse a tag byte. `None` if unrecognized.
    #[must_use]
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::ServerError),
            2 => Some(Self::LobbyList),
            3 => Some(Self::LobbyCreated),
            4 => Some(Self::LobbyMessage),
            _ => None,
        }
    }

    /// Wire representation of this tag.
    #[must_use]
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}
