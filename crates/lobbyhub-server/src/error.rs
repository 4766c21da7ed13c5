//! Server error types.

use std::fmt;

use lobbyhub_proto::ProtocolError;

/// Errors that can occur in the transport layer.
#[derive(Debug)]
pub enum ServerError {
    /// Transport/network error (bind failure, connection I/O error, etc.).
    ///
    /// May be transient (peer hung up) or fatal (bind address in use).
    /// Check error message for details.
    Transport(String),

    /// Wire protocol error on a TCP connection.
    ///
    /// Fatal for that connection, but the server keeps serving other
    /// clients.
    Protocol(ProtocolError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Protocol(err) => write!(f, "protocol error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Protocol(err) => Some(err),
            Self::Transport(_) => None,
        }
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<ProtocolError> for ServerError {
    fn from(err: ProtocolError) -> Self {
        Self::Protocol(err)
    }
}
