//! The delivery seam between the lobby service and its transports.

use async_trait::async_trait;
use thiserror::Error;

use crate::message::Message;

/// A failed delivery to a transport connection.
///
/// Carries only a reason string; the transport that produced it already
/// knows the details, and the service treats any delivery failure the same
/// way (terminate that subscription, leave the stream alone).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("delivery failed: {reason}")]
pub struct DeliveryError {
    /// Human-readable failure detail
    pub reason: String,
}

impl DeliveryError {
    /// Create a delivery error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Capability to push one message to a connected client.
///
/// Both transports implement this: the TCP handler encodes a
/// `LOBBY_MESSAGE` frame, the WebSocket handler a JSON text frame. The
/// lobby service pushes stream messages through it without knowing which
/// socket type sits behind.
#[async_trait]
pub trait Connection: Send {
    /// Deliver one message to the client.
    ///
    /// Implementations should hold their own write exclusivity (the TCP
    /// transport shares its socket with synchronous command responses) and
    /// return an error once the connection is unusable.
    async fn deliver(&mut self, message: &Message) -> Result<(), DeliveryError>;
}
