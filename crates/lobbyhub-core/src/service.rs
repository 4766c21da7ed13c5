//! The lobby service: the one facade every transport calls into.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::connection::{Connection, DeliveryError};
use crate::limiter::TokenBucket;
use crate::message::{Lobby, LobbySummary, Message, MetaMessage, TextMessage};
use crate::repo::{LobbyRepo, NewLobby, RepoError};

/// Publish burst capacity (tokens in a full bucket).
pub const PUBLISH_BURST: u64 = 8;

/// Publish token refill interval.
pub const PUBLISH_REFILL: Duration = Duration::from_millis(100);

/// Per-message delivery deadline for subscribers.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors surfaced by service operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// No lobby with the given id.
    #[error("unknown lobby: {id}")]
    NotFound {
        /// The id that was looked up
        id: String,
    },
    /// The caller's input was rejected before touching any state.
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// What was wrong with the input
        reason: &'static str,
    },
    /// A subscriber failed to accept a message within [`DELIVERY_TIMEOUT`].
    #[error("delivery deadline exceeded")]
    DeliveryTimeout,
    /// The subscriber's connection failed mid-delivery.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

impl From<RepoError> for ServiceError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound { id } => Self::NotFound { id },
        }
    }
}

/// Lobby operations shared by all transports.
///
/// Holds the store and the process-wide publish rate limiter. Cheap to
/// share behind an `Arc`; every method takes `&self`.
pub struct LobbyService {
    repo: Arc<dyn LobbyRepo>,
    limiter: TokenBucket,
}

impl LobbyService {
    /// Create a service over the given store with the default publish
    /// rate limit (burst [`PUBLISH_BURST`], refill [`PUBLISH_REFILL`]).
    #[must_use]
    pub fn new(repo: Arc<dyn LobbyRepo>) -> Self {
        Self { repo, limiter: TokenBucket::new(PUBLISH_BURST, PUBLISH_REFILL) }
    }

    /// Create a lobby. The name is trimmed; an empty result is rejected.
    pub fn create(&self, name: &str) -> Result<Lobby, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidInput { reason: "lobby name must not be empty" });
        }
        let lobby = self.repo.add(NewLobby { name: name.to_owned() });
        debug!(id = %lobby.id, name = %lobby.name, "lobby created");
        Ok(lobby)
    }

    /// All lobbies with their live subscriber counts, oldest first.
    pub async fn list(&self) -> Vec<LobbySummary> {
        let mut lobbies = self.repo.list();
        lobbies.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));

        let mut summaries = Vec::with_capacity(lobbies.len());
        for lobby in lobbies {
            // A lobby deleted between list and count shows up as empty.
            let subscribers = match self.repo.get_or_create_stream(&lobby.id) {
                Ok(stream) => stream.subscriber_count().await.unwrap_or(0),
                Err(_) => 0,
            };
            summaries.push(LobbySummary {
                id: lobby.id,
                name: lobby.name,
                created: lobby.created,
                subscribers,
            });
        }
        summaries
    }

    /// Delete a lobby, closing its stream and ending every subscription.
    pub fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.repo.delete(id)?;
        debug!(id, "lobby deleted");
        Ok(())
    }

    /// Subscribe `conn` to a lobby and pump messages into it until the
    /// token is cancelled, the lobby is deleted, or delivery fails.
    ///
    /// The first delivered message is always a `Meta` announcement whose
    /// subscriber count includes this new subscriber. Each delivery gets
    /// [`DELIVERY_TIMEOUT`] to complete.
    pub async fn subscribe(
        &self,
        cancel: CancellationToken,
        id: &str,
        conn: &mut dyn Connection,
    ) -> Result<(), ServiceError> {
        let lobby = self.repo.get(id)?;
        let stream = self.repo.get_or_create_stream(id)?;
        let mut subscription = stream
            .subscribe()
            .await
            .map_err(|_| ServiceError::NotFound { id: id.to_owned() })?;

        let subscribers = stream.subscriber_count().await.unwrap_or(1);
        let meta = Message::Meta(MetaMessage {
            id: lobby.id,
            name: lobby.name,
            subscribers: i32::try_from(subscribers).unwrap_or(i32::MAX),
        });
        deliver(conn, &meta).await?;

        loop {
            tokio::select! {
                () = cancel.cancelled() => return Ok(()),
                message = subscription.recv() => match message {
                    Some(message) => deliver(conn, &message).await?,
                    // Stream closed: the lobby was deleted.
                    None => return Ok(()),
                },
            }
        }
    }

    /// Publish `content` to a lobby, best-effort.
    ///
    /// Waits for a rate-limit token first (process-wide bucket). An
    /// unknown lobby, a deleted lobby, or a cancelled wait is dropped
    /// silently; the caller never observes a publish failure.
    pub async fn publish(&self, cancel: &CancellationToken, id: &str, content: String) {
        if self.limiter.acquire(cancel).await.is_err() {
            debug!(id, "publish abandoned: cancelled while rate limited");
            return;
        }

        let stream = match self.repo.get_or_create_stream(id) {
            Ok(stream) => stream,
            Err(_) => {
                debug!(id, "publish dropped: unknown lobby");
                return;
            },
        };

        let message = Message::Text(TextMessage { content, created: Utc::now() });
        if stream.publish(message).await.is_err() {
            debug!(id, "publish dropped: lobby deleted");
        }
    }
}

async fn deliver(conn: &mut dyn Connection, message: &Message) -> Result<(), ServiceError> {
    match tokio::time::timeout(DELIVERY_TIMEOUT, conn.deliver(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(err.into()),
        Err(_) => Err(ServiceError::DeliveryTimeout),
    }
}
