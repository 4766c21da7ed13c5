//! Lobby and broadcast engine for the lobbyhub masterserver.
//!
//! This crate is transport-agnostic: it owns lobby identity, per-lobby
//! message streams, and the service facade the transports call into.
//! Transports (TCP, HTTP/WebSocket) plug in through the [`Connection`]
//! trait, a single `deliver` seam the service pushes messages through.
//!
//! # Components
//!
//! - [`LobbyStream`]: per-lobby broadcast hub. One dispatch task owns the
//!   bounded history and the subscriber set; publishes and subscriptions
//!   are serialized through it, so every subscriber observes the same
//!   total message order.
//! - [`LobbyRepo`] / [`InMemoryRepo`]: authoritative lobby map plus the
//!   lazily-created 1:1 stream registry.
//! - [`TokenBucket`]: publish rate limiter (burst 8, one token per 100ms).
//! - [`LobbyService`]: the facade with the five operations every transport
//!   consumes — create, list, delete, subscribe, publish.

mod connection;
mod limiter;
mod message;
mod repo;
mod service;
mod stream;

pub use connection::{Connection, DeliveryError};
pub use limiter::{AcquireCancelled, TokenBucket};
pub use message::{Lobby, LobbySummary, Message, MetaMessage, TextMessage};
pub use repo::{InMemoryRepo, LobbyRepo, NewLobby, RepoError};
pub use service::{DELIVERY_TIMEOUT, LobbyService, PUBLISH_BURST, PUBLISH_REFILL, ServiceError};
pub use stream::{HISTORY_SIZE, LobbyStream, StreamError, SUBSCRIBER_BUFFER, Subscription};
