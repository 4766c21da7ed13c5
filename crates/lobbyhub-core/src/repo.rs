//! Lobby store: the authoritative lobby map plus its stream registry.
//!
//! Streams are created lazily and live 1:1 with lobbies; deleting a lobby
//! closes its stream, which terminates every active subscription.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::message::Lobby;
use crate::stream::LobbyStream;

/// Errors from store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    /// No lobby with the given id.
    #[error("unknown lobby: {id}")]
    NotFound {
        /// The id that was looked up
        id: String,
    },
}

/// Parameters for creating a lobby. The store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewLobby {
    /// Display name (validated by the service before it reaches the store)
    pub name: String,
}

/// Storage seam for lobbies.
///
/// All methods are synchronous; implementations must not block. The
/// in-memory implementation is the only one, but the seam keeps the
/// service testable against a stub store.
pub trait LobbyRepo: Send + Sync {
    /// Store a new lobby, assigning a fresh id, and return it.
    fn add(&self, new: NewLobby) -> Lobby;

    /// Look a lobby up by id.
    fn get(&self, id: &str) -> Result<Lobby, RepoError>;

    /// All lobbies, in no particular order.
    fn list(&self) -> Vec<Lobby>;

    /// Remove a lobby and close its stream.
    fn delete(&self, id: &str) -> Result<(), RepoError>;

    /// The lobby's broadcast stream, created on first use.
    fn get_or_create_stream(&self, id: &str) -> Result<Arc<LobbyStream>, RepoError>;
}

#[derive(Debug, Default)]
struct Inner {
    lobbies: HashMap<String, Lobby>,
    streams: HashMap<String, Arc<LobbyStream>>,
}

/// In-memory lobby store. All state is process-local and lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryRepo {
    inner: Mutex<Inner>,
}

impl InMemoryRepo {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means another thread panicked mid-update;
        // the maps are still structurally valid.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl LobbyRepo for InMemoryRepo {
    fn add(&self, new: NewLobby) -> Lobby {
        let lobby =
            Lobby { id: Uuid::new_v4().to_string(), name: new.name, created: Utc::now() };
        self.lock().lobbies.insert(lobby.id.clone(), lobby.clone());
        lobby
    }

    fn get(&self, id: &str) -> Result<Lobby, RepoError> {
        self.lock().lobbies.get(id).cloned().ok_or_else(|| RepoError::NotFound { id: id.to_owned() })
    }

    fn list(&self) -> Vec<Lobby> {
        self.lock().lobbies.values().cloned().collect()
    }

    fn delete(&self, id: &str) -> Result<(), RepoError> {
        let mut inner = self.lock();
        if inner.lobbies.remove(id).is_none() {
            return Err(RepoError::NotFound { id: id.to_owned() });
        }
        if let Some(stream) = inner.streams.remove(id) {
            stream.close();
        }
        Ok(())
    }

    fn get_or_create_stream(&self, id: &str) -> Result<Arc<LobbyStream>, RepoError> {
        let mut inner = self.lock();
        if !inner.lobbies.contains_key(id) {
            return Err(RepoError::NotFound { id: id.to_owned() });
        }
        let stream = match inner.streams.entry(id.to_owned()) {
            Entry::Occupied(occupied) => occupied.get().clone(),
            Entry::Vacant(vacant) => vacant.insert(Arc::new(LobbyStream::new())).clone(),
        };
        Ok(stream)
    }
}
