//! Per-lobby broadcast hub.
//!
//! Each lobby owns one `LobbyStream`: a handle to a dispatch task that has
//! exclusive ownership of the message history and the subscriber set. All
//! mutations flow through the task's command channel, so publishes to one
//! lobby are totally ordered and a subscriber joining mid-publish receives
//! each message exactly once — via history replay or live delivery, never
//! both.
//!
//! Fan-out is a blocking `send` per subscriber sink: one full sink stalls
//! delivery to the lobby's remaining subscribers (and the publisher) until
//! it drains or its subscription is dropped. This mirrors the dispatch
//! behavior the protocol was built around; see `DESIGN.md` for the
//! trade-off discussion.

use std::collections::{HashMap, VecDeque};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::message::Message;

/// Maximum number of messages retained for replay to late joiners.
pub const HISTORY_SIZE: usize = 10;

/// Buffered capacity of each subscriber sink.
pub const SUBSCRIBER_BUFFER: usize = 20;

/// Errors from stream operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    /// The stream's dispatch task has shut down (lobby deleted).
    #[error("lobby stream closed")]
    Closed,
}

/// Commands processed by the dispatch task.
enum Command {
    Publish { message: Message, done: oneshot::Sender<()> },
    Subscribe { reply: oneshot::Sender<(u64, mpsc::Receiver<Message>)> },
    Unsubscribe(u64),
    Count { reply: oneshot::Sender<usize> },
    Close,
}

/// Handle to one lobby's broadcast stream.
///
/// Cheap to clone via `Arc` (the repo hands out `Arc<LobbyStream>`).
/// Dropping the last handle shuts the dispatch task down; [`close`]
/// shuts it down eagerly and releases every subscriber sink.
///
/// [`close`]: LobbyStream::close
#[derive(Debug)]
pub struct LobbyStream {
    commands: mpsc::UnboundedSender<Command>,
}

impl LobbyStream {
    /// Create a stream and spawn its dispatch task.
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn new() -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        tokio::spawn(dispatch(command_rx));
        Self { commands }
    }

    /// Publish a message: append it to history (evicting the oldest entry
    /// at capacity), then deliver it to every current subscriber.
    ///
    /// Completes once fan-out has finished, which means a full subscriber
    /// sink blocks the publisher too (see module docs).
    pub async fn publish(&self, message: Message) -> Result<(), StreamError> {
        let (done, done_rx) = oneshot::channel();
        self.commands
            .send(Command::Publish { message, done })
            .map_err(|_| StreamError::Closed)?;
        done_rx.await.map_err(|_| StreamError::Closed)
    }

    /// Subscribe to the stream.
    ///
    /// The returned subscription's sink is seeded with the full current
    /// history, in publish order, before any live message. Dropping the
    /// subscription deregisters the sink exactly once.
    pub async fn subscribe(&self) -> Result<Subscription, StreamError> {
        let (reply, reply_rx) = oneshot::channel();
        self.commands.send(Command::Subscribe { reply }).map_err(|_| StreamError::Closed)?;
        let (id, receiver) = reply_rx.await.map_err(|_| StreamError::Closed)?;

        Ok(Subscription { id, receiver, commands: self.commands.clone() })
    }

    /// Current subscriber count (best-effort snapshot).
    pub async fn subscriber_count(&self) -> Result<usize, StreamError> {
        let (reply, reply_rx) = oneshot::channel();
        self.commands.send(Command::Count { reply }).map_err(|_| StreamError::Closed)?;
        reply_rx.await.map_err(|_| StreamError::Closed)
    }

    /// Shut the stream down: stop the dispatch task and drop every
    /// subscriber sink, so all subscriptions terminate deterministically.
    ///
    /// Idempotent; operations after close fail with [`StreamError::Closed`].
    pub fn close(&self) {
        let _ = self.commands.send(Command::Close);
    }
}

impl Default for LobbyStream {
    fn default() -> Self {
        Self::new()
    }
}

/// A live subscription to one lobby's stream.
///
/// Dropping the subscription deregisters its sink from the stream. The
/// stream closing (lobby deletion) ends the subscription from the other
/// side: [`recv`] returns `None`.
///
/// [`recv`]: Subscription::recv
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    receiver: mpsc::Receiver<Message>,
    commands: mpsc::UnboundedSender<Command>,
}

impl Subscription {
    /// Receive the next message. `None` once the stream has closed.
    ///
    /// Cancel-safe: a cancelled `recv` loses no messages.
    pub async fn recv(&mut self) -> Option<Message> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Best effort: if the dispatch task is already gone there is
        // nothing left to deregister from.
        let _ = self.commands.send(Command::Unsubscribe(self.id));
    }
}

/// Dispatch loop: exclusive owner of history and subscriber set.
async fn dispatch(mut commands: mpsc::UnboundedReceiver<Command>) {
    let mut history: VecDeque<Message> = VecDeque::with_capacity(HISTORY_SIZE);
    let mut subscribers: HashMap<u64, mpsc::Sender<Message>> = HashMap::new();
    let mut next_id: u64 = 0;

    while let Some(command) = commands.recv().await {
        match command {
            Command::Publish { message, done } => {
                if history.len() == HISTORY_SIZE {
                    history.pop_front();
                }
                history.push_back(message.clone());

                let mut dropped = Vec::new();
                for (id, sink) in &subscribers {
                    // Blocking send: a full sink stalls the remaining
                    // deliveries until it drains or its receiver drops.
                    if sink.send(message.clone()).await.is_err() {
                        dropped.push(*id);
                    }
                }
                for id in dropped {
                    subscribers.remove(&id);
                }

                let _ = done.send(());
            },
            Command::Subscribe { reply } => {
                let (sink, receiver) = mpsc::channel(SUBSCRIBER_BUFFER);

                // SUBSCRIBER_BUFFER > HISTORY_SIZE, so replay never blocks.
                for message in &history {
                    if sink.send(message.clone()).await.is_err() {
                        break;
                    }
                }

                let id = next_id;
                next_id += 1;

                // Register only if the subscriber still wants the sink.
                if reply.send((id, receiver)).is_ok() {
                    subscribers.insert(id, sink);
                }
            },
            Command::Unsubscribe(id) => {
                subscribers.remove(&id);
            },
            Command::Count { reply } => {
                let _ = reply.send(subscribers.len());
            },
            Command::Close => break,
        }
    }
    // Dropping the subscriber map closes every sink, which terminates all
    // subscriptions.
}
