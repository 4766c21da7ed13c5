//! TCP transport: tab-terminated binary frames.
//!
//! One task per connection reads command frames; a `JoinLobby` switches
//! the connection into push-receiving mode by spawning a subscription
//! task. Pushed `LobbyMessage` frames and synchronous command responses
//! share the outgoing socket behind a lock so frames never interleave.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::BytesMut;
use lobbyhub_core::{Connection, DeliveryError, LobbyService, Message};
use lobbyhub_proto::{Command, FRAME_TERMINATOR, LobbyRecord, Response, WireMessage};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ServerError;

/// The binary-protocol listener.
pub struct TcpServer {
    listener: TcpListener,
    service: Arc<LobbyService>,
}

impl TcpServer {
    /// Bind the listener.
    pub async fn bind(addr: &str, service: Arc<LobbyService>) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, service })
    }

    /// The bound address (useful when binding to port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the listener fails, one task per
    /// connection.
    pub async fn run(self) -> Result<(), ServerError> {
        info!(addr = %self.local_addr()?, "tcp server listening");
        loop {
            let (socket, peer) = self.listener.accept().await?;
            let service = self.service.clone();
            tokio::spawn(async move {
                debug!(%peer, "tcp connection opened");
                if let Err(err) = handle_connection(service, socket, peer).await {
                    debug!(%peer, %err, "tcp connection failed");
                }
                debug!(%peer, "tcp connection closed");
            });
        }
    }
}

/// Per-connection command loop.
///
/// Malformed frames are logged and skipped; the connection survives them.
/// EOF, a read error, or a write error ends the loop, which cancels any
/// active subscription.
async fn handle_connection(
    service: Arc<LobbyService>,
    socket: TcpStream,
    peer: SocketAddr,
) -> Result<(), ServerError> {
    let (read_half, write_half) = socket.into_split();
    let mut reader = BufReader::new(read_half);
    let writer = Arc::new(Mutex::new(write_half));

    // Parent token for everything spawned on behalf of this connection.
    let conn_cancel = CancellationToken::new();
    // Lobby joined by the most recent JoinLobby; publishes to the empty
    // id are dropped by the service, so no-join-yet needs no special case.
    let mut joined = String::new();
    let mut subscription: Option<CancellationToken> = None;

    let result = async {
        let mut frame = Vec::new();
        loop {
            frame.clear();
            let read = reader.read_until(FRAME_TERMINATOR, &mut frame).await?;
            if read == 0 {
                return Ok(());
            }

            let command = match Command::decode(&frame) {
                Ok(command) => command,
                Err(err) => {
                    warn!(%peer, %err, "skipping malformed frame");
                    continue;
                },
            };

            match command {
                Command::ClientError { detail } => {
                    warn!(%peer, detail, "client reported an error");
                },
                Command::ListLobbies => {
                    let records = service
                        .list()
                        .await
                        .into_iter()
                        .map(|summary| LobbyRecord {
                            id: summary.id,
                            name: summary.name,
                            created: summary.created,
                            subscribers: u32::try_from(summary.subscribers)
                                .unwrap_or(u32::MAX),
                        })
                        .collect();
                    write_frame(&writer, &Response::LobbyList(records)).await?;
                },
                Command::CreateLobby { name } => match service.create(&name) {
                    Ok(lobby) => {
                        write_frame(&writer, &Response::LobbyCreated { id: lobby.id }).await?;
                    },
                    Err(err) => warn!(%peer, %err, "create lobby rejected"),
                },
                Command::JoinLobby { id } => {
                    // A rejoin replaces the previous subscription.
                    if let Some(previous) = subscription.take() {
                        previous.cancel();
                    }
                    let cancel = conn_cancel.child_token();
                    subscription = Some(cancel.clone());
                    joined.clone_from(&id);

                    let service = service.clone();
                    let writer = writer.clone();
                    tokio::spawn(async move {
                        let mut conn = TcpConnection { writer };
                        if let Err(err) = service.subscribe(cancel, &id, &mut conn).await {
                            debug!(%peer, lobby = %id, %err, "subscription ended");
                        }
                    });
                },
                Command::SendMessage { payload } => {
                    service.publish(&conn_cancel, &joined, payload).await;
                },
            }
        }
    }
    .await;

    conn_cancel.cancel();
    result
}

/// Encode and write one response frame under the writer lock.
async fn write_frame(
    writer: &Mutex<OwnedWriteHalf>,
    response: &Response,
) -> Result<(), ServerError> {
    let mut frame = BytesMut::new();
    response.encode(&mut frame)?;

    let mut writer = writer.lock().await;
    writer.write_all(&frame).await?;
    Ok(())
}

/// Push side of a joined TCP connection.
struct TcpConnection {
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

#[async_trait]
impl Connection for TcpConnection {
    async fn deliver(&mut self, message: &Message) -> Result<(), DeliveryError> {
        let wire = match message {
            Message::Text(text) => WireMessage::Text {
                created: text.created,
                content: text.content.clone(),
            },
            Message::Meta(meta) => WireMessage::Meta {
                id: meta.id.clone(),
                name: meta.name.clone(),
                subscribers: meta.subscribers,
            },
        };

        write_frame(&self.writer, &Response::LobbyMessage(wire))
            .await
            .map_err(|err| DeliveryError::new(err.to_string()))
    }
}
