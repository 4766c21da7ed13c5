//! End-to-end tests for the binary TCP protocol.
//!
//! Each test starts a real listener on port 0 and drives it with raw
//! sockets through the `lobbyhub-proto` codec, the same way an external
//! client would.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use lobbyhub_core::{InMemoryRepo, LobbyService};
use lobbyhub_proto::{Command, FRAME_TERMINATOR, Response, WireMessage};
use lobbyhub_server::tcp::TcpServer;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

async fn start_server() -> SocketAddr {
    let service = Arc::new(LobbyService::new(Arc::new(InMemoryRepo::new())));
    let server = TcpServer::bind("127.0.0.1:0", service).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());
    addr
}

struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let socket = TcpStream::connect(addr).await.unwrap();
        let (read_half, writer) = socket.into_split();
        Self { reader: BufReader::new(read_half), writer }
    }

    async fn send(&mut self, command: &Command) {
        let mut frame = Vec::new();
        command.encode(&mut frame);
        self.writer.write_all(&frame).await.unwrap();
    }

    async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
    }

    async fn recv(&mut self) -> Response {
        let mut frame = Vec::new();
        let read = timeout(
            Duration::from_secs(5),
            self.reader.read_until(FRAME_TERMINATOR, &mut frame),
        )
        .await
        .expect("timed out waiting for a frame")
        .unwrap();
        assert_ne!(read, 0, "server closed the connection");
        Response::decode(&frame).unwrap()
    }

    /// Create a lobby and return its id.
    async fn create_lobby(&mut self, name: &str) -> String {
        self.send(&Command::CreateLobby { name: name.to_owned() }).await;
        match self.recv().await {
            Response::LobbyCreated { id } => id,
            other => panic!("expected LobbyCreated, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn create_then_list_round_trip() {
    let addr = start_server().await;
    let mut client = Client::connect(addr).await;

    let id = client.create_lobby("arena one").await;

    client.send(&Command::ListLobbies).await;
    match client.recv().await {
        Response::LobbyList(records) => {
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].id, id);
            assert_eq!(records[0].name, "arena one");
            assert_eq!(records[0].subscribers, 0);
        },
        other => panic!("expected LobbyList, got {other:?}"),
    }
}

#[tokio::test]
async fn join_gets_meta_then_broadcasts() {
    let addr = start_server().await;
    let mut client = Client::connect(addr).await;

    let id = client.create_lobby("arena").await;
    client.send(&Command::JoinLobby { id: id.clone() }).await;

    match client.recv().await {
        Response::LobbyMessage(WireMessage::Meta { id: meta_id, name, subscribers }) => {
            assert_eq!(meta_id, id);
            assert_eq!(name, "arena");
            assert_eq!(subscribers, 1);
        },
        other => panic!("expected meta announcement, got {other:?}"),
    }

    client.send(&Command::SendMessage { payload: "ready up".to_owned() }).await;
    match client.recv().await {
        Response::LobbyMessage(WireMessage::Text { content, .. }) => {
            assert_eq!(content, "ready up");
        },
        other => panic!("expected text broadcast, got {other:?}"),
    }
}

#[tokio::test]
async fn late_joiner_replays_history_in_order() {
    let addr = start_server().await;
    let mut publisher = Client::connect(addr).await;

    let id = publisher.create_lobby("arena").await;
    publisher.send(&Command::JoinLobby { id: id.clone() }).await;
    let _meta = publisher.recv().await;

    for i in 0..3 {
        publisher.send(&Command::SendMessage { payload: format!("msg-{i}") }).await;
        let _echo = publisher.recv().await;
    }

    let mut joiner = Client::connect(addr).await;
    joiner.send(&Command::JoinLobby { id: id.clone() }).await;

    match joiner.recv().await {
        Response::LobbyMessage(WireMessage::Meta { subscribers, .. }) => {
            assert_eq!(subscribers, 2);
        },
        other => panic!("expected meta announcement, got {other:?}"),
    }
    for i in 0..3 {
        match joiner.recv().await {
            Response::LobbyMessage(WireMessage::Text { content, .. }) => {
                assert_eq!(content, format!("msg-{i}"));
            },
            other => panic!("expected replayed text, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn broadcast_reaches_every_subscriber() {
    let addr = start_server().await;
    let mut sender = Client::connect(addr).await;
    let id = sender.create_lobby("arena").await;

    sender.send(&Command::JoinLobby { id: id.clone() }).await;
    let _meta = sender.recv().await;

    let mut listener = Client::connect(addr).await;
    listener.send(&Command::JoinLobby { id: id.clone() }).await;
    let _meta = listener.recv().await;

    sender.send(&Command::SendMessage { payload: "hello all".to_owned() }).await;

    for client in [&mut sender, &mut listener] {
        match client.recv().await {
            Response::LobbyMessage(WireMessage::Text { content, .. }) => {
                assert_eq!(content, "hello all");
            },
            other => panic!("expected broadcast, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn malformed_frame_is_skipped_and_connection_survives() {
    let addr = start_server().await;
    let mut client = Client::connect(addr).await;

    // Unknown tag 0xFF, then a valid command on the same connection.
    client.send_raw(&[0xFF, b'j', b'u', b'n', b'k', FRAME_TERMINATOR]).await;
    client.send(&Command::ListLobbies).await;

    match client.recv().await {
        Response::LobbyList(records) => assert!(records.is_empty()),
        other => panic!("expected LobbyList, got {other:?}"),
    }
}

#[tokio::test]
async fn send_before_join_is_dropped() {
    let addr = start_server().await;
    let mut client = Client::connect(addr).await;

    client.send(&Command::SendMessage { payload: "into the void".to_owned() }).await;

    // The connection is still serving commands.
    client.send(&Command::ListLobbies).await;
    assert!(matches!(client.recv().await, Response::LobbyList(_)));
}

#[tokio::test]
async fn join_unknown_lobby_yields_no_push() {
    let addr = start_server().await;
    let mut client = Client::connect(addr).await;

    client.send(&Command::JoinLobby { id: "no-such-lobby".to_owned() }).await;
    client.send(&Command::ListLobbies).await;

    // No meta announcement arrives for the failed join; the next frame is
    // the list response.
    assert!(matches!(client.recv().await, Response::LobbyList(_)));
}
