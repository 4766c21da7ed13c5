//! End-to-end tests for the HTTP/JSON and WebSocket API.
//!
//! Each test serves the real router on port 0 and talks to it with
//! `reqwest` and `tokio-tungstenite`, exactly as an external client
//! would.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use lobbyhub_core::{InMemoryRepo, LobbyService};
use lobbyhub_server::dto::{LobbyDto, MessageDto};
use lobbyhub_server::http::router;
use reqwest::StatusCode;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

async fn start_server() -> SocketAddr {
    let service = Arc::new(LobbyService::new(Arc::new(InMemoryRepo::new())));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(service)).await.unwrap();
    });
    addr
}

async fn create_lobby(addr: SocketAddr, name: &str) -> String {
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/lobby"))
        .json(&serde_json::json!({ "name": name }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response.json::<String>().await.unwrap()
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn ws_connect(addr: SocketAddr, lobby_id: &str) -> WsStream {
    let (socket, _response) =
        connect_async(format!("ws://{addr}/lobby/{lobby_id}")).await.unwrap();
    socket
}

async fn ws_recv(socket: &mut WsStream) -> WsMessage {
    timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("timed out waiting for a websocket frame")
        .expect("websocket stream ended")
        .unwrap()
}

async fn ws_recv_dto(socket: &mut WsStream) -> MessageDto {
    match ws_recv(socket).await {
        WsMessage::Text(json) => serde_json::from_str(json.as_str()).unwrap(),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

#[tokio::test]
async fn create_then_list() {
    let addr = start_server().await;

    let id = create_lobby(addr, "general").await;

    let lobbies: Vec<LobbyDto> =
        reqwest::get(format!("http://{addr}/lobby")).await.unwrap().json().await.unwrap();
    assert_eq!(lobbies.len(), 1);
    assert_eq!(lobbies[0].id, id);
    assert_eq!(lobbies[0].name, "general");
    assert_eq!(lobbies[0].subscribers, 0);
}

#[tokio::test]
async fn create_with_blank_name_fails() {
    let addr = start_server().await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/lobby"))
        .json(&serde_json::json!({ "name": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn delete_removes_lobby() {
    let addr = start_server().await;
    let id = create_lobby(addr, "short lived").await;
    let client = reqwest::Client::new();

    let response = client.delete(format!("http://{addr}/lobby/{id}")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client.delete(format!("http://{addr}/lobby/{id}")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let lobbies: Vec<LobbyDto> =
        reqwest::get(format!("http://{addr}/lobby")).await.unwrap().json().await.unwrap();
    assert!(lobbies.is_empty());
}

#[tokio::test]
async fn publish_is_accepted_even_for_unknown_lobby() {
    let addr = start_server().await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/lobby/no-such-lobby"))
        .body("anyone there?")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn oversized_publish_body_is_rejected() {
    let addr = start_server().await;
    let id = create_lobby(addr, "general").await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/lobby/{id}"))
        .body("x".repeat(9 * 1024))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn subscriber_gets_meta_then_published_messages() {
    let addr = start_server().await;
    let id = create_lobby(addr, "general").await;

    let mut socket = ws_connect(addr, &id).await;

    let meta = ws_recv_dto(&mut socket).await;
    assert_eq!(meta.kind, "meta");
    let meta_body = meta.meta.unwrap();
    assert_eq!(meta_body.id, id);
    assert_eq!(meta_body.name, "general");
    assert_eq!(meta_body.subscribers, 1);

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/lobby/{id}"))
        .body("hello from http")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let message = ws_recv_dto(&mut socket).await;
    assert_eq!(message.kind, "text");
    assert_eq!(message.text.unwrap().content, "hello from http");
}

#[tokio::test]
async fn list_counts_live_websocket_subscribers() {
    let addr = start_server().await;
    let id = create_lobby(addr, "general").await;

    let mut first = ws_connect(addr, &id).await;
    let _meta = ws_recv_dto(&mut first).await;
    let mut second = ws_connect(addr, &id).await;
    let _meta = ws_recv_dto(&mut second).await;

    let lobbies: Vec<LobbyDto> =
        reqwest::get(format!("http://{addr}/lobby")).await.unwrap().json().await.unwrap();
    assert_eq!(lobbies[0].subscribers, 2);
}

#[tokio::test]
async fn delete_while_subscribed_closes_the_socket() {
    let addr = start_server().await;
    let id = create_lobby(addr, "doomed").await;

    let mut socket = ws_connect(addr, &id).await;
    let _meta = ws_recv_dto(&mut socket).await;

    let response =
        reqwest::Client::new().delete(format!("http://{addr}/lobby/{id}")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    match ws_recv(&mut socket).await {
        WsMessage::Close(Some(frame)) => assert_eq!(frame.code, CloseCode::Normal),
        other => panic!("expected a close frame, got {other:?}"),
    }
}

#[tokio::test]
async fn subscribing_to_unknown_lobby_is_refused() {
    let addr = start_server().await;

    let mut socket = ws_connect(addr, "no-such-lobby").await;
    match ws_recv(&mut socket).await {
        WsMessage::Close(Some(frame)) => assert_eq!(frame.code, CloseCode::Policy),
        other => panic!("expected a close frame, got {other:?}"),
    }
}

#[tokio::test]
async fn history_replays_to_late_websocket_joiners() {
    let addr = start_server().await;
    let id = create_lobby(addr, "general").await;
    let client = reqwest::Client::new();

    for i in 0..3 {
        let response = client
            .post(format!("http://{addr}/lobby/{id}"))
            .body(format!("msg-{i}"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    let mut socket = ws_connect(addr, &id).await;
    let meta = ws_recv_dto(&mut socket).await;
    assert_eq!(meta.kind, "meta");

    for i in 0..3 {
        let message = ws_recv_dto(&mut socket).await;
        assert_eq!(message.text.unwrap().content, format!("msg-{i}"));
    }
}
