//! HTTP/JSON and WebSocket transport.
//!
//! Routes:
//!
//! - `GET /lobby` — list lobbies with live subscriber counts
//! - `POST /lobby` — create a lobby, returns its id
//! - `GET /lobby/{lobby_id}` — WebSocket upgrade, subscribes to the lobby
//! - `POST /lobby/{lobby_id}` — publish the raw body to the lobby
//! - `DELETE /lobby/{lobby_id}` — delete the lobby

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message as WsMessage, WebSocket};
use axum::extract::{DefaultBodyLimit, Path, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use lobbyhub_core::{Connection, DeliveryError, LobbyService, Message, ServiceError};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::dto::{CreateLobbyRequest, LobbyDto, MessageDto};

/// Largest accepted publish body.
const MAX_PUBLISH_BYTES: usize = 8 * 1024;

/// WebSocket close code for normal shutdown (lobby deleted).
const CLOSE_NORMAL: u16 = 1000;
/// WebSocket close code for a rejected or too-slow subscriber.
const CLOSE_POLICY: u16 = 1008;
/// WebSocket close code for internal failures.
const CLOSE_ERROR: u16 = 1011;

/// Build the HTTP router over a shared lobby service.
pub fn router(service: Arc<LobbyService>) -> Router {
    Router::new()
        .route("/lobby", get(list_lobbies).post(create_lobby))
        .route(
            "/lobby/{lobby_id}",
            get(join_lobby).post(publish_message).delete(delete_lobby),
        )
        .layer(DefaultBodyLimit::max(MAX_PUBLISH_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn list_lobbies(State(service): State<Arc<LobbyService>>) -> Json<Vec<LobbyDto>> {
    Json(service.list().await.into_iter().map(LobbyDto::from).collect())
}

async fn create_lobby(
    State(service): State<Arc<LobbyService>>,
    Json(request): Json<CreateLobbyRequest>,
) -> Response {
    match service.create(&request.name) {
        Ok(lobby) => Json(lobby.id).into_response(),
        Err(err) => {
            error!(%err, "create lobby failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        },
    }
}

async fn delete_lobby(
    State(service): State<Arc<LobbyService>>,
    Path(lobby_id): Path<String>,
) -> StatusCode {
    match service.delete(&lobby_id) {
        Ok(()) => StatusCode::OK,
        Err(ServiceError::NotFound { .. }) => StatusCode::NOT_FOUND,
        Err(err) => {
            error!(%err, "delete lobby failed");
            StatusCode::INTERNAL_SERVER_ERROR
        },
    }
}

/// Publish is fire-and-forget from the client's point of view: the
/// handler waits for a rate-limit token (backpressure) but always
/// answers 202, even for an unknown lobby.
async fn publish_message(
    State(service): State<Arc<LobbyService>>,
    Path(lobby_id): Path<String>,
    body: String,
) -> StatusCode {
    service.publish(&CancellationToken::new(), &lobby_id, body).await;
    StatusCode::ACCEPTED
}

async fn join_lobby(
    State(service): State<Arc<LobbyService>>,
    Path(lobby_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(service, lobby_id, socket))
}

async fn handle_socket(service: Arc<LobbyService>, lobby_id: String, socket: WebSocket) {
    let (sink, mut stream) = socket.split();
    let cancel = CancellationToken::new();

    // Inbound frames are ignored; the read side only detects disconnect.
    let reader = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            while let Some(Ok(_)) = stream.next().await {}
            cancel.cancel();
        })
    };

    let mut conn = WsConnection { sink };
    let result = service.subscribe(cancel.clone(), &lobby_id, &mut conn).await;
    cancel.cancel();

    let close = match result {
        // Lobby deleted, or the client hung up.
        Ok(()) => Some((CLOSE_NORMAL, "lobby closed")),
        Err(ServiceError::NotFound { .. }) => Some((CLOSE_POLICY, "unknown lobby")),
        Err(ServiceError::DeliveryTimeout) => Some((CLOSE_POLICY, "subscriber too slow")),
        // The socket is already unusable; nothing to say goodbye on.
        Err(ServiceError::Delivery(_)) => None,
        Err(err) => {
            error!(lobby = %lobby_id, %err, "subscription failed");
            Some((CLOSE_ERROR, "internal error"))
        },
    };

    if let Some((code, reason)) = close {
        let frame = CloseFrame { code, reason: reason.into() };
        if let Err(err) = conn.sink.send(WsMessage::Close(Some(frame))).await {
            debug!(lobby = %lobby_id, %err, "websocket close failed");
        }
    }

    reader.abort();
}

/// Push side of a WebSocket subscription: one JSON text frame per
/// message.
struct WsConnection {
    sink: SplitSink<WebSocket, WsMessage>,
}

#[async_trait::async_trait]
impl Connection for WsConnection {
    async fn deliver(&mut self, message: &Message) -> Result<(), DeliveryError> {
        let json = serde_json::to_string(&MessageDto::from(message))
            .map_err(|err| DeliveryError::new(err.to_string()))?;
        self.sink
            .send(WsMessage::Text(json.into()))
            .await
            .map_err(|err| DeliveryError::new(err.to_string()))
    }
}
