//! Lobbyhub server binary.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: HTTP on :3000, TCP on :3001
//! lobbyhub-server
//!
//! # Custom binds and verbose logging
//! lobbyhub-server --http-bind 127.0.0.1:8080 --tcp-bind 127.0.0.1:8081 --log-level debug
//! ```

use std::sync::Arc;

use clap::Parser;
use lobbyhub_core::{InMemoryRepo, LobbyService};
use lobbyhub_server::http;
use lobbyhub_server::tcp::TcpServer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Lobby masterserver
#[derive(Parser, Debug)]
#[command(name = "lobbyhub-server")]
#[command(about = "Lobby masterserver: TCP and HTTP/WebSocket transports")]
#[command(version)]
struct Args {
    /// Address for the HTTP/WebSocket listener
    #[arg(long, default_value = "0.0.0.0:3000")]
    http_bind: String,

    /// Address for the binary TCP listener
    #[arg(long, default_value = "0.0.0.0:3001")]
    tcp_bind: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("lobbyhub server starting");

    let service = Arc::new(LobbyService::new(Arc::new(InMemoryRepo::new())));

    let tcp = TcpServer::bind(&args.tcp_bind, service.clone()).await?;
    tracing::info!("tcp listening on {}", tcp.local_addr()?);

    let http_listener = tokio::net::TcpListener::bind(&args.http_bind).await?;
    tracing::info!("http listening on {}", http_listener.local_addr()?);
    let app = http::router(service);

    // Both transports share one service; either failing takes the
    // process down.
    tokio::select! {
        result = tcp.run() => result?,
        result = axum::serve(http_listener, app) => result?,
    }

    Ok(())
}
