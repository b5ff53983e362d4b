use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::attachments::AttachmentStore;
use crate::config::ServerConfig;
use crate::connection;

/// Failures that stop the server from running at all.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to create reports directory {}: {source}", path.display())]
    CreateReportsDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<AttachmentStore>,
    pub active_connections: Arc<AtomicUsize>,
    pub max_message_size: usize,
}

impl AppState {
    pub fn new(store: AttachmentStore, max_message_size: usize) -> Self {
        Self {
            store: Arc::new(store),
            active_connections: Arc::new(AtomicUsize::new(0)),
            max_message_size,
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub connections: usize,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Create the reports directory, bind, and start serving in the background.
pub async fn start(config: ServerConfig) -> Result<ServerHandle, StartupError> {
    let store = AttachmentStore::init(&config.reports_dir, config.naming).map_err(|source| {
        StartupError::CreateReportsDir {
            path: config.reports_dir.clone(),
            source,
        }
    })?;
    let state = AppState::new(store, config.max_message_size);
    let active = Arc::clone(&state.active_connections);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.clone(),
            source,
        })?;
    let local_addr = listener
        .local_addr()
        .map_err(|source| StartupError::Bind { addr, source })?;

    tracing::info!(
        addr = %local_addr,
        reports_dir = %config.reports_dir.display(),
        "Navira ingest server started on ws://{local_addr}"
    );

    let router = build_router(state);
    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "Server stopped");
        }
    });

    Ok(ServerHandle {
        local_addr,
        active,
        _server: server,
    })
}

/// Handle returned by `start()`.
pub struct ServerHandle {
    pub local_addr: SocketAddr,
    active: Arc<AtomicUsize>,
    _server: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Connections currently being served.
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }
}

/// WebSocket upgrade handler.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.max_message_size(state.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    connection::run_connection(socket, state.store, state.active_connections).await;
}

/// Health check HTTP endpoint.
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connections: state.active_connections.load(Ordering::Relaxed),
    })
}
