use crate::config::RelayConfig;
use crate::signaling::{SignalingRouter, SignalingService, ws_handler};
use anyhow::{Context, Result};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Shared handles behind every route.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub signaling: SignalingService,
    pub router: SignalingRouter,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Self {
        let signaling = SignalingService::new(config.ice_servers.clone(), config.outbox_capacity);
        let router = SignalingRouter::new(Arc::new(signaling.clone()));
        Self {
            config: Arc::new(config),
            signaling,
            router,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health))
        .route("/rooms/live", get(live_rooms))
        .route(&state.config.ws_path, get(ws_handler))
        .layer(cors)
        .with_state(state)
}

async fn health() -> &'static str {
    "Backend OK!"
}

async fn live_rooms(State(state): State<AppState>) -> Json<Vec<String>> {
    let mut rooms: Vec<String> = state
        .router
        .registry()
        .list_live_rooms()
        .into_iter()
        .map(String::from)
        .collect();
    rooms.sort();
    Json(rooms)
}

/// Binds `config.bind_addr` and serves until the process stops.
pub async fn serve(config: RelayConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    serve_listener(listener, AppState::new(config)).await
}

/// Serves on an already bound listener.
pub async fn serve_listener(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr().context("Listener has no local address")?;
    info!(
        "Relay listening on http://{} (WebSocket at {})",
        addr, state.config.ws_path
    );

    axum::serve(listener, build_router(state))
        .await
        .context("Relay server stopped")
}
