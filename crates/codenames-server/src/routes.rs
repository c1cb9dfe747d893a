use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::{debug, warn};

use codenames_core::protocol::StatsResponse;

use crate::state::AppState;
use crate::ws;

// ── Health ──────────────────────────────────────────────────────────────

pub async fn health() -> &'static str {
    "ok"
}

/// Keep-alive endpoint for hosting platforms that idle out quiet servers.
pub async fn ping() -> &'static str {
    debug!("ping");
    "pong"
}

// ── Stats ───────────────────────────────────────────────────────────────

pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let hub = state.hub.lock().await;
    Json(StatsResponse {
        players: hub.player_count(),
        rooms: hub.room_count(),
        connections: state.connections.len(),
    })
}

// ── WebSocket upgrade ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

pub async fn ws_upgrade(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, StatusCode> {
    let Some(slot) = state.try_reserve_slot() else {
        warn!(max = state.config.max_connections, "refusing websocket upgrade");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    Ok(ws.on_upgrade(move |socket| ws::handle_socket(state, slot, socket, query.session_id)))
}
