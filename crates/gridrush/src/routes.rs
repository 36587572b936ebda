//! HTTP surface: router, shared state, and the lobby probes.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use gridrush_protocol::RoomId;
use gridrush_room::RoomManager;
use gridrush_session::Authenticator;
use gridrush_tick::RoundSchedule;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::ServerConfig;
use crate::endpoint::websocket_endpoint;

/// Shared state behind every handler: the room directory (read-only after
/// startup), the authenticator, and the startup configuration.
pub struct AppState<A: Authenticator> {
    pub rooms: RoomManager,
    pub auth: A,
    pub config: ServerConfig,
}

/// Builds the room directory from the configuration and wraps everything
/// for the router.
pub fn build_state<A: Authenticator>(config: ServerConfig, auth: A) -> Arc<AppState<A>> {
    let mut rooms = RoomManager::new();
    for id in &config.room_ids {
        rooms.create_room(
            RoomId::new(id.clone()),
            config.arena_config(),
            RoundSchedule::default(),
        );
    }
    Arc::new(AppState {
        rooms,
        auth,
        config,
    })
}

/// The full route table.
pub fn router<A: Authenticator>(state: Arc<AppState<A>>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/game/ws", get(websocket_endpoint::<A>))
        .route("/v1/game/ws-url", get(ws_url::<A>))
        .route("/v1/game/room-status", get(room_status::<A>))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Advertises where the WebSocket endpoint lives. Lobby clients depend on
/// this URL shape staying stable.
async fn ws_url<A: Authenticator>(State(state): State<Arc<AppState<A>>>) -> Json<serde_json::Value> {
    Json(json!({ "url": state.config.ws_url() }))
}

#[derive(Debug, Deserialize)]
struct RoomStatusQuery {
    #[serde(rename = "roomId")]
    room_id: String,
}

/// `GET /v1/game/room-status?roomId=<id>` — current phase and the next
/// seating time in ms, for lobby UIs.
async fn room_status<A: Authenticator>(
    State(state): State<Arc<AppState<A>>>,
    Query(query): Query<RoomStatusQuery>,
) -> Response {
    match state.rooms.get(&RoomId::new(query.room_id)) {
        Some(room) => Json(room.status()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "unknown room" })),
        )
            .into_response(),
    }
}
