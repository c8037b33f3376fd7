//! Session listing and lifecycle endpoints.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{LifecycleResponse, SessionSummaryDto, SessionsResponse};
use crate::app_state::AppState;

/// `GET /sessions` — Registered sessions and accepting state.
#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    tag = "Server",
    summary = "List sessions",
    responses(
        (status = 200, description = "Current sessions", body = SessionsResponse),
    )
)]
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let mut sessions: Vec<SessionSummaryDto> = state
        .server
        .sessions()
        .iter()
        .map(|s| SessionSummaryDto {
            id: s.id(),
            handshaked: s.is_handshaked(),
            connected_at: s.connected_at(),
        })
        .collect();
    sessions.sort_by_key(|s| s.connected_at);

    Json(SessionsResponse {
        total: sessions.len(),
        handshaked: sessions.iter().filter(|s| s.handshaked).count(),
        accepting: state.server.is_accepting(),
        sessions,
    })
}

/// `POST /server/start` — Start accepting connections.
#[utoipa::path(
    post,
    path = "/api/v1/server/start",
    tag = "Server",
    summary = "Start accepting",
    responses(
        (status = 200, description = "Server accepting", body = LifecycleResponse),
    )
)]
pub async fn start_server(State(state): State<AppState>) -> impl IntoResponse {
    let changed = state.server.start();
    Json(LifecycleResponse {
        accepting: state.server.is_accepting(),
        changed,
    })
}

/// `POST /server/stop` — Stop accepting and disconnect every client.
#[utoipa::path(
    post,
    path = "/api/v1/server/stop",
    tag = "Server",
    summary = "Stop accepting",
    description = "Stops accepting new connections and severs existing ones without a CLOSE frame.",
    responses(
        (status = 200, description = "Server stopped", body = LifecycleResponse),
    )
)]
pub async fn stop_server(State(state): State<AppState>) -> impl IntoResponse {
    let changed = state.server.stop();
    Json(LifecycleResponse {
        accepting: state.server.is_accepting(),
        changed,
    })
}

/// Session and lifecycle routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(list_sessions))
        .route("/server/start", post(start_server))
        .route("/server/stop", post(stop_server))
}
