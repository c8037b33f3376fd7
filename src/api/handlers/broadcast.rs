//! Broadcast and close-all endpoint handlers.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{BroadcastRequest, BroadcastResponse, CloseAllRequest};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, WsError};
use crate::frame::OpCode;

/// `POST /broadcast/{kind}` — Send one frame to every handshaked client.
///
/// # Errors
///
/// Returns [`WsError::InvalidRequest`] for an unknown kind,
/// [`WsError::ControlPayloadTooLarge`] for a ping or pong payload over
/// 125 bytes and [`WsError::NotAccepting`] when the server is stopped.
#[utoipa::path(
    post,
    path = "/api/v1/broadcast/{kind}",
    tag = "Broadcast",
    summary = "Broadcast a frame",
    description = "Frames the payload as text, binary, ping or pong and queues it for every handshaked session. Ping and pong payloads are limited to 125 bytes.",
    params(
        ("kind" = String, Path, description = "One of `text`, `binary`, `ping`, `pong`"),
    ),
    request_body = BroadcastRequest,
    responses(
        (status = 200, description = "Frame queued", body = BroadcastResponse),
        (status = 400, description = "Unknown frame kind or oversized control payload", body = ErrorResponse),
        (status = 503, description = "Server not accepting", body = ErrorResponse),
    )
)]
pub async fn broadcast_frame(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(req): Json<BroadcastRequest>,
) -> Result<impl IntoResponse, WsError> {
    let server = &state.server;
    let (opcode, delivered) = match kind.as_str() {
        "text" => (OpCode::Text, server.multicast_text(&req.payload)?),
        "binary" => (OpCode::Binary, server.multicast_binary(&req.payload)?),
        "ping" => (OpCode::Ping, server.send_ping(&req.payload)?),
        "pong" => (OpCode::Pong, server.send_pong(&req.payload)?),
        other => {
            return Err(WsError::InvalidRequest(format!(
                "unknown frame kind `{other}`"
            )));
        }
    };

    Ok(Json(BroadcastResponse {
        opcode: opcode.to_string(),
        delivered,
    }))
}

/// `POST /close-all` — Send CLOSE to every client, then disconnect all.
///
/// # Errors
///
/// Returns [`WsError::NotAccepting`] when the server is stopped.
#[utoipa::path(
    post,
    path = "/api/v1/close-all",
    tag = "Broadcast",
    summary = "Close every connection",
    description = "Broadcasts a CLOSE frame with the given status code, then tears down every connection.",
    request_body = CloseAllRequest,
    responses(
        (status = 200, description = "Close frame queued and connections severed", body = BroadcastResponse),
        (status = 503, description = "Server not accepting", body = ErrorResponse),
    )
)]
pub async fn close_all(
    State(state): State<AppState>,
    Json(req): Json<CloseAllRequest>,
) -> Result<impl IntoResponse, WsError> {
    let delivered = state.server.close_all(req.status)?;
    Ok(Json(BroadcastResponse {
        opcode: OpCode::Close.to_string(),
        delivered,
    }))
}

/// Broadcast routes mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/broadcast/{kind}", post(broadcast_frame))
        .route("/close-all", post(close_all))
}
