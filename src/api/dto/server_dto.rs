//! Server lifecycle and session DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::session::SessionId;

/// One registered session in `GET /sessions`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionSummaryDto {
    /// Session identifier.
    #[schema(value_type = String, format = Uuid)]
    pub id: SessionId,
    /// Whether the upgrade handshake has completed.
    pub handshaked: bool,
    /// When the socket was accepted.
    pub connected_at: DateTime<Utc>,
}

/// Response body for `GET /sessions`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionsResponse {
    /// Registered sessions, including those still in the handshake.
    pub total: usize,
    /// Sessions eligible for broadcasts.
    pub handshaked: usize,
    /// Whether the server is accepting connections.
    pub accepting: bool,
    /// Every registered session, oldest first.
    pub sessions: Vec<SessionSummaryDto>,
}

/// Response body for `POST /server/start` and `POST /server/stop`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LifecycleResponse {
    /// Accepting state after the call.
    pub accepting: bool,
    /// `false` if the server was already in the requested state.
    pub changed: bool,
}
