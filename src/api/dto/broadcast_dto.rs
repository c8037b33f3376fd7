//! Broadcast and close DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::frame::CloseCode;

/// Request body for `POST /broadcast/{kind}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BroadcastRequest {
    /// Payload sent as its UTF-8 bytes. Empty sends an empty frame.
    #[serde(default)]
    pub payload: String,
}

/// Response body for broadcast and close endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BroadcastResponse {
    /// Frame kind that was sent (`text`, `binary`, `ping`, `pong`, `close`).
    pub opcode: String,
    /// Number of sessions the frame was handed to.
    pub delivered: usize,
}

/// Request body for `POST /close-all`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CloseAllRequest {
    /// Close status code. Defaults to 1000 (normal closure).
    #[serde(default)]
    pub status: CloseCode,
}
