//! Server error types with HTTP status code mapping.
//!
//! [`WsError`] is the central error type for the crate. Broadcast
//! operations return it directly; the admin API maps each variant to an
//! HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::frame::OpCode;
use crate::session::SessionId;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2002,
///     "message": "server is not accepting connections",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see [`WsError`] code ranges).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                    |
/// |-----------|-------------------|--------------------------------|
/// | 1000–1999 | Validation        | 400 Bad Request                |
/// | 2000–2999 | State / Not Found | 404 / 410 / 503                |
/// | 3000–3999 | Server            | 500 Internal Server Error      |
#[derive(Debug, thiserror::Error)]
pub enum WsError {
    /// The server is stopped; nothing was built or dispatched.
    #[error("server is not accepting connections")]
    NotAccepting,

    /// Caller-supplied offset/length do not fit the backing buffer.
    #[error("payload range {offset}+{len} exceeds buffer of {available} bytes")]
    OutOfRange {
        /// Requested start offset.
        offset: usize,
        /// Requested length.
        len: usize,
        /// Actual buffer length.
        available: usize,
    },

    /// Control frames carry at most 125 payload bytes.
    #[error("{opcode} payload of {len} bytes exceeds the 125-byte control frame limit")]
    ControlPayloadTooLarge {
        /// Control opcode that was requested.
        opcode: OpCode,
        /// Requested payload length.
        len: usize,
    },

    /// The session's outbound queue is closed (writer task gone).
    #[error("session {0} is closed")]
    SessionClosed(SessionId),

    /// No session with the given ID is registered.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// The WebSocket upgrade request was rejected.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Transport I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl WsError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::OutOfRange { .. } => 1002,
            Self::Handshake(_) => 1003,
            Self::ControlPayloadTooLarge { .. } => 1004,
            Self::SessionNotFound(_) => 2001,
            Self::NotAccepting => 2002,
            Self::SessionClosed(_) => 2003,
            Self::Io(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::OutOfRange { .. }
            | Self::Handshake(_)
            | Self::ControlPayloadTooLarge { .. } => StatusCode::BAD_REQUEST,
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::SessionClosed(_) => StatusCode::GONE,
            Self::NotAccepting => StatusCode::SERVICE_UNAVAILABLE,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
