//! Minimal HTTP/1.1 → WebSocket upgrade.
//!
//! Reads the request head (bounded in size and time), validates the
//! upgrade headers and answers `101 Switching Protocols` or
//! `400 Bad Request`. Nothing past the blank line is consumed.

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_tungstenite::tungstenite::handshake::derive_accept_key;

use crate::error::WsError;

/// Bounds applied while reading an upgrade request.
#[derive(Debug, Clone, Copy)]
pub struct HandshakeLimits {
    /// Maximum time to receive the full request head.
    pub timeout: Duration,
    /// Maximum size of the request head in bytes.
    pub max_bytes: usize,
}

impl Default for HandshakeLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_bytes: 8 * 1024,
        }
    }
}

/// Validated upgrade request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeRequest {
    /// Request target, e.g. `/` or `/feed`.
    pub path: String,
    /// Client `Sec-WebSocket-Key`.
    pub key: String,
}

/// Parses and validates a request head (request line plus headers).
///
/// # Errors
///
/// Returns [`WsError::Handshake`] describing the first problem found.
pub fn parse_request(head: &str) -> Result<UpgradeRequest, WsError> {
    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(path), Some(version)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(reject("malformed request line"));
    };
    if method != "GET" {
        return Err(reject("method must be GET"));
    }
    if version != "HTTP/1.1" {
        return Err(reject("HTTP/1.1 required"));
    }

    let mut upgrade = false;
    let mut connection = false;
    let mut version_ok = false;
    let mut key = None;

    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match name.trim().to_ascii_lowercase().as_str() {
            "upgrade" => upgrade = has_token(value, "websocket"),
            "connection" => connection = has_token(value, "upgrade"),
            "sec-websocket-version" => version_ok = value == "13",
            "sec-websocket-key" if !value.is_empty() => key = Some(value.to_string()),
            _ => {}
        }
    }

    if !upgrade {
        return Err(reject("missing `Upgrade: websocket`"));
    }
    if !connection {
        return Err(reject("missing `Connection: Upgrade`"));
    }
    if !version_ok {
        return Err(reject("unsupported Sec-WebSocket-Version"));
    }
    let key = key.ok_or_else(|| reject("missing Sec-WebSocket-Key"))?;

    Ok(UpgradeRequest {
        path: path.to_string(),
        key,
    })
}

fn has_token(value: &str, token: &str) -> bool {
    value
        .split(',')
        .any(|t| t.trim().eq_ignore_ascii_case(token))
}

fn reject(reason: &str) -> WsError {
    WsError::Handshake(reason.to_string())
}

/// `101 Switching Protocols` response for `key`.
#[must_use]
pub fn accept_response(key: &str) -> String {
    format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\r\n",
        derive_accept_key(key.as_bytes())
    )
}

/// `400 Bad Request` response with `reason` as plain-text body.
#[must_use]
pub fn reject_response(reason: &str) -> String {
    format!(
        "HTTP/1.1 400 Bad Request\r\n\
         Content-Type: text/plain\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n{reason}",
        reason.len()
    )
}

/// Reads lines up to and including the blank line ending the head.
///
/// # Errors
///
/// Returns [`WsError::Handshake`] if the peer closes early, the head
/// exceeds `max_bytes` or is not UTF-8, and [`WsError::Io`] on read
/// failures.
pub async fn read_request_head<R>(reader: &mut R, max_bytes: usize) -> Result<String, WsError>
where
    R: AsyncBufRead + Unpin,
{
    let mut head = String::new();
    loop {
        let remaining = max_bytes.saturating_sub(head.len());
        if remaining == 0 {
            return Err(reject("request head too large"));
        }
        let read = (&mut *reader)
            .take(remaining as u64)
            .read_line(&mut head)
            .await
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::InvalidData => reject("request head is not valid UTF-8"),
                _ => WsError::Io(err),
            })?;
        if read == 0 {
            return Err(reject("connection closed during handshake"));
        }
        if head.ends_with("\r\n\r\n") || head.ends_with("\n\n") {
            return Ok(head);
        }
    }
}

/// Runs the server side of the upgrade on an accepted socket.
///
/// On a rejected, oversized or timed-out request a `400` response is
/// written (best effort) before the error is returned.
///
/// # Errors
///
/// Returns [`WsError::Handshake`] on a rejected or timed-out request and
/// [`WsError::Io`] on socket failures.
pub async fn perform<R, W>(
    reader: &mut R,
    writer: &mut W,
    limits: HandshakeLimits,
) -> Result<UpgradeRequest, WsError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let request = tokio::time::timeout(limits.timeout, read_request_head(reader, limits.max_bytes))
        .await
        .map_err(|_| reject("timed out"))
        .and_then(|head| parse_request(&head?));

    match request {
        Ok(request) => {
            writer.write_all(accept_response(&request.key).as_bytes()).await?;
            writer.flush().await?;
            Ok(request)
        }
        Err(err @ WsError::Handshake(_)) => {
            let reason = err.to_string();
            let _ = writer.write_all(reject_response(&reason).as_bytes()).await;
            let _ = writer.flush().await;
            Err(err)
        }
        Err(err) => Err(err),
    }
}
