//! Server configuration loaded from environment variables.
//!
//! All settings come from environment variables (or a `.env` file via
//! `dotenvy`). Missing or unparsable values fall back to defaults.

use std::net::SocketAddr;
use std::time::Duration;

use crate::server::send_buffer::DEFAULT_SEND_BUFFER_CAPACITY;
use crate::transport::HandshakeLimits;

/// Top-level server configuration.
///
/// Loaded once at startup via [`ServerConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for WebSocket clients (e.g. `0.0.0.0:8080`).
    pub ws_listen_addr: SocketAddr,

    /// Socket address for the admin REST API (e.g. `0.0.0.0:3000`).
    pub admin_listen_addr: SocketAddr,

    /// Initial capacity of the shared send buffer in bytes.
    pub send_buffer_capacity: usize,

    /// Seconds a client has to complete the upgrade request.
    pub handshake_timeout_secs: u64,

    /// Maximum size of an upgrade request head in bytes.
    pub max_handshake_bytes: usize,

    /// Start accepting connections immediately.
    pub auto_start: bool,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `WS_LISTEN_ADDR` or `ADMIN_LISTEN_ADDR` is set
    /// but cannot be parsed as a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let ws_listen_addr: SocketAddr = std::env::var("WS_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()?;

        let admin_listen_addr: SocketAddr = std::env::var("ADMIN_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;

        let send_buffer_capacity = parse_env("SEND_BUFFER_CAPACITY", DEFAULT_SEND_BUFFER_CAPACITY);
        let handshake_timeout_secs = parse_env("HANDSHAKE_TIMEOUT_SECS", 10);
        let max_handshake_bytes = parse_env("MAX_HANDSHAKE_BYTES", 8 * 1024);
        let auto_start = parse_env_bool("AUTO_START", true);

        Ok(Self {
            ws_listen_addr,
            admin_listen_addr,
            send_buffer_capacity,
            handshake_timeout_secs,
            max_handshake_bytes,
            auto_start,
        })
    }

    /// Handshake bounds derived from this configuration.
    #[must_use]
    pub const fn handshake_limits(&self) -> HandshakeLimits {
        HandshakeLimits {
            timeout: Duration::from_secs(self.handshake_timeout_secs),
            max_bytes: self.max_handshake_bytes,
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().map(|v| v.to_ascii_lowercase()).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_falls_back_on_missing_key() {
        assert_eq!(parse_env("WS_MULTICAST_TEST_UNSET_KEY", 42usize), 42);
        assert!(parse_env_bool("WS_MULTICAST_TEST_UNSET_KEY", true));
    }

    #[test]
    fn handshake_limits_follow_config() {
        let config = ServerConfig {
            ws_listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            admin_listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            send_buffer_capacity: 1024,
            handshake_timeout_secs: 3,
            max_handshake_bytes: 512,
            auto_start: false,
        };
        let limits = config.handshake_limits();
        assert_eq!(limits.timeout, Duration::from_secs(3));
        assert_eq!(limits.max_bytes, 512);
    }
}
