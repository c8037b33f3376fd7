//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::server::WsServer;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Broadcast server driven by the admin endpoints.
    pub server: Arc<WsServer>,
}
