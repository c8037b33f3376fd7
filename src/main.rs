//! ws-multicast server entry point.
//!
//! Starts the WebSocket transport and the Axum admin API.

use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use ws_multicast::api;
use ws_multicast::app_state::AppState;
use ws_multicast::config::ServerConfig;
use ws_multicast::frame::CloseCode;
use ws_multicast::server::WsServer;
use ws_multicast::transport;

/// Time given to connection writers to flush the CLOSE frame on shutdown.
const CLOSE_GRACE: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = ServerConfig::from_env()?;
    tracing::info!(
        ws_addr = %config.ws_listen_addr,
        admin_addr = %config.admin_listen_addr,
        "starting ws-multicast"
    );

    // Build broadcast core
    let server = Arc::new(WsServer::new(config.send_buffer_capacity));
    if config.auto_start {
        server.start();
    }

    // WebSocket transport
    let ws_listener = tokio::net::TcpListener::bind(config.ws_listen_addr).await?;
    let transport_task = tokio::spawn(transport::serve(
        ws_listener,
        Arc::clone(&server),
        config.handshake_limits(),
    ));

    // Admin API
    let app = api::build_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState {
            server: Arc::clone(&server),
        });

    let admin_listener = tokio::net::TcpListener::bind(config.admin_listen_addr).await?;
    tracing::info!(addr = %config.admin_listen_addr, "admin api listening");

    axum::serve(admin_listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Notify clients before the transport goes away
    if let Err(err) = server.close_all(CloseCode::GOING_AWAY) {
        tracing::debug!(error = %err, "close on shutdown skipped");
    } else {
        tokio::time::sleep(CLOSE_GRACE).await;
    }
    transport_task.abort();
    tracing::info!("ws-multicast stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
