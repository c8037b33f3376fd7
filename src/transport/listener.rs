//! TCP accept loop.

use std::sync::Arc;

use tokio::net::TcpListener;

use super::connection::run_connection;
use super::handshake::HandshakeLimits;
use crate::server::WsServer;

/// Accepts sockets forever, creating one session per connection.
///
/// While the server is not accepting, new sockets are closed immediately.
pub async fn serve(listener: TcpListener, server: Arc<WsServer>, limits: HandshakeLimits) {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "ws transport listening");
    }

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                tracing::warn!(error = %err, "ws accept failed");
                continue;
            }
        };

        match server.create_session() {
            Ok((session, outbound)) => {
                tracing::debug!(%peer, session_id = %session.id(), "ws connection accepted");
                tokio::spawn(run_connection(
                    stream,
                    Arc::clone(&server),
                    session,
                    outbound,
                    limits,
                ));
            }
            Err(err) => {
                tracing::debug!(%peer, error = %err, "ws connection refused");
                drop(stream);
            }
        }
    }
}
