//! Per-connection tasks.
//!
//! After the upgrade, each connection runs two halves:
//!
//! - a writer task that drains the session's outbound queue onto the
//!   socket, in order, until it sees [`Outbound::Disconnect`];
//! - a reader loop that discards inbound bytes until EOF, a socket error
//!   or a disconnect request.
//!
//! Whichever side ends first stops the other, and the session is then
//! removed from the registry.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use super::handshake::{self, HandshakeLimits};
use crate::server::WsServer;
use crate::session::{Outbound, OutboundReceiver, WsSession};

/// Drives one accepted socket from upgrade to teardown.
pub async fn run_connection(
    stream: TcpStream,
    server: Arc<WsServer>,
    session: Arc<WsSession>,
    outbound: OutboundReceiver,
    limits: HandshakeLimits,
) {
    let session_id = session.id();
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    match handshake::perform(&mut reader, &mut write_half, limits).await {
        Ok(request) => {
            session.mark_handshaked();
            tracing::info!(%session_id, path = %request.path, "ws handshake complete");
        }
        Err(err) => {
            tracing::warn!(%session_id, error = %err, "ws handshake failed");
            let _ = server.remove_session(session_id);
            return;
        }
    }

    let writer = tokio::spawn(write_loop(write_half, outbound, Arc::clone(&session)));
    read_loop(reader, &session).await;

    session.disconnect();
    if let Err(err) = writer.await {
        tracing::warn!(%session_id, error = %err, "ws writer task failed");
    }
    let _ = server.remove_session(session_id);
    tracing::debug!(%session_id, "ws connection closed");
}

/// Writes queued frames until a disconnect command or a write error.
async fn write_loop<W>(mut writer: W, mut outbound: OutboundReceiver, session: Arc<WsSession>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(command) = outbound.recv().await {
        match command {
            Outbound::Frame(frame) => {
                if let Err(err) = writer.write_all(&frame).await {
                    tracing::debug!(session_id = %session.id(), error = %err, "ws write failed");
                    break;
                }
            }
            Outbound::Disconnect => break,
        }
    }
    drop(outbound);
    let _ = writer.shutdown().await;
    // Wakes the reader if the loop ended on its own.
    session.disconnect();
}

/// Discards inbound bytes until the peer or the server ends the session.
async fn read_loop<R>(mut reader: R, session: &WsSession)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; 4096];
    loop {
        tokio::select! {
            () = session.disconnected() => break,
            read = reader.read(&mut buf) => match read {
                Ok(0) => break,
                Ok(n) => tracing::trace!(session_id = %session.id(), bytes = n, "inbound bytes ignored"),
                Err(err) => {
                    tracing::debug!(session_id = %session.id(), error = %err, "ws read failed");
                    break;
                }
            },
        }
    }
}
