//! One connected client as seen by the broadcast core.
//!
//! A [`WsSession`] is created by the transport when a socket is accepted,
//! flagged as handshaked once the upgrade completes, and fed through an
//! unbounded outbound queue drained by the connection's writer task.

use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::{Notify, mpsc};

use super::SessionId;
use crate::error::WsError;

/// Command delivered to a session's writer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Fully framed bytes to write as-is.
    Frame(Bytes),
    /// Flush pending frames, then shut the socket down.
    Disconnect,
}

/// Receiving half of a session's outbound queue.
pub type OutboundReceiver = mpsc::UnboundedReceiver<Outbound>;

/// Server-side handle for a single client connection.
#[derive(Debug)]
pub struct WsSession {
    id: SessionId,
    handshaked: AtomicBool,
    outbound: mpsc::UnboundedSender<Outbound>,
    closed: Notify,
    connected_at: DateTime<Utc>,
}

impl WsSession {
    /// Creates a session that has not completed the upgrade handshake.
    #[must_use]
    pub fn new() -> (Self, OutboundReceiver) {
        let (outbound, rx) = mpsc::unbounded_channel();
        let session = Self {
            id: SessionId::new(),
            handshaked: AtomicBool::new(false),
            outbound,
            closed: Notify::new(),
            connected_at: Utc::now(),
        };
        (session, rx)
    }

    /// Session identifier.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// When the transport accepted the socket.
    #[must_use]
    pub const fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Returns `true` once the upgrade handshake has completed.
    #[must_use]
    pub fn is_handshaked(&self) -> bool {
        self.handshaked.load(Ordering::Acquire)
    }

    /// Marks the upgrade as complete. Returns `false` if it already was.
    pub fn mark_handshaked(&self) -> bool {
        !self.handshaked.swap(true, Ordering::AcqRel)
    }

    /// Queues a complete frame for the writer task without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::SessionClosed`] if the writer task has exited.
    pub fn enqueue(&self, frame: Bytes) -> Result<(), WsError> {
        self.outbound
            .send(Outbound::Frame(frame))
            .map_err(|_| WsError::SessionClosed(self.id))
    }

    /// Asks the transport to close this connection after flushing
    /// everything queued so far. Returns `false` if the writer was
    /// already gone.
    pub fn disconnect(&self) -> bool {
        self.closed.notify_one();
        self.outbound.send(Outbound::Disconnect).is_ok()
    }

    /// Resolves once [`disconnect`](Self::disconnect) has been called.
    pub async fn disconnected(&self) {
        self.closed.notified().await;
    }
}
