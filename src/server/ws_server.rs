//! Multicast WebSocket server core.
//!
//! [`WsServer`] owns the session registry, the accepting flag and the
//! shared [`SendBuffer`]. Every send operation follows the same path:
//! check the accepting flag → lock the send buffer → build the frame →
//! hand it to each handshaked session → release the lock.
//!
//! All operations are synchronous and non-blocking with respect to the
//! network: they return once the frame sits in each session's outbound
//! queue, not once the bytes reach the wire.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;

use super::dispatcher::broadcast;
use super::send_buffer::{DEFAULT_SEND_BUFFER_CAPACITY, SendBuffer};
use crate::error::WsError;
use crate::frame::{CloseCode, FrameSpec, MAX_CONTROL_PAYLOAD, OpCode, payload_slice};
use crate::session::{OutboundReceiver, SessionId, SessionRegistry, WsSession};

/// Broadcast-capable WebSocket server state.
///
/// Share it behind an [`Arc`]; every method takes `&self` and may be
/// called from any thread.
#[derive(Debug)]
pub struct WsServer {
    accepting: AtomicBool,
    sessions: SessionRegistry,
    send_buffer: SendBuffer,
}

impl Default for WsServer {
    fn default() -> Self {
        Self::new(DEFAULT_SEND_BUFFER_CAPACITY)
    }
}

impl WsServer {
    /// Creates a stopped server whose send buffer starts with
    /// `send_buffer_capacity` bytes.
    #[must_use]
    pub fn new(send_buffer_capacity: usize) -> Self {
        Self {
            accepting: AtomicBool::new(false),
            sessions: SessionRegistry::new(),
            send_buffer: SendBuffer::with_capacity(send_buffer_capacity),
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Starts accepting connections. Returns `false` if already started.
    pub fn start(&self) -> bool {
        let started = !self.accepting.swap(true, Ordering::AcqRel);
        if started {
            tracing::info!("ws server accepting");
        }
        started
    }

    /// Stops accepting and disconnects every session.
    ///
    /// Returns `false` if the server was already stopped.
    pub fn stop(&self) -> bool {
        let _guard = self.send_buffer.lock();
        if !self.accepting.swap(false, Ordering::AcqRel) {
            return false;
        }
        let disconnected = self.teardown();
        tracing::info!(disconnected, "ws server stopped");
        true
    }

    /// Returns `true` while the server accepts connections and sends.
    #[must_use]
    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    fn ensure_accepting(&self) -> Result<(), WsError> {
        if self.is_accepting() {
            Ok(())
        } else {
            Err(WsError::NotAccepting)
        }
    }

    // ── Sessions ────────────────────────────────────────────────────────

    /// Creates and registers a session for a freshly accepted socket.
    ///
    /// The session is not eligible for broadcasts until the transport
    /// calls [`WsSession::mark_handshaked`].
    ///
    /// # Errors
    ///
    /// Returns [`WsError::NotAccepting`] if the server is stopped.
    pub fn create_session(&self) -> Result<(Arc<WsSession>, OutboundReceiver), WsError> {
        self.ensure_accepting()?;
        let (session, rx) = WsSession::new();
        let session = Arc::new(session);
        let id = self.sessions.insert(Arc::clone(&session))?;
        // A concurrent `stop` may have drained the registry between the
        // check above and the insert.
        if !self.is_accepting() {
            let _ = self.sessions.remove(id);
            return Err(WsError::NotAccepting);
        }
        tracing::debug!(session_id = %id, "session created");
        Ok((session, rx))
    }

    /// Unregisters a session after its connection ended.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::SessionNotFound`] if it was already removed
    /// (for example by [`disconnect_all`](Self::disconnect_all)).
    pub fn remove_session(&self, id: SessionId) -> Result<Arc<WsSession>, WsError> {
        let session = self.sessions.remove(id)?;
        tracing::debug!(session_id = %id, "session removed");
        Ok(session)
    }

    /// Clones out every registered session, handshaked or not.
    #[must_use]
    pub fn sessions(&self) -> Vec<Arc<WsSession>> {
        self.sessions.snapshot()
    }

    /// Number of registered sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Number of sessions eligible for broadcasts.
    #[must_use]
    pub fn handshaked_count(&self) -> usize {
        self.sessions.handshaked_count()
    }

    // ── Raw multicast ───────────────────────────────────────────────────

    /// Sends already-framed bytes to every handshaked session.
    ///
    /// Returns the number of sessions the bytes were handed to. Empty
    /// input is a successful no-op.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::NotAccepting`] if the server is stopped.
    pub fn multicast(&self, data: &[u8]) -> Result<usize, WsError> {
        self.ensure_accepting()?;
        if data.is_empty() {
            return Ok(0);
        }
        let guard = self.send_buffer.lock();
        let delivered = self.dispatch(Bytes::copy_from_slice(data))?;
        drop(guard);
        Ok(delivered)
    }

    /// [`multicast`](Self::multicast) over `buffer[offset..offset + len]`.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::OutOfRange`] for an invalid range and
    /// [`WsError::NotAccepting`] if the server is stopped.
    pub fn multicast_at(&self, buffer: &[u8], offset: usize, len: usize) -> Result<usize, WsError> {
        let data = checked_slice(buffer, offset, len)?;
        self.multicast(data)
    }

    fn dispatch(&self, frame: Bytes) -> Result<usize, WsError> {
        self.ensure_accepting()?;
        if frame.is_empty() {
            return Ok(0);
        }
        Ok(broadcast(&self.sessions, &frame).delivered)
    }

    // ── Framed multicast ────────────────────────────────────────────────

    fn send_frame(&self, opcode: OpCode, payload: &[u8]) -> Result<usize, WsError> {
        if opcode.is_control() && payload.len() > MAX_CONTROL_PAYLOAD {
            return Err(WsError::ControlPayloadTooLarge {
                opcode,
                len: payload.len(),
            });
        }
        self.ensure_accepting()?;
        let mut guard = self.send_buffer.lock();
        let frame = guard.build(&FrameSpec::server(opcode, payload));
        let delivered = self.dispatch(frame)?;
        drop(guard);
        tracing::debug!(%opcode, len = payload.len(), delivered, "frame multicast");
        Ok(delivered)
    }

    /// Broadcasts a TEXT frame. The string is sent as its UTF-8 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::NotAccepting`] if the server is stopped.
    pub fn multicast_text(&self, text: &str) -> Result<usize, WsError> {
        self.send_frame(OpCode::Text, text.as_bytes())
    }

    /// Broadcasts a TEXT frame built from `buffer[offset..offset + len]`.
    /// The bytes are not checked for UTF-8 validity.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::OutOfRange`] for an invalid range and
    /// [`WsError::NotAccepting`] if the server is stopped.
    pub fn multicast_text_at(
        &self,
        buffer: &[u8],
        offset: usize,
        len: usize,
    ) -> Result<usize, WsError> {
        self.send_frame(OpCode::Text, checked_slice(buffer, offset, len)?)
    }

    /// Broadcasts a BINARY frame. Accepts bytes or a string.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::NotAccepting`] if the server is stopped.
    pub fn multicast_binary(&self, payload: impl AsRef<[u8]>) -> Result<usize, WsError> {
        self.send_frame(OpCode::Binary, payload.as_ref())
    }

    /// Broadcasts a BINARY frame built from `buffer[offset..offset + len]`.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::OutOfRange`] for an invalid range and
    /// [`WsError::NotAccepting`] if the server is stopped.
    pub fn multicast_binary_at(
        &self,
        buffer: &[u8],
        offset: usize,
        len: usize,
    ) -> Result<usize, WsError> {
        self.send_frame(OpCode::Binary, checked_slice(buffer, offset, len)?)
    }

    /// Broadcasts a PING frame. The payload is limited to 125 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::ControlPayloadTooLarge`] for a longer payload and
    /// [`WsError::NotAccepting`] if the server is stopped.
    pub fn send_ping(&self, payload: impl AsRef<[u8]>) -> Result<usize, WsError> {
        self.send_frame(OpCode::Ping, payload.as_ref())
    }

    /// Broadcasts a PING frame built from `buffer[offset..offset + len]`.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::OutOfRange`] for an invalid range,
    /// [`WsError::ControlPayloadTooLarge`] for more than 125 bytes and
    /// [`WsError::NotAccepting`] if the server is stopped.
    pub fn send_ping_at(&self, buffer: &[u8], offset: usize, len: usize) -> Result<usize, WsError> {
        self.send_frame(OpCode::Ping, checked_slice(buffer, offset, len)?)
    }

    /// Broadcasts a PONG frame. The payload is limited to 125 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::ControlPayloadTooLarge`] for a longer payload and
    /// [`WsError::NotAccepting`] if the server is stopped.
    pub fn send_pong(&self, payload: impl AsRef<[u8]>) -> Result<usize, WsError> {
        self.send_frame(OpCode::Pong, payload.as_ref())
    }

    /// Broadcasts a PONG frame built from `buffer[offset..offset + len]`.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::OutOfRange`] for an invalid range,
    /// [`WsError::ControlPayloadTooLarge`] for more than 125 bytes and
    /// [`WsError::NotAccepting`] if the server is stopped.
    pub fn send_pong_at(&self, buffer: &[u8], offset: usize, len: usize) -> Result<usize, WsError> {
        self.send_frame(OpCode::Pong, checked_slice(buffer, offset, len)?)
    }

    // ── Close ───────────────────────────────────────────────────────────

    /// Broadcasts a CLOSE frame with `status`, then disconnects every
    /// session.
    ///
    /// The send buffer stays locked across both steps. Every other send,
    /// raw [`multicast`](Self::multicast) included, takes the same lock, so
    /// no other frame can be queued between the close notification and the
    /// teardown.
    /// Every session's writer sees the CLOSE frame before its disconnect
    /// command. Returns the number of sessions the CLOSE frame reached.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::NotAccepting`] if the server is stopped; no
    /// session is disconnected in that case.
    pub fn close_all(&self, status: CloseCode) -> Result<usize, WsError> {
        self.ensure_accepting()?;
        let mut guard = self.send_buffer.lock();
        let frame = guard.build(&FrameSpec::close(status));
        let delivered = self.dispatch(frame)?;
        let disconnected = self.disconnect_all()?;
        drop(guard);
        tracing::info!(%status, delivered, disconnected, "closed all sessions");
        Ok(delivered)
    }

    /// Severs every connection, handshaked or not, without a CLOSE frame.
    ///
    /// Returns the number of sessions disconnected.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::NotAccepting`] if the server is stopped.
    pub fn disconnect_all(&self) -> Result<usize, WsError> {
        self.ensure_accepting()?;
        Ok(self.teardown())
    }

    fn teardown(&self) -> usize {
        let sessions = self.sessions.drain();
        for session in &sessions {
            if !session.disconnect() {
                tracing::debug!(session_id = %session.id(), "session already gone");
            }
        }
        sessions.len()
    }
}

/// Resolves a caller-supplied range, logging contract violations.
fn checked_slice(buffer: &[u8], offset: usize, len: usize) -> Result<&[u8], WsError> {
    payload_slice(buffer, offset, len).inspect_err(|err| {
        tracing::error!(error = %err, "rejected out-of-range payload");
    })
}
