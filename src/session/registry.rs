//! Concurrent session storage.
//!
//! [`SessionRegistry`] maps [`SessionId`] to a shared [`WsSession`]. The
//! broadcast path only ever takes a short read lock to snapshot the
//! current sessions; per-session dispatch happens after the lock is gone.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{SessionId, WsSession};
use crate::error::WsError;

/// Registry of every connected session, handshaked or not.
///
/// # Concurrency
///
/// - Snapshots and counts run concurrently.
/// - Inserts and removals are serialized with each other but never wait
///   on a broadcast in progress.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Arc<WsSession>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::InvalidRequest`] if a session with the same ID
    /// is already registered (should never happen with UUID v4).
    pub fn insert(&self, session: Arc<WsSession>) -> Result<SessionId, WsError> {
        let id = session.id();
        let mut map = self.sessions.write();
        if map.contains_key(&id) {
            return Err(WsError::InvalidRequest(format!(
                "session {id} already registered"
            )));
        }
        map.insert(id, session);
        Ok(id)
    }

    /// Unregisters a session.
    ///
    /// # Errors
    ///
    /// Returns [`WsError::SessionNotFound`] if no session has this ID.
    pub fn remove(&self, id: SessionId) -> Result<Arc<WsSession>, WsError> {
        self.sessions
            .write()
            .remove(&id)
            .ok_or(WsError::SessionNotFound(id))
    }

    /// Clones out every registered session.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<WsSession>> {
        self.sessions.read().values().cloned().collect()
    }

    /// Removes and returns every registered session.
    pub fn drain(&self) -> Vec<Arc<WsSession>> {
        self.sessions.write().drain().map(|(_, s)| s).collect()
    }

    /// Number of registered sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Returns `true` if no session is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Number of sessions that completed the upgrade handshake.
    #[must_use]
    pub fn handshaked_count(&self) -> usize {
        self.sessions
            .read()
            .values()
            .filter(|s| s.is_handshaked())
            .count()
    }
}
