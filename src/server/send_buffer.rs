//! Reusable frame scratch space behind an exclusive-access guard.
//!
//! One [`SendBuffer`] is owned by each server. Callers lock it, build a
//! frame into it and get back an immutable [`Bytes`] copy. The scratch
//! allocation stays with the buffer, so steady-state sends do not grow it.

use bytes::{Bytes, BytesMut};
use parking_lot::{Mutex, MutexGuard};

use crate::frame::{FrameSpec, write_frame};

/// Initial scratch capacity when none is configured.
pub const DEFAULT_SEND_BUFFER_CAPACITY: usize = 8 * 1024;

/// Shared frame-construction buffer.
#[derive(Debug)]
pub struct SendBuffer {
    scratch: Mutex<BytesMut>,
}

impl SendBuffer {
    /// Creates a buffer with `capacity` bytes preallocated.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            scratch: Mutex::new(BytesMut::with_capacity(capacity)),
        }
    }

    /// Acquires exclusive access, blocking until no other caller holds it.
    pub fn lock(&self) -> SendGuard<'_> {
        SendGuard {
            scratch: self.scratch.lock(),
        }
    }
}

impl Default for SendBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_SEND_BUFFER_CAPACITY)
    }
}

/// Exclusive access to the scratch buffer.
///
/// Frames built through the guard stay private to the holder until
/// returned; the guard is released on drop.
#[derive(Debug)]
pub struct SendGuard<'a> {
    scratch: MutexGuard<'a, BytesMut>,
}

impl SendGuard<'_> {
    /// Builds `spec` into the scratch buffer and returns a frozen copy.
    pub fn build(&mut self, spec: &FrameSpec<'_>) -> Bytes {
        self.scratch.clear();
        write_frame(&mut self.scratch, spec);
        Bytes::copy_from_slice(&self.scratch)
    }
}
