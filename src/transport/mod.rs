//! TCP transport: accept loop, upgrade handshake and per-connection I/O.
//!
//! This is the plumbing around the broadcast core. It creates sessions,
//! flips their handshake flag and writes whatever frames the core queues.

pub mod connection;
pub mod handshake;
pub mod listener;

pub use handshake::HandshakeLimits;
pub use listener::serve;
