//! # ws-multicast
//!
//! WebSocket server core that frames application messages and multicasts
//! them to every handshaked client.
//!
//! Any number of threads may call the send operations on a shared
//! [`server::WsServer`]. Frames are built in one reusable buffer guarded by
//! a mutex, copied out, and queued on each session's outbound channel; the
//! socket writes happen in per-connection tasks, never under the lock.
//!
//! ## Architecture
//!
//! ```text
//! Producers (threads, admin API)
//!     │
//!     ├── WsServer (server/)          multicast_text / binary / ping / pong / close_all
//!     │     ├── SendBuffer            exclusive scratch buffer
//!     │     ├── Frame Builder (frame/)
//!     │     └── Dispatcher            → every handshaked session
//!     │
//!     ├── SessionRegistry (session/)
//!     │
//!     └── Transport (transport/)      accept → upgrade → writer / reader tasks
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod error;
pub mod frame;
pub mod server;
pub mod session;
pub mod transport;
