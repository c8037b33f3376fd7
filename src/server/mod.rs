//! Broadcast core: shared send buffer, dispatcher and the server facade.

pub mod dispatcher;
pub mod send_buffer;
pub mod ws_server;

pub use dispatcher::{BroadcastReport, broadcast};
pub use send_buffer::{SendBuffer, SendGuard};
pub use ws_server::WsServer;
