//! Session layer: identifiers, per-connection handles and the registry.

pub mod registry;
pub mod session_id;
pub mod ws_session;

pub use registry::SessionRegistry;
pub use session_id::SessionId;
pub use ws_session::{Outbound, OutboundReceiver, WsSession};
