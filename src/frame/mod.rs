//! WebSocket wire format: opcodes, close codes and frame construction.
//!
//! Everything here is pure. The shared scratch buffer and locking live in
//! [`crate::server::send_buffer`].

pub mod builder;
pub mod close_code;
pub mod opcode;

pub use builder::{FrameSpec, MAX_CONTROL_PAYLOAD, encode_frame, payload_slice, write_frame};
pub use close_code::CloseCode;
pub use opcode::OpCode;
