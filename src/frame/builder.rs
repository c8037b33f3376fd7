//! Server-side frame construction.
//!
//! [`write_frame`] appends one complete, unfragmented frame to a
//! [`BytesMut`]. It never reads the destination's previous content, so the
//! same scratch buffer can be cleared and reused for every send.
//!
//! ```text
//!  byte 0      byte 1        ext. length        mask key     payload
//! +-+---+----+-+-------+  +---------------+  +----------+  +---------+
//! |F|000|op  |M| len7  |  | 0 / 2 / 8 B   |  | 0 / 4 B  |  | [status]|
//! +-+---+----+-+-------+  +---------------+  +----------+  | data    |
//!                                                          +---------+
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::{CloseCode, OpCode};
use crate::error::WsError;

/// FIN bit in header byte 0.
pub const FIN_BIT: u8 = 0x80;

/// MASK bit in header byte 1.
pub const MASK_BIT: u8 = 0x80;

/// Largest payload length encoded directly in the 7-bit field.
pub const MAX_SHORT_PAYLOAD: usize = 125;

/// Largest payload a control frame (close, ping, pong) may carry.
pub const MAX_CONTROL_PAYLOAD: usize = MAX_SHORT_PAYLOAD;

/// Length indicator announcing a 16-bit extended length.
const EXTENDED_16: u8 = 126;

/// Length indicator announcing a 64-bit extended length.
const EXTENDED_64: u8 = 127;

/// Description of one frame to build.
///
/// For [`OpCode::Close`] the optional `status` is written as a 2-byte
/// big-endian prefix ahead of `payload`; for every other opcode it is
/// ignored.
#[derive(Debug, Clone, Copy)]
pub struct FrameSpec<'a> {
    /// Frame opcode.
    pub opcode: OpCode,
    /// Final-fragment flag.
    pub fin: bool,
    /// Masking key. Server-originated frames never carry one.
    pub mask: Option<[u8; 4]>,
    /// Application payload.
    pub payload: &'a [u8],
    /// Close status code (CLOSE frames only).
    pub status: Option<CloseCode>,
}

impl<'a> FrameSpec<'a> {
    /// Unmasked, final frame as sent by a server.
    #[must_use]
    pub const fn server(opcode: OpCode, payload: &'a [u8]) -> Self {
        Self {
            opcode,
            fin: true,
            mask: None,
            payload,
            status: None,
        }
    }

    /// Unmasked CLOSE frame carrying `status` and no reason text.
    #[must_use]
    pub const fn close(status: CloseCode) -> Self {
        Self {
            opcode: OpCode::Close,
            fin: true,
            mask: None,
            payload: &[],
            status: Some(status),
        }
    }

    fn status_prefix(&self) -> Option<[u8; 2]> {
        match (self.opcode, self.status) {
            (OpCode::Close, Some(code)) => Some(code.to_be_bytes()),
            _ => None,
        }
    }

    /// Length announced in the header: status prefix plus payload.
    #[must_use]
    pub fn payload_len(&self) -> usize {
        let prefix = if self.status_prefix().is_some() { 2 } else { 0 };
        self.payload.len().saturating_add(prefix)
    }

    /// Exact number of bytes [`write_frame`] appends for this spec.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        let len = self.payload_len();
        let ext = if len <= MAX_SHORT_PAYLOAD {
            0
        } else if u16::try_from(len).is_ok() {
            2
        } else {
            8
        };
        let mask = if self.mask.is_some() { 4 } else { 0 };
        len.saturating_add(2 + ext + mask)
    }
}

/// Resolves `buffer[offset..offset + len]`.
///
/// # Errors
///
/// Returns [`WsError::OutOfRange`] if the range overflows or exceeds the
/// buffer. The slice is never clipped.
pub fn payload_slice(buffer: &[u8], offset: usize, len: usize) -> Result<&[u8], WsError> {
    let out_of_range = || WsError::OutOfRange {
        offset,
        len,
        available: buffer.len(),
    };
    let end = offset.checked_add(len).ok_or_else(out_of_range)?;
    buffer.get(offset..end).ok_or_else(out_of_range)
}

/// Appends the complete wire encoding of `spec` to `dst`.
pub fn write_frame(dst: &mut BytesMut, spec: &FrameSpec<'_>) {
    dst.reserve(spec.encoded_len());

    let fin = if spec.fin { FIN_BIT } else { 0 };
    dst.put_u8(fin | spec.opcode.as_u8());

    let mask = if spec.mask.is_some() { MASK_BIT } else { 0 };
    let len = spec.payload_len();
    match u8::try_from(len) {
        Ok(short) if usize::from(short) <= MAX_SHORT_PAYLOAD => dst.put_u8(mask | short),
        _ => match u16::try_from(len) {
            Ok(medium) => {
                dst.put_u8(mask | EXTENDED_16);
                dst.put_u16(medium);
            }
            Err(_) => {
                dst.put_u8(mask | EXTENDED_64);
                dst.put_u64(len as u64);
            }
        },
    }

    let prefix = spec.status_prefix();
    match spec.mask {
        None => {
            if let Some(status) = prefix {
                dst.put_slice(&status);
            }
            dst.put_slice(spec.payload);
        }
        Some(key) => {
            dst.put_slice(&key);
            let body = prefix.iter().flatten().chain(spec.payload.iter());
            for (byte, k) in body.zip(key.iter().cycle()) {
                dst.put_u8(byte ^ k);
            }
        }
    }
}

/// Encodes `spec` into a freshly allocated [`Bytes`].
#[must_use]
pub fn encode_frame(spec: &FrameSpec<'_>) -> Bytes {
    let mut buf = BytesMut::with_capacity(spec.encoded_len());
    write_frame(&mut buf, spec);
    buf.freeze()
}
