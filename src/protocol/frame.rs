//! Frame struct, sequence counter and frame assembly.
//!
//! A [`Frame`] is an immutable, fully assembled command: header, payload
//! and checksum in one contiguous `bytes::Bytes` buffer, so clones handed
//! to a transport are cheap.
//!
//! # Example
//!
//! ```
//! use rig_control::protocol::{assemble_frame, CommandId, SequenceCounter};
//!
//! let counter = SequenceCounter::new();
//! let frame = assemble_frame(&counter, CommandId::Init, Some(&[0x00, 0x00])).unwrap();
//!
//! assert_eq!(frame.as_bytes(), &[0x01, 0x01, 0x02, 0x00, 0x00, 0x02]);
//! assert_eq!(frame.to_string(), "0x01, 0x01, 0x02, 0x00, 0x00, 0x02");
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use bytes::{BufMut, Bytes, BytesMut};

use super::wire_format::{
    checksum, CommandId, HEADER_SIZE, INITIAL_COUNTER, MAX_PAYLOAD_SIZE, MIN_FRAME_SIZE,
};
use crate::error::{RigError, Result};

/// Per-encoder sequence counter.
///
/// Starts at 1 and wraps from 255 to 0. Each call to [`advance`](Self::advance)
/// hands out a distinct value, also when called from several tasks.
#[derive(Debug)]
pub struct SequenceCounter {
    next: AtomicU8,
}

impl SequenceCounter {
    /// Create a counter starting at [`INITIAL_COUNTER`].
    pub fn new() -> Self {
        Self::starting_at(INITIAL_COUNTER)
    }

    /// Create a counter whose next value is `value`.
    pub fn starting_at(value: u8) -> Self {
        Self {
            next: AtomicU8::new(value),
        }
    }

    /// Value the next frame will receive.
    #[inline]
    pub fn peek(&self) -> u8 {
        self.next.load(Ordering::Acquire)
    }

    /// Take the current value and advance (wrapping).
    #[inline]
    pub fn advance(&self) -> u8 {
        self.next.fetch_add(1, Ordering::AcqRel)
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// A complete command frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    command: CommandId,
    bytes: Bytes,
}

impl Frame {
    /// Parse and validate frame bytes.
    ///
    /// Checks the length field against the buffer size, the checksum and
    /// the command id.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < MIN_FRAME_SIZE {
            return Err(RigError::Protocol(format!(
                "Frame too short: {} bytes",
                buf.len()
            )));
        }

        let payload_len = buf[2] as usize;
        if buf.len() != MIN_FRAME_SIZE + payload_len {
            return Err(RigError::Protocol(format!(
                "Length field says {} payload bytes but frame is {} bytes",
                payload_len,
                buf.len()
            )));
        }

        let command = CommandId::try_from(buf[0])?;

        let (body, trailer) = buf.split_at(buf.len() - 1);
        let expected = checksum(body);
        if trailer[0] != expected {
            return Err(RigError::Protocol(format!(
                "Checksum mismatch: expected 0x{:02x}, got 0x{:02x}",
                expected, trailer[0]
            )));
        }

        Ok(Self {
            command,
            bytes: Bytes::copy_from_slice(buf),
        })
    }

    /// Command id.
    #[inline]
    pub fn command_id(&self) -> CommandId {
        self.command
    }

    /// Sequence counter assigned at assembly.
    #[inline]
    pub fn counter(&self) -> u8 {
        self.bytes[1]
    }

    /// Payload length.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.bytes[2] as usize
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.bytes[HEADER_SIZE..self.bytes.len() - 1]
    }

    /// Trailing checksum byte.
    #[inline]
    pub fn checksum(&self) -> u8 {
        self.bytes[self.bytes.len() - 1]
    }

    /// Whole frame as a slice.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get a clone of the frame as Bytes (cheap, zero-copy).
    #[inline]
    pub fn to_bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    /// Total frame length.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false: a frame holds at least header and checksum.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hex dump as printed in dry-run mode.
    pub fn to_hex(&self) -> String {
        format_hex(&self.bytes)
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Format bytes as `0x..` lowercase hex, comma+space separated.
///
/// ```
/// use rig_control::protocol::format_hex;
///
/// assert_eq!(format_hex(&[0x01, 0xd9]), "0x01, 0xd9");
/// assert_eq!(format_hex(&[]), "");
/// ```
pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("0x{:02x}", b))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Assemble a frame, taking the next value from `counter`.
///
/// `None` is an empty payload. Payloads over 255 bytes are rejected
/// before the counter moves.
pub fn assemble_frame(
    counter: &SequenceCounter,
    cmd: CommandId,
    payload: Option<&[u8]>,
) -> Result<Frame> {
    let payload = payload.unwrap_or_default();
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(RigError::PayloadTooLarge(payload.len()));
    }

    let seq = counter.advance();
    let mut buf = BytesMut::with_capacity(MIN_FRAME_SIZE + payload.len());
    buf.put_u8(cmd.as_u8());
    buf.put_u8(seq);
    buf.put_u8(payload.len() as u8);
    buf.put_slice(payload);

    let sum = checksum(&buf);
    buf.put_u8(sum);

    tracing::debug!(
        command = ?cmd,
        counter = seq,
        payload_len = payload.len(),
        checksum = sum,
        "assembled frame"
    );

    Ok(Frame {
        command: cmd,
        bytes: buf.freeze(),
    })
}
