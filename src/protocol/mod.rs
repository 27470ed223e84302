//! Protocol module - wire format, framing, and command encoding.
//!
//! This module implements the binary command protocol:
//! - 3-byte header, payload and XOR checksum
//! - Sequence counter shared by all frames of one encoder
//! - Command builders that validate and encode arguments

mod command;
mod frame;
mod wire_format;

pub use command::{Command, TARGET_DEGREE_RANGE, TURN_TO_SPEED_RANGE};
pub use frame::{assemble_frame, format_hex, Frame, SequenceCounter};
pub use wire_format::{
    checksum, encode_high_low, round_half_up, wrap_u16, wrap_u8, CommandId, CHECKSUM_SIZE,
    HEADER_SIZE, INITIAL_COUNTER, MAX_PAYLOAD_SIZE, MIN_FRAME_SIZE,
};
