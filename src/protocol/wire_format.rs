//! Wire format encoding.
//!
//! Every command is a 3-byte header, a payload and a trailing checksum:
//! ```text
//! ┌────────┬─────────┬────────┬─────────────┬──────────┐
//! │ Cmd ID │ Counter │ Length │ Payload     │ Checksum │
//! │ 1 byte │ 1 byte  │ 1 byte │ 0-255 bytes │ 1 byte   │
//! └────────┴─────────┴────────┴─────────────┴──────────┘
//! ```
//!
//! The checksum is the XOR of every byte before it. Multi-byte payload
//! fields are Big Endian.

use crate::error::{RigError, Result};

/// Header size in bytes (cmd id, counter, payload length).
pub const HEADER_SIZE: usize = 3;

/// Checksum trailer size in bytes.
pub const CHECKSUM_SIZE: usize = 1;

/// Smallest possible frame (empty payload).
pub const MIN_FRAME_SIZE: usize = HEADER_SIZE + CHECKSUM_SIZE;

/// Largest payload the one-byte length field can describe.
pub const MAX_PAYLOAD_SIZE: usize = u8::MAX as usize;

/// First counter value of a fresh encoder.
pub const INITIAL_COUNTER: u8 = 0x01;

/// Command identifiers understood by the rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandId {
    /// Initialize the interface.
    Init = 0x01,
    /// Turn to an absolute angle at a given speed.
    TurnTo = 0x10,
    /// Turn continuously at a given speed.
    Turn = 0x11,
}

impl CommandId {
    /// Wire value of this command.
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Look up a command by its wire value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Init),
            0x10 => Some(Self::TurnTo),
            0x11 => Some(Self::Turn),
            _ => None,
        }
    }
}

impl TryFrom<u8> for CommandId {
    type Error = RigError;

    fn try_from(value: u8) -> Result<Self> {
        Self::from_u8(value)
            .ok_or_else(|| RigError::Protocol(format!("Unknown command id 0x{:02x}", value)))
    }
}

/// XOR-fold of `bytes`, starting from 0x00.
///
/// # Example
///
/// ```
/// use rig_control::protocol::checksum;
///
/// assert_eq!(checksum(&[]), 0x00);
/// assert_eq!(checksum(&[0xFF, 0x0F]), 0xF0);
/// ```
#[inline]
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0x00, |acc, b| acc ^ b)
}

/// Split a 16-bit value into `[high, low]`.
#[inline]
pub fn encode_high_low(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}

/// Truncate toward zero and wrap into `0..=65535`.
///
/// Out-of-range values wrap rather than clamp, so `-1.0` becomes `0xFFFF`.
/// Non-finite input maps to 0.
pub fn wrap_u16(value: f64) -> u16 {
    if !value.is_finite() {
        return 0;
    }
    value.trunc().rem_euclid(65_536.0) as u16
}

/// Truncate toward zero and wrap into `0..=255`.
pub fn wrap_u8(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    value.trunc().rem_euclid(256.0) as u8
}

/// Round to the nearest integer, halves toward positive infinity.
///
/// `2.5 -> 3`, `-2.5 -> -2`.
#[inline]
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_vectors() {
        assert_eq!(checksum(&[]), 0x00);
        assert_eq!(checksum(&[0x01]), 0x01);
        assert_eq!(checksum(&[0x01, 0x01]), 0x00);
        assert_eq!(checksum(&[0xFF, 0x0F]), 0xF0);
    }

    #[test]
    fn test_checksum_order_independent() {
        assert_eq!(checksum(&[0x10, 0x22, 0x35]), checksum(&[0x35, 0x10, 0x22]));
    }

    #[test]
    fn test_command_id_values() {
        assert_eq!(CommandId::Init.as_u8(), 0x01);
        assert_eq!(CommandId::TurnTo.as_u8(), 0x10);
        assert_eq!(CommandId::Turn.as_u8(), 0x11);
    }

    #[test]
    fn test_command_id_lookup() {
        assert_eq!(CommandId::from_u8(0x10), Some(CommandId::TurnTo));
        assert_eq!(CommandId::from_u8(0x02), None);
        assert!(matches!(
            CommandId::try_from(0xAA),
            Err(RigError::Protocol(_))
        ));
    }

    #[test]
    fn test_encode_high_low() {
        assert_eq!(encode_high_low(217), [0x00, 0xD9]);
        assert_eq!(encode_high_low(0x1234), [0x12, 0x34]);
        assert_eq!(encode_high_low(0xFFFF), [0xFF, 0xFF]);
    }

    #[test]
    fn test_wrap_u16() {
        assert_eq!(wrap_u16(1.0), 1);
        assert_eq!(wrap_u16(-1.0), 0xFFFF);
        assert_eq!(wrap_u16(0.0), 0);
        assert_eq!(wrap_u16(65536.0), 0);
        assert_eq!(wrap_u16(65537.0), 1);
        assert_eq!(wrap_u16(-1800.0), 0xF8F8);
        assert_eq!(wrap_u16(3.9), 3);
        assert_eq!(wrap_u16(-0.5), 0);
        assert_eq!(wrap_u16(f64::NAN), 0);
        assert_eq!(wrap_u16(1e20), 0);
        assert_eq!(wrap_u16(-1e20), 0);
        assert_eq!(wrap_u16(9_223_372_036_854_841_344.0), 0);
        assert_eq!(wrap_u16(2f64.powi(70) + 2f64.powi(18)), 0);
        assert_eq!(wrap_u16(4_294_967_297.0), 1);
    }

    #[test]
    fn test_wrap_u8() {
        assert_eq!(wrap_u8(255.0), 0xFF);
        assert_eq!(wrap_u8(256.0), 0);
        assert_eq!(wrap_u8(3.7), 3);
        assert_eq!(wrap_u8(-1.0), 0xFF);
        assert_eq!(wrap_u8(1e20), 0);
        assert_eq!(wrap_u8(-1e20), 0);
        assert_eq!(wrap_u8(4_294_967_041.0), 1);
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(21.7 * 10.0), 217.0);
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(-2.6), -3.0);
        assert_eq!(round_half_up(1800.0), 1800.0);
    }
}
