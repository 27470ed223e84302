//! Typed rig commands and their payload encoding.
//!
//! # Example
//!
//! ```
//! use rig_control::protocol::{Command, CommandId};
//!
//! let cmd = Command::turn_to(21.7, 3.0).unwrap();
//! assert_eq!(cmd.id(), CommandId::TurnTo);
//! assert_eq!(cmd.encode_payload(), vec![0x00, 0xD9, 0x03]);
//! ```

use super::wire_format::{encode_high_low, round_half_up, wrap_u16, wrap_u8, CommandId};
use crate::error::{ArgumentError, Result};

/// Allowed target angle in degrees.
pub const TARGET_DEGREE_RANGE: (f64, f64) = (-180.0, 180.0);

/// Allowed `TURN_TO` speed in degrees per second.
pub const TURN_TO_SPEED_RANGE: (f64, f64) = (1.0, 255.0);

/// Angles travel on the wire in tenths of a degree.
const DEGREE_SCALE: f64 = 10.0;

/// A validated command, ready to be encoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Initialize the interface.
    Init,
    /// Turn to an absolute angle.
    TurnTo {
        /// Target angle in degrees, `-180..=180`.
        target_degree: f64,
        /// Speed in degrees per second, `1..=255`.
        speed: f64,
    },
    /// Turn continuously.
    Turn {
        /// Raw speed value, sent as a wrapped 16-bit integer.
        speed: f64,
    },
}

impl Command {
    /// `INIT` command.
    pub fn init() -> Self {
        Command::Init
    }

    /// `TURN_TO` command, validating both arguments.
    pub fn turn_to(target_degree: f64, speed: f64) -> Result<Self> {
        check_range("target_degree", target_degree, TARGET_DEGREE_RANGE)?;
        check_range("speed", speed, TURN_TO_SPEED_RANGE)?;
        Ok(Command::TurnTo {
            target_degree,
            speed,
        })
    }

    /// `TURN` command. The speed only has to be finite.
    pub fn turn(speed: f64) -> Result<Self> {
        check_finite("speed", speed)?;
        Ok(Command::Turn { speed })
    }

    /// Wire command id.
    pub fn id(&self) -> CommandId {
        match self {
            Command::Init => CommandId::Init,
            Command::TurnTo { .. } => CommandId::TurnTo,
            Command::Turn { .. } => CommandId::Turn,
        }
    }

    /// Encode the arguments into payload bytes.
    ///
    /// - `INIT`: `[0x00, 0x00]`
    /// - `TURN_TO`: angle×10 (rounded, wrapped to u16) high/low, then speed low byte
    /// - `TURN`: speed wrapped to u16, high/low, unscaled
    pub fn encode_payload(&self) -> Vec<u8> {
        match *self {
            Command::Init => vec![0x00, 0x00],
            Command::TurnTo {
                target_degree,
                speed,
            } => {
                let degree_value = round_half_up(target_degree * DEGREE_SCALE);
                let [high, low] = encode_high_low(wrap_u16(degree_value));
                vec![high, low, wrap_u8(speed)]
            }
            // Same 16-bit split as angles, without the ×10 scaling.
            Command::Turn { speed } => encode_high_low(wrap_u16(speed)).to_vec(),
        }
    }
}

fn check_finite(name: &'static str, value: f64) -> std::result::Result<(), ArgumentError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ArgumentError::NotFinite { name, value })
    }
}

fn check_range(
    name: &'static str,
    value: f64,
    (min, max): (f64, f64),
) -> std::result::Result<(), ArgumentError> {
    check_finite(name, value)?;
    if value < min || value > max {
        return Err(ArgumentError::OutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(())
}
