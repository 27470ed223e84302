//! Transport module - where assembled frames go.
//!
//! Provides:
//! - [`Transport`]: the `write(frame)` capability a live link offers
//! - [`DryRun`]: formats frames as hex instead of sending them
//! - [`SerialConfig`] / [`open_serial`]: a serial port behind the writer task

mod dry_run;
mod serial;

use std::future::Future;

pub use dry_run::{DryRun, DryRunOutput, DRY_RUN_PREFIX};
pub use serial::{
    available_ports, open_serial, SerialConfig, SerialParity, DEFAULT_BAUD_RATE, DEFAULT_SERIAL_PATH,
    DEFAULT_TIMEOUT_MS,
};

use crate::error::TransportError;
use crate::protocol::Frame;

/// Acknowledgement that a frame was accepted for transmission.
///
/// Says nothing about whether the rig received or acted on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteAck {
    /// Counter of the frame that was written.
    pub counter: u8,
    /// Bytes handed to the sink.
    pub bytes_written: usize,
}

/// A live byte sink for frames.
///
/// Implementations deliver the frame bytes unchanged and resolve once the
/// sink has accepted them.
pub trait Transport: Send + Sync {
    /// Write one frame.
    fn write(&self, frame: Frame) -> impl Future<Output = Result<WriteAck, TransportError>> + Send;
}
