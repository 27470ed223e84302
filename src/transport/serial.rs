//! Serial port transport.
//!
//! Opens a port with the `serialport` crate and hands it to a blocking
//! writer task. The default line settings match the rotator controller:
//! `/dev/ttyUSB0`, 115200 baud, 8 data bits, no parity, 1 stop bit.
//!
//! # Example
//!
//! ```ignore
//! use rig_control::transport::{open_serial, SerialConfig};
//!
//! let config = SerialConfig::from_json_str(r#"{ "path": "/dev/ttyACM0" }"#)?;
//! let (writer, task) = open_serial(&config)?;
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serialport::{DataBits, FlowControl, Parity, StopBits};
use tokio::task::JoinHandle;

use crate::error::{RigError, Result, TransportError};
use crate::writer::{spawn_blocking_writer_task, WriterConfig, WriterHandle};

/// Default serial device.
pub const DEFAULT_SERIAL_PATH: &str = "/dev/ttyUSB0";

/// Default baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default write timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 1_000;

/// Parity setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerialParity {
    #[default]
    None,
    Odd,
    Even,
}

impl From<SerialParity> for Parity {
    fn from(parity: SerialParity) -> Self {
        match parity {
            SerialParity::None => Parity::None,
            SerialParity::Odd => Parity::Odd,
            SerialParity::Even => Parity::Even,
        }
    }
}

/// Serial line configuration.
///
/// Every field has a default, so a JSON file only needs the fields it
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub path: String,
    pub baud_rate: u32,
    /// 5 to 8.
    pub data_bits: u8,
    pub parity: SerialParity,
    /// 1 or 2.
    pub stop_bits: u8,
    /// Write timeout in milliseconds.
    pub timeout_ms: u64,
    /// Frame queue depth of the writer task.
    pub channel_capacity: usize,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_SERIAL_PATH.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: 8,
            parity: SerialParity::None,
            stop_bits: 1,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            channel_capacity: WriterConfig::default().channel_capacity,
        }
    }
}

impl SerialConfig {
    /// Default configuration for another device path.
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Parse a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check the line settings are ones a port can be opened with.
    pub fn validate(&self) -> Result<()> {
        if self.path.is_empty() {
            return Err(RigError::Config("serial path is empty".to_string()));
        }
        if self.baud_rate == 0 {
            return Err(RigError::Config("baud rate must be non-zero".to_string()));
        }
        if self.channel_capacity == 0 {
            return Err(RigError::Config(
                "channel capacity must be non-zero".to_string(),
            ));
        }
        self.serial_data_bits()?;
        self.serial_stop_bits()?;
        Ok(())
    }

    fn serial_data_bits(&self) -> Result<DataBits> {
        match self.data_bits {
            5 => Ok(DataBits::Five),
            6 => Ok(DataBits::Six),
            7 => Ok(DataBits::Seven),
            8 => Ok(DataBits::Eight),
            n => Err(RigError::Config(format!("unsupported data bits: {}", n))),
        }
    }

    fn serial_stop_bits(&self) -> Result<StopBits> {
        match self.stop_bits {
            1 => Ok(StopBits::One),
            2 => Ok(StopBits::Two),
            n => Err(RigError::Config(format!("unsupported stop bits: {}", n))),
        }
    }

    fn writer_config(&self) -> WriterConfig {
        WriterConfig {
            channel_capacity: self.channel_capacity,
        }
    }
}

/// Open the configured port and start its writer task.
///
/// Must be called inside a tokio runtime.
pub fn open_serial(
    config: &SerialConfig,
) -> Result<(WriterHandle, JoinHandle<std::result::Result<(), TransportError>>)> {
    config.validate()?;

    let port = serialport::new(config.path.as_str(), config.baud_rate)
        .data_bits(config.serial_data_bits()?)
        .parity(config.parity.into())
        .stop_bits(config.serial_stop_bits()?)
        .flow_control(FlowControl::None)
        .timeout(Duration::from_millis(config.timeout_ms))
        .open()?;

    tracing::info!(
        path = %config.path,
        baud_rate = config.baud_rate,
        "serial port opened"
    );

    Ok(spawn_blocking_writer_task(port, config.writer_config()))
}

/// Names of the serial ports present on this machine.
pub fn available_ports() -> Result<Vec<String>> {
    Ok(serialport::available_ports()?
        .into_iter()
        .map(|p| p.port_name)
        .collect())
}
