//! Error types for rig-control.

use std::sync::Arc;

use thiserror::Error;

/// Main error type for all rig-control operations.
#[derive(Debug, Error)]
pub enum RigError {
    /// A command argument was non-numeric or out of range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ArgumentError),

    /// Payload does not fit the one-byte length field.
    #[error("Payload too large: {0} bytes (max 255)")]
    PayloadTooLarge(usize),

    /// Malformed frame bytes (wrong length, checksum mismatch, unknown command).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The live transport failed to write a frame.
    #[error("Transport error: {0}")]
    Transport(#[source] TransportError),

    /// A live transport is already attached.
    #[error("Transport already attached")]
    AlreadyAttached,

    /// Serial port could not be opened or enumerated.
    #[error("Serial error: {0}")]
    Serial(#[from] serialport::Error),

    /// Invalid configuration value.
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error while loading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON configuration error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a command argument was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArgumentError {
    /// NaN or infinite value.
    #[error("{name} must be a finite number, got {value}")]
    NotFinite { name: &'static str, value: f64 },

    /// Value outside its inclusive range.
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Failure reported by a live transport.
///
/// One sink error answers every frame of the batch it hit, so the
/// underlying `io::Error` is shared rather than copied.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The sink rejected the write.
    #[error("write failed: {0}")]
    Io(#[from] Arc<std::io::Error>),

    /// The writer task is gone.
    #[error("connection closed")]
    ConnectionClosed,
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(Arc::new(err))
    }
}

impl From<TransportError> for RigError {
    fn from(err: TransportError) -> Self {
        RigError::Transport(err)
    }
}

/// Result type alias using RigError.
pub type Result<T> = std::result::Result<T, RigError>;
