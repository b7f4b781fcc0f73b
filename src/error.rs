//! # Error Types
//!
//! Custom error types for nav6-telemetry using `thiserror`.
//!
//! Packet-level decode failures live in [`crate::nav6::DecodeError`]; they never
//! leave the framing scan and so are not part of [`ImuError`].

use std::time::Duration;
use thiserror::Error;

/// Main error type for nav6-telemetry
#[derive(Debug, Error)]
pub enum ImuError {
    /// Serial port could not be opened or configured
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate device paths could be opened
    #[error("No IMU serial device found (tried: {0})")]
    SerialPortNotFound(String),

    /// Read returned no data within the configured timeout
    #[error("No data received within {0:?}")]
    TransportTimeout(Duration),

    /// A full-size read contained no decodable packet
    #[error("Stream desynchronized: {0} bytes without a valid packet")]
    Desync(usize),

    /// The acquisition task panicked or was cancelled
    #[error("Acquisition task failed: {0}")]
    Task(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for nav6-telemetry
pub type Result<T> = std::result::Result<T, ImuError>;
