//! # Serial Communication Module
//!
//! Handles serial communication with the nav6 IMU.
//!
//! This module handles:
//! - Opening the serial port (8N1, no flow control)
//! - Timeout-bounded, optionally line-terminated reads
//! - Pending-byte queries and input discards used for resynchronization

pub mod port_trait;

use async_trait::async_trait;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::Instant;
use tokio_serial::{ClearBuffer, SerialPort, SerialPortBuilderExt};
use tracing::{debug, info, warn};

use crate::config::SerialConfig;
use crate::error::{ImuError, Result};
pub use port_trait::ImuTransport;

/// Default nav6 baud rate
pub const NAV6_BAUD_RATE: u32 = 57_600;

/// Default IMU device paths to try (in order of preference)
const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyUSB0", // USB-to-serial adapters (most common for nav6)
    "/dev/ttyACM0", // USB CDC devices
];

/// nav6 serial port handler
///
/// Reads behave like a classic serial API: they return once the buffer is
/// full, the line terminator arrives, or the read timeout expires.
pub struct SerialTransport {
    /// Serial port handle
    port: tokio_serial::SerialStream,
    /// Device path (e.g., /dev/ttyUSB0)
    device_path: String,
    read_timeout: Duration,
    terminator: Option<u8>,
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("device_path", &self.device_path)
            .field("read_timeout", &self.read_timeout)
            .field("terminator", &self.terminator)
            .finish_non_exhaustive()
    }
}

impl SerialTransport {
    /// Open the port named in `config`, or auto-detect when it is empty
    ///
    /// # Errors
    ///
    /// Returns error if no device could be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use nav6_telemetry::config::Config;
    /// use nav6_telemetry::serial::SerialTransport;
    ///
    /// # async fn run() -> anyhow::Result<()> {
    /// let config = Config::load("config/default.toml")?;
    /// let serial = SerialTransport::open(&config.serial)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let mut transport = if config.port.is_empty() {
            Self::open_with_paths(DEFAULT_DEVICE_PATHS, config.baud_rate)?
        } else {
            Self::open_with_paths(&[config.port.as_str()], config.baud_rate)?
        };
        transport.read_timeout = config.timeout();
        transport.terminator = config.line_terminator;
        Ok(transport)
    }

    /// Open the first device in `paths` that accepts the connection
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try (e.g., &["/dev/ttyUSB0"])
    /// * `baud_rate` - Line speed
    ///
    /// # Returns
    ///
    /// * `Result<SerialTransport>` - Connected serial port or error
    pub fn open_with_paths(paths: &[&str], baud_rate: u32) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(port) => {
                    info!("Successfully opened IMU device at {}", path);
                    return Ok(Self {
                        port,
                        device_path: path.to_string(),
                        read_timeout: Duration::from_secs(1),
                        terminator: None,
                    });
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(ImuError::SerialPortNotFound(paths.join(", ")))
    }

    /// Open a specific serial port with nav6 settings (8N1, no flow control)
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| ImuError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

#[async_trait]
impl ImuTransport for SerialTransport {
    fn set_read_timeout(&mut self, timeout: Duration) {
        self.read_timeout = timeout;
    }

    fn set_line_termination(&mut self, terminator: Option<u8>) {
        self.terminator = terminator;
    }

    async fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.port.write_all(data).await?;
        debug!("Sent {} bytes", data.len());
        Ok(data.len())
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let deadline = Instant::now() + self.read_timeout;
        let mut filled = 0;

        while filled < buf.len() {
            let n = match tokio::time::timeout_at(deadline, self.port.read(&mut buf[filled..])).await {
                Err(_elapsed) => break,
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => n,
                Ok(Err(e)) if filled > 0 => {
                    debug!("Read error after {} bytes: {}", filled, e);
                    break;
                }
                Ok(Err(e)) => return Err(e),
            };

            let terminated = self
                .terminator
                .is_some_and(|t| buf[filled..filled + n].contains(&t));
            filled += n;
            if terminated {
                break;
            }
        }

        Ok(filled)
    }

    fn pending_byte_count(&self) -> io::Result<usize> {
        let pending = self.port.bytes_to_read().map_err(io::Error::from)?;
        Ok(pending as usize)
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.port.flush().await
    }

    fn reset(&mut self) -> io::Result<()> {
        self.port.clear(ClearBuffer::Input).map_err(io::Error::from)
    }
}
