//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{ImuError, Result};
use crate::nav6::protocol::YPR_UPDATE_MESSAGE_LENGTH;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub imu: ImuConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    /// Device path; empty means auto-detect
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Upper bound on a single read
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Byte that ends a read early; `None` disables termination
    #[serde(default = "default_line_terminator")]
    pub line_terminator: Option<u8>,

    /// Largest single read; a full read without a packet counts as desync
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,
}

/// IMU stream configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ImuConfig {
    #[serde(default = "default_update_rate_hz")]
    pub update_rate_hz: u8,

    /// Device boot time waited before the stream command is sent
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Silence longer than this means the device dropped its stream
    #[serde(default = "default_resync_threshold_ms")]
    pub resync_threshold_ms: u64,

    /// Update age after which the IMU is reported disconnected
    #[serde(default = "default_stale_timeout_ms")]
    pub stale_timeout_ms: u64,
}

/// Status feed configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ReportingConfig {
    #[serde(default = "default_report_interval_ms")]
    pub interval_ms: u64,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 57600 }
fn default_timeout_ms() -> u64 { 500 }
fn default_line_terminator() -> Option<u8> { Some(b'\n') }
fn default_read_chunk_size() -> usize { 256 }

fn default_update_rate_hz() -> u8 { 50 }
fn default_settle_delay_ms() -> u64 { 2000 }
fn default_resync_threshold_ms() -> u64 { 1000 }
fn default_stale_timeout_ms() -> u64 { 1000 }

fn default_report_interval_ms() -> u64 { 1000 }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
            line_terminator: default_line_terminator(),
            read_chunk_size: default_read_chunk_size(),
        }
    }
}

impl Default for ImuConfig {
    fn default() -> Self {
        Self {
            update_rate_hz: default_update_rate_hz(),
            settle_delay_ms: default_settle_delay_ms(),
            resync_threshold_ms: default_resync_threshold_ms(),
            stale_timeout_ms: default_stale_timeout_ms(),
        }
    }
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_report_interval_ms(),
        }
    }
}

impl SerialConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl ImuConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn resync_threshold(&self) -> Duration {
        Duration::from_millis(self.resync_threshold_ms)
    }

    pub fn stale_timeout(&self) -> Duration {
        Duration::from_millis(self.stale_timeout_ms)
    }
}

impl ReportingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use nav6_telemetry::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if ![9600, 19200, 38400, 57600, 115200].contains(&self.serial.baud_rate) {
            return Err(invalid("baud_rate must be one of: 9600, 19200, 38400, 57600, 115200"));
        }

        if self.serial.timeout_ms == 0 || self.serial.timeout_ms > 10000 {
            return Err(invalid("timeout_ms must be between 1 and 10000"));
        }

        if self.serial.read_chunk_size < YPR_UPDATE_MESSAGE_LENGTH || self.serial.read_chunk_size > 4096 {
            return Err(invalid(format!(
                "read_chunk_size must be between {} and 4096",
                YPR_UPDATE_MESSAGE_LENGTH
            )));
        }

        if self.imu.update_rate_hz == 0 {
            return Err(invalid("update_rate_hz must be between 1 and 255"));
        }

        if self.imu.settle_delay_ms > 10000 {
            return Err(invalid("settle_delay_ms must be at most 10000"));
        }

        if self.imu.resync_threshold_ms == 0 || self.imu.resync_threshold_ms > 60000 {
            return Err(invalid("resync_threshold_ms must be between 1 and 60000"));
        }

        if self.imu.stale_timeout_ms == 0 || self.imu.stale_timeout_ms > 60000 {
            return Err(invalid("stale_timeout_ms must be between 1 and 60000"));
        }

        if self.reporting.interval_ms == 0 || self.reporting.interval_ms > 60000 {
            return Err(invalid("reporting interval_ms must be between 1 and 60000"));
        }

        Ok(())
    }
}

fn invalid(message: impl std::fmt::Display) -> ImuError {
    ImuError::Config(toml::de::Error::custom(message))
}
