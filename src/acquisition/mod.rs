//! # Acquisition Module
//!
//! Background task that keeps the nav6 streaming and turns its byte output into
//! published samples.
//!
//! This module handles:
//! - Transport setup, device settle delay and the stream command
//! - Chunked reads and packet framing
//! - Desync recovery (transport reset) and silence recovery (stream resend)
//! - Per-instance update and byte counters

pub mod task;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::config::Config;

pub use task::{AcquisitionLoop, LoopState};

/// Tunables of one acquisition run
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionSettings {
    /// Requested device update rate; also sets the silence poll interval
    pub update_rate_hz: u8,
    /// Upper bound on a single transport read
    pub read_timeout: Duration,
    /// Byte that ends a transport read early
    pub line_terminator: Option<u8>,
    /// Transport's maximum single read; a full read with no packet is a desync
    pub read_chunk_size: usize,
    /// Wait before (re)sending the stream command
    pub settle_delay: Duration,
    /// Silence longer than this triggers a stream resend
    pub resync_threshold: Duration,
    /// Update age after which consumers see the IMU as disconnected
    pub stale_timeout: Duration,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for AcquisitionSettings {
    fn from(config: &Config) -> Self {
        Self {
            update_rate_hz: config.imu.update_rate_hz,
            read_timeout: config.serial.timeout(),
            line_terminator: config.serial.line_terminator,
            read_chunk_size: config.serial.read_chunk_size,
            settle_delay: config.imu.settle_delay(),
            resync_threshold: config.imu.resync_threshold(),
            stale_timeout: config.imu.stale_timeout(),
        }
    }
}

impl AcquisitionSettings {
    /// Interval between pending-byte polls while the device is silent
    pub fn poll_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.update_rate_hz.max(1)))
    }
}

/// Diagnostic counters owned by one acquisition instance
#[derive(Debug, Default)]
pub struct AcquisitionStats {
    updates: AtomicU64,
    bytes: AtomicU64,
}

impl AcquisitionStats {
    pub fn record_update(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bytes(&self, count: usize) {
        self.bytes.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Decoded packets since start or the last restart
    pub fn update_count(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    /// Raw bytes read since start or the last restart
    pub fn byte_count(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.updates.store(0, Ordering::Relaxed);
        self.bytes.store(0, Ordering::Relaxed);
    }
}
