//! # Telemetry Module
//!
//! Publishes the latest orientation reading to consumers.
//!
//! This module handles:
//! - Holding the latest sample and its timestamp behind a reader/writer lock
//! - Rolling yaw history for the zero offset
//! - Connectivity detection from update staleness
//! - Adapters for PID controllers and dashboards
//! - Serializable status snapshots

pub mod adapters;
pub mod cache;
pub mod history;
pub mod snapshot;

pub use cache::TelemetryCache;
pub use history::{YawHistory, YAW_HISTORY_LENGTH};
pub use snapshot::TelemetrySnapshot;
