//! # Telemetry Snapshot
//!
//! Point-in-time view of the cache and acquisition counters, serialized as one
//! JSON line per report by the binary's live status feed.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use super::cache::TelemetryCache;
use crate::acquisition::AcquisitionStats;

/// One status record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    /// Wall-clock capture time (RFC 3339, UTC)
    pub timestamp: String,
    pub connected: bool,
    /// Zero-corrected yaw
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    pub compass_heading: f32,
    pub yaw_offset: f32,
    pub update_count: u64,
    pub byte_count: u64,
}

impl TelemetrySnapshot {
    /// Reads the cache and counters into a new snapshot
    pub fn capture(cache: &TelemetryCache, stats: &AcquisitionStats) -> Self {
        let sample = cache.sample();
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            connected: cache.is_connected(),
            yaw: cache.get_yaw(),
            pitch: sample.pitch,
            roll: sample.roll,
            compass_heading: sample.compass_heading,
            yaw_offset: cache.yaw_offset(),
            update_count: stats.update_count(),
            byte_count: stats.byte_count(),
        }
    }

    /// Serializes the snapshot as a single JSON line (no trailing newline)
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav6::OrientationSample;

    #[test]
    fn test_capture_reflects_cache_and_stats() {
        let cache = TelemetryCache::default();
        cache.publish(OrientationSample {
            yaw: 12.5,
            pitch: -3.0,
            roll: 4.0,
            compass_heading: 200.0,
        });

        let stats = AcquisitionStats::default();
        stats.record_bytes(34);
        stats.record_update();

        let snapshot = TelemetrySnapshot::capture(&cache, &stats);

        assert!(snapshot.connected);
        assert_eq!(snapshot.yaw, 12.5);
        assert_eq!(snapshot.pitch, -3.0);
        assert_eq!(snapshot.compass_heading, 200.0);
        assert_eq!(snapshot.update_count, 1);
        assert_eq!(snapshot.byte_count, 34);
    }

    #[test]
    fn test_json_line_fields() {
        let cache = TelemetryCache::default();
        let stats = AcquisitionStats::default();
        let snapshot = TelemetrySnapshot::capture(&cache, &stats);

        let line = snapshot.to_json_line().unwrap();
        assert!(!line.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["connected"], false);
        assert_eq!(value["update_count"], 0);
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
        for key in ["yaw", "pitch", "roll", "compass_heading", "yaw_offset", "byte_count"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
    }
}
