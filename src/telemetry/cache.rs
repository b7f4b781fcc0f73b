//! # Telemetry Cache
//!
//! Latest orientation sample shared between the acquisition task (single writer)
//! and any number of consumer threads.
//!
//! The sample and its timestamp sit behind one `RwLock` so readers never see a
//! sample paired with another sample's timestamp. Locks are only held for the
//! copy in or out, never across I/O.

use std::sync::{Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::time::Instant;

use super::history::YawHistory;
use crate::nav6::OrientationSample;

/// Default staleness threshold for [`TelemetryCache::is_connected`]
pub const DEFAULT_STALE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, Default)]
struct TelemetryState {
    sample: OrientationSample,
    yaw_offset: f32,
    last_update_time: Option<Instant>,
}

/// Concurrency-safe holder of the most recent orientation sample
#[derive(Debug)]
pub struct TelemetryCache {
    state: RwLock<TelemetryState>,
    history: Mutex<YawHistory>,
    stale_timeout: Duration,
}

impl Default for TelemetryCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIMEOUT)
    }
}

impl TelemetryCache {
    /// Creates an empty cache that reports disconnected until the first publish
    ///
    /// # Arguments
    ///
    /// * `stale_timeout` - Maximum age of the last update for `is_connected()`
    #[must_use]
    pub fn new(stale_timeout: Duration) -> Self {
        Self {
            state: RwLock::new(TelemetryState::default()),
            history: Mutex::new(YawHistory::new()),
            stale_timeout,
        }
    }

    /// Replaces the current sample and stamps it, then records its yaw in the history
    pub fn publish(&self, sample: OrientationSample) {
        let now = Instant::now();
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.sample = sample;
            state.last_update_time = Some(match state.last_update_time {
                Some(previous) => previous.max(now),
                None => now,
            });
        }

        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .append(sample.yaw);
    }

    /// Yaw relative to the zero offset, in degrees within `[-180, 180)`
    ///
    /// This angle increases as the platform turns right.
    pub fn get_yaw(&self) -> f32 {
        let state = self.read_state();
        wrap_degrees(state.sample.yaw - state.yaw_offset)
    }

    /// Pitch in degrees
    pub fn get_pitch(&self) -> f32 {
        self.read_state().sample.pitch
    }

    /// Roll in degrees
    pub fn get_roll(&self) -> f32 {
        self.read_state().sample.roll
    }

    /// Compass heading in degrees
    pub fn get_compass_heading(&self) -> f32 {
        self.read_state().sample.compass_heading
    }

    /// Raw sample as last received, without the yaw offset applied
    pub fn sample(&self) -> OrientationSample {
        self.read_state().sample
    }

    /// Current zero offset subtracted from yaw
    pub fn yaw_offset(&self) -> f32 {
        self.read_state().yaw_offset
    }

    /// Monotonic time of the last decoded update, `None` before the first one
    pub fn last_update_time(&self) -> Option<Instant> {
        self.read_state().last_update_time
    }

    /// `true` while the last update is no older than the stale timeout
    pub fn is_connected(&self) -> bool {
        match self.last_update_time() {
            Some(last) => last.elapsed() <= self.stale_timeout,
            None => false,
        }
    }

    /// Makes the current heading read as zero
    ///
    /// Uses the average of the yaw history rather than the latest sample to
    /// smooth out instantaneous noise.
    pub fn zero_yaw(&self) {
        let history = *self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let offset = history.average();

        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .yaw_offset = offset;
    }

    /// Clears history and last update time for a restart; the yaw offset is kept
    pub fn reset(&self) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .last_update_time = None;
    }

    fn read_state(&self) -> TelemetryState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Single-wrap normalization into `[-180, 180)`
///
/// Sufficient for differences of two angles that are each already in range.
pub fn wrap_degrees(degrees: f32) -> f32 {
    if degrees < -180.0 {
        degrees + 360.0
    } else if degrees >= 180.0 {
        degrees - 360.0
    } else {
        degrees
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::history::YAW_HISTORY_LENGTH;
    use std::sync::Arc;

    fn sample_with_yaw(yaw: f32) -> OrientationSample {
        OrientationSample {
            yaw,
            pitch: 1.5,
            roll: -2.5,
            compass_heading: 90.0,
        }
    }

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(0.0), 0.0);
        assert_eq!(wrap_degrees(-180.0), -180.0);
        assert_eq!(wrap_degrees(180.0), -180.0);
        assert_eq!(wrap_degrees(190.0), -170.0);
        assert_eq!(wrap_degrees(-190.0), 170.0);
        assert_eq!(wrap_degrees(359.0), -1.0);
        assert_eq!(wrap_degrees(-359.0), 1.0);
    }

    #[test]
    fn test_get_yaw_always_in_range() {
        let cache = TelemetryCache::default();
        let mut yaw = -180.0f32;
        while yaw < 180.0 {
            let mut offset = -180.0f32;
            while offset < 180.0 {
                cache.state.write().unwrap().yaw_offset = offset;
                cache.publish(sample_with_yaw(yaw));
                let result = cache.get_yaw();
                assert!(
                    (-180.0..180.0).contains(&result),
                    "yaw {} offset {} gave {}",
                    yaw,
                    offset,
                    result
                );
                offset += 7.5;
            }
            yaw += 2.5;
        }
    }

    #[test]
    fn test_getters_return_published_values() {
        let cache = TelemetryCache::default();
        cache.publish(sample_with_yaw(45.0));

        assert_eq!(cache.get_yaw(), 45.0);
        assert_eq!(cache.get_pitch(), 1.5);
        assert_eq!(cache.get_roll(), -2.5);
        assert_eq!(cache.get_compass_heading(), 90.0);
        assert_eq!(cache.sample(), sample_with_yaw(45.0));
    }

    #[test]
    fn test_zero_yaw_after_steady_samples() {
        let cache = TelemetryCache::default();
        for _ in 0..YAW_HISTORY_LENGTH {
            cache.publish(sample_with_yaw(-120.0));
        }

        cache.zero_yaw();

        assert!(cache.get_yaw().abs() < 1e-3);
        assert!((cache.yaw_offset() + 120.0).abs() < 1e-3);
    }

    #[test]
    fn test_zero_yaw_cold_start_bias() {
        let cache = TelemetryCache::default();
        cache.publish(sample_with_yaw(100.0));

        cache.zero_yaw();

        // One of ten slots written
        assert!((cache.yaw_offset() - 10.0).abs() < 1e-3);
        assert!((cache.get_yaw() - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_zeroed_yaw_wraps_across_boundary() {
        let cache = TelemetryCache::default();
        for _ in 0..YAW_HISTORY_LENGTH {
            cache.publish(sample_with_yaw(170.0));
        }
        cache.zero_yaw();

        cache.publish(sample_with_yaw(-170.0));
        // -170 - 170 = -340, wraps to 20
        assert!((cache.get_yaw() - 20.0).abs() < 1e-3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_is_connected_lifecycle() {
        let cache = TelemetryCache::new(Duration::from_secs(1));
        assert!(!cache.is_connected(), "no publish yet");

        cache.publish(sample_with_yaw(0.0));
        assert!(cache.is_connected());

        tokio::time::advance(Duration::from_millis(900)).await;
        assert!(cache.is_connected());

        tokio::time::advance(Duration::from_millis(200)).await;
        assert!(!cache.is_connected(), "stale after threshold");

        cache.publish(sample_with_yaw(0.0));
        assert!(cache.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_update_time_is_monotonic() {
        let cache = TelemetryCache::default();
        cache.publish(sample_with_yaw(1.0));
        let first = cache.last_update_time().unwrap();

        tokio::time::advance(Duration::from_millis(10)).await;
        cache.publish(sample_with_yaw(2.0));
        let second = cache.last_update_time().unwrap();

        assert!(second > first);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_keeps_offset() {
        let cache = TelemetryCache::default();
        for _ in 0..YAW_HISTORY_LENGTH {
            cache.publish(sample_with_yaw(30.0));
        }
        cache.zero_yaw();

        cache.reset();

        assert!(!cache.is_connected());
        assert!(cache.last_update_time().is_none());
        assert!((cache.yaw_offset() - 30.0).abs() < 1e-3);

        // History was cleared: a fresh zero only sees one sample
        cache.publish(sample_with_yaw(30.0));
        cache.zero_yaw();
        assert!((cache.yaw_offset() - 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        let cache = Arc::new(TelemetryCache::default());

        let writer = {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for i in 0..1000 {
                    let value = (i % 360) as f32 - 180.0;
                    cache.publish(OrientationSample {
                        yaw: value,
                        pitch: value,
                        roll: value,
                        compass_heading: value,
                    });
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        // Whole-sample replacement: fields never mix samples
                        let sample = cache.sample();
                        assert_eq!(sample.yaw, sample.pitch);
                        assert_eq!(sample.roll, sample.compass_heading);
                        cache.zero_yaw();
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
