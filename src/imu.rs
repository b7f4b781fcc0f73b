//! # IMU Handle
//!
//! Consumer-facing handle that owns the acquisition task and exposes the
//! telemetry read API.
//!
//! ```no_run
//! use nav6_telemetry::acquisition::AcquisitionSettings;
//! use nav6_telemetry::config::Config;
//! use nav6_telemetry::imu::Imu;
//! use nav6_telemetry::serial::SerialTransport;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::load("config/default.toml")?;
//! let transport = SerialTransport::open(&config.serial)?;
//! let mut imu = Imu::start(transport, AcquisitionSettings::from(&config));
//!
//! if imu.is_connected() {
//!     println!("yaw: {:.2}", imu.get_yaw());
//! }
//! imu.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::acquisition::{AcquisitionLoop, AcquisitionSettings, AcquisitionStats};
use crate::error::{ImuError, Result};
use crate::serial::ImuTransport;
use crate::telemetry::{TelemetryCache, TelemetrySnapshot};

enum Worker<T> {
    /// Acquisition task running; the handle yields the transport back on exit
    Running(JoinHandle<T>),
    /// Task stopped, transport parked for a restart
    Idle(T),
}

/// Running nav6 acquisition plus its shared telemetry
///
/// Dropping the handle raises the stop flag; the task winds down at its next
/// check without being awaited.
pub struct Imu<T: ImuTransport + 'static> {
    cache: Arc<TelemetryCache>,
    stats: Arc<AcquisitionStats>,
    stop: Arc<AtomicBool>,
    settings: AcquisitionSettings,
    worker: Option<Worker<T>>,
}

impl<T: ImuTransport + 'static> std::fmt::Debug for Imu<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Imu")
            .field("running", &self.is_running())
            .field("settings", &self.settings)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl<T: ImuTransport + 'static> Imu<T> {
    /// Spawn the acquisition task on the current tokio runtime
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(transport: T, settings: AcquisitionSettings) -> Self {
        let mut imu = Self {
            cache: Arc::new(TelemetryCache::new(settings.stale_timeout)),
            stats: Arc::new(AcquisitionStats::default()),
            stop: Arc::new(AtomicBool::new(false)),
            settings,
            worker: None,
        };
        imu.spawn(transport);
        imu
    }

    fn spawn(&mut self, transport: T) {
        self.stop.store(false, Ordering::SeqCst);
        let acquisition = AcquisitionLoop::new(
            transport,
            self.settings.clone(),
            Arc::clone(&self.cache),
            Arc::clone(&self.stats),
            Arc::clone(&self.stop),
        );
        self.worker = Some(Worker::Running(tokio::spawn(acquisition.run())));
    }

    /// Stop the acquisition task and wait for it to release the transport
    ///
    /// # Errors
    ///
    /// Returns [`ImuError::Task`] if the task panicked; the transport is lost.
    pub async fn stop(&mut self) -> Result<()> {
        self.stop.store(true, Ordering::SeqCst);

        match self.worker.take() {
            Some(Worker::Running(handle)) => match handle.await {
                Ok(transport) => {
                    self.worker = Some(Worker::Idle(transport));
                    Ok(())
                }
                Err(e) => Err(ImuError::Task(e.to_string())),
            },
            idle => {
                self.worker = idle;
                Ok(())
            }
        }
    }

    /// Stop, reset the transport and start over from initialization
    ///
    /// History, last update time and counters are cleared; the yaw offset is
    /// kept.
    ///
    /// # Errors
    ///
    /// Returns [`ImuError::Task`] if the previous task panicked.
    pub async fn restart(&mut self) -> Result<()> {
        info!("Restarting IMU acquisition");
        self.stop().await?;

        let Some(Worker::Idle(mut transport)) = self.worker.take() else {
            return Err(ImuError::Task("transport lost, cannot restart".to_string()));
        };

        if let Err(e) = transport.reset() {
            warn!("Failed to reset transport on restart: {}", e);
        }
        self.cache.reset();
        self.stats.reset();

        self.spawn(transport);
        Ok(())
    }

    /// `true` while the acquisition task has not finished
    pub fn is_running(&self) -> bool {
        matches!(&self.worker, Some(Worker::Running(handle)) if !handle.is_finished())
    }

    /// Zero-corrected yaw in degrees, [-180, 180)
    pub fn get_yaw(&self) -> f32 {
        self.cache.get_yaw()
    }

    pub fn get_pitch(&self) -> f32 {
        self.cache.get_pitch()
    }

    pub fn get_roll(&self) -> f32 {
        self.cache.get_roll()
    }

    pub fn get_compass_heading(&self) -> f32 {
        self.cache.get_compass_heading()
    }

    /// `true` if an update arrived within the stale timeout
    pub fn is_connected(&self) -> bool {
        self.cache.is_connected()
    }

    /// Make the current heading read as zero
    pub fn zero_yaw(&self) {
        self.cache.zero_yaw();
    }

    /// Decoded packets since start or the last restart
    pub fn get_update_count(&self) -> u64 {
        self.stats.update_count()
    }

    /// Raw bytes read since start or the last restart
    pub fn get_byte_count(&self) -> u64 {
        self.stats.byte_count()
    }

    /// Shared cache handle for adapters and other consumers
    pub fn telemetry(&self) -> Arc<TelemetryCache> {
        Arc::clone(&self.cache)
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot::capture(&self.cache, &self.stats)
    }
}

impl<T: ImuTransport + 'static> Drop for Imu<T> {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav6::{encode_update, OrientationSample};
    use crate::serial::port_trait::mocks::{MockTransport, TransportEvent};
    use std::time::Duration;
    use tokio::time::Instant;

    fn test_settings() -> AcquisitionSettings {
        AcquisitionSettings {
            update_rate_hz: 50,
            read_timeout: Duration::from_millis(100),
            line_terminator: Some(b'\n'),
            read_chunk_size: 512,
            settle_delay: Duration::from_millis(100),
            resync_threshold: Duration::from_secs(1),
            stale_timeout: Duration::from_secs(1),
        }
    }

    fn yaw_packets(yaw: f32, count: usize) -> Vec<u8> {
        let sample = OrientationSample {
            yaw,
            pitch: 1.5,
            roll: -0.5,
            compass_heading: 270.0,
        };
        encode_update(&sample).repeat(count)
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_publishes_and_stop_parks_transport() {
        let transport = MockTransport::new();
        transport.push_chunk_at(Instant::now() + Duration::from_millis(150), &yaw_packets(12.0, 2));

        let mut imu = Imu::start(transport.clone(), test_settings());
        assert!(imu.is_running());
        assert!(!imu.is_connected());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(imu.is_connected());
        assert_eq!(imu.get_update_count(), 2);
        assert_eq!(imu.get_byte_count(), 68);
        assert_eq!(imu.get_yaw(), 12.0);
        assert_eq!(imu.get_pitch(), 1.5);
        assert_eq!(imu.get_roll(), -0.5);
        assert_eq!(imu.get_compass_heading(), 270.0);

        tokio_test::assert_ok!(imu.stop().await);
        assert!(!imu.is_running());
        assert!(matches!(imu.worker, Some(Worker::Idle(_))));

        // Stopping twice is harmless
        tokio_test::assert_ok!(imu.stop().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_counters_and_keeps_offset() {
        let transport = MockTransport::new();
        transport.push_chunk_at(Instant::now() + Duration::from_millis(150), &yaw_packets(30.0, 10));

        let mut imu = Imu::start(transport.clone(), test_settings());
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(imu.get_update_count(), 10);
        assert_eq!(imu.get_byte_count(), 340);

        imu.zero_yaw();
        assert_eq!(imu.telemetry().yaw_offset(), 30.0);
        assert_eq!(imu.get_yaw(), 0.0);

        tokio_test::assert_ok!(imu.restart().await);
        assert!(imu.is_running());
        assert_eq!(imu.get_update_count(), 0);
        assert_eq!(imu.get_byte_count(), 0);
        assert!(!imu.is_connected());
        assert_eq!(imu.telemetry().yaw_offset(), 30.0);
        assert!(transport.events().contains(&TransportEvent::Reset));

        transport.push_chunk_at(Instant::now() + Duration::from_millis(150), &yaw_packets(40.0, 1));
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(transport.written().len(), 2);
        assert_eq!(transport.written()[0], transport.written()[1]);
        assert_eq!(imu.get_update_count(), 1);
        assert!(imu.is_connected());
        assert!((imu.get_yaw() - 10.0).abs() < 1e-4);

        tokio_test::assert_ok!(imu.stop().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_stop() {
        let transport = MockTransport::new();
        let mut imu = Imu::start(transport.clone(), test_settings());

        tokio::time::sleep(Duration::from_millis(50)).await;
        tokio_test::assert_ok!(imu.stop().await);
        assert!(transport.written().is_empty());

        tokio_test::assert_ok!(imu.restart().await);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(transport.written().len(), 1);

        tokio_test::assert_ok!(imu.stop().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_telemetry_handle_is_shared() {
        let transport = MockTransport::new();
        transport.push_chunk_at(Instant::now() + Duration::from_millis(150), &yaw_packets(-45.0, 1));

        let mut imu = Imu::start(transport, test_settings());
        let cache = imu.telemetry();
        assert!(Arc::ptr_eq(&cache, &imu.telemetry()));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(cache.get_yaw(), -45.0);

        let snapshot = imu.snapshot();
        assert!(snapshot.connected);
        assert_eq!(snapshot.update_count, 1);
        assert_eq!(snapshot.yaw, -45.0);

        tokio_test::assert_ok!(imu.stop().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_raises_stop_flag() {
        let imu = Imu::start(MockTransport::new(), test_settings());
        let stop = Arc::clone(&imu.stop);
        let worker = match imu.worker {
            Some(Worker::Running(ref handle)) => handle.abort_handle(),
            _ => panic!("worker should be running"),
        };

        drop(imu);
        assert!(stop.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(worker.is_finished());
    }
}
