//! Acquisition loop state machine
//!
//! ```text
//! Initializing -> Streaming <-> AwaitingData -> Resyncing -> Streaming
//!                 (any state) -> Stopped
//! ```
//!
//! Transport failures never end the loop: read errors and timeouts both lead
//! to `AwaitingData`, write errors are logged. Only the stop flag exits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{AcquisitionSettings, AcquisitionStats};
use crate::error::{ImuError, Result};
use crate::nav6::{encode_stream_command, scan_chunk, ScanOutcome, StreamKind};
use crate::serial::ImuTransport;
use crate::telemetry::TelemetryCache;

/// Longest a blocking point may go without looking at the stop flag
const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// State of the acquisition loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Configuring the transport and waiting for the device to boot
    Initializing,
    /// Reading and decoding chunks
    Streaming,
    /// Last read returned nothing; polling for input since `since`
    AwaitingData { since: Instant },
    /// Device went silent too long; re-requesting the stream
    Resyncing,
    /// Stop requested
    Stopped,
}

/// Drives one transport until stopped
///
/// The loop owns the transport exclusively and hands it back from [`run`](Self::run).
pub struct AcquisitionLoop<T: ImuTransport> {
    transport: T,
    settings: AcquisitionSettings,
    cache: Arc<TelemetryCache>,
    stats: Arc<AcquisitionStats>,
    stop: Arc<AtomicBool>,
    chunk: Vec<u8>,
}

impl<T: ImuTransport> AcquisitionLoop<T> {
    pub fn new(
        transport: T,
        settings: AcquisitionSettings,
        cache: Arc<TelemetryCache>,
        stats: Arc<AcquisitionStats>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        let chunk = vec![0u8; settings.read_chunk_size];
        Self {
            transport,
            settings,
            cache,
            stats,
            stop,
            chunk,
        }
    }

    /// Run until the stop flag is raised, then return the transport
    pub async fn run(mut self) -> T {
        info!(
            "IMU acquisition starting ({} Hz, {}-byte reads)",
            self.settings.update_rate_hz, self.settings.read_chunk_size
        );

        let mut state = LoopState::Initializing;
        while state != LoopState::Stopped {
            let next = if self.stop_requested() {
                LoopState::Stopped
            } else {
                self.step(state).await
            };

            if std::mem::discriminant(&next) != std::mem::discriminant(&state) {
                debug!("Acquisition state {:?} -> {:?}", state, next);
            }
            state = next;
        }

        info!(
            "IMU acquisition stopped ({} updates, {} bytes)",
            self.stats.update_count(),
            self.stats.byte_count()
        );
        self.transport
    }

    /// Execute one state and return the next
    pub async fn step(&mut self, state: LoopState) -> LoopState {
        match state {
            LoopState::Initializing => self.initialize().await,
            LoopState::Streaming => self.stream().await,
            LoopState::AwaitingData { since } => self.await_data(since).await,
            LoopState::Resyncing => self.resync().await,
            LoopState::Stopped => LoopState::Stopped,
        }
    }

    async fn initialize(&mut self) -> LoopState {
        self.transport.set_read_timeout(self.settings.read_timeout);
        self.transport.set_line_termination(self.settings.line_terminator);
        if let Err(e) = self.transport.flush().await {
            warn!("Failed to flush transport: {}", e);
        }
        self.discard_input();

        debug!("Waiting {:?} for the IMU to boot", self.settings.settle_delay);
        if !self.pause(self.settings.settle_delay).await {
            return LoopState::Stopped;
        }

        self.send_stream_command().await;
        LoopState::Streaming
    }

    async fn stream(&mut self) -> LoopState {
        let stop = Arc::clone(&self.stop);
        let read = tokio::select! {
            read = self.transport.read(&mut self.chunk) => read,
            _ = wait_for_stop(&stop) => return LoopState::Stopped,
        };

        match self.check_read(read) {
            Ok(len) => {
                self.process_chunk(len);
                LoopState::Streaming
            }
            Err(e @ ImuError::TransportTimeout(_)) => {
                debug!("{}", e);
                LoopState::AwaitingData {
                    since: Instant::now(),
                }
            }
            Err(e) => {
                debug!("Read failed: {}", e);
                // Failed reads can return at once; back off before polling
                let since = Instant::now();
                if !self.pause(self.settings.poll_interval()).await {
                    return LoopState::Stopped;
                }
                LoopState::AwaitingData { since }
            }
        }
    }

    async fn await_data(&mut self, since: Instant) -> LoopState {
        loop {
            if self.stop_requested() {
                return LoopState::Stopped;
            }

            match self.transport.pending_byte_count() {
                Ok(pending) if pending > 0 => break,
                Ok(_) => {}
                Err(e) => debug!("Pending byte query failed: {}", e),
            }

            if !self.pause(self.settings.poll_interval()).await {
                return LoopState::Stopped;
            }
        }

        let waited = since.elapsed();
        if waited > self.settings.resync_threshold {
            info!("IMU was silent for {:?}, re-requesting stream", waited);
            LoopState::Resyncing
        } else {
            LoopState::Streaming
        }
    }

    async fn resync(&mut self) -> LoopState {
        if !self.pause(self.settings.settle_delay).await {
            return LoopState::Stopped;
        }
        self.send_stream_command().await;
        LoopState::Streaming
    }

    fn check_read(&self, read: std::io::Result<usize>) -> Result<usize> {
        match read {
            Ok(0) => Err(ImuError::TransportTimeout(self.settings.read_timeout)),
            Ok(len) => Ok(len.min(self.chunk.len())),
            Err(e) => Err(ImuError::Io(e)),
        }
    }

    /// Publish every packet in the first `len` bytes of the chunk buffer
    fn process_chunk(&mut self, len: usize) -> ScanOutcome {
        self.stats.record_bytes(len);

        let cache = &self.cache;
        let stats = &self.stats;
        let outcome = scan_chunk(&self.chunk[..len], |sample| {
            cache.publish(sample);
            stats.record_update();
        });

        // A full read with nothing decodable means the stream is misaligned
        if outcome.packets == 0 && len == self.chunk.len() {
            warn!("{}, resetting transport", ImuError::Desync(len));
            self.discard_input();
        } else {
            debug!(
                "Read {} bytes: {} packets, {} bytes skipped",
                len, outcome.packets, outcome.skipped
            );
        }

        outcome
    }

    async fn send_stream_command(&mut self) {
        let rate = self.settings.update_rate_hz;
        let command = encode_stream_command(StreamKind::YawPitchRoll, rate);

        match self.transport.write(&command).await {
            Ok(_) => info!("Requested yaw/pitch/roll stream at {} Hz", rate),
            Err(e) => warn!("Failed to send stream command: {}", e),
        }
        if let Err(e) = self.transport.flush().await {
            warn!("Failed to flush transport: {}", e);
        }
        self.discard_input();
    }

    fn discard_input(&mut self) {
        if let Err(e) = self.transport.reset() {
            warn!("Failed to reset transport: {}", e);
        }
    }

    /// Sleep for `duration` in short slices; `false` if stopped meanwhile
    async fn pause(&mut self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.stop_requested() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            tokio::time::sleep((deadline - now).min(STOP_CHECK_INTERVAL)).await;
        }
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

/// Resolves once `stop` is raised
async fn wait_for_stop(stop: &AtomicBool) {
    while !stop.load(Ordering::SeqCst) {
        tokio::time::sleep(STOP_CHECK_INTERVAL).await;
    }
}
