//! # nav6 Telemetry
//!
//! Stream orientation from a nav6 IMU and print a live JSON status feed.
//!
//! Logs go to stderr; stdout carries one JSON object per reporting interval.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nav6_telemetry::acquisition::AcquisitionSettings;
use nav6_telemetry::config::Config;
use nav6_telemetry::imu::Imu;
use nav6_telemetry::serial::SerialTransport;
use nav6_telemetry::telemetry::adapters::{GyroWidget, TracingTable};

/// Configuration file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Main entry point for the nav6 telemetry application
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging to stderr through a non-blocking writer
///    - Load configuration (first argument, or `config/default.toml`)
///    - Open the serial transport and start acquisition
///
/// 2. **Main Loop**
///    - Print a JSON status line every reporting interval
///    - Refresh the dashboard gyro widget
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Stop the acquisition task and release the port
///
/// # Errors
///
/// Returns error if:
/// - Configuration cannot be loaded or is invalid
/// - The serial device cannot be opened
/// - The acquisition task panicked
///
/// # Example Output
///
/// ```text
/// {"timestamp":"2024-05-01T12:00:00.000Z","connected":true,"yaw":12.5,"pitch":-1.2,"roll":0.4,"compass_heading":181.0,"yaw_offset":0.0,"update_count":50,"byte_count":1700}
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("nav6-telemetry v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = config_path(std::env::args().nth(1));
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path.display()))?;

    let serial = SerialTransport::open(&config.serial)?;
    info!("IMU serial port opened at: {}", serial.device_path());

    let mut imu = Imu::start(serial, AcquisitionSettings::from(&config));

    let mut gyro = GyroWidget::new(imu.telemetry());
    gyro.init_table(Box::new(TracingTable));

    let mut report_interval = interval(config.reporting.interval());
    report_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Reporting every {:?}", config.reporting.interval());
    info!("Press Ctrl+C to exit");

    loop {
        tokio::select! {
            _ = report_interval.tick() => {
                gyro.update_table();
                match imu.snapshot().to_json_line() {
                    Ok(line) => println!("{}", line),
                    Err(e) => warn!("Failed to serialize status: {}", e),
                }
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    imu.stop().await?;
    info!(
        "Total updates: {}, bytes: {}",
        imu.get_update_count(),
        imu.get_byte_count()
    );

    Ok(())
}

fn config_path(arg: Option<String>) -> PathBuf {
    arg.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}
