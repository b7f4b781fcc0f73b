//! # nav6 Telemetry Library
//!
//! Stream orientation from a nav6 IMU over a serial link.
//!
//! This library provides the nav6 wire codec, a background acquisition task that
//! keeps the device streaming and recovers from desync or silence, and a shared
//! telemetry cache for any number of consumers.

pub mod acquisition;
pub mod config;
pub mod error;
pub mod imu;
pub mod nav6;
pub mod serial;
pub mod telemetry;
