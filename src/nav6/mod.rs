//! # nav6 Protocol Module
//!
//! Implementation of the nav6 IMU serial protocol.
//!
//! This module handles:
//! - Stream command encoding (stream kind + update rate)
//! - Yaw/pitch/roll update decoding and framing inside arbitrary byte windows
//! - Two-digit hex checksum calculation
//!
//! Everything here is pure: no I/O and no state carried between calls.

pub mod protocol;
pub mod encoder;
pub mod decoder;
pub mod checksum;

pub use decoder::{decode_update, scan_chunk, ScanOutcome};
pub use encoder::{encode_stream_command, encode_update};
pub use protocol::{DecodeError, OrientationSample, StreamKind};
