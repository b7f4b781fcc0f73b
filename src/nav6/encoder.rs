//! # nav6 Packet Encoder
//!
//! Encodes stream commands (host side) and yaw/pitch/roll updates (device side).

use super::checksum::{checksum, encode_checksum};
use super::protocol::*;

/// Encode a stream command requesting `kind` updates at `rate_hz`
///
/// # Arguments
///
/// * `kind` - Stream kind to request
/// * `rate_hz` - Update rate in Hz (1-255), sent as two hex digits
///
/// # Returns
///
/// * `[u8; 9]` - Complete command: `'!' 'S' kind rate(2) checksum(2) "\r\n"`
///
/// # Examples
///
/// ```
/// use nav6_telemetry::nav6::{encode_stream_command, StreamKind};
///
/// let command = encode_stream_command(StreamKind::YawPitchRoll, 50);
/// assert_eq!(&command, b"!Sy3252\r\n");
/// ```
pub fn encode_stream_command(kind: StreamKind, rate_hz: u8) -> [u8; STREAM_CMD_MESSAGE_LENGTH] {
    let mut packet = [0u8; STREAM_CMD_MESSAGE_LENGTH];
    packet[0] = PACKET_START_CHAR;
    packet[1] = MSGID_STREAM_CMD;
    packet[STREAM_CMD_STREAM_TYPE_INDEX] = kind.to_u8();
    packet[STREAM_CMD_UPDATE_RATE_INDEX..STREAM_CMD_CHECKSUM_INDEX]
        .copy_from_slice(&encode_checksum(rate_hz));

    let sum = checksum(&packet[..STREAM_CMD_CHECKSUM_INDEX]);
    packet[STREAM_CMD_CHECKSUM_INDEX..STREAM_CMD_TERMINATOR_INDEX]
        .copy_from_slice(&encode_checksum(sum));
    packet[STREAM_CMD_TERMINATOR_INDEX..].copy_from_slice(&PACKET_TERMINATOR);

    packet
}

/// Encode an orientation sample the way the device transmits it
///
/// Values are rounded to two decimals and clamped to ±999.99.
///
/// # Examples
///
/// ```
/// use nav6_telemetry::nav6::{decode_update, encode_update, OrientationSample};
///
/// let sample = OrientationSample { yaw: -12.5, pitch: 1.25, roll: 0.0, compass_heading: 270.0 };
/// let packet = encode_update(&sample);
/// assert_eq!(decode_update(&packet), Ok((sample, packet.len())));
/// ```
pub fn encode_update(sample: &OrientationSample) -> [u8; YPR_UPDATE_MESSAGE_LENGTH] {
    let mut packet = [0u8; YPR_UPDATE_MESSAGE_LENGTH];
    packet[0] = PACKET_START_CHAR;
    packet[1] = MSGID_YPR_UPDATE;

    for (index, value) in [
        (YPR_UPDATE_YAW_VALUE_INDEX, sample.yaw),
        (YPR_UPDATE_PITCH_VALUE_INDEX, sample.pitch),
        (YPR_UPDATE_ROLL_VALUE_INDEX, sample.roll),
        (YPR_UPDATE_COMPASS_VALUE_INDEX, sample.compass_heading),
    ] {
        packet[index..index + PROTOCOL_FLOAT_LENGTH].copy_from_slice(&encode_protocol_float(value));
    }

    let sum = checksum(&packet[..YPR_UPDATE_CHECKSUM_INDEX]);
    packet[YPR_UPDATE_CHECKSUM_INDEX..YPR_UPDATE_TERMINATOR_INDEX]
        .copy_from_slice(&encode_checksum(sum));
    packet[YPR_UPDATE_TERMINATOR_INDEX..].copy_from_slice(&PACKET_TERMINATOR);

    packet
}

/// Encode a float as sign + `DDD.dd`
///
/// Positive values carry a leading space rather than `'+'`, as the device sends them.
pub fn encode_protocol_float(value: f32) -> [u8; PROTOCOL_FLOAT_LENGTH] {
    let magnitude = value.abs().min(PROTOCOL_FLOAT_MAX);
    let hundredths = (magnitude * 100.0).round() as u32;

    let mut field = [0u8; PROTOCOL_FLOAT_LENGTH];
    field[0] = if value < 0.0 && hundredths > 0 { b'-' } else { b' ' };
    field[1] = digit(hundredths / 10_000);
    field[2] = digit(hundredths / 1_000);
    field[3] = digit(hundredths / 100);
    field[4] = b'.';
    field[5] = digit(hundredths / 10);
    field[6] = digit(hundredths);
    field
}

fn digit(value: u32) -> u8 {
    b'0' + (value % 10) as u8
}
