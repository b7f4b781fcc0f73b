//! # nav6 Packet Decoder
//!
//! Decodes yaw/pitch/roll updates and locates them inside raw read chunks.

use super::checksum::{checksum, decode_checksum};
use super::protocol::*;

/// Outcome of scanning one read chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanOutcome {
    /// Packets decoded from the chunk
    pub packets: usize,
    /// Positions at which no packet started (one byte skipped each)
    pub skipped: usize,
}

/// Decode a yaw/pitch/roll update starting at the first byte of `buffer`
///
/// `buffer` may extend past the packet; only the first
/// [`YPR_UPDATE_MESSAGE_LENGTH`] bytes are examined. A packet split across two
/// reads is never reassembled, so a truncated tail is simply "no packet here".
///
/// # Arguments
///
/// * `buffer` - Bytes starting at the scan position
///
/// # Returns
///
/// * `Ok((sample, consumed))` - Decoded sample and the number of bytes it occupied
/// * `Err(DecodeError)` - No valid packet starts here
///
/// # Errors
///
/// Returns error if:
/// - Fewer than 34 bytes are available
/// - Start marker or message id is wrong
/// - Checksum field is malformed or does not match
/// - Terminator is not `"\r\n"`
/// - A float field does not parse
pub fn decode_update(buffer: &[u8]) -> Result<(OrientationSample, usize), DecodeError> {
    if buffer.len() < YPR_UPDATE_MESSAGE_LENGTH {
        return Err(DecodeError::Truncated {
            needed: YPR_UPDATE_MESSAGE_LENGTH,
            available: buffer.len(),
        });
    }

    let packet = &buffer[..YPR_UPDATE_MESSAGE_LENGTH];

    if packet[0] != PACKET_START_CHAR {
        return Err(DecodeError::NoStartMarker(packet[0]));
    }

    if packet[1] != MSGID_YPR_UPDATE {
        return Err(DecodeError::UnexpectedMessage(packet[1]));
    }

    let received = decode_checksum([
        packet[YPR_UPDATE_CHECKSUM_INDEX],
        packet[YPR_UPDATE_CHECKSUM_INDEX + 1],
    ])
    .ok_or(DecodeError::InvalidChecksumField)?;

    let computed = checksum(&packet[..YPR_UPDATE_CHECKSUM_INDEX]);
    if computed != received {
        return Err(DecodeError::ChecksumMismatch { computed, received });
    }

    if packet[YPR_UPDATE_TERMINATOR_INDEX..] != PACKET_TERMINATOR {
        return Err(DecodeError::BadTerminator);
    }

    let sample = OrientationSample {
        yaw: decode_protocol_float(packet, YPR_UPDATE_YAW_VALUE_INDEX)?,
        pitch: decode_protocol_float(packet, YPR_UPDATE_PITCH_VALUE_INDEX)?,
        roll: decode_protocol_float(packet, YPR_UPDATE_ROLL_VALUE_INDEX)?,
        compass_heading: decode_protocol_float(packet, YPR_UPDATE_COMPASS_VALUE_INDEX)?,
    };

    Ok((sample, YPR_UPDATE_MESSAGE_LENGTH))
}

/// Decode the sign + `DDD.dd` float at `offset`
///
/// The sign is `'-'`, `' '` or `'+'`; the remainder may only hold digits and a
/// decimal point.
pub fn decode_protocol_float(packet: &[u8], offset: usize) -> Result<f32, DecodeError> {
    let field = packet
        .get(offset..offset + PROTOCOL_FLOAT_LENGTH)
        .ok_or(DecodeError::MalformedField(offset))?;

    let sign = match field[0] {
        b'-' => -1.0,
        b' ' | b'+' => 1.0,
        _ => return Err(DecodeError::MalformedField(offset)),
    };

    let digits = &field[1..];
    if !digits.iter().all(|&b| b.is_ascii_digit() || b == b'.') {
        return Err(DecodeError::MalformedField(offset));
    }

    // ASCII digits and '.' are always valid UTF-8
    let magnitude: f32 = std::str::from_utf8(digits)
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or(DecodeError::MalformedField(offset))?;

    Ok(sign * magnitude)
}

/// Scan a chunk for update packets, handing each decoded sample to `on_sample`
///
/// Samples are delivered in wire order. After a decoded packet the scan resumes
/// right behind it; at any other position it advances exactly one byte, so no
/// packet is missed because of misalignment.
///
/// # Examples
///
/// ```
/// use nav6_telemetry::nav6::{encode_update, scan_chunk, OrientationSample};
///
/// let mut chunk = b"noise".to_vec();
/// chunk.extend_from_slice(&encode_update(&OrientationSample::default()));
///
/// let mut samples = Vec::new();
/// let outcome = scan_chunk(&chunk, |sample| samples.push(sample));
/// assert_eq!(outcome.packets, 1);
/// assert_eq!(outcome.skipped, 5);
/// ```
pub fn scan_chunk<F>(chunk: &[u8], mut on_sample: F) -> ScanOutcome
where
    F: FnMut(OrientationSample),
{
    let mut outcome = ScanOutcome::default();
    let mut offset = 0;

    while offset < chunk.len() {
        match decode_update(&chunk[offset..]) {
            Ok((sample, consumed)) => {
                on_sample(sample);
                outcome.packets += 1;
                offset += consumed;
            }
            Err(_) => {
                outcome.skipped += 1;
                offset += 1;
            }
        }
    }

    outcome
}
