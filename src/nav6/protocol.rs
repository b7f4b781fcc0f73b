//! # nav6 Protocol Constants and Types
//!
//! Core protocol definitions for nav6 communication.
//!
//! Every message is ASCII framed: a `'!'` start marker, a one-byte message id,
//! a fixed-width body, a two-hex-digit checksum and a `"\r\n"` terminator.

use thiserror::Error;

/// Start marker of every nav6 message
pub const PACKET_START_CHAR: u8 = b'!';

/// Stream command message id (host to device)
pub const MSGID_STREAM_CMD: u8 = b'S';

/// Yaw/pitch/roll update message id (device to host)
pub const MSGID_YPR_UPDATE: u8 = b'y';

/// Message terminator
pub const PACKET_TERMINATOR: [u8; 2] = *b"\r\n";

/// Last byte of the terminator, used as the transport's line termination
pub const LINE_TERMINATOR: u8 = b'\n';

/// Length of the checksum field (two hex digits)
pub const CHECKSUM_LENGTH: usize = 2;

/// Length of the terminator field
pub const TERMINATOR_LENGTH: usize = 2;

/// Width of an encoded protocol float: sign + `DDD.dd`
pub const PROTOCOL_FLOAT_LENGTH: usize = 7;

/// Stream command layout: marker(1) + id(1) + kind(1) + rate(2) + checksum(2) + terminator(2)
pub const STREAM_CMD_MESSAGE_LENGTH: usize = 9;
pub const STREAM_CMD_STREAM_TYPE_INDEX: usize = 2;
pub const STREAM_CMD_UPDATE_RATE_INDEX: usize = 3;
pub const STREAM_CMD_CHECKSUM_INDEX: usize = 5;
pub const STREAM_CMD_TERMINATOR_INDEX: usize = 7;

/// Update layout: marker(1) + id(1) + 4 floats(28) + checksum(2) + terminator(2)
pub const YPR_UPDATE_MESSAGE_LENGTH: usize = 34;
pub const YPR_UPDATE_YAW_VALUE_INDEX: usize = 2;
pub const YPR_UPDATE_PITCH_VALUE_INDEX: usize = 9;
pub const YPR_UPDATE_ROLL_VALUE_INDEX: usize = 16;
pub const YPR_UPDATE_COMPASS_VALUE_INDEX: usize = 23;
pub const YPR_UPDATE_CHECKSUM_INDEX: usize = 30;
pub const YPR_UPDATE_TERMINATOR_INDEX: usize = 32;

/// Largest magnitude representable in the `DDD.dd` float encoding
pub const PROTOCOL_FLOAT_MAX: f32 = 999.99;

/// Kind of update stream requested from the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Yaw, pitch, roll and compass heading
    YawPitchRoll,
    /// Orientation quaternion
    Quaternion,
    /// Raw sensor readings
    Raw,
}

impl StreamKind {
    /// Wire byte for this stream kind
    pub fn to_u8(self) -> u8 {
        match self {
            StreamKind::YawPitchRoll => b'y',
            StreamKind::Quaternion => b'q',
            StreamKind::Raw => b'r',
        }
    }
}

/// One orientation reading from the device, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrientationSample {
    /// Yaw in `[-180, 180)`; increases as the platform turns right
    pub yaw: f32,

    /// Pitch
    pub pitch: f32,

    /// Roll
    pub roll: f32,

    /// Tilt-compensated compass heading
    pub compass_heading: f32,
}

/// Why no update packet starts at the scanned position
///
/// None of these are transport failures; the framing scan reacts to all of them
/// by advancing a single byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Not enough bytes left for a whole packet
    #[error("need {needed} bytes for a packet, {available} available")]
    Truncated { needed: usize, available: usize },

    /// First byte is not the start marker
    #[error("missing start marker, found 0x{0:02X}")]
    NoStartMarker(u8),

    /// Start marker present but the message id is not a yaw/pitch/roll update
    #[error("unexpected message id 0x{0:02X}")]
    UnexpectedMessage(u8),

    /// Checksum field is not two hex digits
    #[error("checksum field is not hex")]
    InvalidChecksumField,

    /// Computed and received checksums differ
    #[error("checksum mismatch: computed 0x{computed:02X}, received 0x{received:02X}")]
    ChecksumMismatch { computed: u8, received: u8 },

    /// Terminator is not `"\r\n"`
    #[error("invalid terminator")]
    BadTerminator,

    /// A float field at the given offset does not parse
    #[error("malformed float field at offset {0}")]
    MalformedField(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_layout_is_contiguous() {
        assert_eq!(YPR_UPDATE_PITCH_VALUE_INDEX, YPR_UPDATE_YAW_VALUE_INDEX + PROTOCOL_FLOAT_LENGTH);
        assert_eq!(YPR_UPDATE_ROLL_VALUE_INDEX, YPR_UPDATE_PITCH_VALUE_INDEX + PROTOCOL_FLOAT_LENGTH);
        assert_eq!(YPR_UPDATE_COMPASS_VALUE_INDEX, YPR_UPDATE_ROLL_VALUE_INDEX + PROTOCOL_FLOAT_LENGTH);
        assert_eq!(YPR_UPDATE_CHECKSUM_INDEX, YPR_UPDATE_COMPASS_VALUE_INDEX + PROTOCOL_FLOAT_LENGTH);
        assert_eq!(YPR_UPDATE_TERMINATOR_INDEX, YPR_UPDATE_CHECKSUM_INDEX + CHECKSUM_LENGTH);
        assert_eq!(YPR_UPDATE_MESSAGE_LENGTH, YPR_UPDATE_TERMINATOR_INDEX + TERMINATOR_LENGTH);
    }

    #[test]
    fn test_stream_cmd_layout_is_contiguous() {
        assert_eq!(STREAM_CMD_CHECKSUM_INDEX, STREAM_CMD_UPDATE_RATE_INDEX + 2);
        assert_eq!(STREAM_CMD_TERMINATOR_INDEX, STREAM_CMD_CHECKSUM_INDEX + CHECKSUM_LENGTH);
        assert_eq!(STREAM_CMD_MESSAGE_LENGTH, STREAM_CMD_TERMINATOR_INDEX + TERMINATOR_LENGTH);
    }

    #[test]
    fn test_stream_kind_bytes() {
        assert_eq!(StreamKind::YawPitchRoll.to_u8(), MSGID_YPR_UPDATE);
        assert_eq!(StreamKind::Quaternion.to_u8(), b'q');
        assert_eq!(StreamKind::Raw.to_u8(), b'r');
    }

    #[test]
    fn test_terminator_ends_with_line_terminator() {
        assert_eq!(PACKET_TERMINATOR[1], LINE_TERMINATOR);
    }
}
