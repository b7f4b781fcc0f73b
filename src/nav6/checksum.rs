//! # nav6 Checksum
//!
//! 8-bit additive checksum used by every nav6 message.
//!
//! The checksum is the wrapping sum of all bytes that precede the checksum field,
//! transmitted as two ASCII hex digits (uppercase on the wire).

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Calculate the additive checksum of `data`
///
/// # Examples
///
/// ```
/// use nav6_telemetry::nav6::checksum::checksum;
///
/// assert_eq!(checksum(b"!Sy32"), 0x52);
/// ```
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |sum, &byte| sum.wrapping_add(byte))
}

/// Render a checksum as two uppercase hex digits
pub fn encode_checksum(value: u8) -> [u8; 2] {
    [HEX_DIGITS[(value >> 4) as usize], HEX_DIGITS[(value & 0x0F) as usize]]
}

/// Parse two hex digits (either case) back into a checksum
///
/// Returns `None` if either byte is not a hex digit.
pub fn decode_checksum(digits: [u8; 2]) -> Option<u8> {
    let high = hex_value(digits[0])?;
    let low = hex_value(digits[1])?;
    Some((high << 4) | low)
}

fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        _ => None,
    }
}
