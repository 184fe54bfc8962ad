//! 16-bit fields carried as four hex characters, low byte first.
//!
//! The value `0x03E8` travels as `"E803"`: the pair for the low byte `E8`
//! comes before the pair for the high byte `03`.

use super::{FIELD_SIZE, error::ParseResult, error::ProtocolError};

/// Decode a little-endian hex field.
///
/// With `signed` set, the 16-bit value is read as two's-complement, so
/// anything at or above `0x8000` comes back negative.
pub fn decode_field(hex: &str, signed: bool) -> ParseResult<i32> {
    let bytes = hex.as_bytes();
    if bytes.len() != FIELD_SIZE || !bytes.iter().all(u8::is_ascii_hexdigit) {
        return Err(ProtocolError::MalformedField(hex.to_owned()));
    }

    let low = u8::from_str_radix(&hex[0..2], 16)
        .map_err(|_| ProtocolError::MalformedField(hex.to_owned()))?;
    let high = u8::from_str_radix(&hex[2..4], 16)
        .map_err(|_| ProtocolError::MalformedField(hex.to_owned()))?;

    let raw = u16::from_le_bytes([low, high]);

    Ok(if signed {
        i32::from(raw as i16)
    } else {
        i32::from(raw)
    })
}

/// Encode a value as a little-endian hex field.
///
/// Only the low 16 bits are kept, so negative values wrap to their
/// two's-complement form (`-1` becomes `"FFFF"`).
pub fn encode_field(value: i32) -> String {
    let [low, high] = ((value & 0xFFFF) as u16).to_le_bytes();
    format!("{low:02X}{high:02X}")
}
