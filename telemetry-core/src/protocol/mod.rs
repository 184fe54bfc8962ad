mod error;
mod field;
mod frame;

pub use error::{ParseResult, ProtocolError};
pub use field::{decode_field, encode_field};
pub use frame::{
    CommandId, decode_fields, decode_report, decode_report_bytes, encode_command, encode_start,
    encode_stop,
};

// frame structure : marker(1) + cmd_id(2) + payload(4 * n) + terminator(4)

/// Marker opening every frame sent to the device.
pub const OUTBOUND_MARKER: char = '#';
/// Marker opening every frame received from the device.
pub const INBOUND_MARKER: char = '$';
/// CR LF, written as four hex characters rather than raw bytes.
pub const TERMINATOR: &str = "0D0A";
pub const CMD_ID_SIZE: usize = 2;
/// Hex characters per 16-bit field.
pub const FIELD_SIZE: usize = 4;
pub const REPORT_FIELD_COUNT: usize = 5;
/// Size of a telemetry report frame: `$` + `11` + 5 fields + `0D0A`.
pub const REPORT_FRAME_SIZE: usize =
    1 + CMD_ID_SIZE + FIELD_SIZE * REPORT_FIELD_COUNT + TERMINATOR.len();
