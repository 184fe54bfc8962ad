use serde::{Deserialize, Serialize};

pub mod protocol;

pub use protocol::{
    CommandId, ParseResult, ProtocolError, decode_field, decode_fields, decode_report,
    decode_report_bytes, encode_command, encode_field, encode_start, encode_stop,
};

/// One decoded telemetry report, in wire order.
///
/// The first field is carried unsigned, every other field is signed
/// two's-complement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TelemetryReport {
    /// Supply voltage, raw device units.
    pub voltage: u16,
    /// Environment temperature, raw device units.
    pub env_temp: i16,
    pub yaw: i16,
    pub pitch: i16,
    pub roll: i16,
}

impl TelemetryReport {
    /// The five fields as plain integers, in the order they appear on the wire.
    pub fn values(&self) -> [i32; 5] {
        [
            i32::from(self.voltage),
            i32::from(self.env_temp),
            i32::from(self.yaw),
            i32::from(self.pitch),
            i32::from(self.roll),
        ]
    }
}

/// Whether the device has been told to start streaming.
///
/// A session begins `Stopped` and only moves to `Started` after a start
/// command has been written to the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Stopped,
    Started,
}
