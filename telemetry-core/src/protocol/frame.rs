use super::{
    CMD_ID_SIZE, FIELD_SIZE, INBOUND_MARKER, OUTBOUND_MARKER, REPORT_FRAME_SIZE, TERMINATOR,
    error::ParseResult, error::ProtocolError, field::decode_field, field::encode_field,
};
use crate::TelemetryReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandId {
    Start,
    Stop,
    Report,
}

impl CommandId {
    pub fn as_hex(self) -> &'static str {
        match self {
            CommandId::Start => "03",
            CommandId::Stop => "09",
            CommandId::Report => "11",
        }
    }
}

impl TryFrom<&str> for CommandId {
    type Error = ProtocolError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "03" => Ok(CommandId::Start),
            "09" => Ok(CommandId::Stop),
            "11" => Ok(CommandId::Report),
            _ => Err(ProtocolError::InvalidData(format!(
                "unknown command id {value:?}"
            ))),
        }
    }
}

/// Build an outbound frame: `#` + command id + one field per value + `0D0A`.
pub fn encode_command(cmd_id: CommandId, values: &[i32]) -> String {
    let mut frame =
        String::with_capacity(1 + CMD_ID_SIZE + FIELD_SIZE * values.len() + TERMINATOR.len());

    frame.push(OUTBOUND_MARKER);
    frame.push_str(cmd_id.as_hex());
    for value in values {
        frame.push_str(&encode_field(*value));
    }
    frame.push_str(TERMINATOR);

    frame
}

/// Ask the device to start reporting every `interval` (device units).
///
/// The interval travels as a single field, so only its low 16 bits reach
/// the device.
pub fn encode_start(interval: i32) -> String {
    encode_command(CommandId::Start, &[interval])
}

pub fn encode_stop() -> String {
    encode_command(CommandId::Stop, &[])
}

/// Walk a report payload four characters at a time.
///
/// The first field is unsigned and every following field is signed. A
/// trailing chunk shorter than four characters is a `MalformedField`.
pub fn decode_fields(payload: &str) -> ParseResult<Vec<i32>> {
    payload
        .as_bytes()
        .chunks(FIELD_SIZE)
        .enumerate()
        .map(|(index, chunk)| {
            let hex = std::str::from_utf8(chunk).map_err(|_| {
                ProtocolError::MalformedField(String::from_utf8_lossy(chunk).into_owned())
            })?;
            decode_field(hex, index != 0)
        })
        .collect()
}

/// Decode a telemetry report frame (`$11` + five fields + `0D0A`).
pub fn decode_report(raw: &str) -> ParseResult<TelemetryReport> {
    if raw.len() != REPORT_FRAME_SIZE {
        return Err(ProtocolError::InvalidData(format!(
            "expected {REPORT_FRAME_SIZE} characters, got {}",
            raw.len()
        )));
    }

    if !raw.starts_with(INBOUND_MARKER) {
        return Err(ProtocolError::InvalidData(format!(
            "frame does not start with {INBOUND_MARKER:?}"
        )));
    }

    if !raw.ends_with(TERMINATOR) {
        return Err(ProtocolError::InvalidData(format!(
            "frame does not end with {TERMINATOR:?}"
        )));
    }

    let cmd_end = 1 + CMD_ID_SIZE;
    let cmd_id = raw
        .get(1..cmd_end)
        .ok_or_else(|| ProtocolError::InvalidData("command id is not valid text".to_owned()))?;
    match CommandId::try_from(cmd_id)? {
        CommandId::Report => {}
        other => {
            return Err(ProtocolError::InvalidData(format!(
                "expected report command, got {other:?}"
            )));
        }
    }

    let payload = raw
        .get(cmd_end..raw.len() - TERMINATOR.len())
        .ok_or_else(|| ProtocolError::InvalidData("payload is not valid text".to_owned()))?;

    let values = decode_fields(payload)?;
    let &[voltage, env_temp, yaw, pitch, roll] = values.as_slice() else {
        return Err(ProtocolError::InvalidData(format!(
            "expected 5 fields, got {}",
            values.len()
        )));
    };

    // decode_fields already kept each value inside its 16-bit range
    Ok(TelemetryReport {
        voltage: voltage as u16,
        env_temp: env_temp as i16,
        yaw: yaw as i16,
        pitch: pitch as i16,
        roll: roll as i16,
    })
}

/// Decode a report straight from bytes read off the connection.
///
/// The bytes must be text; surrounding whitespace is trimmed first.
pub fn decode_report_bytes(raw: &[u8]) -> ParseResult<TelemetryReport> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| ProtocolError::InvalidData(format!("frame is not text: {e}")))?;
    decode_report(text.trim())
}
