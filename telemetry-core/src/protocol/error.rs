pub type ParseResult<T> = core::result::Result<T, ProtocolError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed field {0:?}: expected exactly 4 hex characters")]
    MalformedField(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}
