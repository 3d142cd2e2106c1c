//! Shared error type across chatrelay crates.

use thiserror::Error;

/// Shared result type.
pub type Result<T> = std::result::Result<T, ChatError>;

/// Unified error type used by core, server, and client.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("record too large: {len} bytes (max {max})")]
    RecordTooLarge { len: usize, max: usize },
    #[error("unknown record type: {0}")]
    UnknownType(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("connection not registered")]
    NotConnected,
    #[error("write timed out")]
    Timeout,
    #[error("writer broken by an earlier failed write")]
    WriterBroken,
}

impl ChatError {
    /// Stable short code, used as a structured log field.
    pub fn code(&self) -> &'static str {
        match self {
            ChatError::Io(_) => "IO",
            ChatError::Decode(_) => "DECODE",
            ChatError::Encode(_) => "ENCODE",
            ChatError::RecordTooLarge { .. } => "TOO_LARGE",
            ChatError::UnknownType(_) => "UNKNOWN_TYPE",
            ChatError::Config(_) => "CONFIG",
            ChatError::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ChatError::NotConnected => "NOT_CONNECTED",
            ChatError::Timeout => "TIMEOUT",
            ChatError::WriterBroken => "WRITER_BROKEN",
        }
    }

    /// True for errors that just mean "the peer went away or spoke garbage".
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            ChatError::Io(_) | ChatError::Decode(_) | ChatError::RecordTooLarge { .. }
        )
    }
}
