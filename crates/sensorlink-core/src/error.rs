use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Codec errors
    #[error("Malformed field '{field}': {reason}")]
    MalformedField { field: String, reason: String },

    #[error("Malformed number: '{value}'")]
    MalformedNumber { value: String },

    #[error("Unknown payload type: {tag}")]
    UnknownType { tag: String },

    // Framing errors
    #[error("Line exceeds {limit} bytes without a terminator")]
    LineTooLong { limit: usize },

    // Device errors
    #[error("Invalid Bluetooth address: {0}")]
    InvalidAddress(String),

    #[error("Invalid port: {0}")]
    InvalidPort(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new malformed field error.
    pub fn malformed_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True for the errors produced while decoding a single wire line.
    #[must_use]
    pub fn is_codec_error(&self) -> bool {
        matches!(
            self,
            Error::MalformedField { .. } | Error::MalformedNumber { .. } | Error::UnknownType { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
