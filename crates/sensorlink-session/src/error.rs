use sensorlink_hardware::TransportError;
use thiserror::Error;

/// Errors raised by a connection session.
///
/// `AlreadyConnected`, `ModeNotSet`, `InvalidKeyType` and `InvalidDescriptor`
/// are returned synchronously to the caller. `Codec` and `Transport` happen on
/// the worker thread and only ever reach the caller through the session's
/// error callback.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session already connected")]
    AlreadyConnected,

    #[error("No transport mode selected")]
    ModeNotSet,

    #[error("Invalid subscription key: {0}")]
    InvalidKeyType(String),

    #[error("Invalid device descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Codec error: {0}")]
    Codec(#[from] sensorlink_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
