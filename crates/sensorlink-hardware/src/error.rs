//! Error types for transport operations.
//!
//! These cover everything that can go wrong between opening a serial port or
//! RFCOMM socket and closing it again. They are raised on the session worker
//! thread and reach callers only through the session's error callback.

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur while talking to a device.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transport could not be opened.
    #[error("Failed to open {endpoint}: {message}")]
    OpenFailed { endpoint: String, message: String },

    /// The peer closed the connection or the device went away.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// Reading or writing failed.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// The transport is not available in this build or on this platform.
    #[error("Unsupported transport: {transport}")]
    Unsupported { transport: String },

    /// Serial port driver error.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Create a new open failure.
    pub fn open(endpoint: impl ToString, message: impl Into<String>) -> Self {
        Self::OpenFailed {
            endpoint: endpoint.to_string(),
            message: message.into(),
        }
    }

    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new unsupported transport error.
    pub fn unsupported(transport: impl Into<String>) -> Self {
        Self::Unsupported {
            transport: transport.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_error() {
        let error = TransportError::open("/dev/ttyUSB0 @ 9600", "No such file or directory");
        assert!(matches!(error, TransportError::OpenFailed { .. }));
        assert_eq!(
            error.to_string(),
            "Failed to open /dev/ttyUSB0 @ 9600: No such file or directory"
        );
    }

    #[test]
    fn test_disconnected_error() {
        let error = TransportError::disconnected("98:D3:31:F5:2A:10");
        assert_eq!(error.to_string(), "Device disconnected: 98:D3:31:F5:2A:10");
    }

    #[test]
    fn test_communication_error() {
        let error = TransportError::communication("write failed");
        assert!(matches!(error, TransportError::CommunicationError { .. }));
        assert_eq!(error.to_string(), "Communication error: write failed");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let error: TransportError = io.into();
        assert!(matches!(error, TransportError::Io(_)));
    }
}
