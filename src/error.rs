//! Error types and handling for acbridge
//!
//! This module defines the error types used throughout the bridge, from
//! configuration loading and component wiring down to UART framing.

use thiserror::Error;

/// Result type alias for acbridge operations
pub type Result<T> = std::result::Result<T, AcBridgeError>;

/// Main error type for acbridge
#[derive(Debug, Error)]
pub enum AcBridgeError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Serial port errors (open, read, write)
    #[error("UART error: {message}")]
    Uart { message: String },

    /// Malformed or unexpected protocol frames
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Frame checksum mismatch
    #[error("Checksum mismatch: expected {expected:#06x}, got {actual:#06x}")]
    Checksum { expected: u16, actual: u16 },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Lookup of an unknown component
    #[error("{kind} not found: {id}")]
    NotFound { kind: String, id: String },

    /// Timeout errors
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl AcBridgeError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        AcBridgeError::Config {
            message: message.into(),
        }
    }

    /// Create a new UART error
    pub fn uart<S: Into<String>>(message: S) -> Self {
        AcBridgeError::Uart {
            message: message.into(),
        }
    }

    /// Create a new protocol error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        AcBridgeError::Protocol {
            message: message.into(),
        }
    }

    /// Create a new checksum error
    pub fn checksum(expected: u16, actual: u16) -> Self {
        AcBridgeError::Checksum { expected, actual }
    }

    /// Create a new validation error
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        AcBridgeError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<K: Into<String>, I: Into<String>>(kind: K, id: I) -> Self {
        AcBridgeError::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        AcBridgeError::Io {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        AcBridgeError::Timeout {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        AcBridgeError::Generic {
            message: message.into(),
        }
    }

    /// True for errors after which the serial port should be reopened
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            AcBridgeError::Uart { .. } | AcBridgeError::Io { .. } | AcBridgeError::Timeout { .. }
        )
    }
}

impl From<std::io::Error> for AcBridgeError {
    fn from(err: std::io::Error) -> Self {
        AcBridgeError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for AcBridgeError {
    fn from(err: serde_yaml::Error) -> Self {
        AcBridgeError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for AcBridgeError {
    fn from(err: serde_json::Error) -> Self {
        AcBridgeError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<tokio_serial::Error> for AcBridgeError {
    fn from(err: tokio_serial::Error) -> Self {
        AcBridgeError::uart(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = AcBridgeError::config("test config error");
        assert!(matches!(err, AcBridgeError::Config { .. }));

        let err = AcBridgeError::uart("port gone");
        assert!(matches!(err, AcBridgeError::Uart { .. }));

        let err = AcBridgeError::validation("field", "test validation error");
        assert!(matches!(err, AcBridgeError::Validation { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = AcBridgeError::config("test error");
        assert_eq!(format!("{}", err), "Configuration error: test error");

        let err = AcBridgeError::validation("test_field", "invalid value");
        assert_eq!(
            format!("{}", err),
            "Validation error: test_field - invalid value"
        );

        let err = AcBridgeError::checksum(0x12, 0x34);
        assert_eq!(
            format!("{}", err),
            "Checksum mismatch: expected 0x0012, got 0x0034"
        );
    }

    #[test]
    fn test_connection_error_classification() {
        assert!(AcBridgeError::uart("x").is_connection_error());
        assert!(AcBridgeError::timeout("x").is_connection_error());
        assert!(!AcBridgeError::protocol("x").is_connection_error());
        assert!(!AcBridgeError::checksum(1, 2).is_connection_error());
    }
}
