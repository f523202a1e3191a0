//! Error types for the Flight Friend application.

use thiserror::Error;

/// A shared error type for the entire Flight Friend application.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait. Per the application's
/// resilience policy, most of these errors never reach the user: external
/// failures degrade to mock data or template responses at the call site.
#[derive(Error, Debug, Clone)]
pub enum FlightFriendError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// External service error (Gemini, Aviationstack, record store)
    #[error("External service error: {service} - {message}")]
    External {
        service: &'static str,
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// User input could not be parsed into a usable request
    #[error("Parse error: {0}")]
    Parse(String),

    /// Chat history persistence error
    #[error("History error: {0}")]
    History(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FlightFriendError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates an External service error
    pub fn external(service: &'static str, message: impl Into<String>) -> Self {
        Self::External {
            service,
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Creates a History error
    pub fn history(message: impl Into<String>) -> Self {
        Self::History(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error came from an external service.
    ///
    /// External errors are always recoverable: the caller substitutes mock
    /// data or a template response instead of surfacing them.
    pub fn is_external(&self) -> bool {
        matches!(self, Self::External { .. })
    }
}

impl From<std::io::Error> for FlightFriendError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for FlightFriendError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for FlightFriendError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for FlightFriendError {
    fn from(err: reqwest::Error) -> Self {
        Self::External {
            service: "http",
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, FlightFriendError>`.
pub type Result<T> = std::result::Result<T, FlightFriendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = FlightFriendError::not_found("conversation", "abc-123");
        assert_eq!(err.to_string(), "Entity not found: conversation 'abc-123'");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_external_is_recoverable() {
        let err = FlightFriendError::external("gemini", "timeout");
        assert!(err.is_external());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: FlightFriendError = io.into();
        assert!(matches!(err, FlightFriendError::Io { .. }));
    }
}
