//! Error types for the TaskNotes search service.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using the search service's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for search operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Request rejected before any provider call (missing or oversized fields)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A provider call failed
    #[error("Upstream error ({provider}): {message}")]
    Upstream { provider: String, message: String },

    /// A provider call exceeded its deadline
    #[error("Upstream timeout ({provider}) after {}ms", after.as_millis())]
    Timeout { provider: String, after: Duration },

    /// Cache backend operation failed
    #[error("Cache error: {0}")]
    Cache(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Event bus connection or consume failure
    #[error("Event bus error: {0}")]
    EventBus(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build an upstream error for the named provider.
    pub fn upstream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Upstream {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether the error was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::Unauthorized(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
