//! Duebell error types
//!
//! Centralized error handling using thiserror for type-safe errors.
//! Collaborator failures are a closed set of kinds so callers switch on
//! the variant, never on message text.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::event::EventId;

/// Top-level error type for duebell
#[derive(Error, Debug)]
pub enum DuebellError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine is not running")]
    EngineClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Event store errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Invalid event: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not logged in")]
    Unauthenticated,

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Event '{id}' not found")]
    NotFound { id: EventId },
}

/// Synchronous rejections of a new-event payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Event name must not be empty")]
    EmptyName,

    #[error("Event target {target} is in the past")]
    PastTarget { target: DateTime<Utc> },
}

/// Failure kinds of the persistence collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Event '{id}' not found in backing store")]
    NotFound { id: EventId },
}

/// Failure kinds of the identity collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not authorized")]
    Unauthorized,

    #[error("Network error: {0}")]
    Network(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: std::path::PathBuf },

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type alias for duebell operations
pub type Result<T> = std::result::Result<T, DuebellError>;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for persistence collaborator operations
pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;

/// Result type alias for identity collaborator operations
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ValidationError::EmptyName;
        assert_eq!(err.to_string(), "Event name must not be empty");
    }

    #[test]
    fn test_error_conversion() {
        let err: StoreError = ValidationError::EmptyName.into();
        assert!(matches!(err, StoreError::Validation(_)));

        let err: StoreError = PersistenceError::PermissionDenied.into();
        assert!(matches!(err, StoreError::Persistence(_)));

        let err: DuebellError = StoreError::Unauthenticated.into();
        assert!(matches!(err, DuebellError::Store(_)));
    }
}
