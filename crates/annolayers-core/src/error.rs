//! Error types shared by the store and the history engine.

use thiserror::Error;

/// Failure reported by a host callback (listener, document accessor).
pub type CallbackError = Box<dyn std::error::Error>;

/// Result type for host callbacks.
pub type CallbackResult = Result<(), CallbackError>;

/// State store errors.
///
/// Apart from `Locked`, these are caller bugs. Invalid layer ids and
/// degenerate reorders are not errors; those operations return `false` instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("State key must not be empty")]
    EmptyKey,
    #[error("Invalid value for `{key}`: expected {expected}")]
    InvalidValue { key: String, expected: &'static str },
    /// The write would only be queued, and the caller needs it applied now.
    #[error("State is locked")]
    Locked,
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
