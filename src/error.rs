//! Error types for schema_diff

use thiserror::Error;

use crate::risk::executor::ExecutionResult;

/// Result type for schema_diff operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for schema_diff
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Comparison cancelled")]
    Cancelled,

    #[error("High-risk script requires explicit acknowledgement: {0}")]
    AcknowledgementRequired(String),

    #[error("Connection lost during execution: {reason}")]
    ConnectionLost {
        reason: String,
        /// Outcomes recorded before the connection went away; statements
        /// that never ran are marked not-attempted.
        partial: Box<ExecutionResult>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),
}

/// Convert TOML deserialization errors to schema_diff errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}
