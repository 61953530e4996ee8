//! Error types for the failover core
//!
//! Provider-reported connection failures are not errors in this sense: they are
//! carried as [`FailureCause`](crate::types::FailureCause) data and drive the
//! attempt sequence forward. `FailoverError` covers configuration, logging setup
//! and misuse of the coordination API.

use thiserror::Error;

/// Result type for failover core operations
pub type Result<T> = std::result::Result<T, FailoverError>;

/// Errors that can occur in the failover core
#[derive(Debug, Error)]
pub enum FailoverError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Invalid state error
    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    /// The response sink was dropped before an outcome was delivered
    #[error("Connection outcome was dropped before delivery")]
    ResponseDropped,

    /// Logging setup error
    #[error("Logging error: {message}")]
    Logging { message: String },

    /// IO error while reading configuration
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML configuration parse error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// JSON configuration parse error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl FailoverError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a logging setup error
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }
}
