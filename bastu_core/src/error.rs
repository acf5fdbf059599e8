//! Error types for the bastu engine
//!
//! Only startup (configuration) and the upstream proxy calls surface errors.
//! Sensor and publish failures never reach the scheduler: they become `None`
//! readings and failed publish log entries respectively.

use thiserror::Error;

/// Errors raised by the bastu engine
#[derive(Debug, Error)]
pub enum BastuError {
    #[error("Invalid configuration for {key}: {message}")]
    Config { key: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },
}

impl BastuError {
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        BastuError::Config {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Result type for bastu operations
pub type BastuResult<T> = Result<T, BastuError>;
