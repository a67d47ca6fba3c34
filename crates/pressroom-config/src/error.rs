//! Error types for configuration loading.
//!
//! # Design
//! - Keep messages constant; the offending variable and value travel as fields.

use thiserror::Error;

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors produced while loading deployment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Variable contained a value that failed validation.
    #[error("invalid configuration field")]
    InvalidField {
        /// Environment variable that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// Variable was set but could not be parsed as a URL.
    #[error("invalid configuration url")]
    InvalidUrl {
        /// Environment variable holding the URL.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Underlying parse error.
        source: url::ParseError,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: &'static str, value: &str) -> Self {
        Self::InvalidField {
            field,
            reason,
            value: Some(value.to_string()),
        }
    }
}
