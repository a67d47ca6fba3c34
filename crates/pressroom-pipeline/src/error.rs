//! # Design
//!
//! - `ContextError` covers malformed trigger events and never carries a partial job.
//! - `PipelineError` covers the status API; messages stay constant and context rides in fields.

use thiserror::Error;

/// Result alias for status reporting.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// The trigger event could not be turned into a job.
#[derive(Debug, Error)]
pub enum ContextError {
    /// Payload was not valid JSON for the expected event shape.
    #[error("trigger event could not be decoded")]
    Decode {
        /// Underlying serde error.
        source: serde_json::Error,
    },
    /// A required field was absent or blank.
    #[error("trigger event is missing a required field")]
    MissingField {
        /// Dotted path of the missing field.
        field: &'static str,
    },
    /// Neither the event nor configuration named a destination.
    #[error("no destination configured for generated output")]
    MissingDestination,
}

/// Errors raised while talking to the pipeline status API.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Request could not be built or sent.
    #[error("pipeline status request failed")]
    Http {
        /// Operation identifier.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// Underlying HTTP client error.
        source: reqwest::Error,
    },
    /// The API answered with a non-success status.
    #[error("pipeline status response was not successful")]
    HttpStatus {
        /// Operation identifier.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// HTTP status code returned by the server.
        status: u16,
    },
    /// The configured base URL cannot carry path segments.
    #[error("pipeline status url could not be built")]
    InvalidBaseUrl {
        /// Offending base URL.
        url: String,
    },
}

impl PipelineError {
    pub(crate) const fn http(operation: &'static str, url: String, source: reqwest::Error) -> Self {
        Self::Http {
            operation,
            url,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn context_errors_keep_constant_messages() {
        let missing = ContextError::MissingField {
            field: "CodePipeline.job.id",
        };
        assert_eq!(
            missing.to_string(),
            "trigger event is missing a required field"
        );
        assert_eq!(
            ContextError::MissingDestination.to_string(),
            "no destination configured for generated output"
        );
    }

    #[test]
    fn status_errors_carry_no_source() {
        let err = PipelineError::InvalidBaseUrl {
            url: "mailto:ops@example.com".to_string(),
        };
        assert!(err.source().is_none());
        let status = PipelineError::HttpStatus {
            operation: "report_success",
            url: "http://127.0.0.1/jobs/1/success".to_string(),
            status: 503,
        };
        assert!(status.source().is_none());
    }
}
