//! # Design
//!
//! - `AppError` covers process-level failures: nothing could be reported, or reporting
//!   itself failed.
//! - `JobError` covers failures inside a job; the orchestrator turns the first one into
//!   the job's failure report.
//! - Messages stay constant; [`JobError::failure_message`] renders the detail that
//!   reaches the pipeline API.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::fetch::FetchError;
use crate::generator::GenerationError;
use crate::publish::PublishError;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: pressroom_config::ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: pressroom_telemetry::TelemetryError,
    },
    /// The trigger event could not be turned into a reportable job.
    #[error("trigger event could not be processed")]
    Context {
        /// Operation identifier.
        operation: &'static str,
        /// Source context error.
        source: pressroom_pipeline::ContextError,
    },
    /// The pipeline status reporter could not be built.
    #[error("job status reporter could not be configured")]
    Reporter {
        /// Operation identifier.
        operation: &'static str,
        /// Source pipeline error.
        source: pressroom_pipeline::PipelineError,
    },
    /// The pipeline status API could not be reached or rejected the report.
    #[error("job status report failed")]
    Report {
        /// Job whose status was being reported.
        job_id: String,
        /// Source pipeline error.
        source: pressroom_pipeline::PipelineError,
    },
    /// IO operations failed.
    #[error("io operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Optional path involved in the failure.
        path: Option<PathBuf>,
        /// Source IO error.
        source: io::Error,
    },
    /// Output could not be serialized.
    #[error("output serialization failed")]
    Json {
        /// Operation identifier.
        operation: &'static str,
        /// Source JSON error.
        source: serde_json::Error,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: pressroom_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: pressroom_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn context(
        operation: &'static str,
        source: pressroom_pipeline::ContextError,
    ) -> Self {
        Self::Context { operation, source }
    }

    pub(crate) const fn io(
        operation: &'static str,
        path: Option<PathBuf>,
        source: io::Error,
    ) -> Self {
        Self::Io {
            operation,
            path,
            source,
        }
    }

    /// Process exit code for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Report { .. } => 1,
            Self::Config { .. }
            | Self::Telemetry { .. }
            | Self::Context { .. }
            | Self::Reporter { .. }
            | Self::Io { .. }
            | Self::Json { .. } => 2,
        }
    }
}

/// Failure raised while running a job.
#[derive(Debug, Error)]
pub enum JobError {
    /// The event did not describe a complete job.
    #[error("job context extraction failed")]
    Context {
        /// Source context error.
        #[from]
        source: pressroom_pipeline::ContextError,
    },
    /// The source artifact could not be fetched or expanded.
    #[error("source artifact fetch failed")]
    Fetch {
        /// Source fetch error.
        #[from]
        source: FetchError,
    },
    /// The site generator failed.
    #[error("site generation failed")]
    Generation {
        /// Source generation error.
        #[from]
        source: GenerationError,
    },
    /// Publishing the generated output failed.
    #[error("site publish failed")]
    Publish {
        /// Source publish error.
        #[from]
        source: PublishError,
    },
    /// Removing a working directory failed.
    #[error("working directory cleanup failed")]
    Cleanup {
        /// Source filesystem error.
        #[from]
        source: pressroom_fsops::FsOpsError,
    },
}

impl JobError {
    /// Category label used in logs.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Context { .. } => "context",
            Self::Fetch { .. } => "fetch",
            Self::Generation { .. } => "generation",
            Self::Publish { .. } => "publish",
            Self::Cleanup { .. } => "cleanup",
        }
    }

    /// Human-readable description reported to the pipeline.
    #[must_use]
    pub fn failure_message(&self) -> String {
        let detail = match self {
            Self::Context { source } => context_detail(source),
            Self::Fetch { source } => source.detail(),
            Self::Generation { source } => source.detail(),
            Self::Publish { source } => source.detail(),
            Self::Cleanup { source } => format!("{source}: {}", error_chain(source)),
        };
        format!("{self}: {detail}")
    }
}

fn context_detail(err: &pressroom_pipeline::ContextError) -> String {
    match err {
        pressroom_pipeline::ContextError::MissingField { field } => {
            format!("missing required field {field}")
        }
        pressroom_pipeline::ContextError::MissingDestination => {
            "no output artifact in the event and no destination bucket configured".to_string()
        }
        pressroom_pipeline::ContextError::Decode { source } => source.to_string(),
    }
}

/// Render the `source()` chain of `err`, innermost last.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut parts = Vec::new();
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    if parts.is_empty() {
        err.to_string()
    } else {
        parts.join(": ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pressroom_pipeline::ContextError;

    #[test]
    fn exit_codes_separate_reporting_from_processing_failures() {
        let context = AppError::context(
            "job.extract_id",
            ContextError::MissingField {
                field: "CodePipeline.job.id",
            },
        );
        assert_eq!(context.exit_code(), 2);

        let report = AppError::Report {
            job_id: "job-1".to_string(),
            source: pressroom_pipeline::PipelineError::InvalidBaseUrl {
                url: "mailto:x".to_string(),
            },
        };
        assert_eq!(report.exit_code(), 1);

        let io_err = AppError::io("event.read", None, io::Error::other("io"));
        assert_eq!(io_err.exit_code(), 2);
        assert_eq!(io_err.to_string(), "io operation failed");
    }

    #[test]
    fn failure_message_names_missing_field() {
        let err = JobError::from(ContextError::MissingField {
            field: "CodePipeline.job.data.inputArtifacts",
        });
        assert_eq!(err.category(), "context");
        assert_eq!(
            err.failure_message(),
            "job context extraction failed: missing required field \
             CodePipeline.job.data.inputArtifacts"
        );
    }

    #[test]
    fn failure_message_for_generation_includes_output() {
        let err = JobError::from(GenerationError::Exited {
            exit_code: Some(2),
            output: "ERROR template missing".to_string(),
        });
        let message = err.failure_message();
        assert!(message.starts_with("site generation failed"));
        assert!(message.contains("status 2"));
        assert!(message.contains("ERROR template missing"));
    }

    #[test]
    fn error_chain_walks_sources() {
        let err = pressroom_fsops::FsOpsError::Io {
            operation: "workspace.cleanup_output",
            path: PathBuf::from("/tmp/x"),
            source: io::Error::other("busy"),
        };
        assert_eq!(error_chain(&err), "busy");
        let plain = io::Error::other("plain");
        assert_eq!(error_chain(&plain), "plain");
    }
}
