//! Error types for telemetry operations.

use std::io;
use std::path::PathBuf;
use std::string::FromUtf8Error;

use thiserror::Error;
use tracing_subscriber::util::TryInitError;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised while installing logging or exporting metrics.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global subscriber was already installed.
    #[error("tracing subscriber already installed")]
    SubscriberInstall {
        /// Underlying install error.
        #[source]
        source: TryInitError,
    },
    /// A Prometheus call failed.
    #[error("prometheus operation failed")]
    Prometheus {
        /// Failing operation (`collector.build`, `collector.register`, `registry.encode`).
        operation: &'static str,
        /// Metric involved, when the failure concerns one collector.
        metric: Option<&'static str>,
        /// Underlying Prometheus error.
        #[source]
        source: prometheus::Error,
    },
    /// Encoded metrics were not UTF-8.
    #[error("rendered metrics were not utf-8")]
    RenderUtf8 {
        /// Underlying conversion error.
        #[source]
        source: FromUtf8Error,
    },
    /// The metrics textfile could not be written.
    #[error("metrics textfile write failed")]
    Textfile {
        /// Destination file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl TelemetryError {
    pub(crate) const fn prometheus(
        operation: &'static str,
        metric: Option<&'static str>,
        source: prometheus::Error,
    ) -> Self {
        Self::Prometheus {
            operation,
            metric,
            source,
        }
    }
}
