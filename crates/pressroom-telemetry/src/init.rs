//! Tracing subscriber installation.
//!
//! # Design
//! - `RUST_LOG` overrides the configured level when set.
//! - The fmt layer is boxed so json and pretty output share one install path.
//! - The build SHA is captured at install time and read by [`crate::job_span`].

use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

use crate::error::{Result, TelemetryError};

/// Level used when neither `RUST_LOG` nor configuration name one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

const UNKNOWN_BUILD: &str = "dev";

static BUILD_SHA: OnceCell<String> = OnceCell::new();

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable multi-field lines.
    Pretty,
}

impl LogFormat {
    /// Pretty for debug builds, JSON otherwise.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }

    /// Parse a configured name; unknown or missing names fall back to [`LogFormat::infer`].
    #[must_use]
    pub fn from_setting(value: Option<&str>) -> Self {
        let Some(name) = value.map(str::trim) else {
            return Self::infer();
        };
        if name.eq_ignore_ascii_case("json") {
            Self::Json
        } else if name.eq_ignore_ascii_case("pretty") {
            Self::Pretty
        } else {
            Self::infer()
        }
    }

    fn layer(self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let base = fmt::layer().with_target(false);
        match self {
            Self::Json => base.json().flatten_event(true).boxed(),
            Self::Pretty => base.boxed(),
        }
    }
}

/// Inputs for [`init_logging`].
#[derive(Debug, Clone)]
pub struct LoggingConfig<'a> {
    /// Filter directive, e.g. `info` or `pressroom_app=debug`.
    pub level: &'a str,
    /// Output format.
    pub format: LogFormat,
    /// Build identifier attached to job spans.
    pub build_sha: &'a str,
}

impl Default for LoggingConfig<'_> {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL,
            format: LogFormat::infer(),
            build_sha: option_env!("PRESSROOM_BUILD_SHA").unwrap_or(UNKNOWN_BUILD),
        }
    }
}

/// Install the process-wide subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError::SubscriberInstall`] when a global subscriber already exists.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    // First call wins.
    if let Err(rejected) = BUILD_SHA.set(config.build_sha.to_string()) {
        tracing::debug!(rejected = %rejected, kept = build_sha(), "build sha already recorded");
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level));
    tracing_subscriber::registry()
        .with(config.format.layer())
        .with(filter)
        .try_init()
        .map_err(|source| TelemetryError::SubscriberInstall { source })
}

/// Build SHA captured by [`init_logging`], or `dev` before initialisation.
#[must_use]
pub fn build_sha() -> &'static str {
    BUILD_SHA.get().map_or(UNKNOWN_BUILD, String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names_are_case_insensitive() {
        assert_eq!(LogFormat::from_setting(Some("JSON")), LogFormat::Json);
        assert_eq!(LogFormat::from_setting(Some(" pretty ")), LogFormat::Pretty);
        assert_eq!(LogFormat::from_setting(Some("logfmt")), LogFormat::infer());
        assert_eq!(LogFormat::from_setting(None), LogFormat::infer());
    }

    #[test]
    fn second_install_is_rejected() {
        let config = LoggingConfig {
            level: "debug",
            format: LogFormat::Json,
            build_sha: "abc123",
        };
        let first = init_logging(&config);
        assert!(matches!(
            init_logging(&config),
            Err(TelemetryError::SubscriberInstall { .. })
        ));
        if first.is_ok() {
            assert_eq!(build_sha(), "abc123");
        }
    }
}
