use std::sync::Arc;

use pressroom_config::DeployConfig;
use pressroom_pipeline::{HttpJobReporter, JobReporter, LogJobReporter};
use pressroom_storage::{ObjectStorage, ObjectStoreStorage};
use pressroom_telemetry::{LogFormat, LoggingConfig, Metrics};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::orchestrator::DeployOrchestrator;

/// Collaborators the orchestrator is built from.
pub struct AppDependencies {
    config: DeployConfig,
    storage: Arc<dyn ObjectStorage>,
    reporter: Arc<dyn JobReporter>,
    metrics: Metrics,
}

impl AppDependencies {
    /// Production dependencies: S3 storage and the reporter the configuration selects.
    ///
    /// # Errors
    ///
    /// Returns an error when the reporter or metrics registry cannot be built.
    pub fn from_config(config: DeployConfig) -> AppResult<Self> {
        let reporter = build_reporter(&config)?;
        let metrics =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        Ok(Self::new(
            config,
            Arc::new(ObjectStoreStorage::s3()),
            reporter,
            metrics,
        ))
    }

    /// Dependencies assembled by the caller.
    #[must_use]
    pub fn new(
        config: DeployConfig,
        storage: Arc<dyn ObjectStorage>,
        reporter: Arc<dyn JobReporter>,
        metrics: Metrics,
    ) -> Self {
        Self {
            config,
            storage,
            reporter,
            metrics,
        }
    }

    /// Metrics registry shared with the orchestrator.
    #[must_use]
    pub const fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Build the orchestrator.
    #[must_use]
    pub fn into_orchestrator(self) -> DeployOrchestrator {
        DeployOrchestrator::new(self.config, self.storage, self.reporter, self.metrics)
    }
}

/// Reporter posting to the configured pipeline API, or logging when none is configured.
///
/// # Errors
///
/// Returns an error when the configured API URL cannot carry job paths.
pub fn build_reporter(config: &DeployConfig) -> AppResult<Arc<dyn JobReporter>> {
    match &config.pipeline_api_url {
        Some(url) => {
            let reporter = HttpJobReporter::new(url.clone(), config.pipeline_api_timeout)
                .map_err(|source| AppError::Reporter {
                    operation: "reporter.http",
                    source,
                })?;
            info!(url = %url, "reporting job status over http");
            Ok(Arc::new(reporter))
        }
        None => {
            info!("no pipeline api configured; job status will be logged");
            Ok(Arc::new(LogJobReporter))
        }
    }
}

/// Logging settings derived from the deployment configuration.
#[must_use]
pub fn logging_config(config: &DeployConfig) -> LoggingConfig<'_> {
    LoggingConfig {
        level: &config.logging.level,
        format: LogFormat::from_setting(config.logging.format.as_deref()),
        ..LoggingConfig::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reporter_defaults_to_logging() -> anyhow::Result<()> {
        let config = DeployConfig::default();
        let _reporter = build_reporter(&config)?;
        Ok(())
    }

    #[test]
    fn reporter_rejects_opaque_api_url() -> anyhow::Result<()> {
        let config = DeployConfig {
            pipeline_api_url: Some(url::Url::parse("mailto:ops@example.com")?),
            ..DeployConfig::default()
        };
        let err = build_reporter(&config).err();
        assert!(matches!(err, Some(AppError::Reporter { .. })));
        Ok(())
    }

    #[test]
    fn logging_config_follows_settings() {
        let mut config = DeployConfig::default();
        config.logging.level = "debug".to_string();
        config.logging.format = Some("json".to_string());
        let logging = logging_config(&config);
        assert_eq!(logging.level, "debug");
        assert_eq!(logging.format, LogFormat::Json);
    }
}
