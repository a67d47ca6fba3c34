//! Environment parsing for [`DeployConfig`].
//!
//! # Design
//! - All reads go through a lookup closure so tests never mutate process state.
//! - Blank values are treated as unset.

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::defaults::{
    DEFAULT_PIPELINE_API_TIMEOUT_SECS, ENV_GENERATOR_PARAMETERS, ENV_GENERATOR_PATH,
    ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_OBJECT_ACL, ENV_PIPELINE_API_TIMEOUT_SECS,
    ENV_PIPELINE_API_URL, ENV_PUBLISH_MODE, ENV_SITE_BUCKET, ENV_SITE_BUCKET_LEGACY,
    ENV_SITE_KEY, ENV_UPLOAD_CONCURRENCY, ENV_USE_SOURCE_REVISION, ENV_WORK_DIR,
    MAX_UPLOAD_CONCURRENCY,
};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{DeployConfig, LogSettings, PublishMode};

impl DeployConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when a variable is set to a value that fails validation.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error when a variable is set to a value that fails validation.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();

        let destination_bucket = read(ENV_SITE_BUCKET).or_else(|| read(ENV_SITE_BUCKET_LEGACY));
        let destination_key = read(ENV_SITE_KEY).map(|key| key.trim_start_matches('/').to_string());

        let publish_mode = match read(ENV_PUBLISH_MODE) {
            Some(raw) => raw
                .parse::<PublishMode>()
                .map_err(|()| ConfigError::invalid(ENV_PUBLISH_MODE, "unknown_mode", &raw))?,
            None => defaults.publish_mode,
        };

        let upload_concurrency = match read(ENV_UPLOAD_CONCURRENCY) {
            Some(raw) => parse_concurrency(&raw)?,
            None => defaults.upload_concurrency,
        };

        // An explicitly empty ACL disables it, so this one bypasses `read`.
        let object_acl = match lookup(ENV_OBJECT_ACL) {
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => Some(raw.trim().to_string()),
            None => defaults.object_acl,
        };

        let use_source_revision = match read(ENV_USE_SOURCE_REVISION) {
            Some(raw) => parse_bool(ENV_USE_SOURCE_REVISION, &raw)?,
            None => defaults.use_source_revision,
        };

        let pipeline_api_url = read(ENV_PIPELINE_API_URL)
            .map(|raw| {
                Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl {
                    field: ENV_PIPELINE_API_URL,
                    value: raw.clone(),
                    source,
                })
            })
            .transpose()?;

        let pipeline_api_timeout = match read(ENV_PIPELINE_API_TIMEOUT_SECS) {
            Some(raw) => parse_timeout(&raw)?,
            None => Duration::from_secs(DEFAULT_PIPELINE_API_TIMEOUT_SECS),
        };

        let logging = LogSettings {
            level: read(ENV_LOG_LEVEL).unwrap_or(defaults.logging.level),
            format: read(ENV_LOG_FORMAT),
        };

        let config = Self {
            destination_bucket,
            destination_key,
            generator_parameters: read(ENV_GENERATOR_PARAMETERS),
            generator_path: read(ENV_GENERATOR_PATH)
                .map_or(defaults.generator_path, PathBuf::from),
            publish_mode,
            upload_concurrency,
            object_acl,
            use_source_revision,
            work_root: read(ENV_WORK_DIR).map(PathBuf::from),
            pipeline_api_url,
            pipeline_api_timeout,
            logging,
        };

        debug!(
            destination_bucket = ?config.destination_bucket,
            publish_mode = %config.publish_mode,
            upload_concurrency = config.upload_concurrency,
            "deployment configuration loaded"
        );
        Ok(config)
    }
}

fn parse_concurrency(raw: &str) -> ConfigResult<usize> {
    let value = raw
        .parse::<usize>()
        .map_err(|_| ConfigError::invalid(ENV_UPLOAD_CONCURRENCY, "not_an_integer", raw))?;
    if value == 0 {
        return Err(ConfigError::invalid(ENV_UPLOAD_CONCURRENCY, "zero", raw));
    }
    if value > MAX_UPLOAD_CONCURRENCY {
        return Err(ConfigError::invalid(
            ENV_UPLOAD_CONCURRENCY,
            "out_of_range",
            raw,
        ));
    }
    Ok(value)
}

fn parse_timeout(raw: &str) -> ConfigResult<Duration> {
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::invalid(
            ENV_PIPELINE_API_TIMEOUT_SECS,
            "zero",
            raw,
        )),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => Err(ConfigError::invalid(
            ENV_PIPELINE_API_TIMEOUT_SECS,
            "not_an_integer",
            raw,
        )),
    }
}

fn parse_bool(field: &'static str, raw: &str) -> ConfigResult<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(field, "not_a_boolean", raw)),
    }
}
