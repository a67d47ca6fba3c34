//! Typed deployment settings.
//!
//! # Design
//! - Settings are resolved once per process and shared read-only with every stage.
//! - Optional destinations stay optional here; the job context decides which one applies.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::defaults::{
    DEFAULT_GENERATOR_PATH, DEFAULT_LOG_LEVEL, DEFAULT_OBJECT_ACL,
    DEFAULT_PIPELINE_API_TIMEOUT_SECS, DEFAULT_UPLOAD_CONCURRENCY,
};

/// How generated output is delivered when the destination is a bucket root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishMode {
    /// Upload every file individually, gzip-encoding eligible files.
    #[default]
    Sync,
    /// Delete stale destination objects, then upload every file verbatim.
    Mirror,
}

impl PublishMode {
    /// Stable string form used in logs and configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sync => "sync",
            Self::Mirror => "mirror",
        }
    }
}

impl fmt::Display for PublishMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for PublishMode {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sync" => Ok(Self::Sync),
            "mirror" => Ok(Self::Mirror),
            _ => Err(()),
        }
    }
}

/// Logging preferences forwarded to the telemetry crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Level used when `RUST_LOG` is not set.
    pub level: String,
    /// Requested output format (`json`/`pretty`); inferred from the build when absent.
    pub format: Option<String>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: None,
        }
    }
}

/// Resolved configuration for one deployment invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    /// Bucket that receives the published site.
    pub destination_bucket: Option<String>,
    /// Key used when the site is published as a single archive object.
    pub destination_key: Option<String>,
    /// Flags forwarded to the generator when the event carries none.
    pub generator_parameters: Option<String>,
    /// Generator executable.
    pub generator_path: PathBuf,
    /// Delivery mode for bucket destinations.
    pub publish_mode: PublishMode,
    /// Worker pool size for per-file uploads.
    pub upload_concurrency: usize,
    /// Canned ACL attached to uploads.
    pub object_acl: Option<String>,
    /// Download the exact source revision named in the event instead of the latest object.
    pub use_source_revision: bool,
    /// Parent directory for job working directories; system temp when absent.
    pub work_root: Option<PathBuf>,
    /// Pipeline status API; outcomes are only logged when absent.
    pub pipeline_api_url: Option<Url>,
    /// Request timeout for the pipeline status API.
    pub pipeline_api_timeout: Duration,
    /// Logging preferences.
    pub logging: LogSettings,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            destination_bucket: None,
            destination_key: None,
            generator_parameters: None,
            generator_path: PathBuf::from(DEFAULT_GENERATOR_PATH),
            publish_mode: PublishMode::default(),
            upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            object_acl: Some(DEFAULT_OBJECT_ACL.to_string()),
            use_source_revision: false,
            work_root: None,
            pipeline_api_url: None,
            pipeline_api_timeout: Duration::from_secs(DEFAULT_PIPELINE_API_TIMEOUT_SECS),
            logging: LogSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_mode_parses_case_insensitively() {
        assert_eq!("SYNC".parse::<PublishMode>(), Ok(PublishMode::Sync));
        assert_eq!(" mirror ".parse::<PublishMode>(), Ok(PublishMode::Mirror));
        assert!("rsync".parse::<PublishMode>().is_err());
        assert_eq!(PublishMode::Mirror.to_string(), "mirror");
    }

    #[test]
    fn defaults_match_historical_behaviour() {
        let config = DeployConfig::default();
        assert_eq!(config.generator_path, PathBuf::from("./hugo"));
        assert_eq!(config.upload_concurrency, 5);
        assert_eq!(config.object_acl.as_deref(), Some("public-read"));
        assert!(!config.use_source_revision);
        assert_eq!(config.publish_mode, PublishMode::Sync);
    }
}
