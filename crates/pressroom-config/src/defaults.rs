//! Environment variable names and fallback values.

/// Bucket that receives the published site.
pub const ENV_SITE_BUCKET: &str = "PRESSROOM_SITE_BUCKET";
/// Legacy spelling of the site bucket variable, still honoured by existing stacks.
pub const ENV_SITE_BUCKET_LEGACY: &str = "SiteBucket";
/// Object key used when the whole site is published as a single archive.
pub const ENV_SITE_KEY: &str = "PRESSROOM_SITE_KEY";
/// Extra flags forwarded to the generator.
pub const ENV_GENERATOR_PARAMETERS: &str = "PRESSROOM_GENERATOR_PARAMETERS";
/// Path to the generator executable.
pub const ENV_GENERATOR_PATH: &str = "PRESSROOM_GENERATOR_PATH";
/// Publish mode for bucket destinations (`sync` or `mirror`).
pub const ENV_PUBLISH_MODE: &str = "PRESSROOM_PUBLISH_MODE";
/// Upper bound on concurrent per-file uploads.
pub const ENV_UPLOAD_CONCURRENCY: &str = "PRESSROOM_UPLOAD_CONCURRENCY";
/// Canned ACL applied to uploaded objects; empty disables it.
pub const ENV_OBJECT_ACL: &str = "PRESSROOM_OBJECT_ACL";
/// Whether the source revision recorded in the event is honoured on download.
pub const ENV_USE_SOURCE_REVISION: &str = "PRESSROOM_USE_SOURCE_REVISION";
/// Parent directory for job working directories.
pub const ENV_WORK_DIR: &str = "PRESSROOM_WORK_DIR";
/// Base URL of the pipeline status API.
pub const ENV_PIPELINE_API_URL: &str = "PRESSROOM_PIPELINE_API_URL";
/// Request timeout for the pipeline status API, in seconds.
pub const ENV_PIPELINE_API_TIMEOUT_SECS: &str = "PRESSROOM_PIPELINE_API_TIMEOUT_SECS";
/// Log level used when `RUST_LOG` is unset.
pub const ENV_LOG_LEVEL: &str = "PRESSROOM_LOG_LEVEL";
/// Log output format (`json` or `pretty`).
pub const ENV_LOG_FORMAT: &str = "PRESSROOM_LOG_FORMAT";

/// Generator executable used when none is configured.
pub const DEFAULT_GENERATOR_PATH: &str = "./hugo";
/// Worker pool size for per-file uploads.
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 5;
/// Largest accepted worker pool size.
pub const MAX_UPLOAD_CONCURRENCY: usize = 64;
/// Canned ACL applied to published objects.
pub const DEFAULT_OBJECT_ACL: &str = "public-read";
/// Pipeline API timeout in seconds.
pub const DEFAULT_PIPELINE_API_TIMEOUT_SECS: u64 = 10;
/// Log level used when none is configured.
pub const DEFAULT_LOG_LEVEL: &str = "info";
