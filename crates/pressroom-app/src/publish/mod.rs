//! Publisher strategies.
//!
//! # Design
//!
//! - One [`Publisher`] trait; the orchestrator never knows which strategy it drives.
//! - [`Destination::Artifact`] always publishes one archive. A bucket destination syncs
//!   per file, or mirrors when configured to.
//! - Per-file upload failures are collected instead of aborting sibling uploads.

mod archive;
mod mirror;
mod sync;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream;
use pressroom_config::{DeployConfig, PublishMode};
use pressroom_fsops::{FsOpsError, JobWorkspace};
use pressroom_pipeline::Destination;
use pressroom_storage::{ObjectStorage, StorageError, UploadRequest};
use pressroom_telemetry::Metrics;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::error_chain;

pub use archive::ArchivePublisher;
pub use mirror::MirrorPublisher;
pub use sync::SyncPublisher;

/// Errors raised while publishing generated output.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The output could not be enumerated, staged, or packaged.
    #[error("generated output could not be prepared")]
    Prepare {
        /// Operation identifier.
        operation: &'static str,
        /// Source filesystem error.
        source: FsOpsError,
    },
    /// A single required upload failed.
    #[error("upload failed")]
    Upload {
        /// Destination bucket.
        bucket: String,
        /// Destination key.
        key: String,
        /// Source storage error.
        source: StorageError,
    },
    /// Existing objects could not be listed or removed.
    #[error("destination bucket could not be reconciled")]
    Reconcile {
        /// Operation identifier.
        operation: &'static str,
        /// Destination bucket.
        bucket: String,
        /// Source storage error.
        source: StorageError,
    },
    /// Some files failed to publish while the rest succeeded.
    #[error("some files failed to publish")]
    PartialFailure {
        /// Destination bucket.
        bucket: String,
        /// Keys that failed, sorted.
        failed: Vec<String>,
        /// Number of files attempted.
        attempted: usize,
    },
    /// A blocking filesystem task did not complete.
    #[error("publish task failed")]
    Worker {
        /// Operation identifier.
        operation: &'static str,
        /// Source join error.
        source: tokio::task::JoinError,
    },
}

impl PublishError {
    /// Detail for the failure report.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Prepare { source, .. } => format!("{source}: {}", error_chain(source)),
            Self::Upload {
                bucket,
                key,
                source,
            } => format!("{bucket}/{key}: {}", error_chain(source)),
            Self::Reconcile { bucket, source, .. } => {
                format!("{bucket}: {}", error_chain(source))
            }
            Self::PartialFailure {
                bucket,
                failed,
                attempted,
            } => format!(
                "{} of {attempted} files failed to upload to {bucket}: {}",
                failed.len(),
                failed.join(", ")
            ),
            Self::Worker { source, .. } => source.to_string(),
        }
    }
}

/// What a publisher did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Strategy that ran.
    pub strategy: &'static str,
    /// Objects uploaded.
    pub uploaded: usize,
    /// Uploaded objects that were gzip-encoded.
    pub compressed: usize,
    /// Stale objects removed from the destination.
    pub deleted: usize,
}

/// Upload settings shared by the bucket strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishSettings {
    /// Canned ACL requested for each object.
    pub acl: Option<String>,
    /// Maximum uploads in flight.
    pub upload_concurrency: usize,
}

impl PublishSettings {
    /// Settings taken from the deployment configuration.
    #[must_use]
    pub fn from_config(config: &DeployConfig) -> Self {
        Self {
            acl: config.object_acl.clone(),
            upload_concurrency: config.upload_concurrency.max(1),
        }
    }
}

/// Delivers generated output to its destination.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Strategy label used in logs and reports.
    fn strategy(&self) -> &'static str;

    /// Publish everything under `output_dir`, using `workspace` for scratch space.
    async fn publish(
        &self,
        output_dir: &Path,
        workspace: &JobWorkspace,
    ) -> Result<PublishReport, PublishError>;
}

/// Pick the strategy for `destination`.
#[must_use]
pub fn select_publisher(
    destination: &Destination,
    config: &DeployConfig,
    storage: Arc<dyn ObjectStorage>,
    metrics: Metrics,
) -> Box<dyn Publisher> {
    match destination {
        Destination::Artifact { bucket, key } => Box::new(ArchivePublisher::new(
            storage,
            metrics,
            bucket.clone(),
            key.clone(),
        )),
        Destination::Bucket { bucket } => {
            let settings = PublishSettings::from_config(config);
            match config.publish_mode {
                PublishMode::Sync => Box::new(SyncPublisher::new(
                    storage,
                    metrics,
                    bucket.clone(),
                    settings,
                )),
                PublishMode::Mirror => Box::new(MirrorPublisher::new(
                    storage,
                    metrics,
                    bucket.clone(),
                    settings,
                )),
            }
        }
    }
}

/// One object queued for the upload pool.
#[derive(Debug, Clone)]
pub(crate) struct PendingUpload {
    pub(crate) path: std::path::PathBuf,
    pub(crate) key: String,
    pub(crate) content_type: String,
    pub(crate) content_encoding: Option<&'static str>,
}

/// Outcome of draining an upload pool.
#[derive(Debug, Default)]
pub(crate) struct PoolOutcome {
    pub(crate) uploaded: usize,
    pub(crate) compressed: usize,
    pub(crate) failed: Vec<String>,
}

/// Upload every item with at most `concurrency` requests in flight.
///
/// Items are produced lazily by `prepare`, so staging for an item also runs inside the
/// pool. A failed item is logged and recorded; the rest continue.
pub(crate) async fn upload_pool<I, F, Fut>(
    storage: &Arc<dyn ObjectStorage>,
    metrics: &Metrics,
    bucket: &str,
    settings: &PublishSettings,
    items: I,
    prepare: F,
) -> PoolOutcome
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = Result<PendingUpload, (String, PublishError)>>,
{
    let results: Vec<Result<PendingUpload, (String, PublishError)>> = stream::iter(items)
        .map(|item| {
            let prepared = prepare(item);
            async move {
                let pending = prepared.await?;
                upload_one(storage, bucket, settings, &pending)
                    .await
                    .map_err(|err| (pending.key.clone(), err))?;
                Ok(pending)
            }
        })
        .buffer_unordered(settings.upload_concurrency.max(1))
        .collect()
        .await;

    let mut outcome = PoolOutcome::default();
    for result in results {
        match result {
            Ok(pending) => {
                let encoding = pending.content_encoding.unwrap_or("identity");
                metrics.inc_file_published(encoding);
                outcome.uploaded += 1;
                if pending.content_encoding.is_some() {
                    outcome.compressed += 1;
                }
            }
            Err((key, err)) => {
                warn!(
                    bucket,
                    key = %key,
                    error = %err,
                    detail = %err.detail(),
                    "file failed to publish"
                );
                metrics.inc_publish_failure();
                outcome.failed.push(key);
            }
        }
    }
    outcome.failed.sort();
    outcome
}

async fn upload_one(
    storage: &Arc<dyn ObjectStorage>,
    bucket: &str,
    settings: &PublishSettings,
    pending: &PendingUpload,
) -> Result<(), PublishError> {
    let body = tokio::fs::read(&pending.path)
        .await
        .map_err(|source| PublishError::Upload {
            bucket: bucket.to_string(),
            key: pending.key.clone(),
            source: StorageError::io("upload.read", &pending.path, source),
        })?;
    let request = UploadRequest {
        bucket: bucket.to_string(),
        key: pending.key.clone(),
        body: Bytes::from(body),
        content_type: pending.content_type.clone(),
        content_encoding: pending.content_encoding.map(str::to_string),
        acl: settings.acl.clone(),
    };
    storage
        .upload(request)
        .await
        .map_err(|source| PublishError::Upload {
            bucket: bucket.to_string(),
            key: pending.key.clone(),
            source,
        })?;
    debug!(
        bucket,
        key = %pending.key,
        content_type = %pending.content_type,
        encoding = pending.content_encoding.unwrap_or("identity"),
        "file published"
    );
    Ok(())
}

/// Enumerate the output tree on the blocking pool.
pub(crate) async fn enumerate(
    output_dir: &Path,
) -> Result<Vec<pressroom_fsops::FileEntry>, PublishError> {
    let root = output_dir.to_path_buf();
    tokio::task::spawn_blocking(move || pressroom_fsops::enumerate_output(&root))
        .await
        .map_err(|source| PublishError::Worker {
            operation: "publish.enumerate",
            source,
        })?
        .map_err(|source| PublishError::Prepare {
            operation: "publish.enumerate",
            source,
        })
}
