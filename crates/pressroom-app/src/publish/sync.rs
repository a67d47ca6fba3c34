//! Enumerate-and-Sync: per-file staging and upload into a bucket.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use pressroom_fsops::{FileEntry, JobWorkspace, stage_file};
use pressroom_storage::ObjectStorage;
use pressroom_telemetry::Metrics;
use tracing::info;

use super::{
    PendingUpload, PublishError, PublishReport, PublishSettings, Publisher, enumerate,
    upload_pool,
};

/// Stages each generated file (gzip when eligible) and uploads it under its relative key.
pub struct SyncPublisher {
    storage: Arc<dyn ObjectStorage>,
    metrics: Metrics,
    bucket: String,
    settings: PublishSettings,
}

impl SyncPublisher {
    /// Publisher targeting `bucket`.
    #[must_use]
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        metrics: Metrics,
        bucket: String,
        settings: PublishSettings,
    ) -> Self {
        Self {
            storage,
            metrics,
            bucket,
            settings,
        }
    }
}

async fn stage(
    entry: FileEntry,
    staging_root: PathBuf,
) -> Result<PendingUpload, (String, PublishError)> {
    let key = entry.key.clone();
    let staged = tokio::task::spawn_blocking(move || stage_file(&entry, &staging_root))
        .await
        .map_err(|source| {
            (
                key.clone(),
                PublishError::Worker {
                    operation: "sync.stage",
                    source,
                },
            )
        })?
        .map_err(|source| {
            (
                key.clone(),
                PublishError::Prepare {
                    operation: "sync.stage",
                    source,
                },
            )
        })?;
    Ok(PendingUpload {
        path: staged.path,
        key: staged.key,
        content_type: staged.content_type,
        content_encoding: staged.content_encoding,
    })
}

#[async_trait]
impl Publisher for SyncPublisher {
    fn strategy(&self) -> &'static str {
        "sync"
    }

    async fn publish(
        &self,
        output_dir: &Path,
        workspace: &JobWorkspace,
    ) -> Result<PublishReport, PublishError> {
        let entries = enumerate(output_dir).await?;
        let staging = workspace
            .scratch_dir("pressroom-staging-")
            .map_err(|source| PublishError::Prepare {
                operation: "sync.staging_dir",
                source,
            })?;
        let attempted = entries.len();
        let staging_root = staging.path().to_path_buf();

        let outcome = upload_pool(
            &self.storage,
            &self.metrics,
            &self.bucket,
            &self.settings,
            entries,
            |entry| stage(entry, staging_root.clone()),
        )
        .await;
        drop(staging);

        if !outcome.failed.is_empty() {
            return Err(PublishError::PartialFailure {
                bucket: self.bucket.clone(),
                failed: outcome.failed,
                attempted,
            });
        }

        info!(
            bucket = %self.bucket,
            uploaded = outcome.uploaded,
            compressed = outcome.compressed,
            "site synced"
        );
        Ok(PublishReport {
            strategy: self.strategy(),
            uploaded: outcome.uploaded,
            compressed: outcome.compressed,
            deleted: 0,
        })
    }
}
