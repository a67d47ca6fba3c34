//! Full-Mirror-Sync: make the bucket hold exactly the newly generated tree.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use pressroom_fsops::{FileEntry, JobWorkspace};
use pressroom_storage::ObjectStorage;
use pressroom_telemetry::Metrics;
use tracing::info;

use super::{
    PendingUpload, PublishError, PublishReport, PublishSettings, Publisher, enumerate,
    upload_pool,
};

/// Deletes objects absent from the new output, then uploads every file verbatim.
pub struct MirrorPublisher {
    storage: Arc<dyn ObjectStorage>,
    metrics: Metrics,
    bucket: String,
    settings: PublishSettings,
}

impl MirrorPublisher {
    /// Publisher mirroring into `bucket`.
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

    async fn remove_stale(&self, entries: &[FileEntry]) -> Result<usize, PublishError> {
        let existing = self
            .storage
            .list_objects(&self.bucket, None)
            .await
            .map_err(|source| PublishError::Reconcile {
                operation: "mirror.list",
                bucket: self.bucket.clone(),
                source,
            })?;
        let fresh: HashSet<&str> = entries.iter().map(|entry| entry.key.as_str()).collect();
        let stale: Vec<String> = existing
            .into_iter()
            .map(|summary| summary.key)
            .filter(|key| !fresh.contains(key.as_str()))
            .collect();
        if stale.is_empty() {
            return Ok(0);
        }
        self.storage
            .delete_objects(&self.bucket, &stale)
            .await
            .map_err(|source| PublishError::Reconcile {
                operation: "mirror.delete",
                bucket: self.bucket.clone(),
                source,
            })
    }
}

#[async_trait]
impl Publisher for MirrorPublisher {
    fn strategy(&self) -> &'static str {
        "mirror"
    }

    async fn publish(
        &self,
        output_dir: &Path,
        _workspace: &JobWorkspace,
    ) -> Result<PublishReport, PublishError> {
        let entries = enumerate(output_dir).await?;
        let deleted = self.remove_stale(&entries).await?;
        let attempted = entries.len();

        let outcome = upload_pool(
            &self.storage,
            &self.metrics,
            &self.bucket,
            &self.settings,
            entries,
            |entry| async move {
                Ok(PendingUpload {
                    path: entry.path,
                    key: entry.key,
                    content_type: entry.content_type,
                    content_encoding: None,
                })
            },
        )
        .await;

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
            deleted,
            "site mirrored"
        );
        Ok(PublishReport {
            strategy: self.strategy(),
            uploaded: outcome.uploaded,
            compressed: 0,
            deleted,
        })
    }
}
