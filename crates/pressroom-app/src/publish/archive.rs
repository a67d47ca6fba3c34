//! Archive-and-Upload: zip the whole output and store it as one object.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use pressroom_fsops::{JobWorkspace, create_zip};
use pressroom_storage::{ObjectStorage, StorageError, UploadRequest};
use pressroom_telemetry::Metrics;
use tracing::info;

use super::{PublishError, PublishReport, Publisher};

const ZIP_CONTENT_TYPE: &str = "application/zip";

/// Uploads the generated site as a single zip object.
pub struct ArchivePublisher {
    storage: Arc<dyn ObjectStorage>,
    metrics: Metrics,
    bucket: String,
    key: String,
}

impl ArchivePublisher {
    /// Publisher writing `bucket/key`.
    #[must_use]
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        metrics: Metrics,
        bucket: String,
        key: String,
    ) -> Self {
        Self {
            storage,
            metrics,
            bucket,
            key,
        }
    }

    fn upload_error(&self, source: StorageError) -> PublishError {
        self.metrics.inc_publish_failure();
        PublishError::Upload {
            bucket: self.bucket.clone(),
            key: self.key.clone(),
            source,
        }
    }
}

#[async_trait]
impl Publisher for ArchivePublisher {
    fn strategy(&self) -> &'static str {
        "archive"
    }

    async fn publish(
        &self,
        output_dir: &Path,
        workspace: &JobWorkspace,
    ) -> Result<PublishReport, PublishError> {
        let archive = workspace
            .scratch_file("pressroom-site-", ".zip")
            .map_err(|source| PublishError::Prepare {
                operation: "archive.scratch_file",
                source,
            })?;
        let archive_path = archive.path().to_path_buf();
        let source_dir = output_dir.to_path_buf();
        let files = tokio::task::spawn_blocking(move || create_zip(&source_dir, &archive_path))
            .await
            .map_err(|source| PublishError::Worker {
                operation: "archive.create_zip",
                source,
            })?
            .map_err(|source| PublishError::Prepare {
                operation: "archive.create_zip",
                source,
            })?;

        let body = tokio::fs::read(archive.path()).await.map_err(|source| {
            self.upload_error(StorageError::io("archive.read", archive.path(), source))
        })?;
        let size = body.len();
        self.storage
            .upload(UploadRequest {
                bucket: self.bucket.clone(),
                key: self.key.clone(),
                body: Bytes::from(body),
                content_type: ZIP_CONTENT_TYPE.to_string(),
                content_encoding: None,
                acl: None,
            })
            .await
            .map_err(|source| self.upload_error(source))?;
        self.metrics.inc_file_published("identity");

        info!(
            bucket = %self.bucket,
            key = %self.key,
            files,
            size,
            "site archive uploaded"
        );
        Ok(PublishReport {
            strategy: self.strategy(),
            uploaded: 1,
            compressed: 0,
            deleted: 0,
        })
    }
}
