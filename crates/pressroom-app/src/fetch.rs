//! Artifact Fetcher: download the zipped source and expand it into the job workspace.

use std::sync::Arc;

use pressroom_fsops::{FsOpsError, JobWorkspace, extract_zip};
use pressroom_pipeline::ObjectLocation;
use pressroom_storage::{DownloadRequest, ObjectStorage, StorageError};
use thiserror::Error;
use tracing::info;

use crate::error::error_chain;

/// Errors raised while fetching the source artifact.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Working directories could not be prepared.
    #[error("job workspace could not be prepared")]
    Workspace {
        /// Source filesystem error.
        source: FsOpsError,
    },
    /// The artifact could not be downloaded.
    #[error("source artifact download failed")]
    Download {
        /// Artifact bucket.
        bucket: String,
        /// Artifact key.
        key: String,
        /// Source storage error.
        source: StorageError,
    },
    /// The downloaded archive could not be expanded.
    #[error("source artifact could not be expanded")]
    Expand {
        /// Source filesystem error.
        source: FsOpsError,
    },
    /// The blocking expansion task did not complete.
    #[error("source artifact expansion task failed")]
    Worker {
        /// Source join error.
        source: tokio::task::JoinError,
    },
}

impl FetchError {
    /// Detail for the failure report.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Download {
                bucket,
                key,
                source: StorageError::NotFound { .. },
            } => format!("{bucket}/{key} does not exist"),
            Self::Download {
                bucket,
                key,
                source,
            } => format!("{bucket}/{key}: {}", error_chain(source)),
            Self::Workspace { source } | Self::Expand { source } => {
                format!("{source}: {}", error_chain(source))
            }
            Self::Worker { source } => source.to_string(),
        }
    }
}

/// Downloads source artifacts through an [`ObjectStorage`].
#[derive(Clone)]
pub struct ArtifactFetcher {
    storage: Arc<dyn ObjectStorage>,
    use_source_revision: bool,
}

impl ArtifactFetcher {
    /// Fetcher over `storage`; `use_source_revision` pins downloads to the event's revision.
    #[must_use]
    pub fn new(storage: Arc<dyn ObjectStorage>, use_source_revision: bool) -> Self {
        Self {
            storage,
            use_source_revision,
        }
    }

    /// Download `location` and expand it into the workspace source directory, returning the
    /// number of files written. The downloaded archive is removed whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns an error when the object is missing, the download fails, or the archive is
    /// unreadable.
    pub async fn fetch(
        &self,
        location: &ObjectLocation,
        workspace: &JobWorkspace,
    ) -> Result<usize, FetchError> {
        let archive = workspace
            .scratch_file("pressroom-artifact-", ".zip")
            .map_err(|source| FetchError::Workspace { source })?;
        let version = if self.use_source_revision {
            location.revision.as_deref()
        } else {
            None
        };
        let request = DownloadRequest {
            bucket: &location.bucket,
            key: &location.key,
            version,
        };
        let size = self
            .storage
            .download(request, archive.path())
            .await
            .map_err(|source| FetchError::Download {
                bucket: location.bucket.clone(),
                key: location.key.clone(),
                source,
            })?;

        let archive_path = archive.path().to_path_buf();
        let target = workspace.source_dir().to_path_buf();
        let files = tokio::task::spawn_blocking(move || extract_zip(&archive_path, &target))
            .await
            .map_err(|source| FetchError::Worker { source })?
            .map_err(|source| FetchError::Expand { source })?;
        drop(archive);

        info!(
            source = %location,
            size,
            files,
            "source artifact expanded"
        );
        Ok(files)
    }
}
