//! Recording fakes for the storage and reporting seams.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use pressroom_pipeline::{FailureDetails, JobId, JobReporter, PipelineError, PipelineResult};
use pressroom_storage::{
    DownloadRequest, ObjectStorage, ObjectSummary, StorageError, StorageResult, UploadRequest,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Object held by [`RecordingStorage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Stored payload.
    pub body: Bytes,
    /// Content type, when uploaded through the storage seam.
    pub content_type: Option<String>,
    /// Content encoding, when set.
    pub content_encoding: Option<String>,
    /// Requested ACL, when set.
    pub acl: Option<String>,
}

#[derive(Default)]
struct StorageState {
    objects: BTreeMap<(String, String), StoredObject>,
    uploads: Vec<String>,
    deletes: Vec<String>,
    downloads: Vec<(String, String, Option<String>)>,
}

/// In-process [`ObjectStorage`] that records every call and can fail chosen keys.
#[derive(Clone, Default)]
pub struct RecordingStorage {
    state: Arc<Mutex<StorageState>>,
    failing_keys: Arc<HashSet<String>>,
}

impl RecordingStorage {
    /// Empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage whose uploads to any of `keys` fail.
    #[must_use]
    pub fn failing_uploads<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            state: Arc::default(),
            failing_keys: Arc::new(keys.into_iter().map(Into::into).collect()),
        }
    }

    /// Seed an object without recording an upload.
    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Bytes>) {
        lock(&self.state).objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body: body.into(),
                content_type: None,
                content_encoding: None,
                acl: None,
            },
        );
    }

    /// Object currently stored at `bucket/key`.
    #[must_use]
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        lock(&self.state)
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Keys currently stored in `bucket`, sorted.
    #[must_use]
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        lock(&self.state)
            .objects
            .keys()
            .filter(|(stored_bucket, _)| stored_bucket == bucket)
            .map(|(_, key)| key.clone())
            .collect()
    }

    /// Every upload attempt as `bucket/key`, in call order, including failed ones.
    #[must_use]
    pub fn upload_attempts(&self) -> Vec<String> {
        lock(&self.state).uploads.clone()
    }

    /// Every deleted object as `bucket/key`, in call order.
    #[must_use]
    pub fn deletes(&self) -> Vec<String> {
        lock(&self.state).deletes.clone()
    }

    /// Every download as `(bucket, key, version)`.
    #[must_use]
    pub fn downloads(&self) -> Vec<(String, String, Option<String>)> {
        lock(&self.state).downloads.clone()
    }
}

fn injected(operation: &'static str, bucket: &str, key: &str) -> StorageError {
    StorageError::backend(
        operation,
        bucket,
        Some(key),
        object_store::Error::Generic {
            store: "recording",
            source: "injected failure".into(),
        },
    )
}

#[async_trait]
impl ObjectStorage for RecordingStorage {
    async fn download(
        &self,
        request: DownloadRequest<'_>,
        destination: &Path,
    ) -> StorageResult<u64> {
        let body = {
            let mut state = lock(&self.state);
            state.downloads.push((
                request.bucket.to_string(),
                request.key.to_string(),
                request.version.map(str::to_string),
            ));
            state
                .objects
                .get(&(request.bucket.to_string(), request.key.to_string()))
                .map(|object| object.body.clone())
        };
        let body = body.ok_or_else(|| StorageError::NotFound {
            bucket: request.bucket.to_string(),
            key: request.key.to_string(),
        })?;
        tokio::fs::write(destination, &body)
            .await
            .map_err(|source| StorageError::io("download.write", destination, source))?;
        Ok(body.len() as u64)
    }

    async fn upload(&self, request: UploadRequest) -> StorageResult<()> {
        let mut state = lock(&self.state);
        state
            .uploads
            .push(format!("{}/{}", request.bucket, request.key));
        if self.failing_keys.contains(&request.key) {
            return Err(injected("upload", &request.bucket, &request.key));
        }
        state.objects.insert(
            (request.bucket, request.key),
            StoredObject {
                body: request.body,
                content_type: Some(request.content_type),
                content_encoding: request.content_encoding,
                acl: request.acl,
            },
        );
        Ok(())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
    ) -> StorageResult<Vec<ObjectSummary>> {
        let prefix = prefix.unwrap_or_default();
        Ok(lock(&self.state)
            .objects
            .iter()
            .filter(|((stored_bucket, key), _)| stored_bucket == bucket && key.starts_with(prefix))
            .map(|((_, key), object)| ObjectSummary {
                key: key.clone(),
                size: object.body.len() as u64,
            })
            .collect())
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> StorageResult<usize> {
        let mut state = lock(&self.state);
        let mut removed = 0;
        for key in keys {
            if state
                .objects
                .remove(&(bucket.to_string(), key.clone()))
                .is_some()
            {
                state.deletes.push(format!("{bucket}/{key}"));
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Outcome captured by [`RecordingReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportedOutcome {
    /// `report_success` was called.
    Success {
        /// Reported job.
        job_id: String,
    },
    /// `report_failure` was called.
    Failure {
        /// Reported job.
        job_id: String,
        /// Reported failure details.
        details: FailureDetails,
    },
}

/// [`JobReporter`] that records every report.
#[derive(Clone, Default)]
pub struct RecordingReporter {
    reports: Arc<Mutex<Vec<ReportedOutcome>>>,
    reject: bool,
}

impl RecordingReporter {
    /// Reporter that accepts every report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reporter that records reports but answers each with an error status.
    #[must_use]
    pub fn rejecting() -> Self {
        Self {
            reports: Arc::default(),
            reject: true,
        }
    }

    /// Reports received so far.
    #[must_use]
    pub fn reports(&self) -> Vec<ReportedOutcome> {
        lock(&self.reports).clone()
    }

    fn record(&self, outcome: ReportedOutcome) -> PipelineResult<()> {
        lock(&self.reports).push(outcome);
        if self.reject {
            return Err(PipelineError::HttpStatus {
                operation: "report",
                url: "recording://reporter".to_string(),
                status: 503,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl JobReporter for RecordingReporter {
    async fn report_success(&self, job_id: &JobId) -> PipelineResult<()> {
        self.record(ReportedOutcome::Success {
            job_id: job_id.to_string(),
        })
    }

    async fn report_failure(
        &self,
        job_id: &JobId,
        details: &FailureDetails,
    ) -> PipelineResult<()> {
        self.record(ReportedOutcome::Failure {
            job_id: job_id.to_string(),
            details: details.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(key: &str) -> UploadRequest {
        UploadRequest {
            bucket: "site".to_string(),
            key: key.to_string(),
            body: Bytes::from_static(b"body"),
            content_type: "text/html".to_string(),
            content_encoding: None,
            acl: None,
        }
    }

    #[tokio::test]
    async fn failing_keys_are_recorded_but_not_stored() -> anyhow::Result<()> {
        let storage = RecordingStorage::failing_uploads(["bad.html"]);
        storage.upload(request("good.html")).await?;
        assert!(storage.upload(request("bad.html")).await.is_err());

        assert_eq!(storage.upload_attempts(), vec!["site/good.html", "site/bad.html"]);
        assert_eq!(storage.keys("site"), vec!["good.html"]);
        Ok(())
    }

    #[tokio::test]
    async fn reporter_records_outcomes() -> anyhow::Result<()> {
        let reporter = RecordingReporter::new();
        let job = JobId::new("job-1");
        reporter.report_success(&job).await?;
        assert_eq!(
            reporter.reports(),
            vec![ReportedOutcome::Success {
                job_id: "job-1".to_string()
            }]
        );

        let rejecting = RecordingReporter::rejecting();
        assert!(rejecting.report_success(&job).await.is_err());
        assert_eq!(rejecting.reports().len(), 1);
        Ok(())
    }
}
