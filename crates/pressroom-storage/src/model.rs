//! Storage request types and the [`ObjectStorage`] trait.

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StorageResult;

/// Object to fetch, optionally pinned to a version.
#[derive(Debug, Clone, Copy)]
pub struct DownloadRequest<'a> {
    /// Bucket holding the object.
    pub bucket: &'a str,
    /// Object key.
    pub key: &'a str,
    /// Specific object version; latest when absent.
    pub version: Option<&'a str>,
}

/// Object to store along with its HTTP metadata.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Destination bucket.
    pub bucket: String,
    /// Destination key.
    pub key: String,
    /// Object payload.
    pub body: Bytes,
    /// `Content-Type` served with the object.
    pub content_type: String,
    /// `Content-Encoding` served with the object, when the body is encoded.
    pub content_encoding: Option<String>,
    /// Canned ACL requested for the object.
    pub acl: Option<String>,
}

/// One entry returned by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    /// Object key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
}

/// Object storage operations the deployment step relies on.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Download an object into `destination`, returning the number of bytes written.
    async fn download(
        &self,
        request: DownloadRequest<'_>,
        destination: &Path,
    ) -> StorageResult<u64>;

    /// Store one object, replacing any existing object at the same key.
    async fn upload(&self, request: UploadRequest) -> StorageResult<()>;

    /// List objects in `bucket` whose key starts with `prefix`.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
    ) -> StorageResult<Vec<ObjectSummary>>;

    /// Delete the given keys, returning how many were removed. Missing keys are ignored.
    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> StorageResult<usize>;
}
