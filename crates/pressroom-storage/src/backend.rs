//! `object_store`-backed implementation of [`ObjectStorage`].
//!
//! # Design
//!
//! - One store client per bucket, built lazily through a [`StoreFactory`] and cached.
//! - The S3 factory reads credentials and region from the standard `AWS_*` environment.
//! - `object_store` has no canned-ACL attribute. A requested ACL is granted after the put by
//!   an [`AclApplier`]; without one it is left to the bucket policy.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures_util::TryStreamExt;
use object_store::path::Path as ObjectPath;
use object_store::{
    Attribute, AttributeValue, Attributes, GetOptions, ObjectStore, PutOptions, PutPayload,
};
use tracing::{debug, info};

use crate::acl::{AclApplier, S3AclApplier};
use crate::error::{StorageError, StorageResult};
use crate::model::{DownloadRequest, ObjectStorage, ObjectSummary, UploadRequest};

/// Builds a store client for a bucket.
pub trait StoreFactory: Send + Sync {
    /// Create the client used for every call against `bucket`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend rejects the configuration.
    fn build(&self, bucket: &str) -> StorageResult<Arc<dyn ObjectStore>>;
}

impl<F> StoreFactory for F
where
    F: Fn(&str) -> StorageResult<Arc<dyn ObjectStore>> + Send + Sync,
{
    fn build(&self, bucket: &str) -> StorageResult<Arc<dyn ObjectStore>> {
        self(bucket)
    }
}

/// Factory producing S3 clients configured from the environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct S3StoreFactory;

impl StoreFactory for S3StoreFactory {
    fn build(&self, bucket: &str) -> StorageResult<Arc<dyn ObjectStore>> {
        let store = object_store::aws::AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|source| StorageError::backend("client.build", bucket, None, source))?;
        Ok(Arc::new(store))
    }
}

/// [`ObjectStorage`] implementation over `object_store` clients.
pub struct ObjectStoreStorage {
    factory: Arc<dyn StoreFactory>,
    acl_applier: Option<Arc<dyn AclApplier>>,
    stores: Mutex<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl ObjectStoreStorage {
    /// Storage backed by S3, configured from the environment, granting ACLs via the AWS SDK.
    #[must_use]
    pub fn s3() -> Self {
        Self::with_factory(Arc::new(S3StoreFactory))
            .with_acl_applier(Arc::new(S3AclApplier::default()))
    }

    /// Storage using a custom client factory.
    #[must_use]
    pub fn with_factory(factory: Arc<dyn StoreFactory>) -> Self {
        Self {
            factory,
            acl_applier: None,
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// Grant requested ACLs through `applier` after each upload.
    #[must_use]
    pub fn with_acl_applier(mut self, applier: Arc<dyn AclApplier>) -> Self {
        self.acl_applier = Some(applier);
        self
    }

    fn store(&self, bucket: &str) -> StorageResult<Arc<dyn ObjectStore>> {
        let mut stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(store) = stores.get(bucket) {
            return Ok(Arc::clone(store));
        }
        let store = self.factory.build(bucket)?;
        stores.insert(bucket.to_string(), Arc::clone(&store));
        Ok(store)
    }
}

impl std::fmt::Debug for ObjectStoreStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreStorage").finish_non_exhaustive()
    }
}

fn object_path(key: &str) -> StorageResult<ObjectPath> {
    ObjectPath::parse(key).map_err(|source| StorageError::InvalidKey {
        key: key.to_string(),
        source,
    })
}

fn map_get_error(bucket: &str, key: &str, source: object_store::Error) -> StorageError {
    match source {
        object_store::Error::NotFound { .. } => StorageError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        },
        other => StorageError::backend("download", bucket, Some(key), other),
    }
}

fn upload_attributes(request: &UploadRequest) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(
        Attribute::ContentType,
        AttributeValue::from(request.content_type.clone()),
    );
    if let Some(encoding) = &request.content_encoding {
        attributes.insert(
            Attribute::ContentEncoding,
            AttributeValue::from(encoding.clone()),
        );
    }
    attributes
}

#[async_trait]
impl ObjectStorage for ObjectStoreStorage {
    async fn download(
        &self,
        request: DownloadRequest<'_>,
        destination: &Path,
    ) -> StorageResult<u64> {
        let store = self.store(request.bucket)?;
        let path = object_path(request.key)?;
        let options = GetOptions {
            version: request.version.map(str::to_string),
            ..GetOptions::default()
        };
        let result = store
            .get_opts(&path, options)
            .await
            .map_err(|source| map_get_error(request.bucket, request.key, source))?;
        let data = result
            .bytes()
            .await
            .map_err(|source| map_get_error(request.bucket, request.key, source))?;

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StorageError::io("download.create_dir", parent, source))?;
        }
        tokio::fs::write(destination, &data)
            .await
            .map_err(|source| StorageError::io("download.write", destination, source))?;

        info!(
            bucket = request.bucket,
            key = request.key,
            size = data.len(),
            path = %destination.display(),
            "object downloaded"
        );
        Ok(u64::try_from(data.len()).unwrap_or(u64::MAX))
    }

    async fn upload(&self, request: UploadRequest) -> StorageResult<()> {
        let store = self.store(&request.bucket)?;
        let path = object_path(&request.key)?;
        let options = PutOptions {
            attributes: upload_attributes(&request),
            ..PutOptions::default()
        };
        let size = request.body.len();
        store
            .put_opts(&path, PutPayload::from(request.body), options)
            .await
            .map_err(|source| {
                StorageError::backend("upload", &request.bucket, Some(&request.key), source)
            })?;
        debug!(bucket = %request.bucket, key = %request.key, size, "object uploaded");

        match (&request.acl, &self.acl_applier) {
            (Some(acl), Some(applier)) => {
                applier.apply(&request.bucket, &request.key, acl).await?;
            }
            (Some(acl), None) => {
                debug!(key = %request.key, acl = %acl, "no acl applier; left to bucket policy");
            }
            (None, _) => {}
        }
        Ok(())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
    ) -> StorageResult<Vec<ObjectSummary>> {
        let store = self.store(bucket)?;
        let prefix = prefix
            .filter(|value| !value.trim_matches('/').is_empty())
            .map(object_path)
            .transpose()?;
        let metas: Vec<_> = store
            .list(prefix.as_ref())
            .try_collect()
            .await
            .map_err(|source| StorageError::backend("list", bucket, None, source))?;
        Ok(metas
            .into_iter()
            .map(|meta| ObjectSummary {
                key: meta.location.to_string(),
                size: u64::try_from(meta.size).unwrap_or(u64::MAX),
            })
            .collect())
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> StorageResult<usize> {
        let store = self.store(bucket)?;
        let mut removed = 0;
        for key in keys {
            let path = object_path(key)?;
            match store.delete(&path).await {
                Ok(()) => removed += 1,
                Err(object_store::Error::NotFound { .. }) => {
                    debug!(bucket, key = %key, "object already absent");
                }
                Err(source) => {
                    return Err(StorageError::backend("delete", bucket, Some(key), source));
                }
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use object_store::memory::InMemory;
    use tempfile::TempDir;

    fn memory_storage() -> (ObjectStoreStorage, Arc<InMemory>) {
        let memory = Arc::new(InMemory::new());
        let shared = Arc::clone(&memory);
        let factory = move |_: &str| -> StorageResult<Arc<dyn ObjectStore>> {
            Ok(Arc::clone(&shared) as Arc<dyn ObjectStore>)
        };
        (ObjectStoreStorage::with_factory(Arc::new(factory)), memory)
    }

    fn upload_request(key: &str, body: &'static [u8]) -> UploadRequest {
        UploadRequest {
            bucket: "site-bucket".to_string(),
            key: key.to_string(),
            body: Bytes::from_static(body),
            content_type: "text/html".to_string(),
            content_encoding: Some("gzip".to_string()),
            acl: Some("public-read".to_string()),
        }
    }

    #[tokio::test]
    async fn upload_sets_content_metadata() -> anyhow::Result<()> {
        let (storage, memory) = memory_storage();
        storage.upload(upload_request("docs/index.html", b"<p>hi</p>")).await?;

        let result = memory.get(&ObjectPath::from("docs/index.html")).await?;
        let content_type: &str = result
            .attributes
            .get(&Attribute::ContentType)
            .map(AsRef::as_ref)
            .unwrap_or_default();
        let encoding: &str = result
            .attributes
            .get(&Attribute::ContentEncoding)
            .map(AsRef::as_ref)
            .unwrap_or_default();
        assert_eq!(content_type, "text/html");
        assert_eq!(encoding, "gzip");
        assert_eq!(result.bytes().await?.as_ref(), b"<p>hi</p>");
        Ok(())
    }

    #[tokio::test]
    async fn download_writes_object_to_destination() -> anyhow::Result<()> {
        let (storage, memory) = memory_storage();
        memory
            .put(
                &ObjectPath::from("artifacts/source.zip"),
                PutPayload::from_static(b"zip-bytes"),
            )
            .await?;
        let temp = TempDir::new()?;
        let destination = temp.path().join("nested").join("source.zip");

        let written = storage
            .download(
                DownloadRequest {
                    bucket: "artifacts",
                    key: "artifacts/source.zip",
                    version: None,
                },
                &destination,
            )
            .await?;

        assert_eq!(written, 9);
        assert_eq!(std::fs::read(&destination)?, b"zip-bytes");
        Ok(())
    }

    #[tokio::test]
    async fn download_of_missing_object_reports_not_found() -> anyhow::Result<()> {
        let (storage, _) = memory_storage();
        let temp = TempDir::new()?;
        let err = storage
            .download(
                DownloadRequest {
                    bucket: "artifacts",
                    key: "missing.zip",
                    version: None,
                },
                &temp.path().join("out.zip"),
            )
            .await
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected missing object"))?;
        assert!(matches!(err, StorageError::NotFound { ref key, .. } if key == "missing.zip"));
        Ok(())
    }

    #[tokio::test]
    async fn list_and_delete_respect_prefix() -> anyhow::Result<()> {
        let (storage, _) = memory_storage();
        storage.upload(upload_request("site/index.html", b"a")).await?;
        storage.upload(upload_request("site/css/app.css", b"b")).await?;
        storage.upload(upload_request("other/readme.txt", b"c")).await?;

        let mut keys: Vec<String> = storage
            .list_objects("site-bucket", Some("site"))
            .await?
            .into_iter()
            .map(|summary| summary.key)
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["site/css/app.css", "site/index.html"]);

        let all = storage.list_objects("site-bucket", None).await?;
        assert_eq!(all.len(), 3);

        let removed = storage.delete_objects("site-bucket", &keys).await?;
        assert_eq!(removed, 2);
        let remaining = storage.list_objects("site-bucket", Some("/")).await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].key, "other/readme.txt");
        Ok(())
    }

    #[derive(Default)]
    struct RecordingAcl {
        grants: Mutex<Vec<(String, String, String)>>,
        reject: bool,
    }

    #[async_trait]
    impl AclApplier for RecordingAcl {
        async fn apply(&self, bucket: &str, key: &str, acl: &str) -> StorageResult<()> {
            self.grants
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((bucket.to_string(), key.to_string(), acl.to_string()));
            if self.reject {
                return Err(StorageError::acl(bucket, key, acl, "access denied"));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn upload_grants_requested_acl() -> anyhow::Result<()> {
        let (storage, memory) = memory_storage();
        let acl = Arc::new(RecordingAcl::default());
        let storage = storage.with_acl_applier(Arc::clone(&acl) as Arc<dyn AclApplier>);

        storage.upload(upload_request("index.html", b"home")).await?;
        let mut private = upload_request("drafts/post.html", b"draft");
        private.acl = None;
        storage.upload(private).await?;

        let grants = acl.grants.lock().unwrap_or_else(PoisonError::into_inner).clone();
        assert_eq!(
            grants,
            vec![(
                "site-bucket".to_string(),
                "index.html".to_string(),
                "public-read".to_string()
            )]
        );
        assert!(memory.head(&ObjectPath::from("drafts/post.html")).await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn rejected_acl_fails_the_upload() -> anyhow::Result<()> {
        let (storage, _) = memory_storage();
        let storage = storage.with_acl_applier(Arc::new(RecordingAcl {
            reject: true,
            ..RecordingAcl::default()
        }));

        let err = storage
            .upload(upload_request("index.html", b"home"))
            .await
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected acl failure"))?;
        assert!(matches!(
            err,
            StorageError::Acl { ref key, ref acl, .. } if key == "index.html" && acl == "public-read"
        ));
        Ok(())
    }

    #[test]
    fn invalid_keys_are_rejected() {
        let err = object_path("a//b").err();
        assert!(matches!(err, Some(StorageError::InvalidKey { .. })));
    }

    #[test]
    fn factory_is_invoked_once_per_bucket() -> anyhow::Result<()> {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&calls);
        let factory = move |bucket: &str| -> StorageResult<Arc<dyn ObjectStore>> {
            recorded
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(bucket.to_string());
            Ok(Arc::new(InMemory::new()) as Arc<dyn ObjectStore>)
        };
        let storage = ObjectStoreStorage::with_factory(Arc::new(factory));
        storage.store("a")?;
        storage.store("a")?;
        storage.store("b")?;
        let calls = calls.lock().unwrap_or_else(PoisonError::into_inner).clone();
        assert_eq!(calls, vec!["a", "b"]);
        Ok(())
    }
}
