//! Canned ACLs for uploaded objects.
//!
//! # Design
//! - `object_store` writes carry no ACL, so the ACL is set by a follow-up signed call once
//!   the object exists.
//! - The S3 client is loaded from the standard AWS environment on first use.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::types::ObjectCannedAcl;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::{StorageError, StorageResult};

/// Applies a canned ACL to an object that was just written.
#[async_trait]
pub trait AclApplier: Send + Sync {
    /// Grant `acl` (e.g. `public-read`) on `bucket/key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Acl`] when the backend rejects the grant.
    async fn apply(&self, bucket: &str, key: &str, acl: &str) -> StorageResult<()>;
}

/// [`AclApplier`] issuing `PutObjectAcl` through the AWS SDK.
#[derive(Debug, Default)]
pub struct S3AclApplier {
    client: OnceCell<Client>,
}

impl S3AclApplier {
    async fn client(&self) -> &Client {
        self.client
            .get_or_init(|| async {
                let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
                Client::new(&config)
            })
            .await
    }
}

#[async_trait]
impl AclApplier for S3AclApplier {
    async fn apply(&self, bucket: &str, key: &str, acl: &str) -> StorageResult<()> {
        self.client()
            .await
            .put_object_acl()
            .bucket(bucket)
            .key(key)
            .acl(ObjectCannedAcl::from(acl))
            .send()
            .await
            .map_err(|err| StorageError::acl(bucket, key, acl, err.into_service_error()))?;
        debug!(bucket, key, acl, "object acl applied");
        Ok(())
    }
}
