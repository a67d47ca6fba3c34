//! # Design
//!
//! - Constant messages; bucket, key, and operation travel as fields.
//! - A missing object is its own variant so callers can word fetch failures precisely.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors produced by object storage access.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Requested object does not exist.
    #[error("object not found")]
    NotFound {
        /// Bucket that was queried.
        bucket: String,
        /// Key that was queried.
        key: String,
    },
    /// Key could not be expressed as an object path.
    #[error("invalid object key")]
    InvalidKey {
        /// Offending key.
        key: String,
        /// Underlying path error.
        source: object_store::path::Error,
    },
    /// Backend call failed.
    #[error("object storage operation failed")]
    Backend {
        /// Operation identifier.
        operation: &'static str,
        /// Bucket involved.
        bucket: String,
        /// Key involved when the call targeted one object.
        key: Option<String>,
        /// Underlying backend error.
        source: object_store::Error,
    },
    /// Canned ACL could not be applied to an uploaded object.
    #[error("object acl grant failed")]
    Acl {
        /// Bucket holding the object.
        bucket: String,
        /// Object key.
        key: String,
        /// Requested canned ACL.
        acl: String,
        /// Underlying backend error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// Local filesystem access failed.
    #[error("object storage local io failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Local path involved.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl StorageError {
    /// Wrap a backend error for a call against one object.
    #[must_use]
    pub fn backend(
        operation: &'static str,
        bucket: &str,
        key: Option<&str>,
        source: object_store::Error,
    ) -> Self {
        Self::Backend {
            operation,
            bucket: bucket.to_string(),
            key: key.map(str::to_string),
            source,
        }
    }

    /// Wrap a failed ACL grant.
    #[must_use]
    pub fn acl(
        bucket: &str,
        key: &str,
        acl: &str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Acl {
            bucket: bucket.to_string(),
            key: key.to_string(),
            acl: acl.to_string(),
            source: source.into(),
        }
    }

    /// Wrap a local IO error.
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}
