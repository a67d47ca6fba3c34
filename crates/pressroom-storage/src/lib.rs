#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Object storage seam for the deployment step.
//!
//! Layout: `model.rs` (request/summary types + the `ObjectStorage` trait),
//! `backend.rs` (`object_store`-backed implementation), `acl.rs` (canned ACL grants),
//! `error.rs`.

pub mod acl;
pub mod backend;
pub mod error;
pub mod model;

pub use acl::{AclApplier, S3AclApplier};
pub use backend::{ObjectStoreStorage, S3StoreFactory, StoreFactory};
pub use error::{StorageError, StorageResult};
pub use model::{DownloadRequest, ObjectStorage, ObjectSummary, UploadRequest};
