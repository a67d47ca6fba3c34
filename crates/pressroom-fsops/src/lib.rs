#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Filesystem side of the deployment step.
//!
//! Layout: `workspace.rs` (job-scoped working directories), `archive.rs` (zip expand and
//! create), `output.rs` (generated-output enumeration), `staging.rs` (gzip or verbatim
//! staging ahead of upload).
//!
//! Everything here is blocking; async callers wrap these calls in `spawn_blocking`.

pub mod archive;
pub mod error;
pub mod output;
pub mod staging;
pub mod workspace;

pub use archive::{create_zip, extract_zip, sanitize_archive_path};
pub use error::{FsOpsError, FsOpsResult};
pub use output::{
    FALLBACK_CONTENT_TYPE, FileEntry, UNCOMPRESSED_EXTENSIONS, content_type_for, enumerate_output,
    is_compressible,
};
pub use staging::{GZIP_ENCODING, StagedFile, stage_file};
pub use workspace::JobWorkspace;
