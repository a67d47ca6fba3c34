//! Enumeration of generated output.

use std::path::{Component, Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::error::{FsOpsError, FsOpsResult};

/// Extensions that are already compressed and are published verbatim.
pub const UNCOMPRESSED_EXTENSIONS: [&str; 6] = ["jpg", "png", "ttf", "woff", "woff2", "gif"];

/// Content type used when the extension maps to nothing.
pub const FALLBACK_CONTENT_TYPE: &str = "text/plain";

/// A file discovered under the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute path of the generated file.
    pub path: PathBuf,
    /// Path relative to the output root.
    pub relative_path: PathBuf,
    /// Object key: the relative path joined with `/`.
    pub key: String,
    /// Content type inferred from the extension.
    pub content_type: String,
    /// Whether the file is gzip-encoded before upload.
    pub compressible: bool,
    /// File size in bytes.
    pub size: u64,
}

/// Whether a file at `path` should be gzip-encoded before upload.
#[must_use]
pub fn is_compressible(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_none_or(|ext| {
            !UNCOMPRESSED_EXTENSIONS
                .iter()
                .any(|excluded| excluded.eq_ignore_ascii_case(ext))
        })
}

/// Content type for a file, by extension.
#[must_use]
pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_string()
}

/// List every regular file under `root` in file-name order.
///
/// Symlinks are followed: a linked file is listed under the link's own path, and a linked
/// directory is descended into. Link cycles are walk errors.
///
/// # Errors
///
/// Returns an error when the tree cannot be walked or a name is not valid UTF-8.
pub fn enumerate_output(root: &Path) -> FsOpsResult<Vec<FileEntry>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry
            .map_err(|source_err| FsOpsError::walkdir("enumerate_output.walk", root, source_err))?;
        let file_type = entry.file_type();
        if file_type.is_dir() {
            continue;
        }
        if !file_type.is_file() {
            warn!(path = %entry.path().display(), "skipping special file");
            continue;
        }
        let path = entry.path();
        let key = relative_key(root, path)?;
        let metadata = entry.metadata().map_err(|source_err| {
            FsOpsError::walkdir("enumerate_output.metadata", path, source_err)
        })?;
        entries.push(FileEntry {
            path: path.to_path_buf(),
            relative_path: PathBuf::from(&key),
            content_type: content_type_for(path),
            compressible: is_compressible(path),
            key,
            size: metadata.len(),
        });
    }
    Ok(entries)
}

pub(crate) fn relative_key(root: &Path, path: &Path) -> FsOpsResult<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        FsOpsError::invalid("source_path", "strip_prefix", path.to_string_lossy().into_owned())
    })?;
    let mut segments = Vec::new();
    for component in relative.components() {
        if let Component::Normal(segment) = component {
            let segment = segment.to_str().ok_or_else(|| {
                FsOpsError::invalid("source_path", "non_utf8", path.to_string_lossy().into_owned())
            })?;
            segments.push(segment);
        }
    }
    Ok(segments.join("/"))
}
