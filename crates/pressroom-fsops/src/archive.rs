//! Zip expansion and creation.
//!
//! # Design
//!
//! - Entry names are sanitized before touching the filesystem; absolute paths and parent
//!   segments are rejected instead of being clamped.
//! - Archives are written with forward-slash entry names in file-name order so the
//!   output is reproducible for a given tree.

use std::fs::{self, File};
use std::io;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::ZipArchive;
use zip::write::FileOptions;

use crate::error::{FsOpsError, FsOpsResult};
use crate::output::relative_key;

/// Expand the zip archive at `source` into `target`, returning the number of files written.
///
/// # Errors
///
/// Returns an error when the archive cannot be read, an entry name is unsafe, or a file
/// cannot be written.
pub fn extract_zip(source: &Path, target: &Path) -> FsOpsResult<usize> {
    let file = File::open(source)
        .map_err(|source_err| FsOpsError::io("extract_zip.open", source, source_err))?;
    let mut archive = ZipArchive::new(file)
        .map_err(|source_err| FsOpsError::zip("extract_zip.decode", source, source_err))?;

    let mut written = 0;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|source_err| FsOpsError::zip("extract_zip.read_entry", source, source_err))?;
        let entry_path = sanitize_archive_path(entry.name())?;
        if entry_path.as_os_str().is_empty() {
            continue;
        }
        let destination = target.join(&entry_path);

        if entry.is_dir() {
            fs::create_dir_all(&destination).map_err(|source_err| {
                FsOpsError::io("extract_zip.create_dir", &destination, source_err)
            })?;
            continue;
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|source_err| {
                FsOpsError::io("extract_zip.create_parent", parent, source_err)
            })?;
        }

        let mut output = File::create(&destination).map_err(|source_err| {
            FsOpsError::io("extract_zip.create_file", &destination, source_err)
        })?;
        io::copy(&mut entry, &mut output)
            .map_err(|source_err| FsOpsError::io("extract_zip.copy", &destination, source_err))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            let perms = fs::Permissions::from_mode(mode);
            fs::set_permissions(&destination, perms).map_err(|source_err| {
                FsOpsError::io("extract_zip.set_permissions", &destination, source_err)
            })?;
        }
        written += 1;
    }

    debug!(archive = %source.display(), files = written, "archive expanded");
    Ok(written)
}

/// Normalise an archive entry name into a relative path.
///
/// Names made only of `.` segments normalise to an empty path.
///
/// # Errors
///
/// Returns [`FsOpsError::InvalidInput`] for absolute names and names containing `..`.
pub fn sanitize_archive_path(entry: &str) -> FsOpsResult<PathBuf> {
    let path = Path::new(entry);
    if path.is_absolute() || entry.starts_with('/') || entry.starts_with('\\') {
        return Err(FsOpsError::invalid(
            "archive_entry",
            "absolute_path",
            entry.to_string(),
        ));
    }

    let mut sanitized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(segment) => sanitized.push(segment),
            Component::CurDir => {}
            _ => {
                return Err(FsOpsError::invalid(
                    "archive_entry",
                    "invalid_segment",
                    entry.to_string(),
                ));
            }
        }
    }
    Ok(sanitized)
}

/// Zip the tree under `source` into a new archive at `archive`, returning the file count.
///
/// Symlinks are followed and stored as the content they point to.
///
/// # Errors
///
/// Returns an error when the tree cannot be walked or the archive cannot be written.
pub fn create_zip(source: &Path, archive: &Path) -> FsOpsResult<usize> {
    let file = File::create(archive)
        .map_err(|source_err| FsOpsError::io("create_zip.create", archive, source_err))?;
    let mut writer = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut files = 0;
    for entry in WalkDir::new(source)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry
            .map_err(|source_err| FsOpsError::walkdir("create_zip.walk", source, source_err))?;
        let name = relative_key(source, entry.path())?;
        if entry.file_type().is_dir() {
            writer
                .add_directory(format!("{name}/"), options)
                .map_err(|source_err| FsOpsError::zip("create_zip.add_dir", archive, source_err))?;
            continue;
        }
        if !entry.file_type().is_file() {
            warn!(path = %entry.path().display(), "skipping special file");
            continue;
        }

        writer
            .start_file(name, options)
            .map_err(|source_err| FsOpsError::zip("create_zip.start_file", archive, source_err))?;
        let mut input = File::open(entry.path()).map_err(|source_err| {
            FsOpsError::io("create_zip.open_entry", entry.path(), source_err)
        })?;
        io::copy(&mut input, &mut writer)
            .map_err(|source_err| FsOpsError::io("create_zip.copy", entry.path(), source_err))?;
        files += 1;
    }

    writer
        .finish()
        .map_err(|source_err| FsOpsError::zip("create_zip.finish", archive, source_err))?;
    debug!(archive = %archive.display(), files, "archive created");
    Ok(files)
}
