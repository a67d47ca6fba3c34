//! Staging of output files ahead of upload.
//!
//! Eligible files are gzip-encoded into the staging directory; everything else is
//! copied verbatim. The staged layout mirrors the output layout.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::error::{FsOpsError, FsOpsResult};
use crate::output::FileEntry;

/// `Content-Encoding` value for gzip-staged files.
pub const GZIP_ENCODING: &str = "gzip";

/// A file ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// Staged copy on disk.
    pub path: PathBuf,
    /// Object key.
    pub key: String,
    /// Content type to publish with.
    pub content_type: String,
    /// Content encoding to publish with.
    pub content_encoding: Option<&'static str>,
}

/// Stage `entry` beneath `staging_root`.
///
/// # Errors
///
/// Returns an error when the staged copy cannot be written.
pub fn stage_file(entry: &FileEntry, staging_root: &Path) -> FsOpsResult<StagedFile> {
    let target = staging_root.join(&entry.relative_path);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|source_err| {
            FsOpsError::io("stage_file.create_parent", parent, source_err)
        })?;
    }

    let content_encoding = if entry.compressible {
        gzip_file(&entry.path, &target)?;
        Some(GZIP_ENCODING)
    } else {
        fs::copy(&entry.path, &target)
            .map_err(|source_err| FsOpsError::io("stage_file.copy", &target, source_err))?;
        None
    };

    Ok(StagedFile {
        path: target,
        key: entry.key.clone(),
        content_type: entry.content_type.clone(),
        content_encoding,
    })
}

fn gzip_file(source: &Path, target: &Path) -> FsOpsResult<()> {
    let input = File::open(source)
        .map_err(|source_err| FsOpsError::io("stage_file.open", source, source_err))?;
    let output = File::create(target)
        .map_err(|source_err| FsOpsError::io("stage_file.create", target, source_err))?;
    let mut encoder = GzEncoder::new(BufWriter::new(output), Compression::default());
    io::copy(&mut BufReader::new(input), &mut encoder)
        .map_err(|source_err| FsOpsError::io("stage_file.compress", target, source_err))?;
    let writer = encoder
        .finish()
        .map_err(|source_err| FsOpsError::io("stage_file.finish", target, source_err))?;
    writer
        .into_inner()
        .map_err(|err| FsOpsError::io("stage_file.flush", target, err.into_error()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::enumerate_output;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn compressible_files_are_gzipped() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let output = temp.path().join("out");
        fs::create_dir_all(output.join("css"))?;
        fs::write(output.join("css").join("site.css"), b"body { color: red; }")?;
        let staging = temp.path().join("staging");

        let entries = enumerate_output(&output)?;
        let staged = stage_file(&entries[0], &staging)?;

        assert_eq!(staged.key, "css/site.css");
        assert_eq!(staged.content_type, "text/css");
        assert_eq!(staged.content_encoding, Some(GZIP_ENCODING));
        assert_eq!(staged.path, staging.join("css").join("site.css"));
        let mut decoded = String::new();
        GzDecoder::new(File::open(&staged.path)?).read_to_string(&mut decoded)?;
        assert_eq!(decoded, "body { color: red; }");
        Ok(())
    }

    #[test]
    fn excluded_files_are_copied_verbatim() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let output = temp.path().join("out");
        fs::create_dir_all(&output)?;
        fs::write(output.join("font.woff2"), b"wOF2raw")?;
        let staging = temp.path().join("staging");

        let entries = enumerate_output(&output)?;
        let staged = stage_file(&entries[0], &staging)?;

        assert_eq!(staged.content_encoding, None);
        assert_eq!(fs::read(&staged.path)?, b"wOF2raw");
        Ok(())
    }
}
