//! Job-scoped working directories.
//!
//! # Design
//!
//! - Each job gets fresh source and output directories under the work root; nothing is
//!   shared between jobs.
//! - [`JobWorkspace::cleanup`] consumes the workspace, so removal happens at most once.
//!   Dropping without cleanup still removes both directories, silently.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, TempDir};
use tracing::debug;

use crate::error::{FsOpsError, FsOpsResult};

const SOURCE_PREFIX: &str = "pressroom-source-";
const OUTPUT_PREFIX: &str = "pressroom-output-";

/// Source and output directories owned by one job.
#[derive(Debug)]
pub struct JobWorkspace {
    root: PathBuf,
    source: TempDir,
    output: TempDir,
}

impl JobWorkspace {
    /// Create both directories under `work_root`, or the system temp directory.
    ///
    /// # Errors
    ///
    /// Returns an error when the root or either directory cannot be created.
    pub fn create(work_root: Option<&Path>) -> FsOpsResult<Self> {
        let root = work_root.map_or_else(std::env::temp_dir, Path::to_path_buf);
        fs::create_dir_all(&root)
            .map_err(|source_err| FsOpsError::io("workspace.create_root", &root, source_err))?;
        let source = scoped_dir(&root, SOURCE_PREFIX)?;
        let output = scoped_dir(&root, OUTPUT_PREFIX)?;
        debug!(
            source = %source.path().display(),
            output = %output.path().display(),
            "job workspace created"
        );
        Ok(Self {
            root,
            source,
            output,
        })
    }

    /// Directory the source artifact is expanded into.
    #[must_use]
    pub fn source_dir(&self) -> &Path {
        self.source.path()
    }

    /// Directory the generator writes into.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        self.output.path()
    }

    /// Root under which the job's scratch files live.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scratch file under the work root, removed when dropped.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be created.
    pub fn scratch_file(&self, prefix: &str, suffix: &str) -> FsOpsResult<NamedTempFile> {
        tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(&self.root)
            .map_err(|source_err| FsOpsError::io("workspace.scratch_file", &self.root, source_err))
    }

    /// Scratch directory under the work root, removed when dropped.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created.
    pub fn scratch_dir(&self, prefix: &str) -> FsOpsResult<TempDir> {
        scoped_dir(&self.root, prefix)
    }

    /// Remove both directories, returning every removal failure.
    #[must_use]
    pub fn cleanup(self) -> Vec<FsOpsError> {
        let mut failures = Vec::new();
        for (operation, dir) in [
            ("workspace.cleanup_source", self.source),
            ("workspace.cleanup_output", self.output),
        ] {
            let path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => debug!(path = %path.display(), "working directory removed"),
                Err(source_err) => failures.push(FsOpsError::io(operation, path, source_err)),
            }
        }
        failures
    }
}

fn scoped_dir(root: &Path, prefix: &str) -> FsOpsResult<TempDir> {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir_in(root)
        .map_err(|source_err| FsOpsError::io("workspace.create_dir", root, source_err))
}
