//! Site Generator Invoker.
//!
//! # Design
//!
//! - The generator is always called as `<exe> --source=<dir> --destination=<dir>`, with
//!   extra arguments appended only when the parameter string reads as flags.
//! - Output is captured as stdout followed by stderr; it is logged on success and
//!   carried in the error otherwise.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Errors raised by the generator invocation.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The executable could not be started.
    #[error("site generator could not be started")]
    Spawn {
        /// Executable that was invoked.
        program: PathBuf,
        /// Source IO error.
        source: std::io::Error,
    },
    /// The parameter string could not be split into arguments.
    #[error("site generator parameters could not be parsed")]
    InvalidParameters {
        /// Offending parameter string.
        value: String,
        /// Source tokenizer error.
        source: shell_words::ParseError,
    },
    /// The generator ran and reported failure.
    #[error("site generator exited unsuccessfully")]
    Exited {
        /// Exit status, absent when the process was terminated by a signal.
        exit_code: Option<i32>,
        /// Combined stdout and stderr.
        output: String,
    },
}

impl GenerationError {
    /// Exit status of the generator, when it ran to completion.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Exited { exit_code, .. } => *exit_code,
            Self::Spawn { .. } | Self::InvalidParameters { .. } => None,
        }
    }

    /// Detail for the failure report.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Spawn { program, source } => {
                format!("{} could not be started: {source}", program.display())
            }
            Self::InvalidParameters { value, source } => format!("{value:?}: {source}"),
            Self::Exited {
                exit_code: Some(code),
                output,
            } => format!("exited with status {code}\n{output}"),
            Self::Exited {
                exit_code: None,
                output,
            } => format!("terminated by signal\n{output}"),
        }
    }
}

/// Captured output of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOutput {
    /// Combined stdout and stderr.
    pub output: String,
}

/// External static-site generator.
#[derive(Debug, Clone)]
pub struct SiteGenerator {
    executable: PathBuf,
}

impl SiteGenerator {
    /// Generator invoking `executable`.
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Executable this generator invokes.
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Arguments passed to the executable.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidParameters`] when a flag string has unbalanced
    /// quoting.
    pub fn arguments(
        source: &Path,
        destination: &Path,
        parameters: Option<&str>,
    ) -> Result<Vec<String>, GenerationError> {
        let mut args = vec![
            format!("--source={}", source.display()),
            format!("--destination={}", destination.display()),
        ];
        let Some(parameters) = parameters.filter(|value| !value.trim().is_empty()) else {
            return Ok(args);
        };
        if !parameters.trim_start().starts_with('-') {
            warn!(parameters, "ignoring generator parameters that are not flags");
            return Ok(args);
        }
        let extra =
            shell_words::split(parameters).map_err(|source| GenerationError::InvalidParameters {
                value: parameters.to_string(),
                source,
            })?;
        args.extend(extra);
        Ok(args)
    }

    /// Run the generator against `source`, writing into `destination`.
    ///
    /// # Errors
    ///
    /// Returns an error when the process cannot be started or exits unsuccessfully.
    pub async fn run(
        &self,
        source: &Path,
        destination: &Path,
        parameters: Option<&str>,
    ) -> Result<GeneratorOutput, GenerationError> {
        let args = Self::arguments(source, destination, parameters)?;
        info!(program = %self.executable.display(), args = ?args, "running site generator");

        let output = Command::new(&self.executable)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| GenerationError::Spawn {
                program: self.executable.clone(),
                source,
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            warn!(
                exit_code = ?output.status.code(),
                output = %combined,
                "site generator failed"
            );
            return Err(GenerationError::Exited {
                exit_code: output.status.code(),
                output: combined,
            });
        }

        debug!(output = %combined, "site generator output");
        Ok(GeneratorOutput { output: combined })
    }
}
