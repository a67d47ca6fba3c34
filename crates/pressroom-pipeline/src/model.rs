//! Typed job records derived from the trigger event.
//!
//! # Design
//! - A `Job` is immutable once extracted; every field it needs is already validated.

use std::fmt;

use serde::Serialize;

/// Identifier assigned to a job by the pipeline orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Wrap a raw identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// An object in storage, optionally pinned to a revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectLocation {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Object version or source revision when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

impl ObjectLocation {
    /// Location without a revision.
    #[must_use]
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            revision: None,
        }
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}/{}", self.bucket, self.key)
    }
}

/// Where generated output is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Destination {
    /// A single archive object.
    Artifact {
        /// Bucket receiving the archive.
        bucket: String,
        /// Key of the archive object.
        key: String,
    },
    /// The root of a hosting bucket.
    Bucket {
        /// Bucket receiving the site tree.
        bucket: String,
    },
}

impl Destination {
    /// Bucket the destination lives in.
    #[must_use]
    pub fn bucket(&self) -> &str {
        match self {
            Self::Artifact { bucket, .. } | Self::Bucket { bucket } => bucket,
        }
    }
}

/// One execution of the deployment step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    /// Orchestrator-assigned identifier.
    pub id: JobId,
    /// Zipped source artifact.
    pub source: ObjectLocation,
    /// Delivery target for the generated site.
    pub destination: Destination,
    /// Extra flags for the generator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator_parameters: Option<String>,
}
