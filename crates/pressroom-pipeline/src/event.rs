//! Wire shape of the pipeline trigger event.
//!
//! Every field is optional at this layer; required-ness is enforced by
//! [`crate::context`] so a missing value can be reported by name.

use serde::{Deserialize, Serialize};

use crate::error::ContextError;

/// Top-level trigger payload delivered by the pipeline orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// Job envelope.
    #[serde(rename = "CodePipeline.job", default)]
    pub job: Option<PipelineJob>,
}

impl TriggerEvent {
    /// Decode an event from raw JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::Decode`] when the payload is not valid JSON for this shape.
    pub fn from_slice(payload: &[u8]) -> Result<Self, ContextError> {
        serde_json::from_slice(payload).map_err(|source| ContextError::Decode { source })
    }
}

/// Job envelope carrying the identifier and its data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineJob {
    /// Job identifier assigned by the orchestrator.
    #[serde(default)]
    pub id: Option<String>,
    /// Artifacts and action configuration.
    #[serde(default)]
    pub data: Option<JobData>,
}

/// Artifacts and configuration attached to a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobData {
    /// Artifacts the action consumes.
    #[serde(default)]
    pub input_artifacts: Vec<Artifact>,
    /// Artifacts the action is expected to produce.
    #[serde(default)]
    pub output_artifacts: Vec<Artifact>,
    /// User-supplied action configuration.
    #[serde(default)]
    pub action_configuration: Option<ActionConfiguration>,
}

/// One artifact reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Logical artifact name.
    #[serde(default)]
    pub name: Option<String>,
    /// Source revision that produced the artifact.
    #[serde(default)]
    pub revision: Option<String>,
    /// Where the artifact is stored.
    #[serde(default)]
    pub location: Option<ArtifactLocation>,
}

/// Storage location of an artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactLocation {
    /// Location type reported by the orchestrator (`S3`).
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Bucket and key of the artifact object.
    #[serde(default)]
    pub s3_location: Option<S3Location>,
}

/// Bucket/key pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Location {
    /// Bucket name.
    #[serde(default)]
    pub bucket_name: Option<String>,
    /// Object key.
    #[serde(default)]
    pub object_key: Option<String>,
}

/// Action configuration wrapper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionConfiguration {
    /// Configured values.
    #[serde(default)]
    pub configuration: Option<ActionSettings>,
}

/// Configured values for the action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSettings {
    /// Free-text parameters forwarded to the generator.
    #[serde(rename = "UserParameters", default)]
    pub user_parameters: Option<String>,
}
