//! Job Context Extractor: trigger event → [`Job`].
//!
//! # Design
//! - Required fields fail loudly by name; nothing is defaulted silently.
//! - The job identifier is extractable on its own so a failure can still be reported
//!   when the rest of the event is malformed.
//! - Destination precedence: event output artifact, then configured bucket + key, then
//!   configured bucket alone.

use pressroom_config::DeployConfig;

use crate::error::ContextError;
use crate::event::{Artifact, JobData, TriggerEvent};
use crate::model::{Destination, Job, JobId, ObjectLocation};

/// Extract only the job identifier.
///
/// # Errors
///
/// Returns [`ContextError::MissingField`] when the identifier is absent or blank.
pub fn extract_job_id(event: &TriggerEvent) -> Result<JobId, ContextError> {
    event
        .job
        .as_ref()
        .and_then(|job| non_blank(job.id.as_deref()))
        .map(JobId::new)
        .ok_or(ContextError::MissingField {
            field: "CodePipeline.job.id",
        })
}

/// Extract a complete job from the event and deployment configuration.
///
/// # Errors
///
/// Returns a [`ContextError`] naming the first required field that is missing, or
/// [`ContextError::MissingDestination`] when no destination can be resolved.
pub fn extract_job(event: &TriggerEvent, config: &DeployConfig) -> Result<Job, ContextError> {
    let id = extract_job_id(event)?;
    let data = event
        .job
        .as_ref()
        .and_then(|job| job.data.as_ref())
        .ok_or(ContextError::MissingField {
            field: "CodePipeline.job.data",
        })?;

    let input = data
        .input_artifacts
        .first()
        .ok_or(ContextError::MissingField {
            field: "CodePipeline.job.data.inputArtifacts",
        })?;
    let source = artifact_location(input, "CodePipeline.job.data.inputArtifacts[0]")?;

    let destination = resolve_destination(data, config)?;

    let generator_parameters = event_parameters(data)
        .or_else(|| non_blank(config.generator_parameters.as_deref()))
        .map(str::to_string);

    Ok(Job {
        id,
        source,
        destination,
        generator_parameters,
    })
}

fn resolve_destination(data: &JobData, config: &DeployConfig) -> Result<Destination, ContextError> {
    if let Some(output) = data.output_artifacts.first() {
        let location = artifact_location(output, "CodePipeline.job.data.outputArtifacts[0]")?;
        return Ok(Destination::Artifact {
            bucket: location.bucket,
            key: location.key,
        });
    }

    let bucket = non_blank(config.destination_bucket.as_deref());
    let key = non_blank(config.destination_key.as_deref());
    match (bucket, key) {
        (Some(bucket), Some(key)) => Ok(Destination::Artifact {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }),
        (Some(bucket), None) => Ok(Destination::Bucket {
            bucket: bucket.to_string(),
        }),
        (None, _) => Err(ContextError::MissingDestination),
    }
}

fn artifact_location(
    artifact: &Artifact,
    field: &'static str,
) -> Result<ObjectLocation, ContextError> {
    let s3 = artifact
        .location
        .as_ref()
        .and_then(|location| location.s3_location.as_ref())
        .ok_or(ContextError::MissingField { field })?;
    let bucket = non_blank(s3.bucket_name.as_deref()).ok_or(ContextError::MissingField {
        field: "s3Location.bucketName",
    })?;
    let key = non_blank(s3.object_key.as_deref()).ok_or(ContextError::MissingField {
        field: "s3Location.objectKey",
    })?;
    Ok(ObjectLocation {
        bucket: bucket.to_string(),
        key: key.to_string(),
        revision: non_blank(artifact.revision.as_deref()).map(str::to_string),
    })
}

fn event_parameters(data: &JobData) -> Option<&str> {
    data.action_configuration
        .as_ref()
        .and_then(|action| action.configuration.as_ref())
        .and_then(|settings| non_blank(settings.user_parameters.as_deref()))
}

// Whitespace only decides blankness; present values are kept verbatim.
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn event_from(value: &Value) -> anyhow::Result<TriggerEvent> {
        Ok(TriggerEvent::from_slice(&serde_json::to_vec(value)?)?)
    }

    fn base_event() -> Value {
        json!({
            "CodePipeline.job": {
                "id": "job-42",
                "data": {
                    "inputArtifacts": [{
                        "name": "SourceOutput",
                        "revision": "rev-7",
                        "location": {
                            "type": "S3",
                            "s3Location": {"bucketName": "artifacts", "objectKey": "src/site.zip"}
                        }
                    }],
                    "outputArtifacts": []
                }
            }
        })
    }

    fn site_config() -> DeployConfig {
        DeployConfig {
            destination_bucket: Some("site-bucket".to_string()),
            ..DeployConfig::default()
        }
    }

    #[test]
    fn extracts_bucket_destination_from_configuration() -> anyhow::Result<()> {
        let job = extract_job(&event_from(&base_event())?, &site_config())?;
        assert_eq!(job.id.as_str(), "job-42");
        assert_eq!(job.source.bucket, "artifacts");
        assert_eq!(job.source.key, "src/site.zip");
        assert_eq!(job.source.revision.as_deref(), Some("rev-7"));
        assert_eq!(
            job.destination,
            Destination::Bucket {
                bucket: "site-bucket".to_string()
            }
        );
        assert!(job.generator_parameters.is_none());
        Ok(())
    }

    #[test]
    fn output_artifact_takes_precedence_over_configuration() -> anyhow::Result<()> {
        let mut event = base_event();
        event["CodePipeline.job"]["data"]["outputArtifacts"] = json!([{
            "name": "SiteOutput",
            "location": {
                "type": "S3",
                "s3Location": {"bucketName": "artifacts", "objectKey": "out/site.zip"}
            }
        }]);
        let job = extract_job(&event_from(&event)?, &site_config())?;
        assert_eq!(
            job.destination,
            Destination::Artifact {
                bucket: "artifacts".to_string(),
                key: "out/site.zip".to_string()
            }
        );
        Ok(())
    }

    #[test]
    fn configured_bucket_and_key_form_an_artifact_destination() -> anyhow::Result<()> {
        let config = DeployConfig {
            destination_key: Some("releases/site.zip".to_string()),
            ..site_config()
        };
        let job = extract_job(&event_from(&base_event())?, &config)?;
        assert_eq!(
            job.destination,
            Destination::Artifact {
                bucket: "site-bucket".to_string(),
                key: "releases/site.zip".to_string()
            }
        );
        Ok(())
    }

    #[test]
    fn event_parameters_win_over_configured_parameters() -> anyhow::Result<()> {
        let config = DeployConfig {
            generator_parameters: Some("--buildDrafts".to_string()),
            ..site_config()
        };
        let job = extract_job(&event_from(&base_event())?, &config)?;
        assert_eq!(job.generator_parameters.as_deref(), Some("--buildDrafts"));

        let mut event = base_event();
        event["CodePipeline.job"]["data"]["actionConfiguration"] =
            json!({"configuration": {"UserParameters": "  --minify  "}});
        let job = extract_job(&event_from(&event)?, &config)?;
        assert_eq!(job.generator_parameters.as_deref(), Some("  --minify  "));
        Ok(())
    }

    #[test]
    fn artifact_locations_keep_surrounding_whitespace() -> anyhow::Result<()> {
        let mut event = base_event();
        event["CodePipeline.job"]["data"]["inputArtifacts"][0]["location"]["s3Location"] =
            json!({"bucketName": "artifacts", "objectKey": " drafts/site.zip "});
        let job = extract_job(&event_from(&event)?, &site_config())?;
        assert_eq!(job.source.key, " drafts/site.zip ");
        assert_eq!(job.source.bucket, "artifacts");
        Ok(())
    }

    #[test]
    fn missing_required_fields_fail_by_name() -> anyhow::Result<()> {
        let cases: Vec<(Value, &str)> = vec![
            (json!({}), "CodePipeline.job.id"),
            (json!({"CodePipeline.job": {"id": "  "}}), "CodePipeline.job.id"),
            (
                json!({"CodePipeline.job": {"id": "job-1"}}),
                "CodePipeline.job.data",
            ),
            (
                json!({"CodePipeline.job": {"id": "job-1", "data": {"inputArtifacts": []}}}),
                "CodePipeline.job.data.inputArtifacts",
            ),
            (
                json!({"CodePipeline.job": {"id": "job-1", "data": {"inputArtifacts": [{"name": "x"}]}}}),
                "CodePipeline.job.data.inputArtifacts[0]",
            ),
            (
                json!({"CodePipeline.job": {"id": "job-1", "data": {"inputArtifacts": [
                    {"location": {"s3Location": {"objectKey": "src.zip"}}}
                ]}}}),
                "s3Location.bucketName",
            ),
            (
                json!({"CodePipeline.job": {"id": "job-1", "data": {"inputArtifacts": [
                    {"location": {"s3Location": {"bucketName": "artifacts", "objectKey": ""}}}
                ]}}}),
                "s3Location.objectKey",
            ),
        ];

        for (value, expected) in cases {
            match extract_job(&event_from(&value)?, &site_config()) {
                Err(ContextError::MissingField { field }) => assert_eq!(field, expected),
                other => panic!("expected missing {expected}, got {other:?}"),
            }
        }
        Ok(())
    }

    #[test]
    fn missing_destination_is_an_error() -> anyhow::Result<()> {
        let result = extract_job(&event_from(&base_event())?, &DeployConfig::default());
        assert!(matches!(result, Err(ContextError::MissingDestination)));
        Ok(())
    }

    #[test]
    fn job_id_is_available_when_the_rest_is_malformed() -> anyhow::Result<()> {
        let event = event_from(&json!({"CodePipeline.job": {"id": "job-9"}}))?;
        assert_eq!(extract_job_id(&event)?.as_str(), "job-9");
        assert!(extract_job(&event, &site_config()).is_err());
        Ok(())
    }
}
