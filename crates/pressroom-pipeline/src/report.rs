//! Terminal status reporting to the pipeline orchestrator.
//!
//! # Design
//! - Exactly one of `report_success`/`report_failure` is called per job; enforcing that is
//!   the orchestrator's job, not the reporter's.
//! - Reporters are injected, so tests substitute a recording fake.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use tracing::{error, info};

use crate::error::{PipelineError, PipelineResult};
use crate::model::JobId;

/// Longest failure message the orchestrator accepts; longer messages are truncated.
pub const MAX_FAILURE_MESSAGE_CHARS: usize = 5_000;

const ELISION: &str = "\n[...]\n";

/// Category attached to a failure report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    /// Generic job failure.
    JobFailed,
}

impl FailureKind {
    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JobFailed => "JobFailed",
        }
    }
}

/// Human-readable failure description sent to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureDetails {
    /// Failure message, already truncated to [`MAX_FAILURE_MESSAGE_CHARS`].
    pub message: String,
    /// Failure category.
    #[serde(rename = "type")]
    pub kind: FailureKind,
}

impl FailureDetails {
    /// Build a generic job failure from a message.
    ///
    /// Over-long messages keep their first line and as much of the end as fits, since
    /// generator diagnostics usually come last.
    #[must_use]
    pub fn job_failed(message: impl Into<String>) -> Self {
        Self {
            message: elide_middle(message.into()),
            kind: FailureKind::JobFailed,
        }
    }
}

fn elide_middle(message: String) -> String {
    let total = message.chars().count();
    if total <= MAX_FAILURE_MESSAGE_CHARS {
        return message;
    }
    let head_len = message
        .lines()
        .next()
        .map_or(0, |line| line.chars().count())
        .min(MAX_FAILURE_MESSAGE_CHARS / 4);
    let tail_len = MAX_FAILURE_MESSAGE_CHARS - head_len - ELISION.chars().count();
    let head: String = message.chars().take(head_len).collect();
    let tail: String = message.chars().skip(total - tail_len).collect();
    format!("{head}{ELISION}{tail}")
}

/// Receives the terminal status of a job.
#[async_trait]
pub trait JobReporter: Send + Sync {
    /// Report that the job completed successfully.
    async fn report_success(&self, job_id: &JobId) -> PipelineResult<()>;
    /// Report that the job failed.
    async fn report_failure(&self, job_id: &JobId, details: &FailureDetails)
    -> PipelineResult<()>;
}

/// Reporter that posts job outcomes to an HTTP status API.
#[derive(Clone)]
pub struct HttpJobReporter {
    client: Client,
    base: Url,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureBody<'a> {
    failure_details: &'a FailureDetails,
}

impl HttpJobReporter {
    /// Build a reporter for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry path segments or the HTTP client
    /// cannot be constructed.
    pub fn new(base: Url, timeout: Duration) -> PipelineResult<Self> {
        if base.cannot_be_a_base() {
            return Err(PipelineError::InvalidBaseUrl {
                url: base.to_string(),
            });
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| PipelineError::http("client.build", base.to_string(), err))?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, job_id: &JobId, outcome: &str) -> PipelineResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| PipelineError::InvalidBaseUrl {
                url: self.base.to_string(),
            })?
            .pop_if_empty()
            .extend(["jobs", job_id.as_str(), outcome]);
        Ok(url)
    }

    async fn post<B: Serialize + Sync>(
        &self,
        operation: &'static str,
        url: Url,
        body: &B,
    ) -> PipelineResult<()> {
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|err| PipelineError::http(operation, url.to_string(), err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::HttpStatus {
                operation,
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl JobReporter for HttpJobReporter {
    async fn report_success(&self, job_id: &JobId) -> PipelineResult<()> {
        let url = self.endpoint(job_id, "success")?;
        self.post("report_success", url, &serde_json::json!({}))
            .await
    }

    async fn report_failure(
        &self,
        job_id: &JobId,
        details: &FailureDetails,
    ) -> PipelineResult<()> {
        let url = self.endpoint(job_id, "failure")?;
        let body = FailureBody {
            failure_details: details,
        };
        self.post("report_failure", url, &body).await
    }
}

/// Reporter used when no status API is configured; outcomes only reach the logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogJobReporter;

#[async_trait]
impl JobReporter for LogJobReporter {
    async fn report_success(&self, job_id: &JobId) -> PipelineResult<()> {
        info!(job_id = %job_id, "job succeeded");
        Ok(())
    }

    async fn report_failure(
        &self,
        job_id: &JobId,
        details: &FailureDetails,
    ) -> PipelineResult<()> {
        error!(
            job_id = %job_id,
            kind = details.kind.as_str(),
            message = %details.message,
            "job failed"
        );
        Ok(())
    }
}
