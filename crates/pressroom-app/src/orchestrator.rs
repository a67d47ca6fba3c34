//! # Design
//!
//! - Stages run strictly in order: extract, fetch, generate, publish. The first failure
//!   skips straight to reporting.
//! - Exactly one report per job; it is sent before cleanup, and cleanup always runs.
//! - Cleanup failures are logged and never change the reported result.
//! - Every stage transition is logged with the job span and counted in metrics.

use std::sync::Arc;
use std::time::Instant;

use pressroom_config::DeployConfig;
use pressroom_fsops::JobWorkspace;
use pressroom_pipeline::{
    FailureDetails, FailureKind, Job, JobId, JobReporter, TriggerEvent, extract_job,
    extract_job_id,
};
use pressroom_storage::ObjectStorage;
use pressroom_telemetry::{Metrics, job_span, record_stage};
use tracing::{Instrument, Span, error, info, warn};

use crate::error::{AppError, AppResult, JobError};
use crate::fetch::{ArtifactFetcher, FetchError};
use crate::generator::SiteGenerator;
use crate::publish::{PublishReport, select_publisher};

/// Stages a job moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    /// Turning the trigger event into a job.
    Extracting,
    /// Downloading and expanding the source artifact.
    Fetching,
    /// Running the site generator.
    Generating,
    /// Publishing generated output.
    Publishing,
    /// Reporting the terminal status.
    Reporting,
    /// Removing working directories.
    Cleanup,
    /// Finished.
    Done,
}

impl JobStage {
    /// Stable label used in logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Extracting => "extracting",
            Self::Fetching => "fetching",
            Self::Generating => "generating",
            Self::Publishing => "publishing",
            Self::Reporting => "reporting",
            Self::Cleanup => "cleanup",
            Self::Done => "done",
        }
    }
}

/// Terminal result of a job, as reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobResult {
    /// The site was generated and published.
    Success,
    /// A stage failed.
    Failure {
        /// Reported message.
        message: String,
        /// Reported failure kind.
        kind: FailureKind,
    },
}

impl JobResult {
    /// Whether the job succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// What happened to one job.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// Job identifier.
    pub job_id: JobId,
    /// Reported result.
    pub result: JobResult,
    /// Stages visited, in order.
    pub stages: Vec<JobStage>,
    /// Publisher report, when publishing succeeded.
    pub publish: Option<PublishReport>,
}

struct StageLog<'a> {
    metrics: &'a Metrics,
    span: Span,
    visited: Vec<JobStage>,
}

impl<'a> StageLog<'a> {
    const fn new(metrics: &'a Metrics, span: Span) -> Self {
        Self {
            metrics,
            span,
            visited: Vec::new(),
        }
    }

    fn begin(&mut self, stage: JobStage) {
        self.visited.push(stage);
        record_stage(&self.span, stage.as_str());
        self.metrics.inc_stage(stage.as_str(), "started");
        info!(stage = stage.as_str(), "stage started");
    }

    fn complete<T>(&self, stage: JobStage, result: Result<T, JobError>) -> Result<T, JobError> {
        match &result {
            Ok(_) => self.metrics.inc_stage(stage.as_str(), "completed"),
            Err(err) => {
                self.metrics.inc_stage(stage.as_str(), "failed");
                warn!(
                    stage = stage.as_str(),
                    category = err.category(),
                    error = %err,
                    "stage failed"
                );
            }
        }
        result
    }
}

/// Runs one deployment job end to end.
pub struct DeployOrchestrator {
    config: DeployConfig,
    storage: Arc<dyn ObjectStorage>,
    reporter: Arc<dyn JobReporter>,
    generator: SiteGenerator,
    fetcher: ArtifactFetcher,
    metrics: Metrics,
}

impl DeployOrchestrator {
    /// Orchestrator over injected collaborators.
    #[must_use]
    pub fn new(
        config: DeployConfig,
        storage: Arc<dyn ObjectStorage>,
        reporter: Arc<dyn JobReporter>,
        metrics: Metrics,
    ) -> Self {
        let generator = SiteGenerator::new(config.generator_path.clone());
        let fetcher = ArtifactFetcher::new(Arc::clone(&storage), config.use_source_revision);
        Self {
            config,
            storage,
            reporter,
            generator,
            fetcher,
            metrics,
        }
    }

    /// Run the job described by `event`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Context`] when the event carries no job identifier (nothing can
    /// be reported), and [`AppError::Report`] when the terminal report was rejected.
    /// Working directories are removed in both cases.
    pub async fn run(&self, event: &TriggerEvent) -> AppResult<JobOutcome> {
        let job_id = extract_job_id(event)
            .map_err(|source| AppError::context("job.extract_id", source))?;
        let span = job_span(job_id.as_str());
        self.run_job(job_id, event, span.clone())
            .instrument(span)
            .await
    }

    async fn run_job(
        &self,
        job_id: JobId,
        event: &TriggerEvent,
        span: Span,
    ) -> AppResult<JobOutcome> {
        let started = Instant::now();
        let mut stages = StageLog::new(&self.metrics, span);
        info!("job started");

        let (result, workspace) = self.execute(event, &mut stages).await;

        stages.begin(JobStage::Reporting);
        let (job_result, publish, report) = match result {
            Ok(publish) => {
                let report = self.reporter.report_success(&job_id).await;
                (JobResult::Success, Some(publish), report)
            }
            Err(err) => {
                let details = FailureDetails::job_failed(err.failure_message());
                error!(
                    category = err.category(),
                    error = %err,
                    reason = %details.message,
                    "job failed"
                );
                let report = self.reporter.report_failure(&job_id, &details).await;
                let failure = JobResult::Failure {
                    message: details.message,
                    kind: details.kind,
                };
                (failure, None, report)
            }
        };
        if let Err(err) = &report {
            error!(error = %err, "job status report failed");
        }

        stages.begin(JobStage::Cleanup);
        if let Some(workspace) = workspace {
            for failure in workspace.cleanup() {
                let err = JobError::from(failure);
                warn!(error = %err, detail = %err.failure_message(), "cleanup failed");
            }
        }

        stages.begin(JobStage::Done);
        let outcome_label = if job_result.is_success() {
            "success"
        } else {
            "failure"
        };
        self.metrics.inc_job(outcome_label);
        self.metrics.observe_job_duration(started.elapsed());
        info!(
            outcome = outcome_label,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "job finished"
        );

        report.map_err(|source| AppError::Report {
            job_id: job_id.to_string(),
            source,
        })?;
        Ok(JobOutcome {
            job_id,
            result: job_result,
            stages: stages.visited,
            publish,
        })
    }

    async fn execute(
        &self,
        event: &TriggerEvent,
        stages: &mut StageLog<'_>,
    ) -> (Result<PublishReport, JobError>, Option<JobWorkspace>) {
        stages.begin(JobStage::Extracting);
        let extracted = extract_job(event, &self.config).map_err(JobError::from);
        let job = match stages.complete(JobStage::Extracting, extracted) {
            Ok(job) => job,
            Err(err) => return (Err(err), None),
        };

        let workspace = match JobWorkspace::create(self.config.work_root.as_deref()) {
            Ok(workspace) => workspace,
            Err(source) => {
                stages.begin(JobStage::Fetching);
                let failed = Err(JobError::from(FetchError::Workspace { source }));
                return (stages.complete(JobStage::Fetching, failed), None);
            }
        };

        let result = self.process(&job, &workspace, stages).await;
        (result, Some(workspace))
    }

    async fn process(
        &self,
        job: &Job,
        workspace: &JobWorkspace,
        stages: &mut StageLog<'_>,
    ) -> Result<PublishReport, JobError> {
        stages.begin(JobStage::Fetching);
        let fetched = self
            .fetcher
            .fetch(&job.source, workspace)
            .await
            .map_err(JobError::from);
        stages.complete(JobStage::Fetching, fetched)?;

        stages.begin(JobStage::Generating);
        let generated = self
            .generator
            .run(
                workspace.source_dir(),
                workspace.output_dir(),
                job.generator_parameters.as_deref(),
            )
            .await
            .map_err(JobError::from);
        stages.complete(JobStage::Generating, generated)?;

        stages.begin(JobStage::Publishing);
        let publisher = select_publisher(
            &job.destination,
            &self.config,
            Arc::clone(&self.storage),
            self.metrics.clone(),
        );
        info!(
            strategy = publisher.strategy(),
            bucket = job.destination.bucket(),
            "publishing site"
        );
        let published = publisher
            .publish(workspace.output_dir(), workspace)
            .await
            .map_err(JobError::from);
        stages.complete(JobStage::Publishing, published)
    }
}
