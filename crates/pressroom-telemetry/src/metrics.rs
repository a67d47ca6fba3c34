//! Job counters kept in a private Prometheus registry.
//!
//! # Design
//! - Callers only see typed `inc_*`/`observe_*` methods, never raw collectors.
//! - A deployment run is short-lived, so the registry is exported as a textfile at exit
//!   instead of being scraped.

use std::convert::TryFrom;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::error::{Result, TelemetryError};

/// Prometheus-backed metrics registry for one process.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    jobs_total: IntCounterVec,
    stage_transitions_total: IntCounterVec,
    files_published_total: IntCounterVec,
    publish_failures_total: IntCounter,
    job_duration_ms: IntGauge,
}

/// Snapshot of selected counters for logging at exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Jobs that reported success.
    pub jobs_succeeded: u64,
    /// Jobs that reported failure.
    pub jobs_failed: u64,
    /// Files uploaded with gzip encoding.
    pub files_gzip: u64,
    /// Files uploaded verbatim.
    pub files_identity: u64,
    /// Individual uploads that failed.
    pub publish_failures: u64,
    /// Wall-clock duration of the most recent job in milliseconds.
    pub job_duration_ms: i64,
}

impl Metrics {
    /// Fresh registry with every Pressroom collector registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let jobs_total = counter_vec(
            &registry,
            "pressroom_jobs_total",
            "Deployment jobs by terminal outcome",
            &["outcome"],
        )?;
        let stage_transitions_total = counter_vec(
            &registry,
            "pressroom_stage_transitions_total",
            "Job stage transitions by stage and status",
            &["stage", "status"],
        )?;
        let files_published_total = counter_vec(
            &registry,
            "pressroom_files_published_total",
            "Files uploaded to the destination by content encoding",
            &["encoding"],
        )?;
        let publish_failures_total = IntCounter::with_opts(Opts::new(
            "pressroom_publish_failures_total",
            "Individual file uploads that failed",
        ))
        .map_err(|source| {
            TelemetryError::prometheus(
                "collector.build",
                Some("pressroom_publish_failures_total"),
                source,
            )
        })?;
        register(
            &registry,
            "pressroom_publish_failures_total",
            publish_failures_total.clone(),
        )?;
        let job_duration_ms = IntGauge::with_opts(Opts::new(
            "pressroom_job_duration_ms",
            "Wall-clock duration of the last job (ms)",
        ))
        .map_err(|source| {
            TelemetryError::prometheus("collector.build", Some("pressroom_job_duration_ms"), source)
        })?;
        register(&registry, "pressroom_job_duration_ms", job_duration_ms.clone())?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                jobs_total,
                stage_transitions_total,
                files_published_total,
                publish_failures_total,
                job_duration_ms,
            }),
        })
    }

    /// Increment the job counter for a terminal outcome (`success`/`failure`).
    pub fn inc_job(&self, outcome: &str) {
        self.inner.jobs_total.with_label_values(&[outcome]).inc();
    }

    /// Increment the stage transition counter.
    pub fn inc_stage(&self, stage: &str, status: &str) {
        self.inner
            .stage_transitions_total
            .with_label_values(&[stage, status])
            .inc();
    }

    /// Count one uploaded file by content encoding (`gzip`/`identity`).
    pub fn inc_file_published(&self, encoding: &str) {
        self.inner
            .files_published_total
            .with_label_values(&[encoding])
            .inc();
    }

    /// Count one failed file upload.
    pub fn inc_publish_failure(&self) {
        self.inner.publish_failures_total.inc();
    }

    /// Record how long the last job took.
    pub fn observe_job_duration(&self, duration: Duration) {
        self.inner
            .job_duration_ms
            .set(Self::duration_to_ms(duration));
    }

    /// Prometheus text exposition of the registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::prometheus("registry.encode", None, source))?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::RenderUtf8 { source })
    }

    /// Write the rendered registry to a textfile-collector file.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails or the file cannot be written.
    pub fn write_textfile(&self, path: &Path) -> Result<()> {
        let rendered = self.render()?;
        std::fs::write(path, rendered).map_err(|source| TelemetryError::Textfile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Take a point-in-time snapshot of the job counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let jobs = &self.inner.jobs_total;
        let files = &self.inner.files_published_total;
        MetricsSnapshot {
            jobs_succeeded: jobs.with_label_values(&["success"]).get(),
            jobs_failed: jobs.with_label_values(&["failure"]).get(),
            files_gzip: files.with_label_values(&["gzip"]).get(),
            files_identity: files.with_label_values(&["identity"]).get(),
            publish_failures: self.inner.publish_failures_total.get(),
            job_duration_ms: self.inner.job_duration_ms.get(),
        }
    }

    /// Milliseconds, saturating at `i64::MAX`.
    pub(crate) fn duration_to_ms(duration: Duration) -> i64 {
        i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
    }
}

fn counter_vec(
    registry: &Registry,
    name: &'static str,
    help: &str,
    labels: &[&str],
) -> Result<IntCounterVec> {
    let counter = IntCounterVec::new(Opts::new(name, help), labels)
        .map_err(|source| TelemetryError::prometheus("collector.build", Some(name), source))?;
    register(registry, name, counter.clone())?;
    Ok(counter)
}

fn register<C>(registry: &Registry, name: &'static str, collector: C) -> Result<()>
where
    C: prometheus::core::Collector + 'static,
{
    registry
        .register(Box::new(collector))
        .map_err(|source| TelemetryError::prometheus("collector.register", Some(name), source))
}
