//! Job-scoped tracing span.
//!
//! # Design
//! - Every log line emitted while a job runs carries its identifier and the build SHA.
//! - The span is attached with `Instrument` rather than entered, so it survives `.await` points.

use tracing::Span;

use crate::init::build_sha;

/// Build the span that wraps one job execution.
#[must_use]
pub fn job_span(job_id: &str) -> Span {
    tracing::info_span!(
        "job",
        job_id = %job_id,
        build_sha = %build_sha(),
        stage = tracing::field::Empty
    )
}

/// Record the stage currently executing on the given job span.
pub fn record_stage(span: &Span, stage: &str) {
    span.record("stage", tracing::field::display(stage));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_span_accepts_stage_updates_without_subscriber() {
        let span = job_span("job-1");
        record_stage(&span, "fetching");
        record_stage(&span, "publishing");
    }
}
