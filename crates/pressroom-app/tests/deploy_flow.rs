//! End-to-end runs of the deployment job against recording fakes and a scripted generator.
#![cfg(unix)]

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use flate2::read::GzDecoder;
use httpmock::prelude::*;
use pressroom_app::{DeployOrchestrator, JobResult, JobStage, build_reporter};
use pressroom_config::{DeployConfig, PublishMode};
use pressroom_pipeline::TriggerEvent;
use pressroom_telemetry::Metrics;
use pressroom_test_support::fixtures::{
    COPYING_GENERATOR, FAILING_GENERATOR, set_user_parameters, trigger_event,
    trigger_event_with_output, write_fake_generator, zip_bytes,
};
use pressroom_test_support::mocks::{RecordingReporter, RecordingStorage, ReportedOutcome};
use tempfile::TempDir;

struct Harness {
    _generator_dir: TempDir,
    work_root: TempDir,
    config: DeployConfig,
    storage: RecordingStorage,
    reporter: RecordingReporter,
    metrics: Metrics,
}

impl Harness {
    fn new(generator_body: &str, storage: RecordingStorage) -> anyhow::Result<Self> {
        let generator_dir = TempDir::new()?;
        let work_root = TempDir::new()?;
        let generator = write_fake_generator(generator_dir.path(), generator_body)?;
        let config = DeployConfig {
            destination_bucket: Some("site-bucket".to_string()),
            generator_path: generator,
            work_root: Some(work_root.path().to_path_buf()),
            ..DeployConfig::default()
        };
        Ok(Self {
            _generator_dir: generator_dir,
            work_root,
            config,
            storage,
            reporter: RecordingReporter::new(),
            metrics: Metrics::new()?,
        })
    }

    fn orchestrator(&self) -> DeployOrchestrator {
        DeployOrchestrator::new(
            self.config.clone(),
            Arc::new(self.storage.clone()),
            Arc::new(self.reporter.clone()),
            self.metrics.clone(),
        )
    }

    fn work_root_entries(&self) -> anyhow::Result<usize> {
        Ok(std::fs::read_dir(self.work_root.path())?.count())
    }
}

fn event(value: &serde_json::Value) -> anyhow::Result<TriggerEvent> {
    Ok(TriggerEvent::from_slice(&serde_json::to_vec(value)?)?)
}

fn seeded_storage(entries: &[(&str, &[u8])]) -> anyhow::Result<RecordingStorage> {
    let storage = RecordingStorage::new();
    storage.insert("artifacts", "pipeline/SourceArti/source.zip", zip_bytes(entries)?);
    Ok(storage)
}

fn source_event(job_id: &str) -> anyhow::Result<TriggerEvent> {
    event(&trigger_event(
        job_id,
        "artifacts",
        "pipeline/SourceArti/source.zip",
    ))
}

fn gunzip(body: &[u8]) -> anyhow::Result<String> {
    let mut decoded = String::new();
    GzDecoder::new(body).read_to_string(&mut decoded)?;
    Ok(decoded)
}

#[tokio::test]
async fn site_bucket_receives_gzipped_html_and_raw_images() -> anyhow::Result<()> {
    let storage = seeded_storage(&[
        ("index.html", b"<h1>Hello</h1>"),
        ("img/logo.png", b"\x89PNG\r\n\x1a\n"),
    ])?;
    let harness = Harness::new(COPYING_GENERATOR, storage)?;

    let outcome = harness.orchestrator().run(&source_event("job-site")?).await?;

    assert_eq!(outcome.result, JobResult::Success);
    assert_eq!(
        harness.reporter.reports(),
        vec![ReportedOutcome::Success {
            job_id: "job-site".to_string()
        }]
    );

    let index = harness
        .storage
        .object("site-bucket", "index.html")
        .ok_or_else(|| anyhow::anyhow!("index.html was not published"))?;
    assert_eq!(index.content_type.as_deref(), Some("text/html"));
    assert_eq!(index.content_encoding.as_deref(), Some("gzip"));
    assert_eq!(index.acl.as_deref(), Some("public-read"));
    assert_eq!(gunzip(&index.body)?, "<h1>Hello</h1>");

    let logo = harness
        .storage
        .object("site-bucket", "img/logo.png")
        .ok_or_else(|| anyhow::anyhow!("img/logo.png was not published"))?;
    assert_eq!(logo.content_type.as_deref(), Some("image/png"));
    assert_eq!(logo.content_encoding, None);
    assert_eq!(&logo.body[..], b"\x89PNG\r\n\x1a\n");

    for key in harness.storage.keys("site-bucket") {
        assert!(!key.starts_with('/'), "key {key} has a leading slash");
        assert!(!key.contains("pressroom-"), "key {key} leaks a scratch prefix");
    }
    assert_eq!(
        outcome.stages,
        vec![
            JobStage::Extracting,
            JobStage::Fetching,
            JobStage::Generating,
            JobStage::Publishing,
            JobStage::Reporting,
            JobStage::Cleanup,
            JobStage::Done,
        ]
    );
    assert_eq!(harness.work_root_entries()?, 0);
    assert_eq!(harness.metrics.snapshot().jobs_succeeded, 1);
    Ok(())
}

#[tokio::test]
async fn generator_failure_skips_publish_and_reports_output() -> anyhow::Result<()> {
    let storage = seeded_storage(&[("index.html", b"<h1>Hello</h1>")])?;
    let harness = Harness::new(FAILING_GENERATOR, storage)?;

    let outcome = harness.orchestrator().run(&source_event("job-broken")?).await?;

    assert!(!outcome.result.is_success());
    assert!(harness.storage.upload_attempts().is_empty());
    let reports = harness.reporter.reports();
    assert_eq!(reports.len(), 1);
    let ReportedOutcome::Failure { job_id, details } = &reports[0] else {
        return Err(anyhow::anyhow!("expected a failure report, got {reports:?}"));
    };
    assert_eq!(job_id, "job-broken");
    assert!(details.message.contains("exited with status 3"));
    assert!(details.message.contains("template error: missing partial"));
    assert!(!outcome.stages.contains(&JobStage::Publishing));
    assert_eq!(harness.work_root_entries()?, 0);
    Ok(())
}

#[tokio::test]
async fn one_failed_upload_out_of_five_fails_the_job() -> anyhow::Result<()> {
    // The generator adds args.txt, making five output files.
    let storage = RecordingStorage::failing_uploads(["css/site.css"]);
    storage.insert(
        "artifacts",
        "pipeline/SourceArti/source.zip",
        zip_bytes(&[
            ("index.html", b"home"),
            ("about.html", b"about"),
            ("css/site.css", b"body{}"),
            ("js/app.js", b"console.log(1)"),
        ])?,
    );
    let harness = Harness::new(COPYING_GENERATOR, storage)?;

    let outcome = harness.orchestrator().run(&source_event("job-partial")?).await?;

    assert_eq!(harness.storage.upload_attempts().len(), 5);
    assert_eq!(
        harness.storage.keys("site-bucket"),
        vec!["about.html", "args.txt", "index.html", "js/app.js"]
    );
    let JobResult::Failure { message, .. } = &outcome.result else {
        return Err(anyhow::anyhow!("expected failure, got {:?}", outcome.result));
    };
    assert!(message.contains("css/site.css"));
    assert!(message.contains("1 of 5"));
    assert_eq!(harness.reporter.reports().len(), 1);
    assert_eq!(harness.work_root_entries()?, 0);
    Ok(())
}

#[tokio::test]
async fn output_artifact_receives_a_single_archive() -> anyhow::Result<()> {
    let storage = seeded_storage(&[("index.html", b"home")])?;
    let harness = Harness::new(COPYING_GENERATOR, storage)?;
    let archive_event = event(&trigger_event_with_output(
        "job-archive",
        ("artifacts", "pipeline/SourceArti/source.zip"),
        ("artifacts", "pipeline/SiteArtifa/site.zip"),
    ))?;

    let outcome = harness.orchestrator().run(&archive_event).await?;

    assert!(outcome.result.is_success());
    assert_eq!(
        outcome.publish.as_ref().map(|report| report.strategy),
        Some("archive")
    );
    let archive = harness
        .storage
        .object("artifacts", "pipeline/SiteArtifa/site.zip")
        .ok_or_else(|| anyhow::anyhow!("archive was not uploaded"))?;
    assert_eq!(archive.content_type.as_deref(), Some("application/zip"));
    assert!(harness.storage.keys("site-bucket").is_empty());
    Ok(())
}

#[tokio::test]
async fn user_parameters_reach_the_generator() -> anyhow::Result<()> {
    let storage = seeded_storage(&[("index.html", b"home")])?;
    let harness = Harness::new(COPYING_GENERATOR, storage)?;
    let mut value = trigger_event("job-params", "artifacts", "pipeline/SourceArti/source.zip");
    set_user_parameters(&mut value, "--minify --baseURL 'https://example.com/'");

    harness.orchestrator().run(&event(&value)?).await?;

    let args = harness
        .storage
        .object("site-bucket", "args.txt")
        .ok_or_else(|| anyhow::anyhow!("args.txt was not published"))?;
    let args = gunzip(&args.body)?;
    let lines: Vec<&str> = args.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("--source="));
    assert!(lines[1].starts_with("--destination="));
    assert_eq!(&lines[2..], ["--minify", "--baseURL", "https://example.com/"]);
    Ok(())
}

#[tokio::test]
async fn mirror_mode_removes_stale_objects() -> anyhow::Result<()> {
    let storage = seeded_storage(&[("index.html", b"home")])?;
    storage.insert("site-bucket", "old/page.html", b"stale".to_vec());
    let mut harness = Harness::new(COPYING_GENERATOR, storage)?;
    harness.config.publish_mode = PublishMode::Mirror;

    let outcome = harness.orchestrator().run(&source_event("job-mirror")?).await?;

    assert!(outcome.result.is_success());
    assert_eq!(
        harness.storage.keys("site-bucket"),
        vec!["args.txt", "index.html"]
    );
    assert_eq!(harness.storage.deletes(), vec!["site-bucket/old/page.html"]);
    Ok(())
}

#[tokio::test]
async fn missing_source_artifact_is_reported_over_http() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let failure = server.mock(|when, then| {
        when.method(POST).path("/jobs/job-http/failure");
        then.status(200);
    });
    let success = server.mock(|when, then| {
        when.method(POST).path("/jobs/job-http/success");
        then.status(200);
    });
    let mut harness = Harness::new(COPYING_GENERATOR, RecordingStorage::new())?;
    harness.config.pipeline_api_url = Some(url::Url::parse(&server.url("/"))?);
    harness.config.pipeline_api_timeout = Duration::from_secs(2);
    let reporter = build_reporter(&harness.config)?;
    let orchestrator = DeployOrchestrator::new(
        harness.config.clone(),
        Arc::new(harness.storage.clone()),
        reporter,
        harness.metrics.clone(),
    );

    let outcome = orchestrator.run(&source_event("job-http")?).await?;

    failure.assert();
    success.assert_calls(0);
    let JobResult::Failure { message, .. } = &outcome.result else {
        return Err(anyhow::anyhow!("expected failure, got {:?}", outcome.result));
    };
    assert!(message.contains("pipeline/SourceArti/source.zip does not exist"));
    assert_eq!(harness.work_root_entries()?, 0);
    Ok(())
}

#[tokio::test]
async fn cleanup_failure_keeps_the_reported_success() -> anyhow::Result<()> {
    let storage = seeded_storage(&[("index.html", b"home")])?;
    // Removing the source directory makes the workspace cleanup fail after the report.
    let generator = format!("{COPYING_GENERATOR}rm -rf \"$src\"\n");
    let harness = Harness::new(&generator, storage)?;

    let outcome = harness.orchestrator().run(&source_event("job-clean")?).await?;

    assert_eq!(outcome.result, JobResult::Success);
    assert_eq!(
        harness.reporter.reports(),
        vec![ReportedOutcome::Success {
            job_id: "job-clean".to_string()
        }]
    );
    assert!(outcome.stages.ends_with(&[JobStage::Cleanup, JobStage::Done]));
    assert_eq!(harness.work_root_entries()?, 0);
    Ok(())
}

#[tokio::test]
async fn mirror_mode_publishes_symlinked_output() -> anyhow::Result<()> {
    let storage = seeded_storage(&[("index.html", b"home")])?;
    storage.insert("site-bucket", "home.html", b"old home".to_vec());
    let generator = format!("{COPYING_GENERATOR}ln -s \"$dst/index.html\" \"$dst/home.html\"\n");
    let mut harness = Harness::new(&generator, storage)?;
    harness.config.publish_mode = PublishMode::Mirror;

    let outcome = harness.orchestrator().run(&source_event("job-linked")?).await?;

    assert!(outcome.result.is_success());
    assert!(harness.storage.deletes().is_empty());
    assert_eq!(
        harness.storage.keys("site-bucket"),
        vec!["args.txt", "home.html", "index.html"]
    );
    let home = harness
        .storage
        .object("site-bucket", "home.html")
        .ok_or_else(|| anyhow::anyhow!("home.html was not published"))?;
    assert_eq!(&home.body[..], b"home");
    assert_eq!(home.content_type.as_deref(), Some("text/html"));
    Ok(())
}
