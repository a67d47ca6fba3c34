use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use pressroom_config::DeployConfig;
use pressroom_pipeline::{TriggerEvent, extract_job};
use pressroom_telemetry::{LoggingConfig, init_logging};
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use crate::bootstrap::{AppDependencies, logging_config};
use crate::error::{AppError, AppResult};

/// Exit code for a job that ran and succeeded.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for a job that ran and was reported as failed.
pub const EXIT_JOB_FAILED: i32 = 1;

/// Pipeline deployment step for static sites.
#[derive(Debug, Parser)]
#[command(
    name = "pressroom",
    version,
    about = "Build a static site from a pipeline artifact and publish it"
)]
pub struct Cli {
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the deployment job described by a trigger event.
    Run(RunArgs),
    /// Parse a trigger event and print the resolved job as JSON.
    ValidateEvent(EventArgs),
}

/// Trigger event input.
#[derive(Debug, Clone, Args)]
pub struct EventArgs {
    /// Path to the trigger event JSON, or `-` for stdin.
    #[arg(long, env = "PRESSROOM_EVENT", default_value = "-")]
    pub event: PathBuf,
}

/// Arguments for `run`.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Trigger event input.
    #[command(flatten)]
    pub input: EventArgs,
    /// Write Prometheus text metrics here when the job ends.
    #[arg(long, env = "PRESSROOM_METRICS_FILE")]
    pub metrics_file: Option<PathBuf>,
}

/// Execute a parsed command line, returning the process exit code.
///
/// # Errors
///
/// Returns an error when configuration, the event, or the status report cannot be
/// processed.
pub async fn execute(cli: Cli) -> AppResult<i32> {
    let config = match DeployConfig::from_env() {
        Ok(config) => config,
        Err(source) => {
            if let Err(err) = init_logging(&LoggingConfig::default()) {
                eprintln!("pressroom: logging unavailable: {err}");
            }
            return Err(AppError::config("config.from_env", source));
        }
    };
    init_logging(&logging_config(&config))
        .map_err(|source| AppError::telemetry("telemetry.init", source))?;

    match cli.command {
        Command::Run(args) => run(config, &args).await,
        Command::ValidateEvent(args) => {
            let event = read_event(&args.event).await?;
            println!("{}", validate_event(&config, &event)?);
            Ok(EXIT_SUCCESS)
        }
    }
}

async fn run(config: DeployConfig, args: &RunArgs) -> AppResult<i32> {
    let event = read_event(&args.input.event).await?;
    let dependencies = AppDependencies::from_config(config)?;
    let metrics = dependencies.metrics().clone();
    let orchestrator = dependencies.into_orchestrator();

    let result = orchestrator.run(&event).await;

    if let Some(path) = &args.metrics_file
        && let Err(err) = metrics.write_textfile(path)
    {
        warn!(error = %err, path = %path.display(), "metrics file could not be written");
    }

    let outcome = result?;
    if outcome.result.is_success() {
        info!(job_id = %outcome.job_id, "deployment succeeded");
        Ok(EXIT_SUCCESS)
    } else {
        info!(job_id = %outcome.job_id, "deployment failed");
        Ok(EXIT_JOB_FAILED)
    }
}

/// Resolve `event` into a job and render it as pretty JSON.
///
/// # Errors
///
/// Returns an error when the event does not describe a complete job.
pub fn validate_event(config: &DeployConfig, event: &TriggerEvent) -> AppResult<String> {
    let job =
        extract_job(event, config).map_err(|source| AppError::context("job.extract", source))?;
    serde_json::to_string_pretty(&job).map_err(|source| AppError::Json {
        operation: "job.render",
        source,
    })
}

/// Read and decode a trigger event from `path`, or stdin when `path` is `-`.
///
/// # Errors
///
/// Returns an error when the input cannot be read or is not a trigger event.
pub async fn read_event(path: &Path) -> AppResult<TriggerEvent> {
    let payload = if path == Path::new("-") {
        let mut buffer = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut buffer)
            .await
            .map_err(|source| AppError::io("event.read_stdin", None, source))?;
        buffer
    } else {
        tokio::fs::read(path).await.map_err(|source| {
            AppError::io("event.read_file", Some(path.to_path_buf()), source)
        })?
    };
    TriggerEvent::from_slice(&payload).map_err(|source| AppError::context("event.decode", source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pressroom_test_support::fixtures::trigger_event;
    use tempfile::TempDir;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_accepts_event_and_metrics_paths() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "pressroom",
            "run",
            "--event",
            "/tmp/event.json",
            "--metrics-file",
            "/tmp/pressroom.prom",
        ])?;
        let Command::Run(args) = cli.command else {
            return Err(anyhow::anyhow!("expected run command"));
        };
        assert_eq!(args.input.event, PathBuf::from("/tmp/event.json"));
        assert_eq!(args.metrics_file, Some(PathBuf::from("/tmp/pressroom.prom")));
        Ok(())
    }

    #[tokio::test]
    async fn read_event_from_file_and_validate() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("event.json");
        std::fs::write(
            &path,
            serde_json::to_vec(&trigger_event("job-3", "artifacts", "src.zip"))?,
        )?;
        let config = DeployConfig {
            destination_bucket: Some("site-bucket".to_string()),
            ..DeployConfig::default()
        };

        let event = read_event(&path).await?;
        let rendered = validate_event(&config, &event)?;
        let job: serde_json::Value = serde_json::from_str(&rendered)?;

        assert_eq!(job["id"], "job-3");
        assert_eq!(job["source"]["bucket"], "artifacts");
        assert_eq!(job["destination"]["bucket"], "site-bucket");
        Ok(())
    }

    #[tokio::test]
    async fn malformed_event_is_a_processing_error() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let path = temp.path().join("event.json");
        std::fs::write(&path, b"{not json")?;

        let err = read_event(&path)
            .await
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected decode failure"))?;

        assert!(matches!(err, AppError::Context { .. }));
        assert_eq!(err.exit_code(), 2);

        let missing = read_event(&temp.path().join("absent.json")).await.err();
        assert!(matches!(missing, Some(AppError::Io { .. })));
        Ok(())
    }
}
