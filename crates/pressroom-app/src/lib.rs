#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Pressroom deployment step wiring.
//!
//! Layout: `bootstrap.rs` (dependency wiring from the environment), `fetch.rs` (artifact
//! download and expansion), `generator.rs` (site generator invocation), `publish/`
//! (publisher strategies), `orchestrator.rs` (job state machine), `cli.rs` (command line).

/// Dependency wiring from the environment.
pub mod bootstrap;
/// Command-line surface.
pub mod cli;
pub mod error;
/// Source artifact fetching.
pub mod fetch;
/// External site generator invocation.
pub mod generator;
/// Job state machine.
pub mod orchestrator;
/// Publisher strategies.
pub mod publish;

pub use bootstrap::{AppDependencies, build_reporter};
pub use error::{AppError, AppResult, JobError};
pub use fetch::{ArtifactFetcher, FetchError};
pub use generator::{GenerationError, GeneratorOutput, SiteGenerator};
pub use orchestrator::{DeployOrchestrator, JobOutcome, JobResult, JobStage};
pub use publish::{
    ArchivePublisher, MirrorPublisher, PublishError, PublishReport, PublishSettings, Publisher,
    SyncPublisher, select_publisher,
};
