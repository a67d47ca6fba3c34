#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Pipeline-facing edges of the deployment step: the trigger event that starts a job
//! and the status API that receives its terminal result.
//!
//! Layout: `event.rs` (wire shape of the trigger), `model.rs` (typed job),
//! `context.rs` (event → job extraction), `report.rs` (status reporters).

pub mod context;
pub mod error;
pub mod event;
pub mod model;
pub mod report;

pub use context::{extract_job, extract_job_id};
pub use error::{ContextError, PipelineError, PipelineResult};
pub use event::TriggerEvent;
pub use model::{Destination, Job, JobId, ObjectLocation};
pub use report::{FailureDetails, FailureKind, HttpJobReporter, JobReporter, LogJobReporter};
