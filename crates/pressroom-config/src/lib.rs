#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Environment-backed configuration for the Pressroom deployment step.
//!
//! Layout: `defaults.rs` (variable names and fallback values), `model.rs` (typed
//! settings), `loader.rs` (environment parsing and validation).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;

pub use error::{ConfigError, ConfigResult};
pub use model::{DeployConfig, LogSettings, PublishMode};
