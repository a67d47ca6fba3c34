#![forbid(unsafe_code)]
#![deny(unused_must_use, missing_docs)]

//! Binary entrypoint for the Pressroom deployment step.

use std::process;

use clap::Parser;
use pressroom_app::cli::{Cli, execute};
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let exit_code = match execute(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!(error = %err, detail = ?err, "pressroom could not complete");
            eprintln!("error: {err}");
            err.exit_code()
        }
    };
    if exit_code != 0 {
        process::exit(exit_code);
    }
}
