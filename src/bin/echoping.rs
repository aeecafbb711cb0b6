//! Binary entry point for the **echoping** client.
//!
//! * Parses CLI arguments.
//! * Runs one probing flow per target and waits for all of them.
//!
//! Diagnostics go to stderr via `tracing`; probe events go to stdout
//! through the formatter layer.

use clap::Parser;
use echoping::{cli::ClientArgs, engine, error::Result};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = ClientArgs::parse();
    let exit_code = engine::run(args)?;
    Ok(if exit_code == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
