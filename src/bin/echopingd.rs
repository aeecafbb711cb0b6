//! Binary entry point for the **echopingd** echo service.
//!
//! Binds the listener, then hands the thread to the control loop for
//! good. Setup failures (bind/listen) exit non-zero; the loop itself
//! only ends on a fatal I/O error.

use clap::Parser;
use echoping::{cli::ServerArgs, error::Result, server::EchoServer};
use std::net::SocketAddr;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = ServerArgs::parse();
    let addr = SocketAddr::new(args.listen, args.port);

    let server = EchoServer::bind(addr)?;
    info!(addr = %server.local_addr()?, "echo service listening");

    server.run()?;
    Ok(ExitCode::SUCCESS)
}
