//! High-level client orchestrator: resolve -> spawn flows -> join.
//!
//! One OS thread per target. Flows own their sockets exclusively and
//! share nothing but the formatter, so one slow or dead target never
//! blocks the others.

use crate::{
    cli::ClientArgs,
    error::{EchopingError, Result},
    formatter::{self, Formatter},
    probe,
};
use anyhow::anyhow;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::error;

pub fn run(args: ClientArgs) -> Result<i32> {
    let timeout = Duration::from_millis(args.timeout_ms);

    /* target resolution - any bad target is a usage error before any
     * flow starts */
    let mut addrs: Vec<SocketAddr> = Vec::with_capacity(args.targets.len());
    for target in &args.targets {
        let addr = target
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| EchopingError::Other(anyhow!("cannot resolve target `{target}`")))?;
        if addr.port() == 0 {
            return Err(EchopingError::Other(anyhow!("port cannot be 0")));
        }
        addrs.push(addr);
    }

    let fmt: Arc<dyn Formatter> = Arc::from(formatter::from_mode(args.output_mode));

    /* one flow per target */
    let mut handles = Vec::with_capacity(addrs.len());
    for (i, addr) in addrs.into_iter().enumerate() {
        let fmt = Arc::clone(&fmt);
        let count = args.count;
        let handle = thread::Builder::new()
            .name(format!("probe-{i}"))
            .spawn(move || {
                if let Err(e) = probe::run_flow(addr, count, timeout, fmt.as_ref()) {
                    error!(target_addr = %addr, error = %e, "probe flow failed");
                }
            })?;
        handles.push(handle);
    }

    /* the process exits only after every flow finished */
    for handle in handles {
        if handle.join().is_err() {
            error!("probe flow thread panicked");
        }
    }

    // Flow-level failures were reported as events or logged above;
    // non-zero exit is reserved for usage and setup errors.
    Ok(0)
}
