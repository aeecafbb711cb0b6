//! Pluggable output layer.

use crate::{cli::OutputMode, probe::ProbeEvent};
use serde_json::to_string;

/// Print behaviour contract. Flows on different threads share one
/// formatter, so implementations must be thread-safe; `println!` locks
/// stdout per line, which keeps events whole.
pub trait Formatter: Send + Sync {
    fn event(&self, ev: &ProbeEvent);
}

/* ---------- Normal text ---------- */

pub struct Normal;

impl Formatter for Normal {
    fn event(&self, ev: &ProbeEvent) {
        println!("{}", line(ev));
    }
}

/// Render one event as the plain-text line.
fn line(ev: &ProbeEvent) -> String {
    match ev.rtt_ms {
        Some(rtt) => format!("recv from {}, RTT = {} msec", ev.addr, rtt),
        None => format!("timeout when connect to {}", ev.addr),
    }
}

/* ---------- JSON ---------- */

pub struct Json;

impl Formatter for Json {
    fn event(&self, ev: &ProbeEvent) {
        println!("{}", to_string(ev).unwrap())
    }
}

/* ---------- Factory ---------- */

pub fn from_mode(mode: OutputMode) -> Box<dyn Formatter> {
    match mode {
        OutputMode::Normal => Box::new(Normal),
        OutputMode::Json => Box::new(Json),
    }
}
