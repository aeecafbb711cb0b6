//! Argument parsing layer (clap).

use crate::wire;
use clap::{Parser, ValueEnum};
use std::net::{IpAddr, Ipv4Addr};

/// Client arguments: a list of targets plus the probing knobs.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct ClientArgs {
    /// Targets in the form `<host:port>` (one probing flow each)
    #[arg(required = true)]
    pub targets: Vec<String>,

    /// Number of attempts per target, 0 = probe forever (`-n`)
    #[arg(short = 'n', long, default_value_t = 0)]
    pub count: u32,

    /// Timeout per attempt in milliseconds (`-t`)
    #[arg(
        short = 't',
        long,
        default_value_t = wire::DEFAULT_TIMEOUT_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_ms: u64,

    /// Output format (`-o`)
    #[arg(
        short = 'o',
        long,
        value_enum,
        default_value_t = OutputMode::Normal,
        help = "normal | json"
    )]
    pub output_mode: OutputMode,
}

/// Supported output modes.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputMode {
    Normal,
    Json,
}

/// Server arguments: the listen port is required, everything else has
/// a sensible default.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct ServerArgs {
    /// TCP port to listen on
    pub port: u16,

    /// Address to bind (`-l`)
    #[arg(short = 'l', long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub listen: IpAddr,
}
