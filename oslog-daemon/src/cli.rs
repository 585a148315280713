//! CLI argument definitions for oslog-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/oslog-ingest/oslog.toml";

/// System log stream ingester.
///
/// Runs the platform log streaming command, splits its output into
/// individual records, and forwards them to the configured sink.
#[derive(Parser, Debug)]
#[command(name = "oslog-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to oslog.toml configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}
