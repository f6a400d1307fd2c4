//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

pub fn json_mode() -> bool {
    JSON_MODE.get().copied().unwrap_or(false)
}

#[derive(Parser, Debug)]
#[command(name = "lumen", version, about = "Lighting gateway poller")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/lumen.toml")]
    pub config: PathBuf,

    /// Log and print results as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll the gateway until Ctrl-C or escalation
    Run {
        /// Stop after this many poll cycles
        #[arg(long, value_name = "N")]
        max_ticks: Option<u64>,
        /// Override poll.interval_ms from the config
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,
    },
    /// Recompute the baseline table from recent history once
    Rebuild,
    /// Print the stored baseline table
    Baselines,
    /// Check the config and enumerate the gateway once, without persisting anything
    SelfCheck,
}
