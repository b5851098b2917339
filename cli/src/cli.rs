//! Command-line definition.

use std::path::PathBuf;

use clap::Parser;

/// Mirror remote directories over rsync/ssh and report the run to Telegram.
#[derive(Parser, Debug)]
#[command(name = "backsync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json", env = "BACKSYNC_CONFIG")]
    pub config: PathBuf,

    /// Send a test Telegram message and exit without syncing
    #[arg(long)]
    pub test_telegram: bool,

    /// Run log file (overrides `log_file` from the configuration)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
