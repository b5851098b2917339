//! backsync CLI
//!
//! Exit codes: 0 when every directory synced, 2 on a partial success and 1
//! when every directory failed or the service could not start.

mod cli;

use std::path::PathBuf;

use clap::Parser;
use log::{error, info};

use backsync::config::DEFAULT_LOG_FILE;
use backsync::{init_logging, load_config, BackupSync};
use cli::Cli;

fn main() {
    let code = run(Cli::parse());
    std::process::exit(code);
}

/// Everything that owns a resource lives in here so it is dropped, and the
/// log file flushed, before the process exits.
fn run(cli: Cli) -> i32 {
    let config = load_config(&cli.config);

    let log_path = cli
        .log_file
        .clone()
        .or_else(|| config.as_ref().ok().map(|c| c.log_file_path()))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
    let _log_guard = match init_logging(Some(&log_path), cli.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {}", e);
            return 1;
        }
    };

    info!("backsync v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return 1;
        }
    };

    let app = match BackupSync::from_config(config) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize: {}", e);
            return 1;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            return 1;
        }
    };

    if cli.test_telegram {
        return if runtime.block_on(app.send_test_notification()) {
            info!("Test message sent successfully");
            0
        } else {
            1
        };
    }

    let run = runtime.block_on(app.sync());
    let classification = run.summary.classification;
    tracing::debug!(
        classification = %classification,
        directories = run.result.job_results.len(),
        "run complete"
    );
    classification.exit_code()
}
