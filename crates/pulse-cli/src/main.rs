mod db;
mod report;
mod responder;
mod run;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::db::DbCommands;
use crate::run::EXIT_FAILURE;

#[derive(Debug, Parser)]
#[command(name = "pulse-cli")]
#[command(about = "Records the online member count of a community group")]
struct Cli {
    /// Path to the JSON job config (url, cookies, `database_url`, `error_webhook`)
    #[arg(
        long,
        global = true,
        env = "PULSE_CONFIG_PATH",
        default_value = pulse_core::DEFAULT_CONFIG_PATH
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Take one measurement and store it (default when no command is given)
    Run,
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Show recent measurements and overall statistics
    Report {
        /// Number of recent measurements to list
        #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(i64).range(1..))]
        limit: i64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let Cli {
        config: config_path,
        command,
    } = Cli::parse();

    match command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let loaded = pulse_core::load_app_config(&config_path);
            let Some(config) = load_or_report(loaded, &config_path) else {
                return ExitCode::from(EXIT_FAILURE);
            };
            init_tracing(&config.log_level);
            tracing::debug!(?config, "configuration loaded");
            ExitCode::from(run::run_job(&config).await.exit_code())
        }
        Commands::Db { command } => {
            let loaded = pulse_core::load_store_config(&config_path);
            let Some(config) = load_or_report(loaded, &config_path) else {
                return ExitCode::from(EXIT_FAILURE);
            };
            init_tracing(&config.log_level);
            finish(db::run_db_command(&config, command).await)
        }
        Commands::Report { limit } => {
            let loaded = pulse_core::load_store_config(&config_path);
            let Some(config) = load_or_report(loaded, &config_path) else {
                return ExitCode::from(EXIT_FAILURE);
            };
            init_tracing(&config.log_level);
            finish(report::run_report(&config, limit).await)
        }
    }
}

/// Config errors are logged before the configured log level is known.
fn load_or_report<T>(result: Result<T, pulse_core::ConfigError>, path: &Path) -> Option<T> {
    match result {
        Ok(config) => Some(config),
        Err(e) => {
            init_tracing("info");
            tracing::error!(error = %e, path = %path.display(), "invalid configuration");
            None
        }
    }
}

fn init_tracing(default_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn finish(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "command failed");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
