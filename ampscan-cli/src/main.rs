use clap::Parser;
use colored::*;
use std::process;
use tracing_subscriber::EnvFilter;

mod cli;

use crate::cli::{Cli, Commands};
use ampscan_core::AmpscanError;

fn main() {
    // AMPSCAN_LOG takes a tracing filter directive, e.g. "ampscan_tools=debug"
    let log_level = std::env::var("AMPSCAN_LOG").unwrap_or_else(|_| "warn".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(exit_code(&e));
    }
}

/// Distinct exit codes per failure class so scripts can react
fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<AmpscanError>().map(AmpscanError::root_cause) {
        Some(AmpscanError::Configuration(_)) | Some(AmpscanError::InvalidInput(_)) => 2,
        Some(AmpscanError::Io(_)) => 3,
        Some(AmpscanError::MalformedInput { .. }) => 4,
        Some(AmpscanError::ScorerUnavailable(_)) => 5,
        Some(AmpscanError::SearchUnavailable(_)) => 6,
        _ => 1,
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let num_threads = if cli.threads == 0 {
        num_cpus::get()
    } else {
        cli.threads
    };

    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .map_err(|e| anyhow::anyhow!("failed to initialize thread pool: {}", e))?;

    if cli.verbose > 0 {
        eprintln!("Using {} threads", num_threads);
    }

    match cli.command {
        Commands::Annotate(args) => crate::cli::commands::annotate::run(args),
        Commands::Config(args) => crate::cli::commands::config::run(args),
    }
}
