//! trustcheck - main entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use kusto_trusted_endpoints::cli::{Cli, run_command};

fn main() -> anyhow::Result<ExitCode> {
    // Load .env before parsing so it behaves like the process environment
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let all_allowed = run_command(cli.command, &mut std::io::stdout().lock())?;
    Ok(if all_allowed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
