//! ABOUTME: Entry point for the `coord` binary
//! ABOUTME: Professional CLI with tracing to stderr, JSON results to stdout

use anyhow::Result;
use clap::Parser;
use tandem_cli::cli::{Cli, Command};
use tandem_cli::commands::run;

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();

    let cli = Cli::parse();
    let exit_code = match cli.command {
        Command::Run { workflow, timeout_ms } => run::run(&workflow, timeout_ms).await?,
    };

    std::process::exit(exit_code);
}

/// Tracing goes to stderr so stdout stays reserved for the `WorkflowResult` JSON
/// (§6: "No `println!` anywhere outside the CLI's result printer").
fn setup_tracing() {
    use std::io;
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
