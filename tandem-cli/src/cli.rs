//! ABOUTME: CLI argument parsing for the `coord` binary (spec §6 CLI surface)
//! ABOUTME: Thin host convenience — the core never depends on this crate

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "coord", about = "Run Tandem workflow definitions", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a workflow definition file and print the result as JSON.
    Run {
        /// Path to a workflow definition JSON file (§6 wire shape).
        workflow: PathBuf,

        /// Overall workflow deadline in milliseconds, overriding the file's `workflow_timeout_ms`.
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}
