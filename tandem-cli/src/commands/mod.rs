//! ABOUTME: Dispatch from parsed CLI subcommands to their implementations

pub mod run;
