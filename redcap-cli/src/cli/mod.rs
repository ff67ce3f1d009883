//! Command-line interface orchestration for REDCAP regionalization.
//!
//! The `run` command loads attributes from a Parquet column, contiguity from
//! an edge-list file and an optional control column, then prints one region
//! label per observation.

mod commands;

pub use commands::{
    Cli, CliError, Command, ExecutionSummary, ParquetArgs, RunCommand, RunSource, render_summary,
    run_cli,
};

#[cfg(test)]
mod test_helpers;
