//! CLI type definitions
//!
//! Clap structures for the `ppm-sentinel` binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cli::commands::config::ConfigArgs;
use crate::cli::commands::parse::ParseArgs;
use crate::cli::commands::simulate::SimulateArgs;

/// Command-line entry point.
#[derive(Parser, Debug)]
#[command(name = "ppm-sentinel")]
#[command(about = "PPM Sentinel - periodic status checks and cluster recovery", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .ppm-sentinel/config.yaml)
    #[arg(short, long, global = true, env = "PPM_SENTINEL_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show or validate the effective configuration
    Config(ConfigArgs),

    /// Run the reply matcher over a captured bot message
    Parse(ParseArgs),

    /// Drive one check cycle against an in-memory host
    Simulate(SimulateArgs),
}
