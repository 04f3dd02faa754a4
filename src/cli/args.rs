//! Command line argument parsing for intent-bench using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::config::CONFIG_ENV;

/// intent-bench - benchmark remote intent-classification services
#[derive(Parser, Debug, Clone)]
#[command(name = "intent-bench")]
#[command(about = "Benchmark remote intent-classification services")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct BenchArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Configuration file (JSON)
    #[arg(short, long, env = CONFIG_ENV, value_name = "CONFIG_FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl BenchArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the action named in the configuration
    Run(RunArgs),

    /// Compare backends on every criterion
    Compare(CompareArgs),

    /// Sweep one backend's parameter grid
    Sweep(SweepArgs),

    /// Validate the configuration without calling any backend
    Validate(RunArgs),
}

/// Overrides shared by every command
#[derive(Parser, Debug, Clone, Default)]
pub struct RunArgs {
    /// Root of criteria/, logs/ and results/
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Write the result here instead of the per-mode default
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Predict only the held-out partition of each fold
    #[arg(long)]
    pub held_out: bool,
}

/// Arguments for backend comparison
#[derive(Parser, Debug, Clone)]
pub struct CompareArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Backends to compare (defaults to the configured list)
    #[arg(long, value_delimiter = ',', value_name = "BACKEND")]
    pub apis: Vec<String>,
}

/// Arguments for parameter sweeps
#[derive(Parser, Debug, Clone)]
pub struct SweepArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Backend to sweep (defaults to the configured one)
    #[arg(long, value_name = "BACKEND")]
    pub api: Option<String>,

    /// Reduction mode: all or best (defaults to the configured one)
    #[arg(long, value_name = "MODE")]
    pub reduction_mode: Option<String>,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}
