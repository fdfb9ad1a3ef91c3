//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// NetLens - Network traffic report generator
///
/// Batch-analyzes a line-delimited JSON capture of labeled network
/// connections and produces six reports: console statistics plus one
/// chart file each.
///
/// Examples:
///   netlens --input teste.json
///   netlens --input capture.jsonl --out-dir reports
///   netlens --input capture.jsonl --dry-run
///   netlens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to the dataset file (one JSON object per line)
    ///
    /// Can also be set via NETLENS_INPUT env var or .netlens.toml config.
    /// Falls back to "teste.json" in the current directory.
    #[arg(short, long, value_name = "FILE", env = "NETLENS_INPUT")]
    pub input: Option<PathBuf>,

    /// Directory the chart files are written into
    ///
    /// Created if it does not exist. Can also be set via NETLENS_OUT_DIR
    /// env var or .netlens.toml config. Defaults to "reports".
    #[arg(short, long = "out-dir", value_name = "DIR", env = "NETLENS_OUT_DIR")]
    pub out_dir: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .netlens.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: load and validate the dataset without writing any charts
    ///
    /// Shows the dataset shape and exits.
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .netlens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // A missing file is diagnosed by the loader; only a directory is
        // wrong enough to refuse up front.
        if let Some(ref input) = self.input {
            if input.is_dir() {
                return Err(format!("Input path is a directory: {}", input.display()));
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
