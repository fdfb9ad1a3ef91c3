//! NetLens - Network traffic report generator
//!
//! A CLI tool that batch-analyzes a line-delimited JSON capture of
//! labeled network connections and produces six reports: console
//! statistics plus one chart file each.
//!
//! Exit codes:
//!   0 - Success (all reports completed; data-starved skips included)
//!   1 - Runtime error (missing, malformed or empty dataset, config
//!       failure) or at least one report failed

mod analysis;
mod cli;
mod config;
mod dataset;
mod models;
mod render;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::Args;
use config::Config;
use dataset::load_dataset;
use models::Dataset;
use render::SvgRenderer;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("NetLens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the analysis
    match run(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .netlens.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".netlens.toml");

    if path.exists() {
        eprintln!("⚠️  .netlens.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .netlens.toml")?;

    println!("✅ Created .netlens.toml with default settings.");
    println!("   Edit it to customize the dataset path and output directory.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete report workflow. Returns the process exit code.
fn run(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let input = config.dataset.input.clone();

    // Step 1: Load the dataset
    println!("📥 Loading dataset: {}", input.display());
    let dataset = load_dataset(&input, !args.quiet)?;
    println!("   Loaded {} records", dataset.len());

    // Handle --dry-run: show the dataset shape and exit
    if args.dry_run {
        return handle_dry_run(&dataset);
    }

    // Step 2: Prepare the output directory
    let out_dir = config.output.dir.clone();
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;
    info!("Writing charts to {}", out_dir.display());

    let renderer = SvgRenderer::new(&out_dir);

    // Step 3: Run the six reports
    let outcome = report::run_all(&dataset, &renderer)?;

    // Print summary
    let duration = start_time.elapsed().as_secs_f64();
    println!("\n📊 Run Summary:");
    println!("   Charts written: {}", outcome.written);
    if outcome.skipped > 0 {
        println!("   Reports skipped (no data): {}", outcome.skipped);
    }
    if outcome.failed > 0 {
        println!("   Reports failed: {}", outcome.failed);
    }
    println!("   Duration: {:.1}s", duration);

    if outcome.failed > 0 {
        eprintln!("\n⛔ {} of 6 reports failed (exit code 1).", outcome.failed);
        return Ok(1);
    }

    println!(
        "\n✅ Analysis complete! Charts saved to: {} ({})",
        out_dir.display(),
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );

    Ok(0)
}

/// Handle --dry-run: print the dataset shape, write nothing.
fn handle_dry_run(dataset: &Dataset) -> Result<i32> {
    println!("\n🔍 Dry run: no charts will be written.\n");

    let summary = analysis::traffic_summary(dataset);
    let protocols = analysis::protocol_counts(dataset, usize::MAX).len();
    let services = analysis::service_counts(dataset, usize::MAX).len();

    println!("   Total connections: {}", summary.total);
    println!(
        "   Normal connections: {} ({:.1}%)",
        summary.normal, summary.perc_normal
    );
    println!(
        "   Attack connections: {} ({:.1}%)",
        summary.attacks, summary.perc_attack
    );
    println!("   Distinct protocols: {}", protocols);
    println!("   Distinct named services: {}", services);

    println!("\n✅ Dry run complete. No files were written.");
    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .netlens.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
