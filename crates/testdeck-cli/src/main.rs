//! # testdeck
//!
//! Command-line front end for the Testdeck test execution dashboard.
//!
//! ## Usage
//!
//! ```bash
//! # List runnable suites
//! testdeck suites
//!
//! # Simulate two suites side by side
//! testdeck run smoke hotfix
//!
//! # Browse history
//! testdeck results --status failed
//! testdeck show run-001 --expand test-002
//! testdeck timeline --window-minutes 60
//! ```

mod display;
mod results_cli;
mod run_cli;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use display::ColorMode;
use std::path::PathBuf;
use testdeck_core::{Dashboard, DashboardConfig};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Test execution dashboard: run suites and inspect their results.
#[derive(Parser, Debug)]
#[command(name = "testdeck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Dashboard config file (YAML)
    #[arg(short, long, global = true, env = "TESTDECK_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Color output mode
    #[arg(long, value_enum, default_value_t = ColorMode::Auto, global = true)]
    color: ColorMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List runnable suites
    Suites(run_cli::SuitesArgs),

    /// Run suites with live progress
    Run(run_cli::RunArgs),

    /// List past runs
    Results(results_cli::ResultsArgs),

    /// Show charts and test results of one run
    Show(results_cli::ShowArgs),

    /// Passed/failed counts over time
    Timeline(results_cli::TimelineArgs),
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("testdeck=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "testdeck=warn".into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(cli: &Cli) -> Result<DashboardConfig> {
    let mut config = match &cli.config {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DashboardConfig::default(),
    };

    if let Commands::Run(args) = &cli.command
        && let Some(tick_ms) = args.tick_ms
    {
        config.simulator.tick_interval_ms = tick_ms;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);
    cli.color.apply();

    let config = load_config(&cli)?;
    let dashboard = Dashboard::from_config(config).context("Failed to initialize dashboard")?;

    match cli.command {
        Commands::Suites(args) => run_cli::execute_suites(&dashboard, args),
        Commands::Run(args) => run_cli::execute_run(&dashboard, args).await,
        Commands::Results(args) => results_cli::execute_results(&dashboard, args),
        Commands::Show(args) => results_cli::execute_show(&dashboard, args),
        Commands::Timeline(args) => results_cli::execute_timeline(&dashboard, args),
    }
}
