//! CLI commands for the suite catalog and simulated runs.
//!
//! - `suites`: List runnable suites
//! - `run`: Run one or more suites with live progress

use crate::display::{OutputFormat, priority_label, truncate};
use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::{HashMap, HashSet};
use testdeck_core::{Dashboard, ExecutionEvent, SimulatorError};
use tokio::sync::broadcast::error::RecvError;

/// Arguments for the `suites` command.
#[derive(Parser, Debug)]
pub struct SuitesArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Suite IDs to run concurrently (see `testdeck suites`)
    #[arg(required = true)]
    pub suites: Vec<String>,

    /// Milliseconds between progress ticks (overrides config)
    #[arg(long)]
    pub tick_ms: Option<u64>,

    /// Output format: progress bars, or one JSON event per line
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

pub fn execute_suites(dashboard: &Dashboard, args: SuitesArgs) -> Result<()> {
    let suites: Vec<_> = dashboard.catalog().iter().collect();

    match args.format {
        OutputFormat::Table => {
            println!(
                "{:<13} {:<20} {:<8} {:>6} {:<9} {:<30}",
                "ID", "Name", "Priority", "Tests", "Estimate", "Tags"
            );
            println!("{}", "-".repeat(90));
            for suite in &suites {
                println!(
                    "{:<13} {:<20} {:<8} {:>6} {:<9} {:<30}",
                    suite.id,
                    truncate(&suite.name, 20),
                    priority_label(suite.priority),
                    suite.test_count,
                    suite.estimated_duration,
                    truncate(&suite.tags.join(", "), 30)
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&suites)?);
        }
    }

    Ok(())
}

pub async fn execute_run(dashboard: &Dashboard, args: RunArgs) -> Result<()> {
    let mut requested: Vec<String> = Vec::new();
    for suite_id in args.suites {
        if !dashboard.catalog().contains(&suite_id) {
            let known: Vec<&str> = dashboard.catalog().iter().map(|s| s.id.as_str()).collect();
            bail!("Unknown suite: {} (available: {})", suite_id, known.join(", "));
        }
        if !requested.contains(&suite_id) {
            requested.push(suite_id);
        }
    }

    let simulator = dashboard.simulator();
    let mut events = simulator.subscribe();

    let mut display = RunDisplay::new(dashboard, &requested, args.format)?;
    let mut pending: HashSet<String> = HashSet::new();
    for suite_id in &requested {
        match simulator.start(suite_id).await {
            Ok(_) => {
                pending.insert(suite_id.clone());
            }
            Err(SimulatorError::AlreadyRunning(id)) => {
                tracing::warn!("{} is already running; skipping", id);
            }
            Err(e) => return Err(e).context("Failed to start suite"),
        }
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while !pending.is_empty() {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if let ExecutionEvent::Completed { suite_id, .. } = &event {
                        pending.remove(suite_id);
                    }
                    display.show(&event)?;
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Progress display fell behind by {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut ctrl_c => {
                let stopped = simulator.stop_all().await;
                while let Ok(event) = events.try_recv() {
                    display.show(&event)?;
                }
                if args.format == OutputFormat::Table {
                    eprintln!("{} stopped {}", "Interrupted:".yellow(), stopped.join(", "));
                }
                break;
            }
        }
    }

    Ok(())
}

/// Renders run events as progress bars or JSON lines.
enum RunDisplay {
    Bars {
        bars: HashMap<String, ProgressBar>,
        _multi: MultiProgress,
    },
    Json,
}

impl RunDisplay {
    fn new(dashboard: &Dashboard, suite_ids: &[String], format: OutputFormat) -> Result<Self> {
        if format == OutputFormat::Json {
            return Ok(RunDisplay::Json);
        }

        let style = ProgressStyle::default_bar()
            .template("{prefix:<20} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("=> ");

        let multi = MultiProgress::new();
        let mut bars = HashMap::new();
        for suite_id in suite_ids {
            let name = dashboard
                .catalog()
                .get(suite_id)
                .map_or_else(|| suite_id.clone(), |s| s.name.clone());
            let bar = multi.add(ProgressBar::new(100));
            bar.set_style(style.clone());
            bar.set_prefix(name);
            bars.insert(suite_id.clone(), bar);
        }

        Ok(RunDisplay::Bars {
            bars,
            _multi: multi,
        })
    }

    fn show(&mut self, event: &ExecutionEvent) -> Result<()> {
        match self {
            RunDisplay::Json => {
                println!("{}", serde_json::to_string(event)?);
            }
            RunDisplay::Bars { bars, .. } => {
                let Some(bar) = bars.get(event.suite_id()) else {
                    return Ok(());
                };
                match event {
                    ExecutionEvent::Started { suite_name, .. } => {
                        bar.set_message(format!("Running {}...", suite_name));
                    }
                    ExecutionEvent::Progress { progress, .. } => {
                        bar.set_position(progress.round() as u64);
                    }
                    ExecutionEvent::Completed { suite_name, .. } => {
                        bar.finish_with_message(format!(
                            "{} {} finished successfully!",
                            "✓".green(),
                            suite_name
                        ));
                    }
                    ExecutionEvent::Cancelled { .. } => {
                        bar.abandon_with_message("cancelled".yellow().to_string());
                    }
                }
            }
        }
        Ok(())
    }
}
