//! CLI commands for browsing execution history.
//!
//! - `results`: List runs, filtered by search text, status and author
//! - `show`: Charts and per-test results of a single run
//! - `timeline`: Passed/failed counts per time window

use crate::display::{OutputFormat, status_label, truncate};
use anyhow::{Result, bail};
use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use testdeck_core::aggregate::{WindowBucket, distribution_over_windows};
use testdeck_core::filter::filter_records;
use testdeck_core::view::{DetailsView, DetailsViewState, Overview, ResultsViewState};
use testdeck_core::{Dashboard, ExecutionRecord};

/// Arguments for the `results` command.
#[derive(Parser, Debug)]
pub struct ResultsArgs {
    /// Case-insensitive search over suite name and author
    #[arg(short, long)]
    pub search: Option<String>,

    /// Status filter: passed, failed, skipped or all
    #[arg(long)]
    pub status: Option<String>,

    /// Exact author filter, or all
    #[arg(long)]
    pub author: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl ResultsArgs {
    fn view_state(&self) -> ResultsViewState {
        ResultsViewState {
            search: self.search.clone(),
            status: self.status.clone(),
            author: self.author.clone(),
            selected_record: None,
        }
    }
}

/// Arguments for the `show` command.
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Record ID (defaults to the first run in the history)
    pub id: Option<String>,

    /// Case-insensitive search over test name and category
    #[arg(short, long)]
    pub search: Option<String>,

    /// Test status filter: passed, failed, skipped or all
    #[arg(long)]
    pub status: Option<String>,

    /// Exact test category filter, or all
    #[arg(long)]
    pub category: Option<String>,

    /// Test ID whose error and stack trace to print
    #[arg(long)]
    pub expand: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

/// Arguments for the `timeline` command.
#[derive(Parser, Debug)]
pub struct TimelineArgs {
    /// Window size in minutes (overrides config)
    #[arg(long)]
    pub window_minutes: Option<u32>,

    /// Status filter applied to runs before bucketing
    #[arg(long)]
    pub status: Option<String>,

    /// Author filter applied to runs before bucketing
    #[arg(long)]
    pub author: Option<String>,

    /// Also list windows without runs
    #[arg(long)]
    pub include_empty: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

pub fn execute_results(dashboard: &Dashboard, args: ResultsArgs) -> Result<()> {
    let view = dashboard.results_view(&args.view_state());

    match args.format {
        OutputFormat::Table => {
            if view.executions.is_empty() {
                println!("No runs found");
                return Ok(());
            }
            println!(
                "{:<10} {:<20} {:<8} {:<16} {:<17} {:<10}",
                "ID", "Suite", "Status", "Author", "Started", "Duration"
            );
            println!("{}", "-".repeat(86));
            for record in &view.executions {
                println!(
                    "{:<10} {:<20} {:<8} {:<16} {:<17} {:<10}",
                    record.id,
                    truncate(&record.suite_name, 20),
                    status_label(record.status),
                    truncate(&record.author, 16),
                    record.timestamp.format("%Y-%m-%d %H:%M"),
                    record.duration
                );
            }
            println!();
            println!(
                "{} of {} runs. Authors: {}",
                view.executions.len(),
                dashboard.records().len(),
                view.authors.join(", ")
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&view.executions)?);
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct ShowOutput<'a> {
    record: &'a ExecutionRecord,
    overview: &'a Overview,
    details: &'a DetailsView,
}

pub fn execute_show(dashboard: &Dashboard, args: ShowArgs) -> Result<()> {
    let Some(record) = dashboard.select_record(args.id.as_deref()) else {
        bail!("No runs in history");
    };
    if let Some(id) = &args.id
        && record.id != *id
    {
        bail!("Run not found: {}", id);
    }

    let results = dashboard.results_view(&ResultsViewState::default().select(record.id.clone()));
    let Some(overview) = results.overview else {
        bail!("Run not found: {}", record.id);
    };

    let details_state = DetailsViewState {
        search: args.search,
        status: args.status,
        category: args.category,
        expanded_test: args.expand,
    };
    let Some(details) = dashboard.details_view(&record.id, &details_state) else {
        bail!("Run not found: {}", record.id);
    };

    match args.format {
        OutputFormat::Table => print_show(&record, &overview, &details),
        OutputFormat::Json => {
            let output = ShowOutput {
                record: &record,
                overview: &overview,
                details: &details,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn print_show(record: &ExecutionRecord, overview: &Overview, details: &DetailsView) {
    println!(
        "{} {} ({})",
        record.suite_name.bold(),
        status_label(record.status),
        record.id
    );
    println!(
        "  {} by {} at {}, took {}",
        record.summary.total,
        record.author,
        record.timestamp.format("%Y-%m-%d %H:%M"),
        record.duration
    );

    println!();
    println!("{}", "Status".bold());
    for slice in &overview.status {
        println!(
            "  {:<8} {:>4} ({:>3}%)",
            status_label(slice.status),
            slice.count,
            slice.percent
        );
    }

    println!();
    println!("{}", "Categories".bold());
    for (category, count) in &overview.categories {
        println!("  {:<20} {:>4}", truncate(category, 20), count);
    }

    println!();
    println!("{}", "Slowest tests".bold());
    for entry in &overview.slowest {
        println!("  {:<40} {:>8.1}s", truncate(&entry.name, 40), entry.seconds);
    }

    println!();
    println!(
        "{} ({} of {})",
        "Tests".bold(),
        details.tests.len(),
        details.total
    );
    println!(
        "  {:<12} {:<36} {:<8} {:<18} {:>8}",
        "ID", "Name", "Status", "Category", "Duration"
    );
    println!("  {}", "-".repeat(86));
    for test in &details.tests {
        println!(
            "  {:<12} {:<36} {:<8} {:<18} {:>8}",
            test.id,
            truncate(&test.name, 36),
            status_label(test.status),
            truncate(&test.category, 18),
            test.duration
        );
    }

    if let Some(expanded) = &details.expanded {
        println!();
        println!("{} {}", "Details:".bold(), expanded.name);
        match &expanded.error {
            Some(error) => println!("  {}", error.red()),
            None => println!("  No error recorded"),
        }
        if let Some(stack) = &expanded.stack_trace {
            for line in stack.lines() {
                println!("  {}", line.dimmed());
            }
        }
    }
}

pub fn execute_timeline(dashboard: &Dashboard, args: TimelineArgs) -> Result<()> {
    let mut overview_config = dashboard.config().overview.clone();
    if let Some(minutes) = args.window_minutes {
        if minutes == 0 {
            bail!("--window-minutes must be greater than 0");
        }
        overview_config.timeline_window_minutes = minutes;
    }

    let query = ResultsViewState {
        status: args.status,
        author: args.author,
        ..ResultsViewState::default()
    }
    .query();
    let records = filter_records(&dashboard.records(), &query);

    let buckets: Vec<WindowBucket> =
        distribution_over_windows(&records, overview_config.timeline_window())
            .into_iter()
            .filter(|b| args.include_empty || b.passed_count > 0 || b.failed_count > 0)
            .collect();

    match args.format {
        OutputFormat::Table => {
            if buckets.is_empty() {
                println!("No runs found");
                return Ok(());
            }
            println!(
                "{:<14} {:<17} {:>7} {:>7}",
                "Window", "Start", "Passed", "Failed"
            );
            println!("{}", "-".repeat(48));
            for bucket in &buckets {
                println!(
                    "{:<14} {:<17} {:>7} {:>7}",
                    bucket.window,
                    bucket.start.format("%Y-%m-%d %H:%M"),
                    bucket.passed_count.to_string().green(),
                    bucket.failed_count.to_string().red()
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&buckets)?);
        }
    }

    Ok(())
}
