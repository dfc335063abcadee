//! Shared terminal output helpers.

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use std::io::{IsTerminal, stdout};
use testdeck_core::{Priority, TestStatus};

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for programmatic access
    Json,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorMode {
    /// Automatically detect if stdout is a TTY
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl ColorMode {
    fn should_use_colors(self) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => stdout().is_terminal(),
        }
    }

    /// Applies the mode to all `colored` output of the process.
    pub fn apply(self) {
        colored::control::set_override(self.should_use_colors());
    }
}

pub fn status_label(status: TestStatus) -> ColoredString {
    match status {
        TestStatus::Passed => status.as_str().green(),
        TestStatus::Failed => status.as_str().red(),
        TestStatus::Skipped => status.as_str().yellow(),
    }
}

pub fn priority_label(priority: Priority) -> ColoredString {
    let text = priority.to_string();
    match priority {
        Priority::High => text.red().bold(),
        Priority::Medium => text.yellow(),
        Priority::Low => text.dimmed(),
    }
}

/// Shortens `text` to `width` characters, ending in `...` when cut.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}
