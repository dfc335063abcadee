//! Dashboard configuration.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! stock dashboard: builtin suites, seeded history, 500 ms ticks.

use crate::catalog::SuiteCatalog;
use crate::error::ConfigError;
use crate::store::RecordStore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Execution simulator tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Time between progress ticks in milliseconds
    pub tick_interval_ms: u64,
    /// Upper bound (exclusive) of the random per-tick increment, in percent
    pub max_increment: f64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 500,
            max_increment: 15.0,
        }
    }
}

impl SimulatorConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Overview chart settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OverviewConfig {
    /// How many of the slowest tests to chart
    pub top_durations: usize,
    /// Width of each timeline bucket in minutes
    pub timeline_window_minutes: u32,
}

impl Default for OverviewConfig {
    fn default() -> Self {
        Self {
            top_durations: 10,
            timeline_window_minutes: 5,
        }
    }
}

impl OverviewConfig {
    pub fn timeline_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.timeline_window_minutes))
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub simulator: SimulatorConfig,
    pub overview: OverviewConfig,
    /// Suite catalog file; the builtin catalog is used when unset
    pub catalog_path: Option<PathBuf>,
    /// History file (`.json`, `.yml`, `.yaml`); seeded history when unset
    pub history_path: Option<PathBuf>,
}

impl DashboardConfig {
    /// Parses and validates a YAML config.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a YAML config file.
    ///
    /// Relative catalog and history paths are resolved against the config
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml(&content)?;

        if let Some(base) = path.parent() {
            config.catalog_path = config.catalog_path.map(|p| resolve(base, p));
            config.history_path = config.history_path.map(|p| resolve(base, p));
        }

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulator.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "simulator.tick_interval_ms must be greater than 0".to_string(),
            ));
        }
        let max = self.simulator.max_increment;
        if !(max > 0.0 && max <= 100.0) {
            return Err(ConfigError::Invalid(format!(
                "simulator.max_increment must be in (0, 100], got {max}"
            )));
        }
        if self.overview.timeline_window_minutes == 0 {
            return Err(ConfigError::Invalid(
                "overview.timeline_window_minutes must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the configured suite catalog.
    pub fn catalog(&self) -> Result<SuiteCatalog, ConfigError> {
        let catalog = match &self.catalog_path {
            Some(path) => SuiteCatalog::load(path)?,
            None => SuiteCatalog::builtin()?,
        };
        Ok(catalog)
    }

    /// Builds the configured record store.
    pub fn records(&self) -> Result<RecordStore, ConfigError> {
        let store = match &self.history_path {
            Some(path) => RecordStore::load(path)?,
            None => RecordStore::seeded()?,
        };
        Ok(store)
    }
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
