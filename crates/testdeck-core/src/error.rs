//! Error types for Testdeck.

use crate::models::{RecordId, SuiteId};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from starting and stopping simulated runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulatorError {
    #[error("Suite already running: {0}")]
    AlreadyRunning(SuiteId),

    #[error("Unknown suite: {0}")]
    UnknownSuite(SuiteId),

    #[error("Suite not running: {0}")]
    NotRunning(SuiteId),
}

/// Errors from loading or appending execution history.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate record id: {0}")]
    DuplicateRecord(RecordId),

    #[error("Failed to read history {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON history: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML history: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported history format: {0} (expected .json, .yml or .yaml)")]
    UnsupportedFormat(PathBuf),
}

/// Errors from building the suite catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Duplicate suite id: {0}")]
    DuplicateSuite(SuiteId),

    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid catalog YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors from loading dashboard configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
