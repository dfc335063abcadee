//! Execution history storage.
//!
//! The history is append-only. Readers take a [`snapshot`](RecordStore::snapshot)
//! and keep it for as long as they like; later appends copy the list instead
//! of mutating what a snapshot points at.

use crate::aggregate::{check_integrity, unique_authors};
use crate::error::StoreError;
use crate::models::ExecutionRecord;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

const SEED_HISTORY: &str = include_str!("../data/history.yml");

/// Ordered, append-only collection of execution records.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Arc<Vec<ExecutionRecord>>,
}

impl RecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the bundled demo history.
    pub fn seeded() -> Result<Self, StoreError> {
        let records: Vec<ExecutionRecord> = serde_yaml::from_str(SEED_HISTORY)?;
        Self::from_records(records)
    }

    /// Creates a store from records in history order.
    ///
    /// Fails on duplicate IDs. Records that break the model invariants are
    /// kept and logged.
    pub fn from_records(records: Vec<ExecutionRecord>) -> Result<Self, StoreError> {
        let mut seen = HashSet::new();
        for record in &records {
            if !seen.insert(record.id.as_str()) {
                return Err(StoreError::DuplicateRecord(record.id.clone()));
            }
            warn_on_integrity(record);
        }

        Ok(Self {
            records: Arc::new(records),
        })
    }

    /// Loads history from a `.json`, `.yml` or `.yaml` file.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let records: Vec<ExecutionRecord> = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("yml" | "yaml") => serde_yaml::from_str(&content)?,
            _ => return Err(StoreError::UnsupportedFormat(path.to_path_buf())),
        };

        let store = Self::from_records(records)?;
        tracing::info!("Loaded {} records from {}", store.len(), path.display());
        Ok(store)
    }

    /// Appends a record to the end of the history.
    pub fn append(&mut self, record: ExecutionRecord) -> Result<(), StoreError> {
        if self.get(&record.id).is_some() {
            return Err(StoreError::DuplicateRecord(record.id));
        }
        warn_on_integrity(&record);

        tracing::debug!("Appending record {}", record.id);
        Arc::make_mut(&mut self.records).push(record);
        Ok(())
    }

    /// Returns an immutable view of the current history.
    pub fn snapshot(&self) -> Arc<Vec<ExecutionRecord>> {
        Arc::clone(&self.records)
    }

    /// Gets a record by ID.
    pub fn get(&self, id: &str) -> Option<&ExecutionRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Resolves the record a results view should show.
    ///
    /// Returns the requested record when it exists, otherwise the first
    /// record of the history.
    pub fn select_record(&self, id: Option<&str>) -> Option<&ExecutionRecord> {
        crate::view::select_record(&self.records, id)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the history is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct authors, in history order.
    pub fn authors(&self) -> Vec<String> {
        unique_authors(&self.records)
    }
}

fn warn_on_integrity(record: &ExecutionRecord) {
    for warning in check_integrity(record) {
        tracing::warn!("Record {}: {}", record.id, warning);
    }
}
