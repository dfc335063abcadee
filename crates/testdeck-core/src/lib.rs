//! Testdeck core
//!
//! Data model and engines behind the Testdeck test execution dashboard:
//!
//! - [`store`]: append-only history of execution records
//! - [`filter`]: pure record and test filtering
//! - [`aggregate`]: status, category, duration and timeline statistics
//! - [`simulator`]: simulated suite runs with live progress events
//! - [`view`]: page derivations from immutable view state
//!
//! [`Dashboard`] bundles them for a front end such as the `testdeck` CLI.

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod duration;
pub mod error;
pub mod filter;
pub mod models;
pub mod simulator;
pub mod store;
pub mod view;

pub use catalog::SuiteCatalog;
pub use config::{DashboardConfig, OverviewConfig, SimulatorConfig};
pub use error::{CatalogError, ConfigError, SimulatorError, StoreError};
pub use models::{
    ExecutionRecord, ExecutionState, Priority, Summary, SuitePhase, TestCase, TestStatus,
    TestSuiteDescriptor,
};
pub use simulator::{ExecutionEvent, ExecutionSimulator, RandomSource};
pub use store::RecordStore;

use std::sync::{Arc, PoisonError, RwLock};
use view::{DetailsView, DetailsViewState, ResultsView, ResultsViewState};

/// Shared dashboard state.
#[derive(Clone)]
pub struct Dashboard {
    /// Execution history
    records: Arc<RwLock<RecordStore>>,
    /// Runnable suites
    catalog: Arc<SuiteCatalog>,
    /// Simulated runs of catalogued suites
    simulator: ExecutionSimulator,
    config: DashboardConfig,
}

impl Dashboard {
    /// Builds a dashboard from configuration.
    pub fn from_config(config: DashboardConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let catalog = Arc::new(config.catalog()?);
        let records = config.records()?;
        Ok(Self::from_parts(catalog, records, config))
    }

    /// Builds a dashboard with a custom progress source.
    pub fn with_random(
        config: DashboardConfig,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self, ConfigError> {
        let mut dashboard = Self::from_config(config)?;
        dashboard.simulator = ExecutionSimulator::with_random(
            Arc::clone(&dashboard.catalog),
            dashboard.config.simulator.clone(),
            random,
        );
        Ok(dashboard)
    }

    fn from_parts(
        catalog: Arc<SuiteCatalog>,
        records: RecordStore,
        config: DashboardConfig,
    ) -> Self {
        let simulator = ExecutionSimulator::new(Arc::clone(&catalog), config.simulator.clone());
        tracing::debug!(
            "Dashboard ready: {} suites, {} records",
            catalog.len(),
            records.len()
        );
        Self {
            records: Arc::new(RwLock::new(records)),
            catalog,
            simulator,
            config,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn catalog(&self) -> &SuiteCatalog {
        &self.catalog
    }

    pub fn simulator(&self) -> &ExecutionSimulator {
        &self.simulator
    }

    /// Snapshot of the execution history.
    pub fn records(&self) -> Arc<Vec<ExecutionRecord>> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    /// Appends a record to the history.
    pub fn append_record(&self, record: ExecutionRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .append(record)
    }

    /// The record a results page shows for `id`, defaulting to the first.
    pub fn select_record(&self, id: Option<&str>) -> Option<ExecutionRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .select_record(id)
            .cloned()
    }

    /// Derives the run history page.
    pub fn results_view(&self, state: &ResultsViewState) -> ResultsView {
        view::results_view(&self.records(), state, &self.config.overview)
    }

    /// Derives the per-test list of a record, if it exists.
    pub fn details_view(&self, record_id: &str, state: &DetailsViewState) -> Option<DetailsView> {
        let records = self.records();
        let record = records.iter().find(|r| r.id == record_id)?;
        Some(view::details_view(record, state))
    }
}
