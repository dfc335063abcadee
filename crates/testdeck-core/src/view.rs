//! View derivations for the results pages.
//!
//! UI state lives in plain immutable structs. A front end keeps the current
//! state, builds a new one on every interaction and passes it, with the
//! history, to a pure function that returns everything the page renders.

use crate::aggregate::{
    DurationEntry, StatusSlice, WindowBucket, distribution_over_windows, group_by_category,
    status_distribution, summarize_status, top_n_by_duration, unique_authors, unique_categories,
};
use crate::config::OverviewConfig;
use crate::filter::{RecordQuery, TestQuery, filter_records, filter_tests};
use crate::models::{ExecutionRecord, RecordId, TestCase};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Selections on the run history page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResultsViewState {
    /// Search box text
    pub search: Option<String>,
    /// Status dropdown value
    pub status: Option<String>,
    /// Author dropdown value
    pub author: Option<String>,
    /// Record the user clicked
    pub selected_record: Option<RecordId>,
}

impl ResultsViewState {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn select(mut self, record_id: impl Into<RecordId>) -> Self {
        self.selected_record = Some(record_id.into());
        self
    }

    /// The record filter these selections describe.
    pub fn query(&self) -> RecordQuery {
        RecordQuery {
            text: self.search.clone(),
            status: self.status.clone(),
            category: None,
            author: self.author.clone(),
        }
    }
}

/// Charts for one execution record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    /// Status pie slices of the record
    pub status: Vec<StatusSlice>,
    /// Test count per category of the record
    pub categories: BTreeMap<String, usize>,
    /// Slowest tests of the record
    pub slowest: Vec<DurationEntry>,
    /// Passed/failed counts over time across the listed runs
    pub timeline: Vec<WindowBucket>,
}

/// Builds the chart data for `record`, with the timeline over `history`.
pub fn overview(
    record: &ExecutionRecord,
    history: &[ExecutionRecord],
    config: &OverviewConfig,
) -> Overview {
    Overview {
        status: status_distribution(summarize_status(record)),
        categories: group_by_category(&record.tests),
        slowest: top_n_by_duration(&record.tests, config.top_durations),
        timeline: distribution_over_windows(history, config.timeline_window()),
    }
}

/// Everything the run history page renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsView {
    /// Runs passing the current filters, in history order
    pub executions: Vec<ExecutionRecord>,
    /// Author dropdown values over the whole history
    pub authors: Vec<String>,
    /// Run shown in the detail pane
    pub selected: Option<ExecutionRecord>,
    /// Charts of the selected run
    pub overview: Option<Overview>,
}

/// Resolves the shown record: the requested one if present, else the first.
pub fn select_record<'a>(
    records: &'a [ExecutionRecord],
    record_id: Option<&str>,
) -> Option<&'a ExecutionRecord> {
    record_id
        .and_then(|id| records.iter().find(|r| r.id == id))
        .or_else(|| records.first())
}

/// Derives the run history page.
pub fn results_view(
    records: &[ExecutionRecord],
    state: &ResultsViewState,
    config: &OverviewConfig,
) -> ResultsView {
    let executions = filter_records(records, &state.query());
    let selected = select_record(records, state.selected_record.as_deref()).cloned();
    let overview = selected
        .as_ref()
        .map(|record| overview(record, &executions, config));

    ResultsView {
        authors: unique_authors(records),
        executions,
        selected,
        overview,
    }
}

/// Selections on the per-test list of one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetailsViewState {
    pub search: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    /// Test row whose error details are open
    pub expanded_test: Option<String>,
}

impl DetailsViewState {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Opens the row, or closes it if it is already open.
    pub fn toggle(mut self, test_id: &str) -> Self {
        if self.expanded_test.as_deref() == Some(test_id) {
            self.expanded_test = None;
        } else {
            self.expanded_test = Some(test_id.to_string());
        }
        self
    }

    pub fn query(&self) -> TestQuery {
        TestQuery {
            text: self.search.clone(),
            status: self.status.clone(),
            category: self.category.clone(),
        }
    }
}

/// Error details of an expanded test row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedTest {
    pub test_id: String,
    pub name: String,
    pub error: Option<String>,
    pub stack_trace: Option<String>,
}

/// Everything the per-test list renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsView {
    /// Tests passing the current filters, in run order
    pub tests: Vec<TestCase>,
    /// Number of tests before filtering
    pub total: usize,
    /// Category dropdown values
    pub categories: Vec<String>,
    /// Open row, when it is among the listed tests
    pub expanded: Option<ExpandedTest>,
}

/// Derives the per-test list of `record`.
pub fn details_view(record: &ExecutionRecord, state: &DetailsViewState) -> DetailsView {
    let tests = filter_tests(&record.tests, &state.query());
    let expanded = state.expanded_test.as_deref().and_then(|id| {
        tests.iter().find(|t| t.id == id).map(|t| ExpandedTest {
            test_id: t.id.clone(),
            name: t.name.clone(),
            error: t.error.clone(),
            stack_trace: t.stack_trace.clone(),
        })
    });

    DetailsView {
        total: record.tests.len(),
        categories: unique_categories(&record.tests),
        tests,
        expanded,
    }
}
