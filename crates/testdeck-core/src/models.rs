//! Data models for the Testdeck dashboard.
//!
//! These models represent execution records and their test cases, the static
//! suite catalog, and the ephemeral progress state of simulated runs. Field
//! names serialize in camelCase so history files written by the original
//! dashboard load unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for an execution record (e.g. `"run-001"`).
pub type RecordId = String;

/// Unique identifier for a catalogued suite (e.g. `"smoke"`).
pub type SuiteId = String;

/// Outcome of a single test, or of a whole execution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// Test passed
    Passed,
    /// Test failed
    Failed,
    /// Test was skipped
    Skipped,
}

impl TestStatus {
    /// All statuses in chart order.
    pub const ALL: [TestStatus; 3] = [TestStatus::Passed, TestStatus::Failed, TestStatus::Skipped];

    /// Returns the lowercase wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known status name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown test status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for TestStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passed" => Ok(TestStatus::Passed),
            "failed" => Ok(TestStatus::Failed),
            "skipped" => Ok(TestStatus::Skipped),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A single test outcome within an execution record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    /// Test ID, unique within the history
    pub id: String,
    /// Display name
    pub name: String,
    /// Outcome
    pub status: TestStatus,
    /// Elapsed time as written by the runner (e.g. `"2.5s"`)
    pub duration: String,
    /// Free-text category label; may be empty
    #[serde(default)]
    pub category: String,
    /// Failure message, normally only present on failed tests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Opaque stack trace text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

impl TestCase {
    /// Creates a test case without error details.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        status: TestStatus,
        duration: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status,
            duration: duration.into(),
            category: category.into(),
            error: None,
            stack_trace: None,
        }
    }

    /// Attaches a failure message.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attaches a stack trace.
    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }
}

/// Per-status test counts of an execution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Summary {
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
}

impl Summary {
    /// Counts the statuses of the given tests.
    pub fn from_tests(tests: &[TestCase]) -> Self {
        let mut summary = Summary::default();
        for test in tests {
            summary.total += 1;
            match test.status {
                TestStatus::Passed => summary.passed += 1,
                TestStatus::Failed => summary.failed += 1,
                TestStatus::Skipped => summary.skipped += 1,
            }
        }
        summary
    }

    /// Returns the count for a single status.
    pub fn count(&self, status: TestStatus) -> u32 {
        match status {
            TestStatus::Passed => self.passed,
            TestStatus::Failed => self.failed,
            TestStatus::Skipped => self.skipped,
        }
    }

    /// True when the per-status counts add up to `total`.
    pub fn is_balanced(&self) -> bool {
        u64::from(self.passed) + u64::from(self.failed) + u64::from(self.skipped)
            == u64::from(self.total)
    }
}

/// A completed run of a test suite.
///
/// Records are created once and never mutated; the history is append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    /// Record ID
    pub id: RecordId,
    /// Display name of the suite that ran
    pub suite_name: String,
    /// Stored overall status (authoritative)
    pub status: TestStatus,
    /// When the run was created
    pub timestamp: DateTime<Utc>,
    /// Wall-clock duration as written by the runner (e.g. `"42m 15s"`)
    pub duration: String,
    /// Who started the run
    pub author: String,
    /// Stored per-status counts
    pub summary: Summary,
    /// Individual test outcomes, in run order
    #[serde(default)]
    pub tests: Vec<TestCase>,
}

impl ExecutionRecord {
    /// Builds a record whose status and summary are derived from its tests.
    pub fn from_tests(
        id: impl Into<String>,
        suite_name: impl Into<String>,
        timestamp: DateTime<Utc>,
        duration: impl Into<String>,
        author: impl Into<String>,
        tests: Vec<TestCase>,
    ) -> Self {
        Self {
            id: id.into(),
            suite_name: suite_name.into(),
            status: crate::aggregate::derive_status(&tests),
            timestamp,
            duration: duration.into(),
            author: author.into(),
            summary: Summary::from_tests(&tests),
            tests,
        }
    }

    /// Finds a test of this record by ID.
    pub fn test(&self, test_id: &str) -> Option<&TestCase> {
        self.tests.iter().find(|t| t.id == test_id)
    }
}

/// Declared priority of a catalogued suite.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// Static catalog entry for a runnable suite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestSuiteDescriptor {
    /// Suite ID used by start/stop commands
    pub id: SuiteId,
    /// Display name
    pub name: String,
    /// One-line description
    #[serde(default)]
    pub description: String,
    /// Number of tests in the suite
    pub test_count: u32,
    /// Human estimate (e.g. `"45 min"`)
    pub estimated_duration: String,
    /// Declared priority
    pub priority: Priority,
    /// Free-form tags, in declaration order
    #[serde(default)]
    pub tags: Vec<String>,
}

impl TestSuiteDescriptor {
    /// Estimated duration in seconds, or 0 when the estimate cannot be parsed.
    pub fn estimated_seconds(&self) -> f64 {
        crate::duration::seconds_or_zero(&self.estimated_duration)
    }
}

/// Whether a suite currently has a simulated run in flight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SuitePhase {
    Idle,
    Running,
}

/// Progress snapshot of a running suite.
///
/// Only exists while a run is in flight; completed and cancelled runs have no
/// state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionState {
    /// Suite being run
    pub suite_id: SuiteId,
    /// Completion percentage in `[0, 100]`
    pub progress: f64,
    /// Always true for live snapshots
    pub running: bool,
}

impl ExecutionState {
    /// Progress rounded to a whole percentage for display.
    pub fn percent(&self) -> u8 {
        self.progress.round().clamp(0.0, 100.0) as u8
    }
}
