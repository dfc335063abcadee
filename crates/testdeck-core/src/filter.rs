//! Filtering of execution records and test cases.
//!
//! Queries come straight from the view layer (search box, dropdowns), so every
//! field is optional free text. Absent, empty or `"all"` values impose no
//! constraint, and a status value that is not a known status is ignored rather
//! than rejected. Supplied predicates are ANDed and the input order is kept.

use crate::models::{ExecutionRecord, TestCase, TestStatus};
use serde::{Deserialize, Serialize};

/// Dropdown value that selects everything.
pub const ALL: &str = "all";

/// Predicates over execution records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordQuery {
    /// Case-insensitive substring of the suite name or author
    pub text: Option<String>,
    /// Exact record status
    pub status: Option<String>,
    /// Exact category of at least one test in the record
    pub category: Option<String>,
    /// Exact author
    pub author: Option<String>,
}

impl RecordQuery {
    /// Creates an empty query that matches every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the status selector.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets the category selector.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the author selector.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// Predicates over the tests of a single record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestQuery {
    /// Case-insensitive substring of the test name or category
    pub text: Option<String>,
    /// Exact test status
    pub status: Option<String>,
    /// Exact category
    pub category: Option<String>,
}

impl TestQuery {
    /// Creates an empty query that matches every test.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the status selector.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets the category selector.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Returns the lowercased needle, or `None` when the search is blank.
fn search_needle(text: Option<&str>) -> Option<String> {
    text.filter(|t| !t.is_empty()).map(str::to_lowercase)
}

/// Returns the selected value, or `None` for absent, empty and `"all"`.
fn selection(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty() && *v != ALL)
}

/// Returns the selected status; unknown status names select nothing.
fn status_selection(value: Option<&str>) -> Option<TestStatus> {
    selection(value).and_then(|v| v.parse().ok())
}

fn contains_lower(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// Checks a single record against a query.
pub fn record_matches(record: &ExecutionRecord, query: &RecordQuery) -> bool {
    if let Some(needle) = search_needle(query.text.as_deref())
        && !contains_lower(&record.suite_name, &needle)
        && !contains_lower(&record.author, &needle)
    {
        return false;
    }

    if let Some(status) = status_selection(query.status.as_deref())
        && record.status != status
    {
        return false;
    }

    if let Some(author) = selection(query.author.as_deref())
        && record.author != author
    {
        return false;
    }

    if let Some(category) = selection(query.category.as_deref())
        && !record.tests.iter().any(|t| t.category == category)
    {
        return false;
    }

    true
}

/// Checks a single test against a query.
pub fn test_matches(test: &TestCase, query: &TestQuery) -> bool {
    if let Some(needle) = search_needle(query.text.as_deref())
        && !contains_lower(&test.name, &needle)
        && !contains_lower(&test.category, &needle)
    {
        return false;
    }

    if let Some(status) = status_selection(query.status.as_deref())
        && test.status != status
    {
        return false;
    }

    if let Some(category) = selection(query.category.as_deref())
        && test.category != category
    {
        return false;
    }

    true
}

/// Returns the records matching `query`, in input order.
pub fn filter_records(records: &[ExecutionRecord], query: &RecordQuery) -> Vec<ExecutionRecord> {
    records
        .iter()
        .filter(|r| record_matches(r, query))
        .cloned()
        .collect()
}

/// Returns the tests matching `query`, in input order.
pub fn filter_tests(tests: &[TestCase], query: &TestQuery) -> Vec<TestCase> {
    tests
        .iter()
        .filter(|t| test_matches(t, query))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Summary;
    use chrono::{TimeZone, Utc};

    fn record(id: &str, suite: &str, author: &str, status: TestStatus) -> ExecutionRecord {
        ExecutionRecord {
            id: id.to_string(),
            suite_name: suite.to_string(),
            status,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
            duration: "1m".to_string(),
            author: author.to_string(),
            summary: Summary::default(),
            tests: vec![TestCase::new(
                format!("{id}-t1"),
                "Probe",
                TestStatus::Passed,
                "1s",
                "API",
            )],
        }
    }

    fn history() -> Vec<ExecutionRecord> {
        vec![
            record("run-001", "Regression Tests", "Alice Johnson", TestStatus::Failed),
            record("run-002", "Smoke Tests", "Bob Smith", TestStatus::Passed),
            record("run-003", "Hotfix Tests", "Carol Williams", TestStatus::Passed),
            record("run-004", "Integration Tests", "Alice Johnson", TestStatus::Failed),
        ]
    }

    fn tests() -> Vec<TestCase> {
        vec![
            TestCase::new(
                "t1",
                "User Authentication Flow",
                TestStatus::Passed,
                "2.5s",
                "Authentication",
            ),
            TestCase::new(
                "t2",
                "Database Connection Test",
                TestStatus::Failed,
                "5.2s",
                "Infrastructure",
            ),
            TestCase::new("t3", "API Response Validation", TestStatus::Passed, "1.8s", "API"),
            TestCase::new("t4", "UI Button Click Handler", TestStatus::Skipped, "0s", "UI"),
        ]
    }

    fn ids(records: &[ExecutionRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_empty_query_is_identity() {
        let records = history();
        assert_eq!(filter_records(&records, &RecordQuery::new()), records);

        let tests = tests();
        assert_eq!(filter_tests(&tests, &TestQuery::new()), tests);
    }

    #[test]
    fn test_all_selectors_are_identity() {
        let records = history();
        let query = RecordQuery::new()
            .with_text("")
            .with_status("all")
            .with_author("all")
            .with_category("all");
        assert_eq!(filter_records(&records, &query), records);
    }

    #[test]
    fn test_status_filter_only_returns_that_status() {
        let records = history();
        let failed = filter_records(&records, &RecordQuery::new().with_status("failed"));
        assert_eq!(ids(&failed), vec!["run-001", "run-004"]);
        assert!(failed.iter().all(|r| r.status == TestStatus::Failed));
        assert!(failed.len() <= records.len());
    }

    #[test]
    fn test_single_failed_record_scenario() {
        let mut only = record("run-001", "Regression Tests", "Alice Johnson", TestStatus::Failed);
        only.summary = Summary {
            total: 3,
            passed: 2,
            failed: 1,
            skipped: 0,
        };
        let records = vec![only];

        let failed = filter_records(&records, &RecordQuery::new().with_status("failed"));
        assert_eq!(failed, records);

        let passed = filter_records(&records, &RecordQuery::new().with_status("passed"));
        assert!(passed.is_empty());
    }

    #[test]
    fn test_unknown_status_imposes_no_constraint() {
        let records = history();
        let query = RecordQuery::new().with_status("flaky");
        assert_eq!(filter_records(&records, &query), records);
    }

    #[test]
    fn test_text_matches_suite_or_author_case_insensitively() {
        let records = history();

        let by_suite = filter_records(&records, &RecordQuery::new().with_text("SMOKE"));
        assert_eq!(ids(&by_suite), vec!["run-002"]);

        let by_author = filter_records(&records, &RecordQuery::new().with_text("alice"));
        assert_eq!(ids(&by_author), vec!["run-001", "run-004"]);
    }

    #[test]
    fn test_author_is_exact() {
        let records = history();
        let exact = filter_records(&records, &RecordQuery::new().with_author("Bob Smith"));
        assert_eq!(ids(&exact), vec!["run-002"]);

        let partial = filter_records(&records, &RecordQuery::new().with_author("Bob"));
        assert!(partial.is_empty());
    }

    #[test]
    fn test_record_category_matches_any_test() {
        let records = history();
        let api = filter_records(&records, &RecordQuery::new().with_category("API"));
        assert_eq!(api.len(), 4);

        let ui = filter_records(&records, &RecordQuery::new().with_category("UI"));
        assert!(ui.is_empty());
    }

    #[test]
    fn test_predicates_are_anded() {
        let records = history();
        let query = RecordQuery::new()
            .with_author("Alice Johnson")
            .with_text("integration")
            .with_status("failed");
        assert_eq!(ids(&filter_records(&records, &query)), vec!["run-004"]);
    }

    #[test]
    fn test_filter_tests_text_matches_name_or_category() {
        let tests = tests();

        let by_name = filter_tests(&tests, &TestQuery::new().with_text("database"));
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, "t2");

        let by_category = filter_tests(&tests, &TestQuery::new().with_text("auth"));
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].id, "t1");
    }

    #[test]
    fn test_filter_tests_status_and_category() {
        let tests = tests();
        let passed = filter_tests(&tests, &TestQuery::new().with_status("passed"));
        assert_eq!(passed.len(), 2);

        let query = TestQuery::new().with_status("passed").with_category("API");
        let api = filter_tests(&tests, &query);
        assert_eq!(api.len(), 1);
        assert_eq!(api[0].id, "t3");
    }

    #[test]
    fn test_filter_is_deterministic() {
        let records = history();
        let query = RecordQuery::new().with_text("tests").with_status("passed");
        assert_eq!(
            filter_records(&records, &query),
            filter_records(&records, &query)
        );
    }

    #[test]
    fn test_query_deserializes_with_missing_fields() {
        let query: RecordQuery = serde_json::from_str(r#"{"author":"Bob Smith"}"#).unwrap();
        assert_eq!(query.author.as_deref(), Some("Bob Smith"));
        assert!(query.text.is_none());
    }
}
