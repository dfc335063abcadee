//! Derived statistics over execution records.
//!
//! Every function here is pure and total: malformed input degrades to the
//! documented sentinel (`"Other"` for a missing category, zero seconds for an
//! unparsable duration) instead of failing.

use crate::duration::{MalformedDuration, parse_seconds};
use crate::models::{ExecutionRecord, Summary, TestCase, TestStatus};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Bucket for tests without a category.
pub const OTHER_CATEGORY: &str = "Other";

/// Upper bound on emitted timeline windows before empty ones are dropped.
const MAX_CONTIGUOUS_WINDOWS: i64 = 10_000;

/// Passed/failed/skipped counts of one record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
}

impl From<Summary> for StatusCounts {
    fn from(summary: Summary) -> Self {
        Self {
            passed: summary.passed,
            failed: summary.failed,
            skipped: summary.skipped,
        }
    }
}

/// Returns the stored status counts of a record.
pub fn summarize_status(record: &ExecutionRecord) -> StatusCounts {
    record.summary.into()
}

/// Recounts a summary from the tests themselves.
pub fn recompute_summary(tests: &[TestCase]) -> Summary {
    Summary::from_tests(tests)
}

/// Derives an overall status from test outcomes.
///
/// Any failure fails the run. Otherwise any pass passes it. A run with only
/// skipped tests, or no tests at all, is skipped.
pub fn derive_status(tests: &[TestCase]) -> TestStatus {
    if tests.iter().any(|t| t.status == TestStatus::Failed) {
        TestStatus::Failed
    } else if tests.iter().any(|t| t.status == TestStatus::Passed) {
        TestStatus::Passed
    } else {
        TestStatus::Skipped
    }
}

/// A data-integrity problem found in a stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityWarning {
    #[error("stored summary {stored:?} does not match its tests {derived:?}")]
    SummaryMismatch { stored: Summary, derived: Summary },

    #[error("summary counts do not add up to total: {summary:?}")]
    UnbalancedSummary { summary: Summary },

    #[error("stored status {stored} differs from derived status {derived}")]
    StatusMismatch {
        stored: TestStatus,
        derived: TestStatus,
    },

    #[error("test {test_id} has an error message but status {status}")]
    ErrorOnNonFailedTest { test_id: String, status: TestStatus },

    #[error("{}: {source}", field_label(.test_id.as_deref()))]
    MalformedDuration {
        test_id: Option<String>,
        #[serde(rename = "input", serialize_with = "serialize_malformed")]
        source: MalformedDuration,
    },
}

fn field_label(test_id: Option<&str>) -> String {
    match test_id {
        Some(id) => format!("test {id} duration"),
        None => "record duration".to_string(),
    }
}

fn serialize_malformed<S: serde::Serializer>(
    value: &MalformedDuration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.input)
}

/// Checks a record against the model invariants.
///
/// Returns an empty list for a consistent record. Problems are warnings, not
/// errors: the stored fields stay authoritative.
pub fn check_integrity(record: &ExecutionRecord) -> Vec<IntegrityWarning> {
    let mut warnings = Vec::new();

    if !record.summary.is_balanced() {
        warnings.push(IntegrityWarning::UnbalancedSummary {
            summary: record.summary,
        });
    }

    let derived_summary = recompute_summary(&record.tests);
    if derived_summary != record.summary {
        warnings.push(IntegrityWarning::SummaryMismatch {
            stored: record.summary,
            derived: derived_summary,
        });
    }

    let derived_status = derive_status(&record.tests);
    if derived_status != record.status {
        warnings.push(IntegrityWarning::StatusMismatch {
            stored: record.status,
            derived: derived_status,
        });
    }

    if let Err(source) = parse_seconds(&record.duration) {
        warnings.push(IntegrityWarning::MalformedDuration {
            test_id: None,
            source,
        });
    }

    for test in &record.tests {
        if test.error.is_some() && test.status != TestStatus::Failed {
            warnings.push(IntegrityWarning::ErrorOnNonFailedTest {
                test_id: test.id.clone(),
                status: test.status,
            });
        }
        if let Err(source) = parse_seconds(&test.duration) {
            warnings.push(IntegrityWarning::MalformedDuration {
                test_id: Some(test.id.clone()),
                source,
            });
        }
    }

    warnings
}

/// Returns the category a test is charted under.
pub fn category_of(test: &TestCase) -> &str {
    if test.category.trim().is_empty() {
        OTHER_CATEGORY
    } else {
        &test.category
    }
}

/// Counts tests per category.
pub fn group_by_category(tests: &[TestCase]) -> BTreeMap<String, usize> {
    let mut groups: BTreeMap<String, usize> = BTreeMap::new();
    for test in tests {
        *groups.entry(category_of(test).to_string()).or_default() += 1;
    }
    groups
}

/// A test name with its parsed duration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DurationEntry {
    pub name: String,
    pub seconds: f64,
}

/// Returns the `n` slowest tests, slowest first.
///
/// Unparsable durations count as zero seconds and rank after parsable zeros.
/// Remaining ties keep input order.
pub fn top_n_by_duration(tests: &[TestCase], n: usize) -> Vec<DurationEntry> {
    let mut ranked: Vec<(&TestCase, f64, bool)> = tests
        .iter()
        .map(|test| match parse_seconds(&test.duration) {
            Ok(seconds) => (test, seconds, false),
            Err(e) => {
                tracing::warn!("test {}: {}; ranking as 0s", test.id, e);
                (test, 0.0, true)
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .take(n)
        .map(|(test, seconds, _)| DurationEntry {
            name: test.name.clone(),
            seconds,
        })
        .collect()
}

/// Passed and failed test counts of the runs that started in one window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WindowBucket {
    /// Offset label relative to the first run, e.g. `"5-10min"`
    pub window: String,
    /// Start of the window
    pub start: DateTime<Utc>,
    pub passed_count: u64,
    pub failed_count: u64,
}

/// Buckets runs into fixed-size windows by timestamp.
///
/// Windows start at the earliest timestamp and are contiguous up to the
/// latest, so windows without runs appear with zero counts. Counts are the
/// stored test-level passed/failed totals of each run, saturating at
/// `u64::MAX`. Window sizes are resolved to the microsecond; a window shorter
/// than 1µs, or non-positive, yields no buckets.
pub fn distribution_over_windows(
    records: &[ExecutionRecord],
    window_size: Duration,
) -> Vec<WindowBucket> {
    let window_us = micros(window_size);
    if window_us <= 0 {
        return Vec::new();
    }
    let Some(origin) = records.iter().map(|r| r.timestamp).min() else {
        return Vec::new();
    };

    let mut counts: BTreeMap<i64, (u64, u64)> = BTreeMap::new();
    for record in records {
        let index = micros(record.timestamp - origin) / window_us;
        let entry = counts.entry(index).or_default();
        entry.0 = entry.0.saturating_add(u64::from(record.summary.passed));
        entry.1 = entry.1.saturating_add(u64::from(record.summary.failed));
    }

    let last = counts.keys().next_back().copied().unwrap_or(0);
    let indices: Vec<i64> = if last < MAX_CONTIGUOUS_WINDOWS {
        (0..=last).collect()
    } else {
        tracing::debug!("timeline spans {} windows; omitting empty ones", last + 1);
        counts.keys().copied().collect()
    };

    indices
        .into_iter()
        .map(|index| {
            let (passed_count, failed_count) = counts.get(&index).copied().unwrap_or_default();
            let start = origin
                .checked_add_signed(Duration::microseconds(index * window_us))
                .unwrap_or(origin);
            WindowBucket {
                window: window_label(index, window_us),
                start,
                passed_count,
                failed_count,
            }
        })
        .collect()
}

/// Whole microseconds of a span, clamped to `i64::MAX` when it does not fit.
fn micros(span: Duration) -> i64 {
    span.num_microseconds().unwrap_or(i64::MAX)
}

/// Formats the offset range of window `index`, in the largest whole unit.
fn window_label(index: i64, window_us: i64) -> String {
    let (step, suffix) = if window_us % 1000 != 0 {
        (window_us, "us")
    } else if window_us % 1_000_000 != 0 {
        (window_us / 1000, "ms")
    } else {
        let secs = window_us / 1_000_000;
        if secs % 3600 == 0 {
            (secs / 3600, "h")
        } else if secs % 60 == 0 {
            (secs / 60, "min")
        } else {
            (secs, "s")
        }
    };
    format!(
        "{}-{}{}",
        index.saturating_mul(step),
        index.saturating_add(1).saturating_mul(step),
        suffix
    )
}

/// One slice of the status pie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusSlice {
    pub status: TestStatus,
    pub count: u32,
    /// Share of the total, rounded to a whole percent
    pub percent: u32,
}

/// Splits a summary into pie slices, in passed/failed/skipped order.
pub fn status_distribution(counts: StatusCounts) -> Vec<StatusSlice> {
    let total = u64::from(counts.passed) + u64::from(counts.failed) + u64::from(counts.skipped);
    TestStatus::ALL
        .iter()
        .map(|&status| {
            let count = match status {
                TestStatus::Passed => counts.passed,
                TestStatus::Failed => counts.failed,
                TestStatus::Skipped => counts.skipped,
            };
            let percent = if total == 0 {
                0
            } else {
                ((f64::from(count) * 100.0) / total as f64).round() as u32
            };
            StatusSlice {
                status,
                count,
                percent,
            }
        })
        .collect()
}

/// Distinct authors in first-seen order.
pub fn unique_authors(records: &[ExecutionRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert(r.author.as_str()))
        .map(|r| r.author.clone())
        .collect()
}

/// Distinct non-empty categories in first-seen order.
pub fn unique_categories(tests: &[TestCase]) -> Vec<String> {
    let mut seen = HashSet::new();
    tests
        .iter()
        .filter(|t| !t.category.trim().is_empty() && seen.insert(t.category.as_str()))
        .map(|t| t.category.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test(id: &str, status: TestStatus, duration: &str, category: &str) -> TestCase {
        TestCase::new(id, format!("Test {id}"), status, duration, category)
    }

    fn named(name: &str, duration: &str) -> TestCase {
        TestCase::new(name, name, TestStatus::Passed, duration, "General")
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, hour, minute, 0).unwrap()
    }

    fn run(id: &str, timestamp: DateTime<Utc>, passed: u32, failed: u32) -> ExecutionRecord {
        let mut tests = Vec::new();
        for i in 0..passed {
            tests.push(test(&format!("{id}-p{i}"), TestStatus::Passed, "1s", "API"));
        }
        for i in 0..failed {
            tests.push(
                test(&format!("{id}-f{i}"), TestStatus::Failed, "1s", "API").with_error("boom"),
            );
        }
        ExecutionRecord::from_tests(id, "Suite", timestamp, "1m", "Alice Johnson", tests)
    }

    #[test]
    fn test_summarize_status_matches_recomputation() {
        let record = run("run-1", at(10, 0), 2, 1);
        let counts = summarize_status(&record);
        assert_eq!(counts, StatusCounts::from(recompute_summary(&record.tests)));
        assert_eq!(
            counts,
            StatusCounts {
                passed: 2,
                failed: 1,
                skipped: 0
            }
        );
    }

    #[test]
    fn test_derive_status() {
        let passed = test("a", TestStatus::Passed, "1s", "");
        let failed = test("b", TestStatus::Failed, "1s", "");
        let skipped = test("c", TestStatus::Skipped, "0s", "");

        assert_eq!(
            derive_status(&[passed.clone(), failed, skipped.clone()]),
            TestStatus::Failed
        );
        assert_eq!(
            derive_status(&[passed, skipped.clone()]),
            TestStatus::Passed
        );
        assert_eq!(derive_status(&[skipped]), TestStatus::Skipped);
        assert_eq!(derive_status(&[]), TestStatus::Skipped);
    }

    #[test]
    fn test_check_integrity_clean_record() {
        let record = run("run-1", at(10, 0), 3, 1);
        assert!(check_integrity(&record).is_empty());
    }

    #[test]
    fn test_check_integrity_reports_divergence() {
        let mut record = run("run-1", at(10, 0), 1, 1);
        record.status = TestStatus::Passed;
        record.summary.total = 245;
        record.tests[0].error = Some("stale".to_string());
        record.tests[1].duration = "soon".to_string();

        let warnings = check_integrity(&record);
        assert!(
            warnings
                .iter()
                .any(|w| matches!(w, IntegrityWarning::UnbalancedSummary { .. }))
        );
        assert!(
            warnings
                .iter()
                .any(|w| matches!(w, IntegrityWarning::SummaryMismatch { .. }))
        );
        assert!(warnings.contains(&IntegrityWarning::StatusMismatch {
            stored: TestStatus::Passed,
            derived: TestStatus::Failed,
        }));
        assert!(warnings.iter().any(|w| matches!(
            w,
            IntegrityWarning::ErrorOnNonFailedTest { test_id, .. } if test_id == "run-1-p0"
        )));
        assert!(warnings.iter().any(|w| matches!(
            w,
            IntegrityWarning::MalformedDuration { test_id: Some(id), .. } if id == "run-1-f0"
        )));
    }

    #[test]
    fn test_group_by_category_counts_sum_to_len() {
        let tests = vec![
            test("1", TestStatus::Passed, "1s", "API"),
            test("2", TestStatus::Passed, "1s", "UI"),
            test("3", TestStatus::Failed, "1s", "API"),
            test("4", TestStatus::Skipped, "0s", ""),
            test("5", TestStatus::Skipped, "0s", "  "),
        ];

        let groups = group_by_category(&tests);
        assert_eq!(groups.get("API"), Some(&2));
        assert_eq!(groups.get("UI"), Some(&1));
        assert_eq!(groups.get(OTHER_CATEGORY), Some(&2));
        assert_eq!(groups.values().sum::<usize>(), tests.len());
    }

    #[test]
    fn test_group_by_category_empty() {
        assert!(group_by_category(&[]).is_empty());
    }

    #[test]
    fn test_top_n_scenario() {
        let tests = vec![named("A", "2.5s"), named("B", "10.5s"), named("C", "bad")];
        let top = top_n_by_duration(&tests, 2);
        assert_eq!(
            top,
            vec![
                DurationEntry {
                    name: "B".to_string(),
                    seconds: 10.5
                },
                DurationEntry {
                    name: "A".to_string(),
                    seconds: 2.5
                },
            ]
        );
    }

    #[test]
    fn test_top_n_malformed_last_among_zero_ties() {
        let tests = vec![named("bad", "n/a"), named("zero", "0s"), named("one", "1s")];
        let top = top_n_by_duration(&tests, 10);
        let names: Vec<&str> = top.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["one", "zero", "bad"]);
        assert_eq!(top[2].seconds, 0.0);
    }

    #[test]
    fn test_top_n_is_stable_and_bounded() {
        let tests = vec![
            named("first", "3s"),
            named("second", "3s"),
            named("third", "5s"),
        ];
        let top = top_n_by_duration(&tests, 5);
        assert_eq!(top.len(), 3);
        let names: Vec<&str> = top.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["third", "first", "second"]);
        assert!(top.windows(2).all(|w| w[0].seconds >= w[1].seconds));

        assert!(top_n_by_duration(&tests, 0).is_empty());
        assert!(top_n_by_duration(&[], 3).is_empty());
    }

    #[test]
    fn test_distribution_over_windows_contiguous() {
        let records = vec![
            run("late", at(10, 12), 1, 1),
            run("first", at(10, 0), 4, 0),
            run("early", at(10, 3), 2, 1),
        ];

        let buckets = distribution_over_windows(&records, Duration::minutes(5));
        assert_eq!(buckets.len(), 3);

        assert_eq!(buckets[0].window, "0-5min");
        assert_eq!(buckets[0].start, at(10, 0));
        assert_eq!((buckets[0].passed_count, buckets[0].failed_count), (6, 1));

        assert_eq!(buckets[1].window, "5-10min");
        assert_eq!((buckets[1].passed_count, buckets[1].failed_count), (0, 0));

        assert_eq!(buckets[2].window, "10-15min");
        assert_eq!(buckets[2].start, at(10, 10));
        assert_eq!((buckets[2].passed_count, buckets[2].failed_count), (1, 1));
    }

    #[test]
    fn test_distribution_degenerate_inputs() {
        assert!(distribution_over_windows(&[], Duration::minutes(5)).is_empty());

        let records = vec![run("r", at(9, 0), 1, 0)];
        assert!(distribution_over_windows(&records, Duration::zero()).is_empty());
        assert!(distribution_over_windows(&records, Duration::minutes(-5)).is_empty());
    }

    #[test]
    fn test_distribution_counts_do_not_overflow() {
        let mut records = vec![run("a", at(10, 0), 0, 0), run("b", at(10, 2), 0, 0)];
        for record in &mut records {
            record.summary.passed = 3_000_000_000;
            record.summary.failed = u32::MAX;
        }

        let buckets = distribution_over_windows(&records, Duration::minutes(5));
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].passed_count, 6_000_000_000);
        assert_eq!(buckets[0].failed_count, 2 * u64::from(u32::MAX));
    }

    #[test]
    fn test_distribution_sub_millisecond_windows() {
        let mut late = run("late", at(10, 0), 1, 0);
        late.timestamp += Duration::microseconds(1200);
        let records = vec![run("first", at(10, 0), 2, 1), late];

        let buckets = distribution_over_windows(&records, Duration::microseconds(500));
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].window, "0-500us");
        assert_eq!((buckets[0].passed_count, buckets[0].failed_count), (2, 1));
        assert_eq!((buckets[1].passed_count, buckets[1].failed_count), (0, 0));
        assert_eq!(buckets[2].start, at(10, 0) + Duration::microseconds(1000));
        assert_eq!((buckets[2].passed_count, buckets[2].failed_count), (1, 0));

        assert!(distribution_over_windows(&records, Duration::nanoseconds(500)).is_empty());
    }

    #[test]
    fn test_window_labels_pick_units() {
        assert_eq!(window_label(1, 2 * 3_600_000_000), "2-4h");
        assert_eq!(window_label(2, 90_000_000), "180-270s");
        assert_eq!(window_label(0, 250_000), "0-250ms");
        assert_eq!(window_label(3, 1_500), "4500-6000us");
    }

    #[test]
    fn test_status_distribution_percentages() {
        let slices = status_distribution(StatusCounts {
            passed: 7,
            failed: 2,
            skipped: 1,
        });
        assert_eq!(slices.len(), 3);
        assert_eq!(slices[0].status, TestStatus::Passed);
        assert_eq!(slices[0].percent, 70);
        assert_eq!(slices[1].percent, 20);
        assert_eq!(slices[2].percent, 10);

        let empty = status_distribution(StatusCounts::default());
        assert!(empty.iter().all(|s| s.percent == 0));
    }

    #[test]
    fn test_unique_authors_first_seen_order() {
        let mut a = run("1", at(10, 0), 1, 0);
        a.author = "Alice".to_string();
        let mut b = run("2", at(10, 0), 1, 0);
        b.author = "Bob".to_string();
        let mut c = run("3", at(10, 0), 1, 0);
        c.author = "Alice".to_string();

        assert_eq!(unique_authors(&[a, b, c]), vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_unique_categories_skips_empty() {
        let tests = vec![
            test("1", TestStatus::Passed, "1s", "UI"),
            test("2", TestStatus::Passed, "1s", ""),
            test("3", TestStatus::Passed, "1s", "API"),
            test("4", TestStatus::Passed, "1s", "UI"),
        ];
        assert_eq!(unique_categories(&tests), vec!["UI", "API"]);
    }
}
