//! Engine types
//!
//! Request counters, stop reasons and the two stages of a run's life:
//! [`CollectionRun`] while fetching, [`FinalizedRun`] afterwards.

use crate::types::Record;
use crate::validate::ValidationStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// HTTP attempt counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestStats {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
}

impl RequestStats {
    /// Create empty counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one attempt
    pub fn record(&mut self, success: bool) {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }
    }

    /// Share of successful attempts; 1.0 before any request has been made
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 1.0;
        }
        self.successful_requests as f64 / self.total_requests as f64
    }
}

/// Why the collection loop stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StopReason {
    /// The API returned no further cursor
    Exhausted,
    /// `limits.max_records` accepted records were collected
    RecordCapReached { limit: usize },
    /// `limits.max_pages` pages were fetched
    PageCapReached { limit: u32 },
    /// A page could not be fetched; earlier pages are kept
    PageFailed { page: u32, error: String },
    /// The API rejected the credentials
    AuthRejected { error: String },
}

impl StopReason {
    /// Whether the run ended on an error rather than a limit
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::PageFailed { .. } | Self::AuthRejected { .. })
    }

    /// One-line human description
    pub fn describe(&self) -> String {
        match self {
            Self::Exhausted => "all pages fetched".to_string(),
            Self::RecordCapReached { limit } => format!("record cap of {limit} reached"),
            Self::PageCapReached { limit } => format!("page cap of {limit} reached"),
            Self::PageFailed { page, error } => format!("page {page} failed: {error}"),
            Self::AuthRejected { error } => format!("authentication rejected: {error}"),
        }
    }
}

/// In-progress run, mutated by the engine
#[derive(Debug, Clone)]
pub struct CollectionRun {
    start_time: DateTime<Utc>,
    /// Attempt counters, lent to the fetcher
    pub stats: RequestStats,
    records: Vec<Record>,
}

impl CollectionRun {
    /// Start a run now
    pub fn start() -> Self {
        Self {
            start_time: Utc::now(),
            stats: RequestStats::new(),
            records: Vec::new(),
        }
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Freeze the run
    pub fn finalize(self, outcome: RunOutcome) -> FinalizedRun {
        let issues = collect_issues(&self.stats, &outcome);
        FinalizedRun {
            start_time: self.start_time,
            end_time: Utc::now(),
            requests: self.stats,
            pages_fetched: outcome.pages_fetched,
            raw_records: outcome.raw_records,
            records: self.records,
            validation: outcome.validation,
            delay_multiplier: outcome.delay_multiplier,
            stop_reason: outcome.stop_reason,
            issues,
        }
    }
}

/// Everything the engine learned besides the records and counters
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub stop_reason: StopReason,
    pub validation: ValidationStats,
    pub delay_multiplier: f64,
    pub pages_fetched: u32,
    pub raw_records: u64,
}

/// A completed run; consumed read-only by the scorer and the reporter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedRun {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub requests: RequestStats,
    pub pages_fetched: u32,
    /// Rows received from the API before validation
    pub raw_records: u64,
    pub records: Vec<Record>,
    pub validation: ValidationStats,
    /// Multiplier at the end of the run
    pub delay_multiplier: f64,
    pub stop_reason: StopReason,
    /// Problems worth surfacing in the summary
    pub issues: Vec<String>,
}

impl FinalizedRun {
    /// Wall-clock duration in seconds
    pub fn duration_secs(&self) -> f64 {
        (self.end_time - self.start_time).num_milliseconds() as f64 / 1000.0
    }

    /// Whether collection stopped early on an error
    pub fn is_partial(&self) -> bool {
        self.stop_reason.is_failure()
    }
}

fn collect_issues(stats: &RequestStats, outcome: &RunOutcome) -> Vec<String> {
    let mut issues = Vec::new();

    if outcome.stop_reason.is_failure() {
        issues.push(format!(
            "Collection stopped early ({}); partial results kept",
            outcome.stop_reason.describe()
        ));
    }
    if stats.failed_requests > 0 {
        issues.push(format!(
            "{} of {} request attempts failed",
            stats.failed_requests, stats.total_requests
        ));
    }

    let rejected = &outcome.validation.rejected;
    if rejected.missing_field > 0 {
        issues.push(format!(
            "{} rows rejected for missing required fields",
            rejected.missing_field
        ));
    }
    if rejected.invalid_ticker_format > 0 {
        issues.push(format!(
            "{} rows rejected for invalid ticker format",
            rejected.invalid_ticker_format
        ));
    }
    if rejected.duplicate_ticker > 0 {
        issues.push(format!(
            "{} duplicate rows dropped ({} distinct tickers)",
            rejected.duplicate_ticker,
            outcome.validation.duplicate_tickers.len()
        ));
    }
    if outcome.pages_fetched > 0 && outcome.validation.accepted == 0 {
        issues.push("No records passed validation".to_string());
    }

    issues
}
