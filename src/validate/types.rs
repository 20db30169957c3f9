//! Validation outcome types

use crate::types::{Record, RecordField};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of validating one raw row
pub type Validation = std::result::Result<Record, Rejection>;

/// Why a row was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// A required field is absent, null, empty or not a string
    MissingField,
    /// The ticker does not match the accepted symbol syntax
    InvalidTickerFormat,
    /// The ticker was already accepted earlier in the run
    DuplicateTicker,
}

impl RejectReason {
    /// All reasons in report order
    pub const ALL: [RejectReason; 3] = [
        RejectReason::MissingField,
        RejectReason::InvalidTickerFormat,
        RejectReason::DuplicateTicker,
    ];

    /// Stable reason code
    pub fn code(self) -> &'static str {
        match self {
            RejectReason::MissingField => "missing_field",
            RejectReason::InvalidTickerFormat => "invalid_ticker_format",
            RejectReason::DuplicateTicker => "duplicate_ticker",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A rejected row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub reason: RejectReason,
    /// Ticker of the row, when it had a usable one
    pub ticker: Option<String>,
    pub detail: String,
}

impl Rejection {
    pub(crate) fn new(
        reason: RejectReason,
        ticker: Option<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            reason,
            ticker,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ticker {
            Some(ticker) => write!(f, "{} ({}): {}", self.reason, ticker, self.detail),
            None => write!(f, "{}: {}", self.reason, self.detail),
        }
    }
}

/// Rejection tallies keyed by reason code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionCounts {
    pub missing_field: usize,
    pub invalid_ticker_format: usize,
    pub duplicate_ticker: usize,
}

impl RejectionCounts {
    /// Count for one reason
    pub fn get(&self, reason: RejectReason) -> usize {
        match reason {
            RejectReason::MissingField => self.missing_field,
            RejectReason::InvalidTickerFormat => self.invalid_ticker_format,
            RejectReason::DuplicateTicker => self.duplicate_ticker,
        }
    }

    /// Rows rejected for any reason
    pub fn total(&self) -> usize {
        self.missing_field + self.invalid_ticker_format + self.duplicate_ticker
    }

    pub(crate) fn increment(&mut self, reason: RejectReason) {
        match reason {
            RejectReason::MissingField => self.missing_field += 1,
            RejectReason::InvalidTickerFormat => self.invalid_ticker_format += 1,
            RejectReason::DuplicateTicker => self.duplicate_ticker += 1,
        }
    }
}

/// Running totals kept by the validator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationStats {
    /// Rows accepted as records
    pub accepted: usize,
    pub rejected: RejectionCounts,
    /// Tickers seen more than once, each listed once, first-seen order
    pub duplicate_tickers: Vec<String>,
    /// Tickers rejected for their syntax, in arrival order
    pub invalid_tickers: Vec<String>,
    /// Rejected rows per absent required field
    pub missing_by_field: BTreeMap<RecordField, usize>,
}

impl ValidationStats {
    /// Rows examined
    pub fn examined(&self) -> usize {
        self.accepted + self.rejected.total()
    }
}
