//! Common types used throughout the ticker collector
//!
//! This module contains the reference-data record, its field catalogue,
//! the redacted API key wrapper and a few shared aliases.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Record
// ============================================================================

/// One validated reference-data row for a security.
///
/// Field names are part of the output contract; downstream consumers of
/// `records.json` key off them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Unique key, e.g. `AAPL` or `BRK.A`
    pub ticker: String,
    /// Issuer / instrument name
    pub name: String,
    /// Market class (`stocks`, `crypto`, `fx`, `otc`, `indices`)
    pub market: String,
    /// Locale (`us`, `global`)
    pub locale: String,
    /// Primary listing exchange MIC, e.g. `XNAS`
    pub primary_exchange: String,
}

impl Record {
    /// Get the value of a field by catalogue entry
    pub fn get(&self, field: RecordField) -> &str {
        match field {
            RecordField::Ticker => &self.ticker,
            RecordField::Name => &self.name,
            RecordField::Market => &self.market,
            RecordField::Locale => &self.locale,
            RecordField::PrimaryExchange => &self.primary_exchange,
        }
    }
}

// ============================================================================
// Record Fields
// ============================================================================

/// The five fields every [`Record`] carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    Ticker,
    Name,
    Market,
    Locale,
    PrimaryExchange,
}

impl RecordField {
    /// All fields in output order
    pub const ALL: [RecordField; 5] = [
        RecordField::Ticker,
        RecordField::Name,
        RecordField::Market,
        RecordField::Locale,
        RecordField::PrimaryExchange,
    ];

    /// JSON key used by the upstream API and the output files
    pub fn as_str(self) -> &'static str {
        match self {
            RecordField::Ticker => "ticker",
            RecordField::Name => "name",
            RecordField::Market => "market",
            RecordField::Locale => "locale",
            RecordField::PrimaryExchange => "primary_exchange",
        }
    }

    /// Human-readable description for the variable dictionary
    pub fn description(self) -> &'static str {
        match self {
            RecordField::Ticker => "Exchange symbol uniquely identifying the security",
            RecordField::Name => "Registered name of the security or issuer",
            RecordField::Market => "Market type the security trades in",
            RecordField::Locale => "Geographic locale of the market",
            RecordField::PrimaryExchange => "ISO 10383 MIC of the primary listing exchange",
        }
    }

    /// Example value for the variable dictionary
    pub fn example(self) -> &'static str {
        match self {
            RecordField::Ticker => "AAPL",
            RecordField::Name => "Apple Inc.",
            RecordField::Market => "stocks",
            RecordField::Locale => "us",
            RecordField::PrimaryExchange => "XNAS",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// API Key
// ============================================================================

/// Upstream API key. `Debug` and `Display` never reveal the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a raw key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for placing on the wire only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}
