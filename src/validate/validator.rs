//! Required-field, ticker syntax and duplicate checks

use super::types::{RejectReason, Rejection, Validation, ValidationStats};
use crate::config::ValidationConfig;
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue, Record, RecordField};
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// Stateful validator for one collection run.
///
/// Checks run in a fixed order: missing fields, then ticker syntax, then
/// duplicates. Only accepted tickers enter the seen-set, so the first
/// *valid* occurrence of a ticker wins.
#[derive(Debug)]
pub struct Validator {
    required: Vec<RecordField>,
    ticker_pattern: Regex,
    seen: HashSet<String>,
    stats: ValidationStats,
}

impl Validator {
    /// Build a validator from config
    pub fn new(config: &ValidationConfig) -> Result<Self> {
        if !config.required_fields.contains(&RecordField::Ticker) {
            return Err(Error::invalid_value(
                "validation.required_fields",
                "must include 'ticker'",
            ));
        }
        let ticker_pattern = Regex::new(&config.ticker_pattern)
            .map_err(|e| Error::invalid_value("validation.ticker_pattern", e.to_string()))?;

        Ok(Self {
            required: config.required_fields.clone(),
            ticker_pattern,
            seen: HashSet::new(),
            stats: ValidationStats::default(),
        })
    }

    /// Validate one raw row
    pub fn validate(&mut self, raw: &JsonValue) -> Validation {
        let outcome = self.check(raw);
        match &outcome {
            Ok(record) => {
                self.seen.insert(record.ticker.clone());
                self.stats.accepted += 1;
            }
            Err(rejection) => {
                debug!("Rejected row: {rejection}");
                self.note_rejection(rejection);
            }
        }
        outcome
    }

    /// Totals so far
    pub fn stats(&self) -> &ValidationStats {
        &self.stats
    }

    /// Consume the validator, keeping its totals
    pub fn into_stats(self) -> ValidationStats {
        self.stats
    }

    fn check(&mut self, raw: &JsonValue) -> Validation {
        let Some(obj) = raw.as_object() else {
            return Err(Rejection::new(
                RejectReason::MissingField,
                None,
                "row is not a JSON object",
            ));
        };

        let ticker = text_field(obj, RecordField::Ticker);

        let missing: Vec<RecordField> = self
            .required
            .iter()
            .copied()
            .filter(|field| text_field(obj, *field).is_none())
            .collect();
        if !missing.is_empty() {
            for field in &missing {
                *self.stats.missing_by_field.entry(*field).or_default() += 1;
            }
            let names: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
            return Err(Rejection::new(
                RejectReason::MissingField,
                ticker,
                format!("missing or empty: {}", names.join(", ")),
            ));
        }

        // Required fields always include the ticker, so it is present here.
        let ticker = ticker.unwrap_or_default();

        if !self.ticker_pattern.is_match(&ticker) {
            return Err(Rejection::new(
                RejectReason::InvalidTickerFormat,
                Some(ticker),
                format!("does not match {}", self.ticker_pattern.as_str()),
            ));
        }

        if self.seen.contains(&ticker) {
            return Err(Rejection::new(
                RejectReason::DuplicateTicker,
                Some(ticker),
                "ticker already collected",
            ));
        }

        let field = |f: RecordField| text_field(obj, f).unwrap_or_default();
        Ok(Record {
            ticker,
            name: field(RecordField::Name),
            market: field(RecordField::Market),
            locale: field(RecordField::Locale),
            primary_exchange: field(RecordField::PrimaryExchange),
        })
    }

    fn note_rejection(&mut self, rejection: &Rejection) {
        self.stats.rejected.increment(rejection.reason);
        match (rejection.reason, &rejection.ticker) {
            (RejectReason::DuplicateTicker, Some(ticker)) => {
                if !self.stats.duplicate_tickers.contains(ticker) {
                    self.stats.duplicate_tickers.push(ticker.clone());
                }
            }
            (RejectReason::InvalidTickerFormat, Some(ticker)) => {
                self.stats.invalid_tickers.push(ticker.clone());
            }
            _ => {}
        }
    }
}

/// A field's trimmed string value, `None` when absent, null, blank or not a string
fn text_field(obj: &JsonObject, field: RecordField) -> Option<String> {
    obj.get(field.as_str())
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
