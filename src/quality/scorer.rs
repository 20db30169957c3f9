//! Completeness and distribution calculations

use super::types::{Anomalies, FieldCompleteness, FieldDistribution, QualityReport, ValueCount};
use crate::config::QualityConfig;
use crate::types::{Record, RecordField};
use crate::validate::ValidationStats;
use std::collections::HashMap;

/// Scores a finalized record set.
///
/// Scoring is a pure function of its inputs: the same records and
/// validation totals always give an identical report.
#[derive(Debug, Clone)]
pub struct QualityScorer {
    top_n: usize,
    distribution_fields: Vec<RecordField>,
}

impl QualityScorer {
    pub fn new(config: &QualityConfig) -> Self {
        Self {
            top_n: config.top_n,
            distribution_fields: config.distribution_fields.clone(),
        }
    }

    /// Build the quality report.
    ///
    /// `overall_score` is the plain mean of the five completeness ratios.
    /// It is a simple indicator of how filled-in the data set is, not a
    /// statistically grounded quality measure: every field weighs the same
    /// and validity beyond presence is not scored.
    pub fn score(&self, records: &[Record], validation: &ValidationStats) -> QualityReport {
        let completeness: Vec<FieldCompleteness> = RecordField::ALL
            .into_iter()
            .map(|field| self::completeness(records, field))
            .collect();

        let overall_score =
            completeness.iter().map(|c| c.completeness).sum::<f64>() / completeness.len() as f64;

        let distributions = self
            .distribution_fields
            .iter()
            .map(|field| distribution(records, *field, self.top_n))
            .collect();

        QualityReport {
            record_count: records.len(),
            overall_score,
            completeness,
            distributions,
            rejections: validation.rejected,
            anomalies: Anomalies {
                duplicate_tickers: validation.duplicate_tickers.clone(),
                invalid_tickers: validation.invalid_tickers.clone(),
                missing_by_field: validation.missing_by_field.clone(),
            },
        }
    }
}

/// Completeness of one field
pub fn completeness(records: &[Record], field: RecordField) -> FieldCompleteness {
    let total = records.len();
    let populated = records
        .iter()
        .filter(|r| !r.get(field).trim().is_empty())
        .count();
    let ratio = if total == 0 {
        0.0
    } else {
        populated as f64 / total as f64
    };

    FieldCompleteness {
        field,
        populated,
        total,
        completeness: ratio,
    }
}

/// Frequency table of one field, truncated to `top_n`
pub fn distribution(records: &[Record], field: RecordField, top_n: usize) -> FieldDistribution {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        let value = record.get(field).trim();
        if !value.is_empty() {
            *counts.entry(value).or_default() += 1;
        }
    }

    let distinct = counts.len();
    let mut entries: Vec<(&str, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let total = records.len() as f64;
    let top = entries
        .into_iter()
        .take(top_n)
        .map(|(value, count)| ValueCount {
            value: value.to_string(),
            count,
            share: count as f64 / total,
        })
        .collect();

    FieldDistribution {
        field,
        distinct,
        top,
    }
}
