//! Quality report types
//!
//! Field names here are the JSON contract of `quality_report.json`.

use crate::types::RecordField;
use crate::validate::RejectionCounts;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Share of records with a populated field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCompleteness {
    pub field: RecordField,
    /// Records with a non-empty value
    pub populated: usize,
    pub total: usize,
    /// `populated / total`, 0.0 for an empty record set
    pub completeness: f64,
}

/// One entry of a value distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
    /// `count / record_count`
    pub share: f64,
}

/// Most frequent values of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDistribution {
    pub field: RecordField,
    /// Distinct non-empty values before truncation
    pub distinct: usize,
    /// Sorted by count descending, then value ascending
    pub top: Vec<ValueCount>,
}

/// Problems found while validating
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anomalies {
    pub duplicate_tickers: Vec<String>,
    pub invalid_tickers: Vec<String>,
    pub missing_by_field: BTreeMap<RecordField, usize>,
}

/// Derived view over a finalized run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub record_count: usize,
    /// Unweighted mean of the per-field completeness ratios
    pub overall_score: f64,
    pub completeness: Vec<FieldCompleteness>,
    pub distributions: Vec<FieldDistribution>,
    pub rejections: RejectionCounts,
    pub anomalies: Anomalies,
}

impl QualityReport {
    /// Completeness ratio of one field
    pub fn completeness_of(&self, field: RecordField) -> Option<f64> {
        self.completeness
            .iter()
            .find(|c| c.field == field)
            .map(|c| c.completeness)
    }

    /// Distribution of one field, if it was summarised
    pub fn distribution_of(&self, field: RecordField) -> Option<&FieldDistribution> {
        self.distributions.iter().find(|d| d.field == field)
    }

    /// Fields whose completeness is below 1.0
    pub fn incomplete_fields(&self) -> Vec<RecordField> {
        self.completeness
            .iter()
            .filter(|c| c.total > 0 && c.populated < c.total)
            .map(|c| c.field)
            .collect()
    }
}
