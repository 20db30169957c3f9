//! Serializable documents written next to the records
//!
//! Field names are the JSON contract of `metadata.json` and
//! `collection_summary.json`.

use crate::config::SourceConfig;
use crate::engine::{FinalizedRun, StopReason};
use crate::quality::QualityReport;
use crate::types::RecordField;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Success rate below which slowing down is recommended
const LOW_SUCCESS_RATE: f64 = 0.8;
/// Final multiplier at or above which the run is considered throttled
const HIGH_MULTIPLIER: f64 = 4.0;

/// One entry of the variable dictionary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub example: String,
}

impl From<RecordField> for VariableInfo {
    fn from(field: RecordField) -> Self {
        Self {
            name: field.as_str().to_string(),
            kind: "string".to_string(),
            description: field.description().to_string(),
            example: field.example().to_string(),
        }
    }
}

/// When the data was collected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionWindow {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_secs: f64,
}

/// Tool that produced the artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub version: String,
}

impl Default for ToolInfo {
    fn default() -> Self {
        Self {
            name: crate::NAME.to_string(),
            version: crate::VERSION.to_string(),
        }
    }
}

/// Contents of `metadata.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub source: String,
    pub base_url: String,
    pub endpoint: String,
    /// Query parameters of the first request; never includes the API key
    pub query_parameters: BTreeMap<String, String>,
    pub variables: Vec<VariableInfo>,
    pub collection: CollectionWindow,
    pub record_count: usize,
    pub tool: ToolInfo,
}

impl Metadata {
    pub fn new(run: &FinalizedRun, source: &SourceConfig) -> Self {
        Self {
            source: source.provider.clone(),
            base_url: source.base_url.clone(),
            endpoint: source.endpoint.clone(),
            query_parameters: source.query_params(),
            variables: RecordField::ALL.into_iter().map(VariableInfo::from).collect(),
            collection: CollectionWindow {
                start_time: run.start_time,
                end_time: run.end_time,
                duration_secs: run.duration_secs(),
            },
            record_count: run.records.len(),
            tool: ToolInfo::default(),
        }
    }
}

/// Contents of `collection_summary.json`, also rendered as Markdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_secs: f64,
    pub endpoint: String,
    pub apis_used: Vec<String>,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub success_rate: f64,
    pub pages_fetched: u32,
    pub raw_records: u64,
    pub records_collected: usize,
    pub records_rejected: usize,
    pub data_quality_score: f64,
    pub delay_multiplier: f64,
    pub partial: bool,
    pub stop_reason: StopReason,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

impl CollectionSummary {
    pub fn new(run: &FinalizedRun, report: &QualityReport, source: &SourceConfig) -> Self {
        Self {
            start_time: run.start_time,
            end_time: run.end_time,
            duration_secs: run.duration_secs(),
            endpoint: source.endpoint.clone(),
            apis_used: vec![source.provider.clone()],
            total_requests: run.requests.total_requests,
            successful_requests: run.requests.successful_requests,
            failed_requests: run.requests.failed_requests,
            success_rate: run.requests.success_rate(),
            pages_fetched: run.pages_fetched,
            raw_records: run.raw_records,
            records_collected: run.records.len(),
            records_rejected: run.validation.rejected.total(),
            data_quality_score: report.overall_score,
            delay_multiplier: run.delay_multiplier,
            partial: run.is_partial(),
            stop_reason: run.stop_reason.clone(),
            issues: run.issues.clone(),
            recommendations: recommendations(run, report),
        }
    }
}

/// Follow-up actions derived from a run and its quality report
pub fn recommendations(run: &FinalizedRun, report: &QualityReport) -> Vec<String> {
    let mut out = Vec::new();

    match &run.stop_reason {
        StopReason::AuthRejected { .. } => out.push(
            "Check the API key: the provider rejected it. Set POLYGON_API_KEY or auth.api_key and re-run."
                .to_string(),
        ),
        StopReason::PageFailed { page, .. } => out.push(format!(
            "Collection stopped at page {page}; re-run later or raise retry.max_attempts to collect the rest."
        )),
        StopReason::RecordCapReached { limit } => out.push(format!(
            "Record cap of {limit} reached; raise limits.max_records for a fuller dataset."
        )),
        StopReason::PageCapReached { limit } => out.push(format!(
            "Page cap of {limit} reached; raise limits.max_pages for a fuller dataset."
        )),
        StopReason::Exhausted => {}
    }

    if run.requests.total_requests > 0 && run.requests.success_rate() < LOW_SUCCESS_RATE {
        out.push(format!(
            "Only {:.0}% of requests succeeded; increase rate.base_delay_secs or lower rate.requests_per_minute.",
            run.requests.success_rate() * 100.0
        ));
    }
    if run.delay_multiplier >= HIGH_MULTIPLIER {
        out.push(format!(
            "Delay multiplier ended at {:.2}; the API was throttling, consider a slower schedule.",
            run.delay_multiplier
        ));
    }

    for field in report.incomplete_fields() {
        if let Some(ratio) = report.completeness_of(field) {
            out.push(format!(
                "Field '{field}' is {:.1}% complete; add it to validation.required_fields or backfill it.",
                ratio * 100.0
            ));
        }
    }

    if !report.anomalies.duplicate_tickers.is_empty() {
        out.push(format!(
            "{} tickers were returned more than once; the first occurrence was kept.",
            report.anomalies.duplicate_tickers.len()
        ));
    }
    if !report.anomalies.invalid_tickers.is_empty() {
        out.push(format!(
            "{} tickers failed the syntax check; review validation.ticker_pattern if they are legitimate.",
            report.anomalies.invalid_tickers.len()
        ));
    }
    if run.records.is_empty() && !run.stop_reason.is_failure() {
        out.push("No records were collected; check the market filter and endpoint.".to_string());
    }

    if out.is_empty() {
        out.push("No action needed; the dataset is complete for the configured scope.".to_string());
    }
    out
}
