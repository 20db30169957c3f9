//! Tests for output module

use super::*;
use crate::config::{OutputConfig, QualityConfig, SourceConfig};
use crate::engine::{CollectionRun, FinalizedRun, RunOutcome, StopReason};
use crate::quality::{QualityReport, QualityScorer};
use crate::types::Record;
use crate::validate::ValidationStats;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

fn record(ticker: &str, exchange: &str) -> Record {
    Record {
        ticker: ticker.to_string(),
        name: format!("{ticker} Inc."),
        market: "stocks".to_string(),
        locale: "us".to_string(),
        primary_exchange: exchange.to_string(),
    }
}

fn finalized(records: Vec<Record>, stop_reason: StopReason) -> FinalizedRun {
    let mut run = CollectionRun::start();
    run.stats.record(true);
    run.stats.record(true);
    let mut validation = ValidationStats {
        accepted: records.len(),
        ..ValidationStats::default()
    };
    validation.rejected.duplicate_ticker = 1;
    validation.duplicate_tickers.push("AAPL".to_string());
    for r in records {
        run.push(r);
    }
    run.finalize(RunOutcome {
        stop_reason,
        validation,
        delay_multiplier: 0.8,
        pages_fetched: 2,
        raw_records: 4,
    })
}

fn score(run: &FinalizedRun) -> QualityReport {
    QualityScorer::new(&QualityConfig::default()).score(&run.records, &run.validation)
}

fn sample_run() -> FinalizedRun {
    finalized(
        vec![
            record("AAPL", "XNAS"),
            record("IBM", "XNYS"),
            record("MSFT", "XNAS"),
        ],
        StopReason::Exhausted,
    )
}

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// ============================================================================
// Writer Tests
// ============================================================================

#[test]
fn test_write_creates_all_artifacts() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("nested/output");
    let config = OutputConfig {
        dir: out.to_string_lossy().into_owned(),
        ..OutputConfig::default()
    };
    let run = sample_run();
    let report = score(&run);

    let artifacts = ArtifactWriter::new(&config, &SourceConfig::default())
        .write(&run, &report)
        .unwrap();

    for path in artifacts.paths() {
        assert!(path.exists(), "missing {}", path.display());
        assert!(path.starts_with(&out));
    }
    assert_eq!(artifacts.records, out.join("records.json"));
    assert_eq!(artifacts.summary_markdown, out.join("collection_summary.md"));
}

#[test]
fn test_records_json_is_array_of_records() {
    let dir = tempdir().unwrap();
    let config = OutputConfig {
        dir: dir.path().to_string_lossy().into_owned(),
        ..OutputConfig::default()
    };
    let run = sample_run();

    let artifacts = ArtifactWriter::new(&config, &SourceConfig::default())
        .write(&run, &score(&run))
        .unwrap();

    let records: Vec<Record> =
        serde_json::from_str(&fs::read_to_string(&artifacts.records).unwrap()).unwrap();
    assert_eq!(records, run.records);

    let first = &read_json(&artifacts.records)[0];
    let mut keys: Vec<&str> = first.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec!["locale", "market", "name", "primary_exchange", "ticker"]
    );
}

#[test]
fn test_metadata_document() {
    let dir = tempdir().unwrap();
    let config = OutputConfig {
        dir: dir.path().to_string_lossy().into_owned(),
        ..OutputConfig::default()
    };
    let run = sample_run();

    let artifacts = ArtifactWriter::new(&config, &SourceConfig::default())
        .write(&run, &score(&run))
        .unwrap();
    let metadata = read_json(&artifacts.metadata);

    assert_eq!(metadata["source"], "Polygon.io");
    assert_eq!(metadata["endpoint"], "/v3/reference/tickers");
    assert_eq!(metadata["record_count"], 3);
    assert_eq!(metadata["query_parameters"]["market"], "stocks");
    assert!(metadata["query_parameters"].get("apiKey").is_none());
    assert_eq!(metadata["variables"].as_array().unwrap().len(), 5);
    assert_eq!(metadata["variables"][0]["name"], "ticker");
    assert_eq!(metadata["variables"][0]["type"], "string");
    assert!(metadata["collection"]["start_time"].is_string());
    assert_eq!(metadata["tool"]["name"], crate::NAME);
}

#[test]
fn test_summary_json_counts() {
    let dir = tempdir().unwrap();
    let config = OutputConfig {
        dir: dir.path().to_string_lossy().into_owned(),
        ..OutputConfig::default()
    };
    let run = sample_run();

    let artifacts = ArtifactWriter::new(&config, &SourceConfig::default())
        .write(&run, &score(&run))
        .unwrap();
    let summary: CollectionSummary =
        serde_json::from_str(&fs::read_to_string(&artifacts.summary_json).unwrap()).unwrap();

    assert_eq!(summary.total_requests, 2);
    assert_eq!(summary.successful_requests, 2);
    assert_eq!(summary.success_rate, 1.0);
    assert_eq!(summary.records_collected, 3);
    assert_eq!(summary.records_rejected, 1);
    assert_eq!(summary.pages_fetched, 2);
    assert_eq!(summary.stop_reason, StopReason::Exhausted);
    assert!(!summary.partial);
    assert_eq!(summary.apis_used, vec!["Polygon.io".to_string()]);
}

#[test]
fn test_write_fails_when_dir_is_a_file() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("taken");
    fs::write(&blocker, "not a directory").unwrap();
    let config = OutputConfig {
        dir: blocker.to_string_lossy().into_owned(),
        ..OutputConfig::default()
    };
    let run = sample_run();

    let err = ArtifactWriter::new(&config, &SourceConfig::default())
        .write(&run, &score(&run))
        .unwrap_err();
    assert!(matches!(err, crate::error::Error::Output { .. }));
}

// ============================================================================
// Markdown Tests
// ============================================================================

#[test]
fn test_quality_markdown_sections() {
    let run = sample_run();
    let md = render_quality_report(&score(&run));

    assert!(md.starts_with("# Data Quality Report"));
    assert!(md.contains("- **Records:** 3"));
    assert!(md.contains("- **Overall score:** 1.000"));
    assert!(md.contains("| ticker | 3 | 3 | 100.0% |"));
    assert!(md.contains("### primary_exchange (2 distinct)"));
    assert!(md.contains("| XNAS | 2 | 66.7% |"));
    assert!(md.contains("| duplicate_ticker | 1 |"));
    assert!(md.contains("- **Duplicate tickers:** AAPL"));
    assert!(md.contains("not a statistically rigorous"));
}

#[test]
fn test_summary_markdown_partial_banner() {
    let run = finalized(
        vec![record("AAPL", "XNAS")],
        StopReason::PageFailed {
            page: 3,
            error: "HTTP 503".to_string(),
        },
    );
    let summary = CollectionSummary::new(&run, &score(&run), &SourceConfig::default());
    let md = render_summary(&summary);

    assert!(md.contains("**Partial result:**"));
    assert!(md.contains("page 3 failed: HTTP 503"));
    assert!(md.contains("| Records collected | 1 |"));
    assert!(md.contains("## Recommendations"));
}

#[test]
fn test_markdown_escapes_pipes() {
    let mut odd = record("ODD", "X|Y");
    odd.name = "Odd".to_string();
    let run = finalized(vec![odd], StopReason::Exhausted);
    let md = render_quality_report(&score(&run));
    assert!(md.contains("| X\\|Y | 1 | 100.0% |"));
}

#[test]
fn test_summary_markdown_flattens_error_text() {
    let run = finalized(
        vec![record("AAPL", "XNAS")],
        StopReason::PageFailed {
            page: 2,
            error: "bad|body\nline2".to_string(),
        },
    );
    let summary = CollectionSummary::new(&run, &score(&run), &SourceConfig::default());
    let md = render_summary(&summary);

    assert!(md.contains("| Stop reason | page 2 failed: bad\\|body line2 |"));
    assert!(md.contains("collection stopped early (page 2 failed: bad\\|body line2)"));
    assert!(md.contains(
        "- Collection stopped early (page 2 failed: bad\\|body line2); partial results kept"
    ));
    assert!(!md.contains("\nline2"));
}

// ============================================================================
// Recommendation Tests
// ============================================================================

#[test]
fn test_recommendations_for_caps_and_duplicates() {
    let run = finalized(
        vec![record("AAPL", "XNAS")],
        StopReason::RecordCapReached { limit: 1 },
    );
    let recs = recommendations(&run, &score(&run));

    assert!(recs[0].contains("limits.max_records"));
    assert!(recs.iter().any(|r| r.contains("more than once")));
    assert!(!recs.iter().any(|r| r.contains("No action needed")));
}

#[test]
fn test_recommendations_for_auth_failure() {
    let run = finalized(
        Vec::new(),
        StopReason::AuthRejected {
            error: "401".to_string(),
        },
    );
    let recs = recommendations(&run, &score(&run));
    assert!(recs[0].contains("API key"));
    assert!(!recs.iter().any(|r| r.contains("No records were collected")));
}

#[test]
fn test_recommendations_for_low_success_rate() {
    let mut run = sample_run();
    run.requests.record(false);
    run.requests.record(false);
    run.requests.record(false);
    run.delay_multiplier = 4.0;

    let recs = recommendations(&run, &score(&run));
    assert!(recs.iter().any(|r| r.contains("40% of requests succeeded")));
    assert!(recs.iter().any(|r| r.contains("Delay multiplier ended at 4.00")));
}

#[test]
fn test_recommendations_clean_run() {
    let mut run = sample_run();
    run.validation = ValidationStats {
        accepted: 3,
        ..ValidationStats::default()
    };
    let recs = recommendations(&run, &score(&run));
    assert_eq!(recs.len(), 1);
    assert!(recs[0].starts_with("No action needed"));
}
