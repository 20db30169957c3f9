//! Tests for engine module

use super::*;
use crate::config::RateConfig;
use crate::types::Record;
use crate::validate::ValidationStats;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TICKERS: &str = "/v3/reference/tickers";

fn row(ticker: &str, name: &str) -> Value {
    json!({
        "ticker": ticker,
        "name": name,
        "market": "stocks",
        "locale": "us",
        "primary_exchange": "XNYS"
    })
}

fn config_for(server: &MockServer) -> CollectorConfig {
    let mut config = CollectorConfig::default();
    config.source.base_url = server.uri();
    config.rate = RateConfig::immediate();
    config.limits.max_pages = None;
    config
}

async fn run(config: &CollectorConfig) -> FinalizedRun {
    CollectionEngine::from_config(config, ApiKey::new("test-key"))
        .unwrap()
        .run()
        .await
}

async fn mount_first_page(server: &MockServer, rows: Vec<Value>, next: Option<&str>) {
    let mut body = json!({"status": "OK", "results": rows});
    if let Some(cursor) = next {
        body["next_url"] = json!(format!("{}{}?cursor={}", server.uri(), TICKERS, cursor));
    }
    Mock::given(method("GET"))
        .and(path(TICKERS))
        .and(query_param("market", "stocks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_cursor_page(server: &MockServer, cursor: &str, rows: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path(TICKERS))
        .and(query_param("cursor", cursor))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "OK", "results": rows})),
        )
        .mount(server)
        .await;
}

// ============================================================================
// Engine Tests
// ============================================================================

#[tokio::test]
async fn test_follows_cursor_until_exhausted() {
    let server = MockServer::start().await;
    mount_first_page(&server, vec![row("A", "Agilent"), row("AA", "Alcoa")], Some("p2")).await;
    mount_cursor_page(&server, "p2", vec![row("AAPL", "Apple")]).await;

    let finalized = run(&config_for(&server)).await;

    assert_eq!(finalized.stop_reason, StopReason::Exhausted);
    assert_eq!(finalized.pages_fetched, 2);
    assert_eq!(finalized.raw_records, 3);
    let tickers: Vec<&str> = finalized.records.iter().map(|r| r.ticker.as_str()).collect();
    assert_eq!(tickers, vec!["A", "AA", "AAPL"]);
    assert_eq!(finalized.requests.total_requests, 2);
    assert_eq!(finalized.requests.successful_requests, 2);
    assert!(!finalized.is_partial());
    assert!(finalized.issues.is_empty());
}

#[tokio::test]
async fn test_duplicates_across_pages_keep_first() {
    let server = MockServer::start().await;
    mount_first_page(&server, vec![row("ABC", "First")], Some("p2")).await;
    mount_cursor_page(&server, "p2", vec![row("ABC", "Second"), row("XYZ", "Other")]).await;

    let finalized = run(&config_for(&server)).await;

    assert_eq!(finalized.records.len(), 2);
    assert_eq!(finalized.records[0].name, "First");
    assert_eq!(finalized.validation.rejected.duplicate_ticker, 1);
    assert_eq!(finalized.validation.duplicate_tickers, vec!["ABC".to_string()]);
}

#[tokio::test]
async fn test_record_cap_stops_mid_page() {
    let server = MockServer::start().await;
    let rows = vec![
        row("A", "a"),
        row("B", "b"),
        row("C", "c"),
        row("D", "d"),
        row("E", "e"),
    ];
    mount_first_page(&server, rows, Some("p2")).await;

    let mut config = config_for(&server);
    config.limits.max_records = 3;
    let finalized = run(&config).await;

    assert_eq!(finalized.stop_reason, StopReason::RecordCapReached { limit: 3 });
    assert_eq!(finalized.records.len(), 3);
    assert_eq!(finalized.raw_records, 5);
    // Rows past the cap are never validated
    assert_eq!(finalized.validation.examined(), 3);
    assert_eq!(finalized.pages_fetched, 1);
}

#[tokio::test]
async fn test_page_cap() {
    let server = MockServer::start().await;
    mount_first_page(&server, vec![row("A", "a")], Some("p2")).await;
    Mock::given(method("GET"))
        .and(query_param("cursor", "p2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.limits.max_pages = Some(1);
    let finalized = run(&config).await;

    assert_eq!(finalized.stop_reason, StopReason::PageCapReached { limit: 1 });
    assert_eq!(finalized.records.len(), 1);
}

#[tokio::test]
async fn test_failed_page_keeps_partial_results() {
    let server = MockServer::start().await;
    mount_first_page(&server, vec![row("A", "a"), row("B", "b")], Some("p2")).await;
    Mock::given(method("GET"))
        .and(query_param("cursor", "p2"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let finalized = run(&config_for(&server)).await;

    assert!(matches!(
        finalized.stop_reason,
        StopReason::PageFailed { page: 2, .. }
    ));
    assert!(finalized.is_partial());
    assert_eq!(finalized.records.len(), 2);
    assert_eq!(finalized.pages_fetched, 1);
    assert_eq!(finalized.requests.total_requests, 4);
    assert_eq!(finalized.requests.failed_requests, 3);
    assert!(finalized.delay_multiplier > 1.0);
    assert!(finalized
        .issues
        .iter()
        .any(|issue| issue.contains("partial results kept")));
}

#[tokio::test]
async fn test_auth_rejection_stops_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let finalized = run(&config_for(&server)).await;

    assert!(matches!(
        finalized.stop_reason,
        StopReason::AuthRejected { .. }
    ));
    assert!(finalized.records.is_empty());
    assert_eq!(finalized.pages_fetched, 0);
}

#[tokio::test]
async fn test_invalid_rows_are_counted_not_kept() {
    let server = MockServer::start().await;
    mount_first_page(
        &server,
        vec![
            row("GOOD", "Fine"),
            json!({"ticker": "NONAME", "market": "stocks", "locale": "us", "primary_exchange": "XNAS"}),
            row("BAD TICKER", "Spaces"),
        ],
        None,
    )
    .await;

    let finalized = run(&config_for(&server)).await;

    assert_eq!(finalized.records.len(), 1);
    assert_eq!(finalized.validation.rejected.missing_field, 1);
    assert_eq!(finalized.validation.rejected.invalid_ticker_format, 1);
    assert_eq!(finalized.issues.len(), 2);
}

// ============================================================================
// Type Tests
// ============================================================================

#[test]
fn test_request_stats_success_rate() {
    let mut stats = RequestStats::new();
    assert_eq!(stats.success_rate(), 1.0);

    stats.record(true);
    stats.record(false);
    stats.record(true);
    stats.record(true);
    assert_eq!(stats.total_requests, 4);
    assert_eq!(stats.failed_requests, 1);
    assert_eq!(stats.success_rate(), 0.75);
}

#[test]
fn test_stop_reason_serialization() {
    let reason = StopReason::PageFailed {
        page: 2,
        error: "boom".to_string(),
    };
    let value = serde_json::to_value(&reason).unwrap();
    assert_eq!(value, json!({"kind": "page_failed", "page": 2, "error": "boom"}));

    let value = serde_json::to_value(StopReason::Exhausted).unwrap();
    assert_eq!(value, json!({"kind": "exhausted"}));
}

#[test]
fn test_stop_reason_failure_flag() {
    assert!(!StopReason::Exhausted.is_failure());
    assert!(!StopReason::RecordCapReached { limit: 1 }.is_failure());
    assert!(!StopReason::PageCapReached { limit: 1 }.is_failure());
    assert!(StopReason::AuthRejected {
        error: "401".to_string()
    }
    .is_failure());
}

#[test]
fn test_finalize_carries_outcome() {
    let mut run = CollectionRun::start();
    run.stats.record(true);
    run.push(Record {
        ticker: "A".to_string(),
        name: "Agilent".to_string(),
        market: "stocks".to_string(),
        locale: "us".to_string(),
        primary_exchange: "XNYS".to_string(),
    });
    let start = run.start_time();

    let finalized = run.finalize(RunOutcome {
        stop_reason: StopReason::Exhausted,
        validation: ValidationStats {
            accepted: 1,
            ..ValidationStats::default()
        },
        delay_multiplier: 0.8,
        pages_fetched: 1,
        raw_records: 1,
    });

    assert_eq!(finalized.start_time, start);
    assert!(finalized.end_time >= start);
    assert!(finalized.duration_secs() >= 0.0);
    assert_eq!(finalized.records.len(), 1);
    assert_eq!(finalized.delay_multiplier, 0.8);
    assert!(finalized.issues.is_empty());
}

#[test]
fn test_finalize_flags_empty_result() {
    let run = CollectionRun::start();
    let finalized = run.finalize(RunOutcome {
        stop_reason: StopReason::Exhausted,
        validation: ValidationStats::default(),
        delay_multiplier: 1.0,
        pages_fetched: 1,
        raw_records: 0,
    });
    assert_eq!(finalized.issues, vec!["No records passed validation".to_string()]);
}
