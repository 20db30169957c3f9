//! Page fetcher
//!
//! Requests one page of the ticker listing, retrying transient failures with
//! delays taken from the [`RateGovernor`]. Exhausted retries surface as an
//! error; the engine decides what that means for the run.

use crate::config::{CollectorConfig, RetryConfig, SourceConfig};
use crate::engine::RequestStats;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RateGovernor, RateLimiterConfig, RequestConfig};
use crate::pagination::PageCursor;
use crate::types::{ApiKey, JsonValue};
use reqwest::header::HeaderMap;
use serde::Deserialize;
use tracing::{debug, warn};

/// One page of raw rows
#[derive(Debug, Clone)]
pub struct Page {
    /// Rows exactly as the API returned them
    pub records: Vec<JsonValue>,
    /// Continuation token, `None` on the last page
    pub next: Option<PageCursor>,
    /// The API's own status field (`OK`, `DELAYED`, ...)
    pub status: Option<String>,
    /// Row count reported by the API for this page
    pub count: Option<u64>,
}

/// Response body of the reference tickers endpoint
#[derive(Debug, Deserialize)]
struct TickerPageBody {
    #[serde(default)]
    results: Vec<JsonValue>,
    #[serde(default)]
    next_url: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    count: Option<u64>,
}

/// Fetches pages from the reference tickers endpoint
#[derive(Debug)]
pub struct Fetcher {
    client: HttpClient,
    source: SourceConfig,
    retry: RetryConfig,
    api_key: ApiKey,
    api_key_param: String,
}

impl Fetcher {
    /// Build a fetcher and its HTTP client from config
    pub fn from_config(config: &CollectorConfig, api_key: ApiKey) -> Result<Self> {
        let mut http = HttpClientConfig::builder()
            .base_url(config.source.base_url.clone())
            .timeout(config.retry.timeout());
        http = match config.rate.requests_per_minute {
            Some(rpm) => http.rate_limit(RateLimiterConfig::per_minute(rpm)),
            None => http.no_rate_limit(),
        };
        let client = HttpClient::with_config(http.build())?;

        Ok(Self::new(
            client,
            config.source.clone(),
            config.retry.clone(),
            api_key,
            config.auth.query_param.clone(),
        ))
    }

    /// Create a fetcher around an existing client
    pub fn new(
        client: HttpClient,
        source: SourceConfig,
        retry: RetryConfig,
        api_key: ApiKey,
        api_key_param: impl Into<String>,
    ) -> Self {
        Self {
            client,
            source,
            retry,
            api_key,
            api_key_param: api_key_param.into(),
        }
    }

    /// Fetch the page at `cursor` (`None` = first page).
    ///
    /// Every HTTP attempt is counted in `stats` and recorded in the
    /// governor's window. Retryable failures are retried up to
    /// `retry.max_attempts` attempts in total.
    pub async fn fetch_page(
        &self,
        cursor: Option<&PageCursor>,
        governor: &mut RateGovernor,
        stats: &mut RequestStats,
    ) -> Result<Page> {
        let (url, request) = self.request_for(cursor, None);
        let max_attempts = self.retry.max_attempts;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = self.attempt(&url, &request, governor).await;
            stats.record(result.is_ok());
            governor.record(result.is_ok());

            let err = match result {
                Ok(page) => return Ok(page),
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(err);
            }
            if attempt >= max_attempts {
                return Err(Error::MaxRetriesExceeded {
                    max_attempts,
                    last: Box::new(err),
                });
            }

            let rate = governor.recent_success_rate();
            let mut delay = governor.next_delay(rate);
            if let Some(retry_after) = err.retry_after() {
                delay = delay.max(retry_after.min(self.retry.max_retry_after()));
            }
            warn!(
                "Request attempt {}/{} failed: {}; retrying in {:.2}s",
                attempt,
                max_attempts,
                err,
                delay.as_secs_f64()
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Single request for a small first page; returns the raw body
    pub async fn sample(&self, limit: u32) -> Result<JsonValue> {
        let (url, request) = self.request_for(None, Some(limit));
        let response = self.client.send(&url, &request).await?;
        response
            .json()
            .await
            .map_err(|e| Error::decode(format!("Response is not JSON: {}", e.without_url())))
    }

    /// URL and query for a page; the key is always appended
    fn request_for(&self, cursor: Option<&PageCursor>, limit: Option<u32>) -> (String, RequestConfig) {
        let mut request = RequestConfig::new();
        let url = match cursor {
            Some(cursor) => cursor.as_str().to_string(),
            None => {
                let mut params = self.source.query_params();
                if let Some(limit) = limit {
                    params.insert("limit".to_string(), limit.to_string());
                }
                for (key, value) in params {
                    request = request.query(key, value);
                }
                self.source.endpoint_url()
            }
        };
        request = request.query(self.api_key_param.as_str(), self.api_key.expose());
        (url, request)
    }

    async fn attempt(
        &self,
        url: &str,
        request: &RequestConfig,
        governor: &mut RateGovernor,
    ) -> Result<Page> {
        let response = self.client.send(url, request).await?;

        if let Some(remaining) = rate_limit_remaining(response.headers()) {
            debug!("Rate limit remaining: {remaining}");
            governor.note_rate_limit_remaining(remaining);
        }

        let text = response.text().await.map_err(|e| Error::Http(e.without_url()))?;
        let body: TickerPageBody = serde_json::from_str(&text)
            .map_err(|e| Error::decode(format!("Unexpected response body: {e}")))?;

        Ok(Page {
            records: body.results,
            next: body.next_url.and_then(PageCursor::new),
            status: body.status,
            count: body.count,
        })
    }
}

/// Value of any `*ratelimit-remaining` header
fn rate_limit_remaining(headers: &HeaderMap) -> Option<u32> {
    headers.iter().find_map(|(name, value)| {
        if !name.as_str().ends_with("ratelimit-remaining") {
            return None;
        }
        let value = value.to_str().ok()?.trim();
        value
            .parse::<u32>()
            .ok()
            .or_else(|| value.parse::<f64>().ok().map(|v| v.max(0.0) as u32))
    })
}
