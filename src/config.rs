//! Collector configuration
//!
//! This module contains the configuration structures read from a YAML or
//! JSON file. Every field has a default so a partial file (or none at all)
//! produces a working configuration.

use crate::error::{Error, Result};
use crate::types::{ApiKey, OptionStringExt, RecordField};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use url::Url;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete collector configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Upstream endpoint and query filters
    pub source: SourceConfig,
    /// API key lookup
    pub auth: AuthConfig,
    /// Collection caps
    pub limits: LimitsConfig,
    /// Per-page retry behaviour
    pub retry: RetryConfig,
    /// Pacing between requests
    pub rate: RateConfig,
    /// Record acceptance rules
    pub validation: ValidationConfig,
    /// Quality report shape
    pub quality: QualityConfig,
    /// Artifact locations
    pub output: OutputConfig,
}

impl CollectorConfig {
    /// Load a config file. `.json` files are parsed as JSON, anything else
    /// as YAML. The result is validated before it is returned.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let config = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_yaml_str(&content)?
        };
        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section; the first problem found is returned
    pub fn validate(&self) -> Result<()> {
        self.source.validate()?;
        self.auth.validate()?;
        self.limits.validate()?;
        self.retry.validate()?;
        self.rate.validate()?;
        self.validation.validate()?;
        self.quality.validate()?;
        Ok(())
    }
}

// ============================================================================
// Source
// ============================================================================

/// Upstream endpoint description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Human-readable provider name (used in metadata)
    pub provider: String,
    /// Base URL for API requests
    pub base_url: String,
    /// Endpoint path appended to the base URL
    pub endpoint: String,
    /// Market filter (`stocks`, `crypto`, `fx`, `otc`, `indices`); `None` = all
    pub market: Option<String>,
    /// Only list actively traded tickers
    pub active: bool,
    /// Records per page (`limit` query parameter)
    pub page_size: u32,
    /// Additional query parameters sent with the first page
    pub extra_params: BTreeMap<String, String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            provider: "Polygon.io".to_string(),
            base_url: "https://api.polygon.io".to_string(),
            endpoint: "/v3/reference/tickers".to_string(),
            market: Some("stocks".to_string()),
            active: true,
            page_size: 100,
            extra_params: BTreeMap::new(),
        }
    }
}

impl SourceConfig {
    /// Base URL joined with the endpoint path
    pub fn endpoint_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        )
    }

    /// Query parameters for the first page, excluding the API key
    pub fn query_params(&self) -> BTreeMap<String, String> {
        let mut params = self.extra_params.clone();
        if let Some(market) = &self.market {
            params.insert("market".to_string(), market.clone());
        }
        params.insert("active".to_string(), self.active.to_string());
        params.insert("limit".to_string(), self.page_size.to_string());
        params
    }

    fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::missing_field("source.base_url"));
        }
        Url::parse(&self.base_url)?;
        if self.endpoint.is_empty() {
            return Err(Error::missing_field("source.endpoint"));
        }
        if !(1..=1000).contains(&self.page_size) {
            return Err(Error::invalid_value(
                "source.page_size",
                format!("must be between 1 and 1000, got {}", self.page_size),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Auth
// ============================================================================

/// Where the API key comes from and how it is sent
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Inline key; used only when the environment variable is unset
    pub api_key: Option<String>,
    /// Environment variable checked first
    pub api_key_env: String,
    /// Query parameter carrying the key
    pub query_param: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: "POLYGON_API_KEY".to_string(),
            query_param: "apiKey".to_string(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("api_key_env", &self.api_key_env)
            .field("query_param", &self.query_param)
            .finish()
    }
}

impl AuthConfig {
    /// Resolve the key from the process environment, then the config value
    pub fn resolve_api_key(&self) -> Result<ApiKey> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    /// Resolve the key using a custom environment lookup
    pub fn resolve_api_key_with<F>(&self, lookup: F) -> Result<ApiKey>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = lookup(&self.api_key_env)
            .map(|v| v.trim().to_string())
            .none_if_empty()
            .or_else(|| {
                self.api_key
                    .as_ref()
                    .map(|v| v.trim().to_string())
                    .none_if_empty()
            })
            .ok_or_else(|| Error::MissingApiKey {
                env_var: self.api_key_env.clone(),
            })?;

        if raw.chars().any(char::is_whitespace) {
            return Err(Error::invalid_value(
                "auth.api_key",
                "API key must not contain whitespace",
            ));
        }

        Ok(ApiKey::new(raw))
    }

    fn validate(&self) -> Result<()> {
        if self.api_key_env.is_empty() {
            return Err(Error::missing_field("auth.api_key_env"));
        }
        if self.query_param.is_empty() {
            return Err(Error::missing_field("auth.query_param"));
        }
        Ok(())
    }
}

// ============================================================================
// Limits
// ============================================================================

/// Caps on how much a single run collects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Upper bound on accepted records
    pub max_records: usize,
    /// Upper bound on fetched pages (`None` = follow the cursor to the end)
    pub max_pages: Option<u32>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_records: 250,
            max_pages: Some(3),
        }
    }
}

impl LimitsConfig {
    fn validate(&self) -> Result<()> {
        if self.max_records == 0 {
            return Err(Error::invalid_value("limits.max_records", "must be > 0"));
        }
        if self.max_pages == Some(0) {
            return Err(Error::invalid_value("limits.max_pages", "must be > 0"));
        }
        Ok(())
    }
}

// ============================================================================
// Retry
// ============================================================================

/// Retry behaviour for a single page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per page, including the first
    pub max_attempts: u32,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Ceiling on a server-provided `Retry-After`
    pub max_retry_after_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_secs: 10,
            max_retry_after_secs: 60,
        }
    }
}

impl RetryConfig {
    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry-After ceiling
    pub fn max_retry_after(&self) -> Duration {
        Duration::from_secs(self.max_retry_after_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::invalid_value("retry.max_attempts", "must be >= 1"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::invalid_value("retry.timeout_secs", "must be > 0"));
        }
        Ok(())
    }
}

// ============================================================================
// Rate
// ============================================================================

/// Longest delay the governor will ever wait between requests
pub const MAX_DELAY_SECS: f64 = 3600.0;

/// Pacing between requests and adaptive multiplier tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateConfig {
    /// Fixed part of every inter-request delay
    pub base_delay_secs: f64,
    /// Lower bound of the uniform jitter added to the base delay
    pub jitter_min_secs: f64,
    /// Upper bound of the uniform jitter added to the base delay
    pub jitter_max_secs: f64,
    /// Hard requests-per-minute ceiling (`None` = unlimited)
    pub requests_per_minute: Option<u32>,
    /// Number of recent request outcomes the success rate is computed over
    pub window_size: usize,
    pub min_multiplier: f64,
    pub max_multiplier: f64,
    /// Below this success rate the multiplier grows by `severe_backoff_factor`
    pub severe_threshold: f64,
    /// Below this success rate the multiplier grows by `backoff_factor`
    pub backoff_threshold: f64,
    /// Above this success rate the multiplier shrinks by `speedup_factor`
    pub speedup_threshold: f64,
    pub backoff_factor: f64,
    pub severe_backoff_factor: f64,
    pub speedup_factor: f64,
    /// Outcomes that must be observed before any speed-up
    pub speedup_min_samples: usize,
    /// A `*-ratelimit-remaining` header below this triggers a backoff
    pub low_remaining_threshold: u32,
    /// Fixed RNG seed for reproducible jitter
    pub seed: Option<u64>,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            base_delay_secs: 1.0,
            jitter_min_secs: 0.0,
            jitter_max_secs: 0.5,
            requests_per_minute: Some(5),
            window_size: 10,
            min_multiplier: 0.5,
            max_multiplier: 8.0,
            severe_threshold: 0.5,
            backoff_threshold: 0.8,
            speedup_threshold: 0.9,
            backoff_factor: 1.5,
            severe_backoff_factor: 2.0,
            speedup_factor: 0.8,
            speedup_min_samples: 3,
            low_remaining_threshold: 2,
            seed: None,
        }
    }
}

impl RateConfig {
    /// Configuration with no waiting at all; handy for tests and dry runs
    pub fn immediate() -> Self {
        Self {
            base_delay_secs: 0.0,
            jitter_min_secs: 0.0,
            jitter_max_secs: 0.0,
            requests_per_minute: None,
            seed: Some(0),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        let non_negative = [
            ("rate.base_delay_secs", self.base_delay_secs),
            ("rate.jitter_min_secs", self.jitter_min_secs),
            ("rate.jitter_max_secs", self.jitter_max_secs),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::invalid_value(field, "must be a finite value >= 0"));
            }
        }
        if self.jitter_max_secs < self.jitter_min_secs {
            return Err(Error::invalid_value(
                "rate.jitter_max_secs",
                "must be >= rate.jitter_min_secs",
            ));
        }
        if self.requests_per_minute == Some(0) {
            return Err(Error::invalid_value(
                "rate.requests_per_minute",
                "must be > 0 (omit it to disable the ceiling)",
            ));
        }
        if self.window_size == 0 {
            return Err(Error::invalid_value("rate.window_size", "must be > 0"));
        }
        if !(self.min_multiplier > 0.0 && self.min_multiplier <= self.max_multiplier) {
            return Err(Error::invalid_value(
                "rate.min_multiplier",
                "must be > 0 and <= rate.max_multiplier",
            ));
        }
        if !self.max_multiplier.is_finite() {
            return Err(Error::invalid_value("rate.max_multiplier", "must be finite"));
        }
        let worst = (self.base_delay_secs + self.jitter_max_secs) * self.max_multiplier;
        if worst > MAX_DELAY_SECS {
            return Err(Error::invalid_value(
                "rate.base_delay_secs",
                format!(
                    "(base_delay_secs + jitter_max_secs) * max_multiplier must be <= {MAX_DELAY_SECS}"
                ),
            ));
        }
        for (field, value) in [
            ("rate.severe_threshold", self.severe_threshold),
            ("rate.backoff_threshold", self.backoff_threshold),
            ("rate.speedup_threshold", self.speedup_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::invalid_value(field, "must be within [0, 1]"));
            }
        }
        if !(self.severe_threshold <= self.backoff_threshold
            && self.backoff_threshold <= self.speedup_threshold)
        {
            return Err(Error::invalid_value(
                "rate.backoff_threshold",
                "thresholds must satisfy severe <= backoff <= speedup",
            ));
        }
        for (field, value) in [
            ("rate.backoff_factor", self.backoff_factor),
            ("rate.severe_backoff_factor", self.severe_backoff_factor),
        ] {
            if !value.is_finite() || value < 1.0 {
                return Err(Error::invalid_value(field, "must be >= 1"));
            }
        }
        if !(self.speedup_factor > 0.0 && self.speedup_factor <= 1.0) {
            return Err(Error::invalid_value(
                "rate.speedup_factor",
                "must be within (0, 1]",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Ticker syntax accepted by default: an optional one or two letter market
/// prefix (`X:`, `C:`, `I:`) followed by alphanumerics, dots and dashes.
pub const DEFAULT_TICKER_PATTERN: &str = r"^(?:[A-Z]{1,2}:)?[A-Za-z0-9][A-Za-z0-9.\-]*$";

/// Record acceptance rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Fields that must be present and non-empty
    pub required_fields: Vec<RecordField>,
    /// Regular expression every ticker must match
    pub ticker_pattern: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            required_fields: RecordField::ALL.to_vec(),
            ticker_pattern: DEFAULT_TICKER_PATTERN.to_string(),
        }
    }
}

impl ValidationConfig {
    fn validate(&self) -> Result<()> {
        // The dedup key has to be present on every accepted record.
        if !self.required_fields.contains(&RecordField::Ticker) {
            return Err(Error::invalid_value(
                "validation.required_fields",
                "must include 'ticker'",
            ));
        }
        Regex::new(&self.ticker_pattern).map_err(|e| {
            Error::invalid_value("validation.ticker_pattern", e.to_string())
        })?;
        Ok(())
    }
}

// ============================================================================
// Quality
// ============================================================================

/// Shape of the quality report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Number of values kept per distribution
    pub top_n: usize,
    /// Fields summarised as value distributions
    pub distribution_fields: Vec<RecordField>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            distribution_fields: vec![
                RecordField::Market,
                RecordField::Locale,
                RecordField::PrimaryExchange,
            ],
        }
    }
}

impl QualityConfig {
    fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(Error::invalid_value("quality.top_n", "must be > 0"));
        }
        Ok(())
    }
}

// ============================================================================
// Output
// ============================================================================

/// Where artifacts are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: String,
    pub records_file: String,
    pub metadata_file: String,
    pub quality_json_file: String,
    pub quality_markdown_file: String,
    pub summary_markdown_file: String,
    pub summary_json_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "output".to_string(),
            records_file: "records.json".to_string(),
            metadata_file: "metadata.json".to_string(),
            quality_json_file: "quality_report.json".to_string(),
            quality_markdown_file: "quality_report.md".to_string(),
            summary_markdown_file: "collection_summary.md".to_string(),
            summary_json_file: "collection_summary.json".to_string(),
        }
    }
}
