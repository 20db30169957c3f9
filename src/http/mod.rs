//! HTTP module
//!
//! Provides the HTTP client, the requests-per-minute ceiling and the
//! adaptive pacing used between requests.
//!
//! # Features
//!
//! - **Status Classification**: 429, auth, transient and permanent failures
//!   map to distinct error variants
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Adaptive Pacing**: Jittered delay scaled by a success-rate driven multiplier

mod client;
mod pacing;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use pacing::{Adjustment, RateGovernor, NEUTRAL_SUCCESS_RATE};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
