// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]

//! # Ticker Collector
//!
//! Collects the Polygon.io reference ticker list, validates and deduplicates
//! the rows, scores their quality and writes documentation artifacts.
//!
//! ## Features
//!
//! - **Paginated Fetching**: Follows the API's `next_url` cursor with retries
//! - **Adaptive Pacing**: Jittered delays scaled by recent success rate
//! - **Validation**: Required fields, ticker syntax, first-seen deduplication
//! - **Quality Scoring**: Completeness per field and value distributions
//! - **Reporting**: Records, metadata, quality report and run summary on disk
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ticker_collector::{cli::collect, config::CollectorConfig, Result};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<()> {
//!     let config = CollectorConfig::from_file("collector.yaml")?;
//!     config.validate()?;
//!
//!     let collection = collect(&config).await?;
//!     println!("{} records", collection.run.records.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌──────────┐   ┌──────────┐
//! │  Fetch   │──▶│ Validate  │──▶│ Quality  │──▶│  Output  │
//! │ + retry  │   │ + dedup   │   │  score   │   │ JSON, MD │
//! └────┬─────┘   └───────────┘   └──────────┘   └──────────┘
//!      │
//! ┌────┴──────────────────────┐
//! │ HTTP: RPM ceiling, pacing │
//! └───────────────────────────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Collector configuration
pub mod config;

/// HTTP client, RPM ceiling and adaptive pacing
pub mod http;

/// Cursor pagination
pub mod pagination;

/// Page fetching with retries
pub mod fetch;

/// Record validation and deduplication
pub mod validate;

/// Quality scoring
pub mod quality;

/// Collection loop
pub mod engine;

/// Artifact writing
pub mod output;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
