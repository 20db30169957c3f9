//! Data quality scoring
//!
//! Derives a read-only [`QualityReport`] from a finalized record set:
//! per-field completeness, an overall score, value distributions and the
//! anomalies the validator caught.

mod scorer;
mod types;

pub use scorer::{completeness, distribution, QualityScorer};
pub use types::{Anomalies, FieldCompleteness, FieldDistribution, QualityReport, ValueCount};
