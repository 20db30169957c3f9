//! Collection engine
//!
//! Drives one run: page loop, validation and cap checks.
//!
//! # Overview
//!
//! The engine module provides:
//! - `CollectionEngine` - Owns the fetcher, validator and governor for a run
//! - `CollectionRun` / `FinalizedRun` - Run state while collecting and after
//! - `StopReason` - Why the page loop ended

mod types;

pub use types::{CollectionRun, FinalizedRun, RequestStats, RunOutcome, StopReason};

use crate::config::{CollectorConfig, LimitsConfig};
use crate::error::Result;
use crate::fetch::Fetcher;
use crate::http::RateGovernor;
use crate::pagination::PaginationState;
use crate::types::ApiKey;
use crate::validate::Validator;
use tracing::{debug, error, info};

/// Sequential collection engine
#[derive(Debug)]
pub struct CollectionEngine {
    fetcher: Fetcher,
    validator: Validator,
    governor: RateGovernor,
    limits: LimitsConfig,
}

impl CollectionEngine {
    /// Assemble an engine from its parts
    pub fn new(
        fetcher: Fetcher,
        validator: Validator,
        governor: RateGovernor,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            fetcher,
            validator,
            governor,
            limits,
        }
    }

    /// Build every part from config
    pub fn from_config(config: &CollectorConfig, api_key: ApiKey) -> Result<Self> {
        Ok(Self::new(
            Fetcher::from_config(config, api_key)?,
            Validator::new(&config.validation)?,
            RateGovernor::new(config.rate.clone()),
            config.limits.clone(),
        ))
    }

    /// Run the page loop to completion.
    ///
    /// Never fails: fetch errors end the loop with a failure [`StopReason`]
    /// and whatever was accepted before is kept.
    pub async fn run(mut self) -> FinalizedRun {
        let mut run = CollectionRun::start();
        let mut pagination = PaginationState::new();
        let max_records = self.limits.max_records;

        info!(
            "Starting collection (max_records={}, max_pages={:?})",
            max_records, self.limits.max_pages
        );

        let stop_reason = loop {
            if pagination.reached_page_cap(self.limits.max_pages) {
                break StopReason::PageCapReached {
                    limit: pagination.pages,
                };
            }

            if pagination.pages > 0 {
                let rate = self.governor.recent_success_rate();
                let delay = self.governor.next_delay(rate);
                debug!(
                    "Waiting {:.2}s before next page (multiplier {:.2})",
                    delay.as_secs_f64(),
                    self.governor.multiplier()
                );
                tokio::time::sleep(delay).await;
            }

            let page_number = pagination.pages + 1;
            let page = match self
                .fetcher
                .fetch_page(pagination.cursor.as_ref(), &mut self.governor, &mut run.stats)
                .await
            {
                Ok(page) => page,
                Err(err) if err.is_auth() => {
                    error!("Credentials rejected on page {page_number}: {err}");
                    break StopReason::AuthRejected {
                        error: err.to_string(),
                    };
                }
                Err(err) => {
                    error!("Page {page_number} failed, keeping partial results: {err}");
                    break StopReason::PageFailed {
                        page: page_number,
                        error: err.to_string(),
                    };
                }
            };

            let received = page.records.len();
            if let Some(count) = page.count.filter(|c| *c != received as u64) {
                debug!("Page {page_number}: API reported {count} rows, body has {received}");
            }
            let mut accepted = 0usize;
            for raw in &page.records {
                if run.records().len() >= max_records {
                    break;
                }
                if let Ok(record) = self.validator.validate(raw) {
                    run.push(record);
                    accepted += 1;
                }
            }
            info!(
                "Page {}: {} rows, {} accepted, {} records so far",
                page_number,
                received,
                accepted,
                run.records().len()
            );

            let next = pagination.advance(received, page.next);

            if run.records().len() >= max_records {
                break StopReason::RecordCapReached { limit: max_records };
            }
            if next.is_done() {
                break StopReason::Exhausted;
            }
        };

        info!(
            "Collection stopped: {} ({} records, {} requests)",
            stop_reason.describe(),
            run.records().len(),
            run.stats.total_requests
        );

        let outcome = RunOutcome {
            stop_reason,
            delay_multiplier: self.governor.multiplier(),
            pages_fetched: pagination.pages,
            raw_records: pagination.total_fetched,
            validation: self.validator.into_stats(),
        };
        run.finalize(outcome)
    }
}

#[cfg(test)]
mod tests;
