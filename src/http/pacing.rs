//! Adaptive request pacing
//!
//! The [`RateGovernor`] turns recent request outcomes into the delay to wait
//! before the next request. The delay is `(base + jitter) * multiplier`, where
//! the multiplier is a bounded scalar nudged up when the rolling success rate
//! drops and nudged down when it stays high.
//!
//! The governor is an explicit value owned by the collection engine and lent
//! to the fetcher for each page; there is no global pacing state.

use crate::config::{RateConfig, MAX_DELAY_SECS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{info, warn};

/// Success rate assumed before any request has completed
pub const NEUTRAL_SUCCESS_RATE: f64 = 1.0;

/// What a call to [`RateGovernor::adapt`] did to the multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    /// Success rate below the severe threshold
    SevereBackoff,
    /// Success rate below the backoff threshold
    Backoff,
    /// Success rate sustained above the speed-up threshold
    SpeedUp,
    /// Between thresholds, or not enough samples yet
    Hold,
}

/// Adaptive delay calculator
#[derive(Debug)]
pub struct RateGovernor {
    config: RateConfig,
    multiplier: f64,
    window: VecDeque<bool>,
    rng: StdRng,
}

impl RateGovernor {
    /// Create a governor; the multiplier starts at 1.0 clamped into bounds
    pub fn new(config: RateConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let multiplier = 1.0_f64.clamp(config.min_multiplier, config.max_multiplier);
        let window = VecDeque::with_capacity(config.window_size);

        Self {
            config,
            multiplier,
            window,
            rng,
        }
    }

    /// Current delay multiplier
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Record the outcome of one HTTP attempt
    pub fn record(&mut self, success: bool) {
        if self.window.len() == self.config.window_size {
            self.window.pop_front();
        }
        self.window.push_back(success);
    }

    /// Success rate over the rolling window.
    ///
    /// With no recorded outcomes this is [`NEUTRAL_SUCCESS_RATE`], never 0.0,
    /// so the very first call cannot trigger a backoff.
    pub fn recent_success_rate(&self) -> f64 {
        if self.window.is_empty() {
            return NEUTRAL_SUCCESS_RATE;
        }
        let ok = self.window.iter().filter(|s| **s).count();
        ok as f64 / self.window.len() as f64
    }

    /// Update the multiplier from a success rate
    pub fn adapt(&mut self, success_rate: f64) -> Adjustment {
        let cfg = &self.config;
        let (adjustment, factor) = if success_rate < cfg.severe_threshold {
            (Adjustment::SevereBackoff, cfg.severe_backoff_factor)
        } else if success_rate < cfg.backoff_threshold {
            (Adjustment::Backoff, cfg.backoff_factor)
        } else if success_rate > cfg.speedup_threshold
            && self.window.len() >= cfg.speedup_min_samples
        {
            (Adjustment::SpeedUp, cfg.speedup_factor)
        } else {
            (Adjustment::Hold, 1.0)
        };

        if adjustment != Adjustment::Hold {
            let previous = self.multiplier;
            self.multiplier = (previous * factor).clamp(cfg.min_multiplier, cfg.max_multiplier);
            if (self.multiplier - previous).abs() > f64::EPSILON {
                info!(
                    "Strategy adjusted ({:?}): delay_multiplier {:.2} -> {:.2}, success_rate={:.2}",
                    adjustment, previous, self.multiplier, success_rate
                );
            }
        }

        adjustment
    }

    /// Adapt to `success_rate`, then compute the delay before the next request
    pub fn next_delay(&mut self, success_rate: f64) -> Duration {
        self.adapt(success_rate);
        self.current_delay()
    }

    /// Delay at the current multiplier without adapting, at most
    /// [`MAX_DELAY_SECS`]
    pub fn current_delay(&mut self) -> Duration {
        let jitter = self.jitter();
        let secs = (self.config.base_delay_secs + jitter) * self.multiplier;
        // NaN falls through max() to 0.0
        Duration::from_secs_f64(secs.max(0.0).min(MAX_DELAY_SECS))
    }

    /// React to a `*-ratelimit-remaining` response header
    pub fn note_rate_limit_remaining(&mut self, remaining: u32) {
        if remaining < self.config.low_remaining_threshold {
            let previous = self.multiplier;
            self.multiplier = (previous * self.config.backoff_factor)
                .clamp(self.config.min_multiplier, self.config.max_multiplier);
            warn!(
                "Near rate limit ({} remaining); delay_multiplier {:.2} -> {:.2}",
                remaining, previous, self.multiplier
            );
        }
    }

    fn jitter(&mut self) -> f64 {
        let (min, max) = (self.config.jitter_min_secs, self.config.jitter_max_secs);
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..=max)
    }
}
