// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

/// Configuration for one rig's poll loop (spec §4.2).
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Base cadence between polls.
    pub poll_interval: Duration,
    /// Multiplier applied to the interval after each consecutive failure.
    pub backoff_factor: f64,
    /// Ceiling the back-off interval never exceeds.
    pub backoff_cap: Duration,
    /// Bounded worker pool size for concurrent per-agent status fetches.
    pub worker_pool: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(5_000),
            backoff_factor: 1.5,
            backoff_cap: Duration::from_millis(60_000),
            worker_pool: 8,
        }
    }
}

impl PollerConfig {
    /// Next interval after `consecutive_failures` failures in a row, capped
    /// at `backoff_cap` (spec §4.2: `1.5x`, capped at 60s; example scenario
    /// 6: `5s * 1.5^3 ~= 16.9s`).
    pub fn backoff_interval(&self, consecutive_failures: u32) -> Duration {
        if consecutive_failures == 0 {
            return self.poll_interval;
        }
        let scaled = self.poll_interval.as_secs_f64() * self.backoff_factor.powi(consecutive_failures as i32);
        Duration::from_secs_f64(scaled).min(self.backoff_cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_matches_spec_example() {
        let config = PollerConfig::default();
        let interval = config.backoff_interval(3);
        assert!((interval.as_secs_f64() - 16.875).abs() < 0.01);
    }

    #[test]
    fn backoff_is_capped() {
        let config = PollerConfig::default();
        let interval = config.backoff_interval(20);
        assert_eq!(interval, config.backoff_cap);
    }

    #[test]
    fn resets_to_base_interval_with_zero_failures() {
        let config = PollerConfig::default();
        assert_eq!(config.backoff_interval(0), config.poll_interval);
    }
}
