// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::VecDeque;

use parking_lot::Mutex;
use rigwatch_model::metrics::{AgentActivity, MetricsSample, PollDuration};

use crate::config::HistoryConfig;

const MINUTE_MS: u64 = 60_000;
const HOUR_MS: u64 = 3_600_000;

#[derive(Default)]
struct MinuteAccumulator {
    minute: u64,
    durations_ms: Vec<u64>,
    event_volume: u64,
    successful_polls: u32,
    failed_polls: u32,
    ws_connections: u32,
    agent_activity: AgentActivity,
    coalesced_pokes: u32,
}

/// Rolls poll and event activity up into per-minute [`MetricsSample`]s,
/// retained for `metrics_retention_hours` (spec §4.4, ambient metrics).
pub struct MetricsCollector {
    retention_ms: u64,
    samples: Mutex<VecDeque<MetricsSample>>,
    current: Mutex<Option<MinuteAccumulator>>,
}

impl MetricsCollector {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            retention_ms: config.metrics_retention_hours * HOUR_MS,
            samples: Mutex::new(VecDeque::new()),
            current: Mutex::new(None),
        }
    }

    pub fn record_poll(&self, at: u64, duration_ms: u64, success: bool) {
        let mut current = self.current.lock();
        let minute = at - (at % MINUTE_MS);
        self.roll_if_needed(&mut current, minute, at);
        if let Some(acc) = current.as_mut() {
            acc.durations_ms.push(duration_ms);
            if success {
                acc.successful_polls += 1;
            } else {
                acc.failed_polls += 1;
            }
        }
    }

    pub fn record_event(&self, at: u64) {
        let mut current = self.current.lock();
        let minute = at - (at % MINUTE_MS);
        self.roll_if_needed(&mut current, minute, at);
        if let Some(acc) = current.as_mut() {
            acc.event_volume += 1;
        }
    }

    /// Count one coalesced `pokeNow` refresh request for the rig's current
    /// minute (spec §A.2/§B).
    pub fn record_poke(&self, at: u64) {
        let mut current = self.current.lock();
        let minute = at - (at % MINUTE_MS);
        self.roll_if_needed(&mut current, minute, at);
        if let Some(acc) = current.as_mut() {
            acc.coalesced_pokes += 1;
        }
    }

    pub fn record_gauges(&self, at: u64, ws_connections: u32, agent_activity: AgentActivity) {
        let mut current = self.current.lock();
        let minute = at - (at % MINUTE_MS);
        self.roll_if_needed(&mut current, minute, at);
        if let Some(acc) = current.as_mut() {
            acc.ws_connections = ws_connections;
            acc.agent_activity = agent_activity;
        }
    }

    fn roll_if_needed(&self, current: &mut Option<MinuteAccumulator>, minute: u64, at: u64) {
        match current {
            Some(acc) if acc.minute == minute => {}
            Some(acc) => {
                let finished = std::mem::replace(acc, MinuteAccumulator { minute, ..Default::default() });
                self.finalize(finished, at);
            }
            None => {
                *current = Some(MinuteAccumulator { minute, ..Default::default() });
            }
        }
    }

    fn finalize(&self, acc: MinuteAccumulator, now: u64) {
        let mut durations = acc.durations_ms;
        durations.sort_unstable();
        let avg_ms = if durations.is_empty() {
            0.0
        } else {
            durations.iter().sum::<u64>() as f64 / durations.len() as f64
        };
        let percentile = |p: f64| -> f64 {
            if durations.is_empty() {
                return 0.0;
            }
            let idx = ((durations.len() - 1) as f64 * p).round() as usize;
            durations[idx] as f64
        };

        let sample = MetricsSample {
            timestamp: acc.minute,
            poll_duration: PollDuration { avg_ms, p50_ms: percentile(0.50), p95_ms: percentile(0.95) },
            event_volume: acc.event_volume,
            successful_polls: acc.successful_polls,
            failed_polls: acc.failed_polls,
            ws_connections: acc.ws_connections,
            agent_activity: acc.agent_activity,
            health_score: MetricsSample::health_score(acc.successful_polls, acc.failed_polls, acc.agent_activity),
            coalesced_pokes: acc.coalesced_pokes,
        };

        let mut samples = self.samples.lock();
        samples.push_back(sample);
        let cutoff = now.saturating_sub(self.retention_ms);
        while samples.front().is_some_and(|s| s.timestamp < cutoff) {
            samples.pop_front();
        }
    }

    /// All finalized samples, oldest first. Does not include the in-flight
    /// (current, not-yet-rolled) minute.
    pub fn samples(&self) -> Vec<MetricsSample> {
        self.samples.lock().iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polls_in_the_same_minute_accumulate_into_one_sample() {
        let collector = MetricsCollector::new(HistoryConfig::default());
        collector.record_poll(0, 100, true);
        collector.record_poll(1_000, 200, true);
        collector.record_poll(MINUTE_MS, 50, false); // rolls the first minute

        let samples = collector.samples();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].successful_polls, 2);
        assert_eq!(samples[0].poll_duration.avg_ms, 150.0);
    }

    #[test]
    fn old_samples_are_evicted_past_retention() {
        let collector = MetricsCollector::new(HistoryConfig { metrics_retention_hours: 1, ..Default::default() });
        collector.record_poll(0, 10, true);
        collector.record_poll(MINUTE_MS, 10, true); // rolls minute 0 in
        collector.record_poll(HOUR_MS * 3, 10, true); // rolls minute 1 in, evicts minute 0
        let timestamps: Vec<u64> = collector.samples().iter().map(|s| s.timestamp).collect();
        assert!(!timestamps.contains(&0));
    }
}
