// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Retention knobs for the timeline and pattern aggregator (spec §A.3).
#[derive(Debug, Clone, Copy)]
pub struct HistoryConfig {
    pub event_ring_capacity: usize,
    pub agent_history_capacity: usize,
    pub metrics_retention_hours: u64,
    pub pattern_threshold: u64,
    pub pattern_eviction_hours: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            event_ring_capacity: 5_000,
            agent_history_capacity: 200,
            metrics_retention_hours: 48,
            pattern_threshold: 5,
            pattern_eviction_hours: 24,
        }
    }
}
