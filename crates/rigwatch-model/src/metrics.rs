// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Poll duration distribution for one per-minute metrics sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PollDuration {
    pub avg_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
}

/// Agent activity breakdown for one per-minute metrics sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentActivity {
    pub active: u32,
    pub hooked: u32,
    pub idle: u32,
    pub error: u32,
}

/// A per-minute aggregate (spec §3). `health_score` is a derived 0-100
/// rollup combining poll success rate and agent error rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsSample {
    pub timestamp: u64,
    pub poll_duration: PollDuration,
    pub event_volume: u64,
    pub successful_polls: u32,
    pub failed_polls: u32,
    pub ws_connections: u32,
    pub agent_activity: AgentActivity,
    pub health_score: f64,
    /// `pokeNow` refresh requests coalesced into a poll this minute (spec
    /// §A.2/§B "poke_now coalescing metric").
    #[serde(default)]
    pub coalesced_pokes: u32,
}

impl MetricsSample {
    pub fn health_score(successful_polls: u32, failed_polls: u32, activity: AgentActivity) -> f64 {
        let total_polls = successful_polls + failed_polls;
        let poll_score = if total_polls == 0 { 100.0 } else { 100.0 * successful_polls as f64 / total_polls as f64 };
        let total_agents = activity.active + activity.hooked + activity.idle + activity.error;
        let agent_score = if total_agents == 0 {
            100.0
        } else {
            100.0 * (total_agents - activity.error) as f64 / total_agents as f64
        };
        (poll_score * 0.5 + agent_score * 0.5).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_score_penalizes_failures_and_errors() {
        let perfect = MetricsSample::health_score(10, 0, AgentActivity { active: 5, ..Default::default() });
        assert_eq!(perfect, 100.0);
        let degraded = MetricsSample::health_score(
            5,
            5,
            AgentActivity { active: 1, error: 1, ..Default::default() },
        );
        assert!(degraded < perfect);
    }
}
