// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::{HashMap, VecDeque};

use parking_lot::RwLock;
use rigwatch_model::error::{Error, Result};
use rigwatch_model::event::Event;
use rigwatch_world::FleetView;

use crate::config::HistoryConfig;

/// Min/max timestamp currently retained (spec §4.4 `bounds()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineBounds {
    pub start: u64,
    pub end: u64,
}

struct Checkpoint {
    at: u64,
    view: FleetView,
}

/// The event ring, per-agent status history, and replay checkpoints (spec
/// §4.4). Every field is guarded by its own lock so a slow reader on one
/// axis (say, a long `eventsBetween` scan) never blocks writers on another.
pub struct Timeline {
    config: HistoryConfig,
    events: RwLock<VecDeque<Event>>,
    agent_history: RwLock<HashMap<(String, String), VecDeque<(String, u64)>>>,
    checkpoints: RwLock<VecDeque<Checkpoint>>,
}

impl Timeline {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            config,
            events: RwLock::new(VecDeque::new()),
            agent_history: RwLock::new(HashMap::new()),
            checkpoints: RwLock::new(VecDeque::new()),
        }
    }

    /// Record one event into the global ring, and into the per-agent status
    /// history ring when it is an `agent_status_change` (spec §4.3 rule 3).
    pub fn record(&self, event: Event) {
        if let Event::AgentStatusChange { rig, agent, to, at, .. } = &event {
            let mut history = self.agent_history.write();
            let entry = history.entry((rig.clone(), agent.clone())).or_default();
            if entry.len() >= self.config.agent_history_capacity {
                entry.pop_front();
            }
            entry.push_back((to.clone(), *at));
        }

        let mut events = self.events.write();
        if events.len() >= self.config.event_ring_capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// A checkpoint of the whole fleet, taken right after a snapshot apply.
    /// `stateAt` reconstructs from the nearest checkpoint at or before the
    /// requested timestamp; because a checkpoint is captured on every apply,
    /// there is never an event strictly between two adjacent checkpoints for
    /// the rig that produced them, so folding forward is a no-op and the
    /// reconstruction is trivially bit-identical for repeated queries.
    pub fn record_checkpoint(&self, at: u64, view: FleetView) {
        let mut checkpoints = self.checkpoints.write();
        if checkpoints.len() >= self.config.event_ring_capacity {
            checkpoints.pop_front();
        }
        checkpoints.push_back(Checkpoint { at, view });
    }

    /// Events with `start <= ts <= end`, in chronological order (spec §4.4).
    pub fn events_between(&self, start: u64, end: u64, type_filter: Option<&str>) -> Vec<Event> {
        let events = self.events.read();
        events
            .iter()
            .filter(|e| {
                let ts = e.timestamp();
                ts >= start && ts <= end
            })
            .filter(|e| type_filter.is_none_or(|t| e.type_name() == t))
            .cloned()
            .collect()
    }

    /// Reconstruct the fleet as it existed at `timestamp` (spec §4.4).
    pub fn state_at(&self, timestamp: u64) -> Result<FleetView> {
        let checkpoints = self.checkpoints.read();
        checkpoints
            .iter()
            .rev()
            .find(|c| c.at <= timestamp)
            .map(|c| c.view.clone())
            .ok_or(Error::OutOfHistory)
    }

    pub fn bounds(&self) -> Option<TimelineBounds> {
        let events = self.events.read();
        let start = events.front()?.timestamp();
        let end = events.back()?.timestamp();
        Some(TimelineBounds { start, end })
    }

    /// Status history for one `(rig, agent)`, oldest first (spec §4.4).
    pub fn agent_status_history(&self, rig: &str, agent: &str) -> Vec<(String, u64)> {
        self.agent_history
            .read()
            .get(&(rig.to_owned(), agent.to_owned()))
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }
}
