// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::sync::Arc;

use rigwatch_model::event::Event;
use rigwatch_model::Snapshot;
use tokio::sync::RwLock;

use crate::diff::apply_snapshot;
use crate::state::{FleetView, RigState, RigView};

/// Authoritative fleet state for every known rig (spec §3, C3).
///
/// Each rig has its own lock; applying a snapshot acquires only that rig's
/// write guard, computes the diff, and drops the guard before handing
/// events back to the caller. No lock is ever held across a downstream
/// publish — other rigs' pollers and readers are never blocked by it.
pub struct WorldModel {
    rigs: RwLock<HashMap<String, Arc<RwLock<RigState>>>>,
}

impl Default for WorldModel {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldModel {
    pub fn new() -> Self {
        Self { rigs: RwLock::new(HashMap::new()) }
    }

    async fn rig_handle(&self, rig: &str) -> Arc<RwLock<RigState>> {
        if let Some(existing) = self.rigs.read().await.get(rig) {
            return existing.clone();
        }
        let mut rigs = self.rigs.write().await;
        rigs.entry(rig.to_owned()).or_insert_with(|| Arc::new(RwLock::new(RigState::new(rig)))).clone()
    }

    /// Apply one poll snapshot and return the events it produced, in
    /// Agents → Hooks → Beads → Mail order (spec §4.3).
    pub async fn apply(&self, snapshot: Snapshot) -> Vec<Event> {
        let handle = self.rig_handle(&snapshot.rig).await;
        let mut guard = handle.write().await;
        apply_snapshot(&mut guard, snapshot)
    }

    /// Read-only projection of one rig, for HTTP responses and socket
    /// `initial` frames (spec §6.1, §6.2). `None` if the rig has never been
    /// observed.
    pub async fn rig_view(&self, rig: &str) -> Option<RigView> {
        let handle = self.rigs.read().await.get(rig).cloned()?;
        let guard = handle.read().await;
        Some(RigView::from(&*guard))
    }

    /// A snapshot of the whole fleet, across every known rig (spec §6.2).
    pub async fn fleet_view(&self) -> FleetView {
        let handles: Vec<Arc<RwLock<RigState>>> = self.rigs.read().await.values().cloned().collect();
        let mut rigs = Vec::with_capacity(handles.len());
        for handle in handles {
            let guard = handle.read().await;
            rigs.push(RigView::from(&*guard));
        }
        rigs.sort_by(|a, b| a.rig.cmp(&b.rig));
        FleetView { rigs, mail: Vec::new() }
    }

    pub async fn known_rigs(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rigs.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn agent_count(&self) -> usize {
        let handles: Vec<Arc<RwLock<RigState>>> = self.rigs.read().await.values().cloned().collect();
        let mut total = 0;
        for handle in handles {
            total += handle.read().await.agents.len();
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use rigwatch_model::agent::{Agent, AgentRole};

    use super::*;

    fn snapshot(rig: &str, observed_at: u64, agents: Vec<Agent>) -> Snapshot {
        Snapshot { rig: rig.to_owned(), observed_at, agents, beads: vec![], mail: vec![], duration_ms: 0 }
    }

    #[tokio::test]
    async fn apply_creates_rig_on_first_snapshot() {
        let world = WorldModel::new();
        let agent = Agent::new("r1", "p1", AgentRole::Polecat, true, "ready", None);
        let events = world.apply(snapshot("r1", 1, vec![agent])).await;
        assert_eq!(events.len(), 1);
        let view = world.rig_view("r1").await.expect("rig should exist");
        assert_eq!(view.agents.len(), 1);
    }

    #[tokio::test]
    async fn unknown_rig_view_is_none() {
        let world = WorldModel::new();
        assert!(world.rig_view("nope").await.is_none());
    }

    #[tokio::test]
    async fn fleet_view_aggregates_every_rig_sorted() {
        let world = WorldModel::new();
        world.apply(snapshot("r2", 1, vec![])).await;
        world.apply(snapshot("r1", 1, vec![])).await;
        let fleet = world.fleet_view().await;
        let names: Vec<&str> = fleet.rigs.iter().map(|r| r.rig.as_str()).collect();
        assert_eq!(names, vec!["r1", "r2"]);
    }

    #[tokio::test]
    async fn agent_count_reflects_all_rigs() {
        let world = WorldModel::new();
        world.apply(snapshot("r1", 1, vec![Agent::new("r1", "p1", AgentRole::Polecat, true, "ready", None)])).await;
        world.apply(snapshot("r2", 1, vec![Agent::new("r2", "p2", AgentRole::Polecat, true, "ready", None)])).await;
        assert_eq!(world.agent_count().await, 2);
    }
}
