// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replay job registry backing the CLI's `replay`/`replay-start`/
//! `replay-jobs` subcommands (spec §6.4): a job resolves a batch of
//! timestamps against [`rigwatch_history::Timeline::state_at`] in one
//! request instead of one round trip per timestamp.

use std::collections::HashMap;

use parking_lot::RwLock;
use rigwatch_world::FleetView;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayStatus {
    Completed,
    Failed,
}

#[derive(Clone, Serialize)]
pub struct ReplayResult {
    pub timestamp: u64,
    pub state: Option<FleetView>,
    pub error: Option<String>,
}

#[derive(Clone, Serialize)]
pub struct ReplayJob {
    pub id: String,
    pub created_at: u64,
    pub status: ReplayStatus,
    pub results: Vec<ReplayResult>,
}

#[derive(Default)]
pub struct ReplayStore {
    jobs: RwLock<HashMap<String, ReplayJob>>,
}

impl ReplayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, job: ReplayJob) {
        self.jobs.write().insert(job.id.clone(), job);
    }

    pub fn get(&self, id: &str) -> Option<ReplayJob> {
        self.jobs.read().get(id).cloned()
    }

    pub fn list(&self) -> Vec<ReplayJob> {
        let mut jobs: Vec<ReplayJob> = self.jobs.read().values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }
}
