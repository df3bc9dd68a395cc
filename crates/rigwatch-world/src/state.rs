// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::{BTreeMap, VecDeque};

use rigwatch_model::agent::{Agent, AgentRole};
use rigwatch_model::bead::Bead;
use rigwatch_model::mail::Mail;
use serde::Serialize;

/// An agent's current record plus the flap-suppression counter used by the
/// two-consecutive-snapshots removal rule (spec §4.3 rule 2).
#[derive(Debug, Clone)]
pub struct AgentRecord {
    pub agent: Agent,
    pub absent_streak: u32,
}

const MAIL_DEDUP_RING: usize = 1_000;

/// Authoritative per-rig fleet state (spec §3, §4.3).
#[derive(Debug, Clone)]
pub struct RigState {
    pub rig: String,
    pub agents: BTreeMap<(String, AgentRole), AgentRecord>,
    pub beads: BTreeMap<String, Bead>,
    pub last_seen_mail_ts: Option<u64>,
    mail_dedup_seen: VecDeque<(String, String, String, u64, String)>,
    pub last_observed_at: Option<u64>,
}

impl RigState {
    pub fn new(rig: impl Into<String>) -> Self {
        Self {
            rig: rig.into(),
            agents: BTreeMap::new(),
            beads: BTreeMap::new(),
            last_seen_mail_ts: None,
            mail_dedup_seen: VecDeque::new(),
            last_observed_at: None,
        }
    }

    /// True if `key` has already been emitted as a mail event (spec §9: keys
    /// on `(rig, from, to, timestamp, path)` to disambiguate same-timestamp
    /// mails).
    pub fn mail_already_seen(&self, key: &(String, String, String, u64, String)) -> bool {
        self.mail_dedup_seen.contains(key)
    }

    pub fn remember_mail(&mut self, key: (String, String, String, u64, String)) {
        if self.mail_dedup_seen.len() >= MAIL_DEDUP_RING {
            self.mail_dedup_seen.pop_front();
        }
        self.mail_dedup_seen.push_back(key);
    }
}

/// A read-only, serializable projection of one rig's state — what HTTP and
/// socket `initial` frames send to clients (spec §6.1, §6.2).
#[derive(Debug, Clone, Serialize)]
pub struct RigView {
    pub rig: String,
    pub agents: Vec<Agent>,
    pub beads: Vec<Bead>,
}

impl From<&RigState> for RigView {
    fn from(state: &RigState) -> Self {
        Self {
            rig: state.rig.clone(),
            agents: state.agents.values().map(|r| r.agent.clone()).collect(),
            beads: state.beads.values().cloned().collect(),
        }
    }
}

/// The whole fleet's current state, across all rigs plus a recent mail
/// window — the `initial` frame payload shape (spec §6.2).
#[derive(Debug, Clone, Default, Serialize)]
pub struct FleetView {
    pub rigs: Vec<RigView>,
    pub mail: Vec<Mail>,
}
