// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::bead::Bead;
use crate::mail::Mail;

/// The fleet state produced by one poll cycle of one rig (spec §3, §4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub rig: String,
    pub observed_at: u64,
    pub agents: Vec<Agent>,
    pub beads: Vec<Bead>,
    pub mail: Vec<Mail>,
    pub duration_ms: u64,
}
