// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Roles an agent can hold within a rig (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Mayor,
    Witness,
    Refinery,
    Crew,
    Polecat,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mayor => "mayor",
            Self::Witness => "witness",
            Self::Refinery => "refinery",
            Self::Crew => "crew",
            Self::Polecat => "polecat",
        }
    }
}

/// Derived agent status (spec §3). Never read directly from the tool; always
/// computed by [`AgentStatus::derive`] from `session_running`/`hook_bead`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Running,
    Idle,
    Stopped,
    Error,
    Unknown,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Idle => "idle",
            Self::Stopped => "stopped",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }

    /// Derive status from the raw tool fields, honoring the invariants in
    /// spec §3: `running` requires `session_running`; a hooked agent is
    /// never `stopped`.
    pub fn derive(session_running: bool, hook_bead_id: &Option<String>, raw_state: &str) -> Self {
        if !session_running {
            return Self::Stopped;
        }
        if raw_state.eq_ignore_ascii_case("error") {
            return Self::Error;
        }
        if hook_bead_id.is_some() {
            return Self::Running;
        }
        match raw_state.to_ascii_lowercase().as_str() {
            "working" | "running" | "busy" => Self::Running,
            "ready" | "idle" | "" => Self::Idle,
            _ => Self::Unknown,
        }
    }
}

/// One worker within a rig, identified by `(rig, name, role)` (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub rig: String,
    pub name: String,
    pub role: AgentRole,
    pub status: AgentStatus,
    pub session_running: bool,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_bead_id: Option<String>,
    pub session_id: String,
}

impl Agent {
    /// Synthetic session id: `gt-{rig}-{name}` (spec §3).
    pub fn synthetic_session_id(rig: &str, name: &str) -> String {
        format!("gt-{rig}-{name}")
    }

    pub fn new(
        rig: impl Into<String>,
        name: impl Into<String>,
        role: AgentRole,
        session_running: bool,
        state: impl Into<String>,
        hook_bead_id: Option<String>,
    ) -> Self {
        let rig = rig.into();
        let name = name.into();
        let state = state.into();
        let status = AgentStatus::derive(session_running, &hook_bead_id, &state);
        // spec §3 invariant: a stopped agent never carries a hook.
        let hook_bead_id = if status == AgentStatus::Stopped { None } else { hook_bead_id };
        let session_id = Self::synthetic_session_id(&rig, &name);
        Self { rig, name, role, status, session_running, state, hook_bead_id, session_id }
    }

    /// Identity key used for uniqueness within a rig: `(name, role)`.
    pub fn identity(&self) -> (&str, AgentRole) {
        (&self.name, self.role)
    }
}
