// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

use crate::mail::Mail;

/// The fleet event stream. A closed, explicit tagged union — unlike the
/// prototype-style open event shape in the source system, unknown event
/// types are never forwarded (spec §9 design notes).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    AgentAdded { rig: String, agent: String, at: u64 },
    AgentRemoved { rig: String, agent: String, at: u64 },
    AgentStatusChange { rig: String, agent: String, from: String, to: String, at: u64 },
    HookChange { rig: String, agent: String, prev_bead: Option<String>, new_bead: Option<String>, at: u64 },
    BeadStatusChange { rig: String, bead_id: String, from: String, to: String, at: u64 },
    Mail(Mail),
    GtEvent { rig: String, kind: String, payload: serde_json::Value, at: u64 },
    Feed { rig: String, message: String, at: u64 },
    Log { rig: Option<String>, source: Option<String>, level: String, message: String, at: u64 },
    Error { rig: Option<String>, source: Option<String>, level: String, message: String, at: u64 },
}

impl Event {
    pub fn rig(&self) -> Option<&str> {
        match self {
            Self::AgentAdded { rig, .. }
            | Self::AgentRemoved { rig, .. }
            | Self::AgentStatusChange { rig, .. }
            | Self::HookChange { rig, .. }
            | Self::BeadStatusChange { rig, .. }
            | Self::GtEvent { rig, .. }
            | Self::Feed { rig, .. } => Some(rig),
            Self::Mail(m) => Some(&m.rig),
            Self::Log { rig, .. } | Self::Error { rig, .. } => rig.as_deref(),
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            Self::AgentAdded { at, .. }
            | Self::AgentRemoved { at, .. }
            | Self::AgentStatusChange { at, .. }
            | Self::HookChange { at, .. }
            | Self::BeadStatusChange { at, .. }
            | Self::GtEvent { at, .. }
            | Self::Feed { at, .. }
            | Self::Log { at, .. }
            | Self::Error { at, .. } => *at,
            Self::Mail(m) => m.timestamp,
        }
    }

    /// Discriminant string, used for rule matching and REST filtering.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::AgentAdded { .. } => "agent_added",
            Self::AgentRemoved { .. } => "agent_removed",
            Self::AgentStatusChange { .. } => "agent_status_change",
            Self::HookChange { .. } => "hooks:updated",
            Self::BeadStatusChange { .. } => "bead_status_change",
            Self::Mail(_) => "mail",
            Self::GtEvent { .. } => "gt_event",
            Self::Feed { .. } => "feed",
            Self::Log { .. } => "log",
            Self::Error { .. } => "error",
        }
    }

    /// Best-effort free text used for `event_pattern` regex matching and
    /// error fingerprinting (spec §4.5, §4.6).
    pub fn message_text(&self) -> Option<&str> {
        match self {
            Self::Log { message, .. } | Self::Error { message, .. } => Some(message),
            Self::Feed { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn source(&self) -> Option<&str> {
        match self {
            Self::Log { source, .. } | Self::Error { source, .. } => source.as_deref(),
            _ => None,
        }
    }
}
