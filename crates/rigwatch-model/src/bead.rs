// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Bead lifecycle status. The external tool's exact enum varies; unknown
/// values pass through as [`BeadStatus::Other`] rather than being rejected
/// (spec §9 open question on bead schema).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeadStatus {
    Open,
    Hooked,
    InProgress,
    Closed,
    Done,
    Blocked,
    Deferred,
    Other(String),
}

impl Serialize for BeadStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BeadStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_raw(&raw))
    }
}

impl BeadStatus {
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "open" => Self::Open,
            "hooked" => Self::Hooked,
            "in_progress" => Self::InProgress,
            "closed" => Self::Closed,
            "done" => Self::Done,
            "blocked" => Self::Blocked,
            "deferred" => Self::Deferred,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "open",
            Self::Hooked => "hooked",
            Self::InProgress => "in_progress",
            Self::Closed => "closed",
            Self::Done => "done",
            Self::Blocked => "blocked",
            Self::Deferred => "deferred",
            Self::Other(s) => s,
        }
    }

    /// Terminal statuses set `closedAt` (spec §3 invariant).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Done)
    }
}

/// One entry in a bead's `statusHistory` (spec §3): monotone non-decreasing
/// in timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPoint {
    pub status: BeadStatus,
    pub at: u64,
}

/// A unit of work, identified by a stable id (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bead {
    pub id: String,
    pub title: String,
    pub status: BeadStatus,
    /// Opaque string: the tool's priority enum varies by deployment (spec §9).
    pub priority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    pub depends_on: BTreeSet<String>,
    pub created_at: u64,
    pub updated_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<u64>,
    pub status_history: Vec<StatusPoint>,
}

impl Bead {
    /// Append a status transition, preserving the monotone-timestamp
    /// invariant and setting `closedAt` the first time a terminal status is
    /// reached (spec §3).
    pub fn push_status(&mut self, status: BeadStatus, at: u64) {
        let at = at.max(self.status_history.last().map(|p| p.at).unwrap_or(0));
        if status.is_terminal() && self.closed_at.is_none() {
            self.closed_at = Some(at);
        }
        self.status = status.clone();
        self.updated_at = at;
        self.status_history.push(StatusPoint { status, at });
    }
}
