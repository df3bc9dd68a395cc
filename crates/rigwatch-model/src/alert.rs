// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

use crate::event::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Critical,
    Warning,
    Info,
}

/// A triggered alert (spec §3, §4.7): append-only with an
/// acknowledge/resolve/dismiss lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub rule_id: String,
    pub rule_name: String,
    pub severity: AlertSeverity,
    pub timestamp: u64,
    pub context: Event,
    pub acknowledged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<u64>,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<u64>,
}

impl Alert {
    /// `active -> acknowledged`, allowed any time while not resolved.
    pub fn acknowledge(&mut self, at: u64) {
        if !self.resolved {
            self.acknowledged = true;
            self.acknowledged_at.get_or_insert(at);
        }
    }

    /// `active|acknowledged -> resolved` (terminal). A second call is a
    /// no-op success (spec §4.7).
    pub fn resolve(&mut self, at: u64) {
        if !self.resolved {
            self.resolved = true;
            self.resolved_at = Some(at);
        }
    }
}
