// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// A closed discriminated union of rule conditions (spec §4.6, §9 design
/// notes: free-form dynamic config dictionaries are reified here as a
/// closed enum — unknown condition types are rejected at the HTTP boundary
/// with `ErrBadRequest`, never silently forwarded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    AgentStatus {
        #[serde(default = "default_glob")]
        agent: String,
        #[serde(default = "default_glob")]
        rig: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<String>,
    },
    BeadStatus {
        #[serde(default = "default_glob")]
        bead: String,
        #[serde(default = "default_glob")]
        rig: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        priority: Option<String>,
    },
    BeadDuration {
        status: String,
        duration_ms: u64,
        #[serde(default = "default_glob")]
        rig: String,
    },
    MetricThreshold {
        metric: String,
        operator: Operator,
        threshold: f64,
    },
    ErrorCount {
        count: u64,
        window_ms: u64,
        #[serde(default = "default_glob")]
        agent: String,
        #[serde(default = "default_glob")]
        rig: String,
    },
    EventPattern {
        event_type: String,
        #[serde(default = "default_glob")]
        source: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        level: Option<String>,
    },
}

fn default_glob() -> String {
    "*".to_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Operator {
    pub fn apply(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    Toast,
    Log { level: String },
    Webhook { url: String, method: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

/// A user-defined alert rule (spec §3, §4.6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
    pub cooldown_ms: u64,
    pub condition: Condition,
    pub actions: Vec<Action>,
    #[serde(default)]
    pub severity: Severity,
    /// Epoch millis of the last dispatched (non-cooldown-suppressed) fire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fired_at: Option<u64>,
}

impl Default for Severity {
    fn default() -> Self {
        Self::Warning
    }
}
