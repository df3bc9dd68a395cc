// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// An observed message between agents within a rig (spec §3). Immutable once
/// observed; de-duplicated on `(rig, from, to, timestamp, path)` rather than
/// `timestamp` alone, since two mails can share a timestamp (spec §9).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mail {
    pub rig: String,
    pub from: String,
    pub to: String,
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub path: String,
}

impl Mail {
    /// The de-duplication key used by the diff engine (spec §9).
    pub fn dedup_key(&self) -> (String, String, String, u64, String) {
        (self.rig.clone(), self.from.clone(), self.to.clone(), self.timestamp, self.path.clone())
    }
}
