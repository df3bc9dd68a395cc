// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// What a connected operator is currently looking at (spec §3).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rig: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
}

/// A connected dashboard operator. Lifetime == socket connection (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceUser {
    pub session_id: String,
    pub username: String,
    pub color: String,
    pub current_view: PresenceView,
    pub last_activity: u64,
}
