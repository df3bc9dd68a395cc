// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

/// Configuration for the tool invoker (spec §4.1).
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// Path or name of the external fleet CLI binary.
    pub binary: String,
    /// Wall-clock budget for one invocation before `ErrTimeout` fires.
    pub exec_timeout: Duration,
    /// Grace period after a timeout/cancel before the child is force-killed.
    pub kill_grace: Duration,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            binary: "gt".to_owned(),
            exec_timeout: Duration::from_millis(10_000),
            kill_grace: Duration::from_millis(500),
        }
    }
}
