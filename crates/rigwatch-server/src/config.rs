// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use rigwatch_history::HistoryConfig;
use rigwatch_poller::PollerConfig;
use rigwatch_tool::ToolConfig;

/// Server-wide configuration (spec §A.3), mirroring the teacher's
/// `clap::Args`-derived config struct: one flat list of `--long`/`env` pairs,
/// loaded once at `serve`/`watch` startup and threaded down as a typed
/// value rather than read back out of ambient globals.
#[derive(Debug, Clone, clap::Args)]
pub struct ServerConfig {
    /// Host to bind the HTTP/WS surface on.
    #[arg(long, default_value = "127.0.0.1", env = "RIGWATCH_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8900, env = "RIGWATCH_PORT")]
    pub port: u16,

    /// Path or name of the external fleet CLI binary.
    #[arg(long, default_value = "gt", env = "RIGWATCH_GT_BINARY")]
    pub gt_binary: String,

    /// Wall-clock budget for one tool invocation before `ErrTimeout`.
    #[arg(long, default_value_t = 10_000, env = "RIGWATCH_EXEC_TIMEOUT_MS")]
    pub exec_timeout_ms: u64,

    /// Grace period after a timeout/cancel before a child is force-killed.
    #[arg(long, default_value_t = 500, env = "RIGWATCH_KILL_GRACE_MS")]
    pub kill_grace_ms: u64,

    /// Base cadence between polls of one rig.
    #[arg(long, default_value_t = 5_000, env = "RIGWATCH_POLL_INTERVAL_MS")]
    pub poll_interval_ms: u64,

    /// Multiplier applied to the poll interval after each consecutive failure.
    #[arg(long, default_value_t = 1.5, env = "RIGWATCH_POLL_BACKOFF_FACTOR")]
    pub poll_backoff_factor: f64,

    /// Ceiling the back-off interval never exceeds.
    #[arg(long, default_value_t = 60_000, env = "RIGWATCH_POLL_BACKOFF_CAP_MS")]
    pub poll_backoff_cap_ms: u64,

    /// Bounded worker pool size for concurrent per-agent status fetches.
    #[arg(long, default_value_t = 8, env = "RIGWATCH_POLL_WORKER_POOL")]
    pub poll_worker_pool: usize,

    /// Global event ring capacity retained by the history store.
    #[arg(long, default_value_t = 5_000, env = "RIGWATCH_EVENT_RING_CAPACITY")]
    pub event_ring_capacity: usize,

    /// Per-agent status-history ring capacity.
    #[arg(long, default_value_t = 200, env = "RIGWATCH_AGENT_HISTORY_CAPACITY")]
    pub agent_history_capacity: usize,

    /// Metrics sample retention, in hours.
    #[arg(long, default_value_t = 48, env = "RIGWATCH_METRICS_RETENTION_HOURS")]
    pub metrics_retention_hours: u64,

    /// Occurrence count at which an error pattern is classified systemic.
    #[arg(long, default_value_t = 5, env = "RIGWATCH_PATTERN_THRESHOLD")]
    pub pattern_threshold: u64,

    /// Error-pattern eviction window, in hours since last seen.
    #[arg(long, default_value_t = 24, env = "RIGWATCH_PATTERN_EVICTION_HOURS")]
    pub pattern_eviction_hours: u64,

    /// Alert ring capacity.
    #[arg(long, default_value_t = 1_000, env = "RIGWATCH_ALERT_RING_CAPACITY")]
    pub alert_ring_capacity: usize,

    /// Per-session outbound queue capacity.
    #[arg(long, default_value_t = 256, env = "RIGWATCH_SESSION_QUEUE_CAPACITY")]
    pub session_queue_capacity: usize,

    /// How long a session's outbound queue may stay continuously full
    /// before the hub drops that connection (spec §8 scenario 5).
    #[arg(long, default_value_t = 30_000, env = "RIGWATCH_MAX_BACKPRESSURE_MS")]
    pub max_backpressure_ms: u64,

    /// Cadence of the secondary rule tick (`bead_duration`/`metric_threshold`).
    #[arg(long, default_value_t = 10_000, env = "RIGWATCH_RULE_TICK_MS")]
    pub rule_tick_ms: u64,

    /// Per-request timeout for HTTP handlers.
    #[arg(long, default_value_t = 10_000, env = "RIGWATCH_HTTP_REQUEST_TIMEOUT_MS")]
    pub http_request_timeout_ms: u64,

    /// Directory persisted rules/alerts/metrics are written under.
    #[arg(long, default_value = "./rigwatch-state", env = "RIGWATCH_STATE_DIR")]
    pub state_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8900,
            gt_binary: "gt".to_owned(),
            exec_timeout_ms: 10_000,
            kill_grace_ms: 500,
            poll_interval_ms: 5_000,
            poll_backoff_factor: 1.5,
            poll_backoff_cap_ms: 60_000,
            poll_worker_pool: 8,
            event_ring_capacity: 5_000,
            agent_history_capacity: 200,
            metrics_retention_hours: 48,
            pattern_threshold: 5,
            pattern_eviction_hours: 24,
            alert_ring_capacity: 1_000,
            session_queue_capacity: 256,
            max_backpressure_ms: 30_000,
            rule_tick_ms: 10_000,
            http_request_timeout_ms: 10_000,
            state_dir: PathBuf::from("./rigwatch-state"),
        }
    }
}

impl ServerConfig {
    pub fn tool_config(&self) -> ToolConfig {
        ToolConfig {
            binary: self.gt_binary.clone(),
            exec_timeout: Duration::from_millis(self.exec_timeout_ms),
            kill_grace: Duration::from_millis(self.kill_grace_ms),
        }
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            backoff_factor: self.poll_backoff_factor,
            backoff_cap: Duration::from_millis(self.poll_backoff_cap_ms),
            worker_pool: self.poll_worker_pool,
        }
    }

    pub fn history_config(&self) -> HistoryConfig {
        HistoryConfig {
            event_ring_capacity: self.event_ring_capacity,
            agent_history_capacity: self.agent_history_capacity,
            metrics_retention_hours: self.metrics_retention_hours,
            pattern_threshold: self.pattern_threshold,
            pattern_eviction_hours: self.pattern_eviction_hours,
        }
    }

    pub fn rule_tick_interval(&self) -> Duration {
        Duration::from_millis(self.rule_tick_ms)
    }

    pub fn http_request_timeout(&self) -> Duration {
        Duration::from_millis(self.http_request_timeout_ms)
    }

    pub fn rules_path(&self) -> PathBuf {
        self.state_dir.join("rules.json")
    }

    pub fn alerts_path(&self) -> PathBuf {
        self.state_dir.join("alerts.json")
    }

    /// Today's metrics NDJSON path, rotated daily (spec §6.5, §A.5).
    pub fn metrics_path(&self, now_ms: u64) -> PathBuf {
        let days = now_ms / 86_400_000;
        self.state_dir.join(format!("metrics-{days}.ndjson"))
    }
}
