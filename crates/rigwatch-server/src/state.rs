// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared server context (spec §5 "one explicit Server context" redesign
//! note), grounded on the teacher's `MuxState`: every long-lived store is
//! an `Arc`, constructed once at startup and cloned into every task and
//! request handler rather than reached for via a global.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rigwatch_history::{HistoryConfig, MetricsCollector, PatternStore, Timeline};
use rigwatch_hub::{Hub, SessionId};
use rigwatch_rules::{AlertStore, RuleStore};
use rigwatch_tool::Invoker;
use rigwatch_world::WorldModel;
use tokio_util::sync::CancellationToken;

use crate::config::ServerConfig;
use crate::metrics_log::MetricsLog;
use crate::replay::ReplayStore;

/// Outstanding poke handle per rig, so `poll:now`/`POST /api/rules/test`
/// style immediacy requests can nudge a specific poller instead of waiting
/// out its backoff interval.
pub struct ServerState {
    pub config: Arc<ServerConfig>,
    pub world: Arc<WorldModel>,
    pub timeline: Arc<Timeline>,
    pub metrics: Arc<MetricsCollector>,
    pub metrics_log: Arc<MetricsLog>,
    pub patterns: Arc<PatternStore>,
    pub rule_store: Arc<RuleStore>,
    pub alert_store: Arc<AlertStore>,
    pub hub: Arc<Hub>,
    pub invoker: Arc<Invoker>,
    pub http_client: reqwest::Client,
    pub shutdown: CancellationToken,
    pub poke_handles: RwLock<HashMap<String, rigwatch_poller::PokeHandle>>,
    pub replay_store: Arc<ReplayStore>,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> anyhow::Result<Arc<Self>> {
        std::fs::create_dir_all(&config.state_dir)?;

        let history_config: HistoryConfig = config.history_config();
        let persisted_rules = rigwatch_rules::persist::load_rules(&config.rules_path())?;
        let persisted_alerts = rigwatch_rules::persist::load_alerts(&config.alerts_path())?;

        let alert_store = AlertStore::new(config.alert_ring_capacity);
        for alert in persisted_alerts {
            alert_store.push(alert);
        }

        let http_client = reqwest::Client::builder().timeout(config.http_request_timeout()).build()?;

        Ok(Arc::new(Self {
            invoker: Arc::new(Invoker::new(config.tool_config())),
            world: Arc::new(WorldModel::new()),
            timeline: Arc::new(Timeline::new(history_config.clone())),
            metrics: Arc::new(MetricsCollector::new(history_config.clone())),
            metrics_log: Arc::new(MetricsLog::new(config.state_dir.clone())),
            patterns: Arc::new(PatternStore::new(history_config)),
            rule_store: Arc::new(RuleStore::from_rules(persisted_rules)),
            alert_store: Arc::new(alert_store),
            hub: Hub::with_config(config.session_queue_capacity, config.max_backpressure_ms),
            http_client,
            shutdown: CancellationToken::new(),
            poke_handles: RwLock::new(HashMap::new()),
            replay_store: Arc::new(ReplayStore::new()),
            config: Arc::new(config),
        }))
    }

    pub async fn persist(&self) -> anyhow::Result<()> {
        rigwatch_rules::persist::save_rules(&self.config.rules_path(), &self.rule_store.list())?;
        rigwatch_rules::persist::save_alerts(&self.config.alerts_path(), &self.alert_store.list())?;
        Ok(())
    }

    pub async fn poke(&self, rig: Option<&str>) {
        let handles = self.poke_handles.read();
        match rig {
            Some(rig) => {
                if let Some(handle) = handles.get(rig) {
                    handle.poke();
                    self.metrics.record_poke(rigwatch_model::time::epoch_ms());
                }
            }
            None => {
                for handle in handles.values() {
                    handle.poke();
                    self.metrics.record_poke(rigwatch_model::time::epoch_ms());
                }
            }
        }
    }

    pub async fn ws_connections(&self) -> usize {
        self.hub.session_count().await
    }

    /// Forget everything tracked for a disconnected session, mirrored from
    /// the hub's own registry (spec §4.8 cancellation -> drain -> unregister).
    pub async fn disconnect(&self, id: SessionId) {
        self.hub.unregister(id).await;
    }
}
