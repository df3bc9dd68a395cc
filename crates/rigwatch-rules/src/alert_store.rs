// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::VecDeque;

use parking_lot::RwLock;
use rigwatch_model::alert::Alert;
use rigwatch_model::error::{Error, Result};

const ALERT_RING_CAPACITY: usize = 1_000;

/// Append-only ring of fired alerts (spec §4.7).
pub struct AlertStore {
    capacity: usize,
    alerts: RwLock<VecDeque<Alert>>,
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new(ALERT_RING_CAPACITY)
    }
}

impl AlertStore {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, alerts: RwLock::new(VecDeque::new()) }
    }

    pub fn push(&self, alert: Alert) {
        let mut alerts = self.alerts.write();
        if alerts.len() >= self.capacity {
            alerts.pop_front();
        }
        alerts.push_back(alert);
    }

    pub fn list(&self) -> Vec<Alert> {
        self.alerts.read().iter().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<Alert> {
        self.alerts.read().iter().find(|a| a.id == id).cloned()
    }

    /// `active -> acknowledged` (spec §4.7): allowed any time before resolve.
    pub fn acknowledge(&self, id: &str, at: u64) -> Result<()> {
        let mut alerts = self.alerts.write();
        let alert = alerts.iter_mut().find(|a| a.id == id).ok_or_else(|| Error::NotFound(format!("alert {id}")))?;
        alert.acknowledge(at);
        Ok(())
    }

    /// `active|acknowledged -> resolved` (spec §4.7): idempotent, a second
    /// call on an already-resolved alert is a no-op success.
    pub fn resolve(&self, id: &str, at: u64) -> Result<()> {
        let mut alerts = self.alerts.write();
        let alert = alerts.iter_mut().find(|a| a.id == id).ok_or_else(|| Error::NotFound(format!("alert {id}")))?;
        alert.resolve(at);
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        let mut alerts = self.alerts.write();
        let before = alerts.len();
        alerts.retain(|a| a.id != id);
        if alerts.len() == before {
            return Err(Error::NotFound(format!("alert {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rigwatch_model::alert::AlertSeverity;
    use rigwatch_model::event::Event;

    use super::*;

    fn alert(id: &str) -> Alert {
        Alert {
            id: id.to_owned(),
            rule_id: "rule1".into(),
            rule_name: "stopped".into(),
            severity: AlertSeverity::Warning,
            timestamp: 0,
            context: Event::AgentAdded { rig: "r1".into(), agent: "p1".into(), at: 0 },
            acknowledged: false,
            acknowledged_at: None,
            resolved: false,
            resolved_at: None,
        }
    }

    #[test]
    fn ring_evicts_oldest_past_capacity() {
        let store = AlertStore::new(2);
        store.push(alert("a1"));
        store.push(alert("a2"));
        store.push(alert("a3"));
        let ids: Vec<String> = store.list().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["a2", "a3"]);
    }

    #[test]
    fn concurrent_resolve_on_resolved_alert_is_a_no_op_success() {
        let store = AlertStore::new(ALERT_RING_CAPACITY);
        store.push(alert("a1"));
        store.resolve("a1", 10).expect("first resolve should succeed");
        store.resolve("a1", 20).expect("second resolve should also succeed as a no-op");
        let a = store.get("a1").expect("alert should exist");
        assert_eq!(a.resolved_at, Some(10));
    }

    #[test]
    fn delete_unknown_alert_is_not_found() {
        let store = AlertStore::new(ALERT_RING_CAPACITY);
        assert!(store.delete("nope").is_err());
    }
}
