// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use indexmap::IndexMap;
use parking_lot::RwLock;
use rigwatch_model::error::{Error, Result};
use rigwatch_model::rule::Rule;

/// Transactional in-memory rule set, write-through persisted by the caller
/// (spec §4.6: "write-through to a small on-disk file"). A disabled rule
/// stops matching at the next event; edits never drop in-flight matches
/// because matching always reads a fresh clone of the current rule set.
pub struct RuleStore {
    rules: RwLock<IndexMap<String, Rule>>,
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleStore {
    pub fn new() -> Self {
        Self { rules: RwLock::new(IndexMap::new()) }
    }

    pub fn from_rules(rules: Vec<Rule>) -> Self {
        let store = Self::new();
        let mut guard = store.rules.write();
        for rule in rules {
            guard.insert(rule.id.clone(), rule);
        }
        drop(guard);
        store
    }

    pub fn insert(&self, rule: Rule) {
        self.rules.write().insert(rule.id.clone(), rule);
    }

    /// `ErrConflict` if another rule already owns `name` (spec §4.6, §7).
    /// `exclude_id` lets an update check against every *other* rule's name.
    pub fn check_name_available(&self, name: &str, exclude_id: Option<&str>) -> Result<()> {
        let collision = self.rules.read().values().any(|r| r.name == name && Some(r.id.as_str()) != exclude_id);
        if collision {
            Err(Error::Conflict(format!("a rule named {name:?} already exists")))
        } else {
            Ok(())
        }
    }

    pub fn get(&self, id: &str) -> Option<Rule> {
        self.rules.read().get(id).cloned()
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        self.rules
            .write()
            .shift_remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("rule {id}")))
    }

    pub fn list(&self) -> Vec<Rule> {
        self.rules.read().values().cloned().collect()
    }

    /// Snapshot used for write-through persistence.
    pub fn snapshot(&self) -> Vec<Rule> {
        self.list()
    }

    /// Record a dispatched (non-cooldown-suppressed) fire so the next
    /// `cooldown_ms` window of matches is suppressed (spec §4.6).
    pub fn record_fire(&self, id: &str, at: u64) {
        if let Some(rule) = self.rules.write().get_mut(id) {
            rule.last_fired_at = Some(at);
        }
    }

    pub fn is_in_cooldown(&self, id: &str, now: u64) -> bool {
        let rules = self.rules.read();
        let Some(rule) = rules.get(id) else { return false };
        match rule.last_fired_at {
            Some(last) => now.saturating_sub(last) < rule.cooldown_ms,
            None => false,
        }
    }
}
