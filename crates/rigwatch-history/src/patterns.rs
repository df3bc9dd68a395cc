// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use parking_lot::RwLock;
use rigwatch_model::event::Event;
use rigwatch_model::pattern::{fingerprint, ErrorPattern, PatternLevel};

use crate::config::HistoryConfig;

const HOUR_MS: u64 = 3_600_000;

/// Aggregates `log`/`error` events into [`ErrorPattern`]s by normalized
/// fingerprint (spec §4.5, C6).
pub struct PatternStore {
    threshold: u64,
    eviction_window_ms: u64,
    patterns: RwLock<HashMap<String, ErrorPattern>>,
}

impl PatternStore {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            threshold: config.pattern_threshold,
            eviction_window_ms: config.pattern_eviction_hours * HOUR_MS,
            patterns: RwLock::new(HashMap::new()),
        }
    }

    /// Fold `event` into its pattern if it is a `log`/`error` event, then
    /// evict anything whose `lastSeen` has aged out (spec §4.5).
    pub fn ingest(&self, event: &Event) {
        let (level, rig, source, message, at) = match event {
            Event::Error { rig, source, message, at, .. } => {
                (PatternLevel::Error, rig.as_deref(), source.as_deref(), message.as_str(), *at)
            }
            Event::Log { rig, source, level, message, at } if level.eq_ignore_ascii_case("error") => {
                (PatternLevel::Error, rig.as_deref(), source.as_deref(), message.as_str(), *at)
            }
            Event::Log { rig, source, level, message, at } if level.eq_ignore_ascii_case("warn") => {
                (PatternLevel::Warn, rig.as_deref(), source.as_deref(), message.as_str(), *at)
            }
            _ => return,
        };

        let fp = fingerprint(message);
        let mut patterns = self.patterns.write();
        let entry = patterns.entry(fp.clone()).or_insert_with(|| ErrorPattern::new(fp, level, at));
        entry.observe(source, rig, message, at, self.threshold);

        patterns.retain(|_, p| at.saturating_sub(p.last_seen) <= self.eviction_window_ms);
    }

    pub fn get(&self, fingerprint: &str) -> Option<ErrorPattern> {
        self.patterns.read().get(fingerprint).cloned()
    }

    pub fn list(&self) -> Vec<ErrorPattern> {
        let mut patterns: Vec<ErrorPattern> = self.patterns.read().values().cloned().collect();
        patterns.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        patterns
    }

    pub fn systemic(&self) -> Vec<ErrorPattern> {
        self.list().into_iter().filter(|p| p.is_systemic).collect()
    }
}
