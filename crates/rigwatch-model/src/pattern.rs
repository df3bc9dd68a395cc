// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

/// An error/log message normalized for pattern aggregation (spec §4.5):
/// lowercase, collapsed whitespace, long digit runs replaced with `N`,
/// hex/UUID runs replaced with `X`, truncated to 200 chars.
pub fn fingerprint(message: &str) -> String {
    let lower = message.to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut chars = lower.chars().peekable();
    let mut last_was_space = false;

    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            if !last_was_space && !out.is_empty() {
                out.push(' ');
            }
            last_was_space = true;
            continue;
        }
        last_was_space = false;

        // A run of hex digits and dashes covers both plain numbers and
        // hex/UUID ids; classify it by composition once the whole run is
        // known rather than branching on the first character alone.
        if c.is_ascii_hexdigit() || c == '-' {
            let mut run = String::from(c);
            while matches!(chars.peek(), Some(d) if d.is_ascii_hexdigit() || *d == '-') {
                if let Some(next) = chars.next() {
                    run.push(next);
                }
            }
            let digits_only = run.chars().all(|d| d.is_ascii_digit());
            let has_hex_letter = run.chars().any(|d| d.is_ascii_alphabetic());
            if digits_only && run.len() >= 2 {
                out.push('N');
            } else if has_hex_letter && run.len() >= 8 {
                out.push('X');
            } else {
                out.push_str(&run);
            }
            continue;
        }

        out.push(c);
    }

    truncate_at_char_boundary(&mut out, 200);
    out
}

/// Truncate `s` to at most `cap` bytes without splitting a multi-byte UTF-8
/// character, walking back to the nearest preceding char boundary first.
fn truncate_at_char_boundary(s: &mut String, cap: usize) {
    if s.len() <= cap {
        return;
    }
    let mut cap = cap;
    while !s.is_char_boundary(cap) {
        cap -= 1;
    }
    s.truncate(cap);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternLevel {
    Error,
    Warn,
}

/// Aggregated occurrences of a normalized error/log fingerprint (spec §3, §4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPattern {
    pub fingerprint: String,
    pub level: PatternLevel,
    pub count: u64,
    pub first_seen: u64,
    pub last_seen: u64,
    pub affected_agents: BTreeSet<String>,
    pub affected_rigs: BTreeSet<String>,
    pub examples: VecDeque<String>,
    pub is_systemic: bool,
}

const MAX_EXAMPLES: usize = 5;

impl ErrorPattern {
    pub fn new(fingerprint: String, level: PatternLevel, at: u64) -> Self {
        Self {
            fingerprint,
            level,
            count: 0,
            first_seen: at,
            last_seen: at,
            affected_agents: BTreeSet::new(),
            affected_rigs: BTreeSet::new(),
            examples: VecDeque::new(),
            is_systemic: false,
        }
    }

    /// Fold one more observation in and re-evaluate systemic classification
    /// (spec §4.5): `|agents| >= 2 && |rigs| >= 2 && count >= threshold`.
    pub fn observe(
        &mut self,
        agent: Option<&str>,
        rig: Option<&str>,
        example: &str,
        at: u64,
        threshold: u64,
    ) {
        self.count += 1;
        self.last_seen = at;
        if let Some(a) = agent {
            self.affected_agents.insert(a.to_owned());
        }
        if let Some(r) = rig {
            self.affected_rigs.insert(r.to_owned());
        }
        if self.examples.len() == MAX_EXAMPLES {
            self.examples.pop_front();
        }
        self.examples.push_back(example.to_owned());
        self.is_systemic = self.affected_agents.len() >= 2
            && self.affected_rigs.len() >= 2
            && self.count >= threshold;
    }
}
