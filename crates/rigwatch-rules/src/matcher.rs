// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use regex::Regex;
use rigwatch_model::event::Event;
use rigwatch_model::glob::{glob_match, optional_eq};
use rigwatch_model::rule::{Condition, Rule};

/// A rule that matched, carrying the context used to build an alert/action
/// payload.
#[derive(Debug, Clone)]
pub struct Fired {
    pub rule: Rule,
    pub context: Event,
}

/// Answers "how many matching `error` events occurred in the trailing
/// window", used by [`Condition::ErrorCount`]. Implemented by the history
/// timeline at the call site so this crate never depends on storage layout.
pub trait ErrorCountSource {
    fn count_errors(&self, rig_glob: &str, agent_glob: &str, window_ms: u64, now: u64) -> u64;
}

/// One bead's elapsed time in its current status, for [`Condition::BeadDuration`]
/// evaluation on the secondary 10s tick.
#[derive(Debug, Clone)]
pub struct BeadDurationInput {
    pub rig: String,
    pub bead_id: String,
    pub status: String,
    pub entered_status_at: u64,
}

/// Evaluate every enabled, non-cooldown rule's event-driven conditions
/// (`agent_status`, `bead_status`, `event_pattern`, `error_count`) against
/// one incoming event (spec §4.6).
pub fn evaluate_event(rules: &[Rule], event: &Event, now: u64, error_counts: &dyn ErrorCountSource) -> Vec<Fired> {
    rules
        .iter()
        .filter(|r| r.enabled)
        .filter(|r| matches_event(&r.condition, event, now, error_counts))
        .map(|r| Fired { rule: r.clone(), context: event.clone() })
        .collect()
}

fn matches_event(condition: &Condition, event: &Event, now: u64, error_counts: &dyn ErrorCountSource) -> bool {
    match condition {
        Condition::AgentStatus { agent, rig, from, to } => match event {
            Event::AgentStatusChange { rig: e_rig, agent: e_agent, from: e_from, to: e_to, .. } => {
                glob_match(agent, e_agent)
                    && glob_match(rig, e_rig)
                    && optional_eq(from, e_from)
                    && optional_eq(to, e_to)
            }
            _ => false,
        },
        Condition::BeadStatus { bead, rig, from, to, priority: _ } => match event {
            Event::BeadStatusChange { rig: e_rig, bead_id, from: e_from, to: e_to, .. } => {
                glob_match(bead, bead_id) && glob_match(rig, e_rig) && optional_eq(from, e_from) && optional_eq(to, e_to)
            }
            _ => false,
        },
        Condition::EventPattern { event_type, source, pattern, level } => {
            if event.type_name() != event_type {
                return false;
            }
            let source_value = event.source().unwrap_or("");
            if !glob_match(source, source_value) {
                return false;
            }
            if let Some(expected_level) = level {
                let actual_level = match event {
                    Event::Log { level, .. } | Event::Error { level, .. } => level.as_str(),
                    _ => "",
                };
                if !actual_level.eq_ignore_ascii_case(expected_level) {
                    return false;
                }
            }
            match pattern {
                Some(p) => match Regex::new(p) {
                    Ok(re) => event.message_text().is_some_and(|m| re.is_match(m)),
                    Err(err) => {
                        tracing::warn!(pattern = %p, error = %err, "invalid event_pattern regex, treating as no match");
                        false
                    }
                },
                None => true,
            }
        }
        Condition::ErrorCount { count, window_ms, agent, rig } => {
            event.source().is_some_and(|s| glob_match(agent, s))
                && event.rig().is_some_and(|r| glob_match(rig, r))
                && error_counts.count_errors(rig, agent, *window_ms, now) >= *count
        }
        Condition::BeadDuration { .. } | Condition::MetricThreshold { .. } => false,
    }
}

/// Evaluate every enabled, non-cooldown rule's tick-driven conditions
/// (`bead_duration`, `metric_threshold`) on the secondary 10s tick.
pub fn evaluate_tick(
    rules: &[Rule],
    now: u64,
    beads: &[BeadDurationInput],
    metric_samples: &[(String, f64)],
) -> Vec<Fired> {
    let mut fired = Vec::new();
    for rule in rules.iter().filter(|r| r.enabled) {
        match &rule.condition {
            Condition::BeadDuration { status, duration_ms, rig } => {
                for bead in beads {
                    if bead.status != *status || !glob_match(rig, &bead.rig) {
                        continue;
                    }
                    if now.saturating_sub(bead.entered_status_at) > *duration_ms {
                        fired.push(Fired {
                            rule: rule.clone(),
                            context: Event::BeadStatusChange {
                                rig: bead.rig.clone(),
                                bead_id: bead.bead_id.clone(),
                                from: bead.status.clone(),
                                to: bead.status.clone(),
                                at: now,
                            },
                        });
                    }
                }
            }
            Condition::MetricThreshold { metric, operator, threshold } => {
                for (path, value) in metric_samples {
                    if path == metric && operator.apply(*value, *threshold) {
                        fired.push(Fired {
                            rule: rule.clone(),
                            context: Event::Feed {
                                rig: String::new(),
                                message: format!("{metric}={value}"),
                                at: now,
                            },
                        });
                    }
                }
            }
            _ => {}
        }
    }
    fired
}

#[cfg(test)]
mod tests {
    use rigwatch_model::rule::{Action, Operator, Severity};

    use super::*;

    struct NoErrors;
    impl ErrorCountSource for NoErrors {
        fn count_errors(&self, _: &str, _: &str, _: u64, _: u64) -> u64 {
            0
        }
    }

    fn rule(condition: Condition) -> Rule {
        Rule {
            id: "r1".into(),
            name: "test".into(),
            description: None,
            enabled: true,
            cooldown_ms: 0,
            condition,
            actions: vec![Action::Toast],
            severity: Severity::Warning,
            last_fired_at: None,
        }
    }

    #[test]
    fn agent_status_condition_matches_glob_and_transition() {
        let r = rule(Condition::AgentStatus {
            agent: "polecat-*".into(),
            rig: "*".into(),
            from: None,
            to: Some("stopped".into()),
        });
        let matching = Event::AgentStatusChange {
            rig: "r1".into(),
            agent: "polecat-1".into(),
            from: "running".into(),
            to: "stopped".into(),
            at: 0,
        };
        let not_matching = Event::AgentStatusChange {
            rig: "r1".into(),
            agent: "polecat-1".into(),
            from: "running".into(),
            to: "idle".into(),
            at: 0,
        };
        assert_eq!(evaluate_event(&[r.clone()], &matching, 0, &NoErrors).len(), 1);
        assert!(evaluate_event(&[r], &not_matching, 0, &NoErrors).is_empty());
    }

    #[test]
    fn event_pattern_requires_type_source_and_regex() {
        let r = rule(Condition::EventPattern {
            event_type: "error".into(),
            source: "*".into(),
            pattern: Some("timeout".into()),
            level: None,
        });
        let e = Event::Error {
            rig: Some("r1".into()),
            source: Some("p1".into()),
            level: "error".into(),
            message: "connection timeout".into(),
            at: 0,
        };
        assert_eq!(evaluate_event(&[r], &e, 0, &NoErrors).len(), 1);
    }

    #[test]
    fn bead_duration_fires_once_threshold_exceeded() {
        let r = rule(Condition::BeadDuration { status: "blocked".into(), duration_ms: 1000, rig: "*".into() });
        let beads = vec![BeadDurationInput {
            rig: "r1".into(),
            bead_id: "B-1".into(),
            status: "blocked".into(),
            entered_status_at: 0,
        }];
        assert!(evaluate_tick(&[r.clone()], 500, &beads, &[]).is_empty());
        assert_eq!(evaluate_tick(&[r], 2000, &beads, &[]).len(), 1);
    }

    #[test]
    fn metric_threshold_compares_latest_sample() {
        let r = rule(Condition::MetricThreshold {
            metric: "health_score".into(),
            operator: Operator::Lt,
            threshold: 50.0,
        });
        let samples = vec![("health_score".to_owned(), 30.0)];
        assert_eq!(evaluate_tick(&[r], 0, &[], &samples).len(), 1);
    }
}
