// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;

use rigwatch_model::agent::AgentRole;
use rigwatch_model::bead::Bead;
use rigwatch_model::event::Event;
use rigwatch_model::Snapshot;

use crate::state::{AgentRecord, RigState};

/// Apply one snapshot to `state` in place and return the events it produced,
/// in the tie-break order Agents → Hooks → Beads → Mail (spec §4.3).
///
/// Re-applying the identical snapshot a second time produces no events
/// (idempotence, spec §8): every comparison here is against the stored
/// value, not against "was this snapshot already applied".
pub fn apply_snapshot(state: &mut RigState, snapshot: Snapshot) -> Vec<Event> {
    let mut agent_events = Vec::new();
    let mut hook_events = Vec::new();
    let mut bead_events = Vec::new();
    let mut mail_events = Vec::new();

    let next_agents: BTreeMap<(String, AgentRole), _> =
        snapshot.agents.into_iter().map(|a| ((a.name.clone(), a.role), a)).collect();

    // Rule 2: disappearance with two-consecutive-snapshot flap suppression.
    let mut removed_keys = Vec::new();
    for (key, record) in state.agents.iter_mut() {
        if !next_agents.contains_key(key) {
            record.absent_streak += 1;
            if record.absent_streak >= 2 {
                agent_events.push(Event::AgentRemoved {
                    rig: state.rig.clone(),
                    agent: key.0.clone(),
                    at: snapshot.observed_at,
                });
                removed_keys.push(key.clone());
            }
        }
    }
    for key in removed_keys {
        state.agents.remove(&key);
    }

    // Rules 1, 3, 4: appearance, status change, hook change.
    for (key, next_agent) in next_agents {
        match state.agents.get_mut(&key) {
            None => {
                agent_events.push(Event::AgentAdded {
                    rig: state.rig.clone(),
                    agent: key.0.clone(),
                    at: snapshot.observed_at,
                });
                if next_agent.hook_bead_id.is_some() {
                    hook_events.push(Event::HookChange {
                        rig: state.rig.clone(),
                        agent: key.0.clone(),
                        prev_bead: None,
                        new_bead: next_agent.hook_bead_id.clone(),
                        at: snapshot.observed_at,
                    });
                }
                state.agents.insert(key, AgentRecord { agent: next_agent, absent_streak: 0 });
            }
            Some(record) => {
                record.absent_streak = 0;
                if record.agent.status != next_agent.status {
                    agent_events.push(Event::AgentStatusChange {
                        rig: state.rig.clone(),
                        agent: key.0.clone(),
                        from: record.agent.status.as_str().to_owned(),
                        to: next_agent.status.as_str().to_owned(),
                        at: snapshot.observed_at,
                    });
                }
                if record.agent.hook_bead_id != next_agent.hook_bead_id {
                    hook_events.push(Event::HookChange {
                        rig: state.rig.clone(),
                        agent: key.0.clone(),
                        prev_bead: record.agent.hook_bead_id.clone(),
                        new_bead: next_agent.hook_bead_id.clone(),
                        at: snapshot.observed_at,
                    });
                }
                record.agent = next_agent;
            }
        }
    }

    // Rule 5: bead status change. First observation of a bead is a silent
    // insert (entities are created by first observation, spec §3).
    for next_bead in snapshot.beads {
        match state.beads.get_mut(&next_bead.id) {
            None => {
                state.beads.insert(next_bead.id.clone(), next_bead);
            }
            Some(existing) => {
                if existing.status != next_bead.status {
                    bead_events.push(Event::BeadStatusChange {
                        rig: state.rig.clone(),
                        bead_id: next_bead.id.clone(),
                        from: existing.status.as_str().to_owned(),
                        to: next_bead.status.as_str().to_owned(),
                        at: snapshot.observed_at,
                    });
                    existing.push_status(next_bead.status.clone(), snapshot.observed_at);
                }
                merge_bead_fields(existing, next_bead);
            }
        }
    }

    // Rule 6: new mail, de-duplicated on (rig, from, to, timestamp, path).
    let mut max_ts = state.last_seen_mail_ts;
    for mail in snapshot.mail {
        let key = mail.dedup_key();
        let is_new = match state.last_seen_mail_ts {
            Some(last) => mail.timestamp > last || (mail.timestamp == last && !state.mail_already_seen(&key)),
            None => true,
        };
        if is_new && !state.mail_already_seen(&key) {
            state.remember_mail(key);
            max_ts = Some(max_ts.map_or(mail.timestamp, |m| m.max(mail.timestamp)));
            mail_events.push(Event::Mail(mail));
        }
    }
    state.last_seen_mail_ts = max_ts;
    state.last_observed_at = Some(snapshot.observed_at);

    agent_events.extend(hook_events);
    agent_events.extend(bead_events);
    agent_events.extend(mail_events);
    agent_events
}

fn merge_bead_fields(existing: &mut Bead, next: Bead) {
    existing.title = next.title;
    existing.priority = next.priority;
    existing.owner = next.owner;
    existing.assignee = next.assignee;
    existing.depends_on = next.depends_on;
    existing.updated_at = next.updated_at;
}

#[cfg(test)]
mod tests {
    use rigwatch_model::agent::{Agent, AgentRole};
    use rigwatch_model::bead::{BeadStatus, StatusPoint};

    use super::*;

    fn agent(name: &str, session_running: bool, state: &str, hook: Option<&str>) -> Agent {
        Agent::new("r1", name, AgentRole::Polecat, session_running, state, hook.map(str::to_owned))
    }

    fn bead(id: &str, status: &str, at: u64) -> Bead {
        let status = BeadStatus::from_raw(status);
        Bead {
            id: id.to_owned(),
            title: "t".into(),
            status: status.clone(),
            priority: "p1".into(),
            owner: None,
            assignee: None,
            depends_on: Default::default(),
            created_at: at,
            updated_at: at,
            closed_at: None,
            status_history: vec![StatusPoint { status, at }],
        }
    }

    fn snapshot(observed_at: u64, agents: Vec<Agent>, beads: Vec<Bead>) -> Snapshot {
        Snapshot { rig: "r1".into(), observed_at, agents, beads, mail: vec![], duration_ms: 0 }
    }

    #[test]
    fn status_change_and_hook_change_fire_in_order() {
        let mut state = RigState::new("r1");
        let events1 = apply_snapshot(&mut state, snapshot(1, vec![agent("p1", true, "ready", None)], vec![]));
        assert_eq!(events1.len(), 1);
        assert!(matches!(events1[0], Event::AgentAdded { .. }));

        let events2 =
            apply_snapshot(&mut state, snapshot(2, vec![agent("p1", true, "working", Some("B-1"))], vec![]));
        assert_eq!(events2.len(), 2);
        assert!(matches!(events2[0], Event::AgentStatusChange { ref from, ref to, .. } if from == "idle" && to == "running"));
        assert!(matches!(events2[1], Event::HookChange { ref new_bead, .. } if new_bead.as_deref() == Some("B-1")));
    }

    #[test]
    fn agent_removal_requires_two_consecutive_absences() {
        let mut state = RigState::new("r1");
        apply_snapshot(&mut state, snapshot(1, vec![agent("p1", true, "ready", None)], vec![]));

        let events2 = apply_snapshot(&mut state, snapshot(2, vec![], vec![]));
        assert!(events2.is_empty(), "first absence is suppressed");
        assert!(state.agents.contains_key(&("p1".to_owned(), AgentRole::Polecat)));

        let events3 = apply_snapshot(&mut state, snapshot(3, vec![], vec![]));
        assert_eq!(events3.len(), 1);
        assert!(matches!(events3[0], Event::AgentRemoved { .. }));
        assert!(!state.agents.contains_key(&("p1".to_owned(), AgentRole::Polecat)));
    }

    #[test]
    fn reappearance_resets_absent_streak() {
        let mut state = RigState::new("r1");
        apply_snapshot(&mut state, snapshot(1, vec![agent("p1", true, "ready", None)], vec![]));
        apply_snapshot(&mut state, snapshot(2, vec![], vec![])); // one miss, suppressed
        apply_snapshot(&mut state, snapshot(3, vec![agent("p1", true, "ready", None)], vec![])); // reappears
        let events4 = apply_snapshot(&mut state, snapshot(4, vec![], vec![]));
        assert!(events4.is_empty(), "streak reset by reappearance, this is only the first miss again");
    }

    #[test]
    fn bead_status_change_appends_history() {
        let mut state = RigState::new("r1");
        apply_snapshot(&mut state, snapshot(1, vec![], vec![bead("B-1", "open", 1)]));
        let events = apply_snapshot(&mut state, snapshot(2, vec![], vec![bead("B-1", "in_progress", 2)]));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::BeadStatusChange { ref from, ref to, .. } if from == "open" && to == "in_progress"));
        assert_eq!(state.beads["B-1"].status_history.len(), 2);
    }

    #[test]
    fn applying_the_same_snapshot_twice_is_idempotent() {
        let mut state = RigState::new("r1");
        let snap = snapshot(1, vec![agent("p1", true, "ready", None)], vec![bead("B-1", "open", 1)]);
        apply_snapshot(&mut state, snap.clone());
        let events = apply_snapshot(&mut state, snap);
        assert!(events.is_empty());
    }

    #[test]
    fn mail_dedup_handles_shared_timestamps() {
        use rigwatch_model::mail::Mail;
        let mut state = RigState::new("r1");
        let m1 = Mail {
            rig: "r1".into(),
            from: "a".into(),
            to: "b".into(),
            timestamp: 100,
            subject: None,
            preview: None,
            content: None,
            path: "p1".into(),
        };
        let mut m2 = m1.clone();
        m2.path = "p2".into();

        let mut snap1 = snapshot(1, vec![], vec![]);
        snap1.mail = vec![m1.clone()];
        let events1 = apply_snapshot(&mut state, snap1);
        assert_eq!(events1.len(), 1);

        // second poll re-observes m1 (already seen) and a new mail m2 at the
        // same timestamp — only m2 should fire.
        let mut snap2 = snapshot(2, vec![], vec![]);
        snap2.mail = vec![m1, m2];
        let events2 = apply_snapshot(&mut state, snap2);
        assert_eq!(events2.len(), 1);
    }
}
