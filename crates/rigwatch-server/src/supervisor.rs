// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The one supervising task (spec §5): discovers rigs, spawns a poller per
//! rig, folds every outcome into the world model/timeline/patterns/metrics,
//! runs the rule engine against each event and on a secondary tick, and
//! publishes everything onto the hub. Grounded on the teacher's
//! `Aggregator` task shape (one event loop owning every downstream store).

use std::sync::Arc;

use rigwatch_hub::ServerFrame;
use rigwatch_model::alert::{Alert, AlertSeverity};
use rigwatch_model::event::Event;
use rigwatch_model::rule::Severity;
use rigwatch_model::time::epoch_ms;
use rigwatch_poller::{spawn_rig_poller, PollOutcome};
use rigwatch_rules::matcher::{evaluate_event, evaluate_tick, BeadDurationInput, ErrorCountSource, Fired};
use rigwatch_rules::{dispatch_actions, DispatchContext, DispatchEffect};
use tokio::sync::mpsc;

use crate::state::ServerState;

const POLL_OUTCOME_CHANNEL_CAPACITY: usize = 256;

/// Adapts the timeline's `events_between` scan to the rule engine's
/// `ErrorCountSource` seam, so the rules crate never depends on storage
/// layout (spec §4.6). Shared with the `POST /api/rules/test` handler so a
/// dry-run evaluates `error_count` conditions the same way the live engine
/// does.
pub(crate) struct TimelineErrorCounts {
    pub(crate) timeline: Arc<rigwatch_history::Timeline>,
}

impl ErrorCountSource for TimelineErrorCounts {
    fn count_errors(&self, rig_glob: &str, agent_glob: &str, window_ms: u64, now: u64) -> u64 {
        let start = now.saturating_sub(window_ms);
        self.timeline
            .events_between(start, now, Some("error"))
            .iter()
            .filter(|e| {
                e.rig().is_some_and(|r| rigwatch_model::glob::glob_match(rig_glob, r))
                    && e.source().is_some_and(|s| rigwatch_model::glob::glob_match(agent_glob, s))
            })
            .count() as u64
    }
}

fn to_alert_severity(severity: Severity) -> AlertSeverity {
    match severity {
        Severity::Critical => AlertSeverity::Critical,
        Severity::Warning => AlertSeverity::Warning,
        Severity::Info => AlertSeverity::Info,
    }
}

/// Run the whole backend pipeline until `state.shutdown` fires. Spawns one
/// poller per rig discovered via `rig ls`, a consumer loop folding poll
/// outcomes into every downstream store, and a secondary tick task for
/// `bead_duration`/`metric_threshold` rules.
pub async fn run(state: Arc<ServerState>) {
    let (outcome_tx, outcome_rx) = mpsc::channel(POLL_OUTCOME_CHANNEL_CAPACITY);

    match rigwatch_tool::commands::rig_ls(&state.invoker, &state.shutdown).await {
        Ok(rigs) => {
            for rig in rigs {
                spawn_poller_for(&state, rig, outcome_tx.clone()).await;
            }
        }
        Err(error) => {
            tracing::warn!(%error, "initial rig discovery failed, starting with no rigs");
        }
    }

    let consumer = tokio::spawn(consume_outcomes(Arc::clone(&state), outcome_rx));
    let ticker = tokio::spawn(rule_tick_loop(Arc::clone(&state)));

    state.shutdown.cancelled().await;
    let _ = tokio::join!(consumer, ticker);
}

async fn spawn_poller_for(state: &Arc<ServerState>, rig: String, outcome_tx: mpsc::Sender<PollOutcome>) {
    let cancel = state.shutdown.clone();
    let handle = spawn_rig_poller(rig.clone(), Arc::clone(&state.invoker), state.config.poller_config(), outcome_tx, cancel);
    state.poke_handles.write().insert(rig, handle);
}

async fn consume_outcomes(state: Arc<ServerState>, mut outcome_rx: mpsc::Receiver<PollOutcome>) {
    let error_counts = TimelineErrorCounts { timeline: Arc::clone(&state.timeline) };

    loop {
        tokio::select! {
            biased;
            _ = state.shutdown.cancelled() => break,
            outcome = outcome_rx.recv() => {
                let Some(outcome) = outcome else { break };
                match outcome {
                    PollOutcome::Snapshot(snapshot) => handle_snapshot(&state, &error_counts, snapshot).await,
                    PollOutcome::Failed { rig, at, error } => handle_poll_failure(&state, &error_counts, rig, at, error).await,
                }
            }
        }
    }
}

async fn handle_snapshot(state: &Arc<ServerState>, error_counts: &TimelineErrorCounts, snapshot: rigwatch_model::Snapshot) {
    let observed_at = snapshot.observed_at;
    let duration_ms = snapshot.duration_ms;

    let events = state.world.apply(snapshot).await;
    state.metrics.record_poll(observed_at, duration_ms, true);

    for event in events {
        publish_event(state, error_counts, event).await;
    }

    let fleet = state.world.fleet_view().await;
    state.timeline.record_checkpoint(observed_at, fleet);
}

async fn handle_poll_failure(state: &Arc<ServerState>, error_counts: &TimelineErrorCounts, rig: String, at: u64, error: rigwatch_model::Error) {
    state.metrics.record_poll(at, 0, false);
    let event = Event::Error { rig: Some(rig), source: None, level: "warn".into(), message: error.to_string(), at };
    publish_event(state, error_counts, event).await;
}

/// Record, pattern-ingest, fan out and rule-match one event, in that order
/// (spec §4.3–§4.6): downstream consumers always see an event already
/// durable in the timeline before they see it on the wire.
async fn publish_event(state: &Arc<ServerState>, error_counts: &TimelineErrorCounts, event: Event) {
    state.timeline.record(event.clone());
    state.patterns.ingest(&event);
    state.metrics.record_event(event.timestamp());
    state.hub.publish(ServerFrame::Event(event.clone())).await;

    let now = epoch_ms();
    let rules = state.rule_store.list();
    let fired = evaluate_event(&rules, &event, now, error_counts);
    for f in fired {
        handle_fired(state, f, now).await;
    }
}

/// Secondary tick (spec default 10s): evaluates `bead_duration` and
/// `metric_threshold` conditions, which have no single triggering event.
async fn rule_tick_loop(state: Arc<ServerState>) {
    let mut interval = tokio::time::interval(state.config.rule_tick_interval());
    loop {
        tokio::select! {
            biased;
            _ = state.shutdown.cancelled() => break,
            _ = interval.tick() => run_rule_tick(&state).await,
        }
    }
}

async fn run_rule_tick(state: &Arc<ServerState>) {
    let now = epoch_ms();
    let fleet = state.world.fleet_view().await;

    let beads: Vec<BeadDurationInput> = fleet
        .rigs
        .iter()
        .flat_map(|rig_view| {
            rig_view.beads.iter().map(move |bead| BeadDurationInput {
                rig: rig_view.rig.clone(),
                bead_id: bead.id.clone(),
                status: bead.status.as_str().to_owned(),
                entered_status_at: bead.status_history.last().map(|p| p.at).unwrap_or(bead.updated_at),
            })
        })
        .collect();

    let metric_samples: Vec<(String, f64)> = state
        .metrics
        .samples()
        .last()
        .map(|sample| {
            vec![
                ("health_score".to_owned(), sample.health_score),
                ("poll_duration.avg_ms".to_owned(), sample.poll_duration.avg_ms),
                ("poll_duration.p95_ms".to_owned(), sample.poll_duration.p95_ms),
                ("event_volume".to_owned(), sample.event_volume as f64),
            ]
        })
        .unwrap_or_default();

    let rules = state.rule_store.list();
    let fired = evaluate_tick(&rules, now, &beads, &metric_samples);
    for f in fired {
        handle_fired(state, f, now).await;
    }
}

/// Drive one fired rule to completion: cooldown check, alert creation and
/// persistence, action dispatch, and fan-out as an `alert` frame (spec
/// §4.6, §4.7).
async fn handle_fired(state: &Arc<ServerState>, fired: Fired, now: u64) {
    if state.rule_store.is_in_cooldown(&fired.rule.id, now) {
        return;
    }
    state.rule_store.record_fire(&fired.rule.id, now);

    let alert = Alert {
        id: uuid::Uuid::new_v4().to_string(),
        rule_id: fired.rule.id.clone(),
        rule_name: fired.rule.name.clone(),
        severity: to_alert_severity(fired.rule.severity),
        timestamp: now,
        context: fired.context.clone(),
        acknowledged: false,
        acknowledged_at: None,
        resolved: false,
        resolved_at: None,
    };
    state.alert_store.push(alert.clone());

    let ctx = DispatchContext { http: &state.http_client, alert_id: &alert.id };
    let effects = dispatch_actions(&fired.rule, &fired.context, &ctx);
    // Only a `toast` action earns the live `alert` frame fan-out (spec
    // §4.6); `log`/`webhook`-only rules still record the alert above but
    // never reach connected dashboards.
    if effects.iter().any(|e| matches!(e, DispatchEffect::Toast { .. })) {
        state.hub.publish(ServerFrame::Alert(rigwatch_hub::frame::AlertFrame { frame_type: "alert", alert })).await;
    }
}
