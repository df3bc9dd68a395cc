// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The REST surface (spec §4.9, §6.3, C10): stateless handlers reading
//! stores under read guards, with a per-request timeout and structured
//! JSON errors on every failure path. Grounded on the teacher's
//! `transport/http.rs` handler shape — `State<Arc<_>>` extraction, a
//! `MuxError`-flavored error type returned via `?`, consistent
//! `Json<T>`/`Path<T>`/`Query<T>` extraction.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use rigwatch_model::agent::AgentRole;
use rigwatch_model::alert::Alert;
use rigwatch_model::error::Error;
use rigwatch_model::event::Event;
use rigwatch_model::rule::{Action, Condition, Rule, Severity};
use rigwatch_model::time::epoch_ms;
use rigwatch_rules::matcher::evaluate_event;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{ApiError, ApiResult};
use crate::state::ServerState;
use crate::supervisor::TimelineErrorCounts;

pub fn routes() -> Router<Arc<ServerState>> {
    Router::new()
        .route("/health", get(health))
        .route("/api/state", get(get_state))
        .route("/api/timeline/events/all", get(get_all_events))
        .route("/api/timeline/events", get(get_events_window))
        .route("/api/metrics/history", get(get_metrics_history))
        .route("/api/metrics/summary", get(get_metrics_summary))
        .route("/api/rules", get(list_rules).post(create_rule))
        .route("/api/rules/test", post(test_rule))
        .route("/api/rules/{id}", get(get_rule).put(update_rule).delete(delete_rule))
        .route("/api/rules/{id}/toggle", post(toggle_rule))
        .route("/api/alerts", get(list_alerts))
        .route("/api/alerts/{id}", axum::routing::delete(delete_alert))
        .route("/api/alerts/{id}/acknowledge", post(acknowledge_alert))
        .route("/api/alerts/{id}/resolve", post(resolve_alert))
        .route("/api/events/export", get(export_events))
        .route("/api/agents/{rig}/{role}/{name}/peek", get(peek_agent))
        .route("/api/timeline/state", get(get_timeline_state))
        .route("/api/replay/jobs", get(list_replay_jobs).post(create_replay_job))
        .route("/api/replay/jobs/{id}", get(get_replay_job))
}

async fn with_timeout<T>(state: &ServerState, fut: impl std::future::Future<Output = Result<T, Error>>) -> Result<T, Error> {
    match tokio::time::timeout(state.config.http_request_timeout(), fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(state.config.http_request_timeout_ms)),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    rig_count: usize,
    agent_count: usize,
    ws_connections: usize,
}

async fn health(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        rig_count: state.world.known_rigs().await.len(),
        agent_count: state.world.agent_count().await,
        ws_connections: state.ws_connections().await,
    })
}

async fn get_state(State(state): State<Arc<ServerState>>) -> Json<rigwatch_world::FleetView> {
    Json(state.world.fleet_view().await)
}

async fn get_all_events(State(state): State<Arc<ServerState>>) -> Json<Vec<Event>> {
    let bounds = state.timeline.bounds();
    let (start, end) = bounds.map(|b| (b.start, b.end)).unwrap_or((0, u64::MAX));
    Json(state.timeline.events_between(start, end, None))
}

#[derive(Deserialize)]
struct EventsWindowQuery {
    start: u64,
    end: u64,
    #[serde(rename = "type")]
    type_filter: Option<String>,
}

async fn get_events_window(State(state): State<Arc<ServerState>>, Query(q): Query<EventsWindowQuery>) -> Json<Vec<Event>> {
    Json(state.timeline.events_between(q.start, q.end, q.type_filter.as_deref()))
}

#[derive(Deserialize)]
struct RangeQuery {
    start: Option<u64>,
    end: Option<u64>,
}

async fn get_metrics_history(State(state): State<Arc<ServerState>>, Query(q): Query<RangeQuery>) -> Json<Vec<rigwatch_model::MetricsSample>> {
    let start = q.start.unwrap_or(0);
    let end = q.end.unwrap_or(u64::MAX);
    let samples = state.metrics.samples().into_iter().filter(|s| s.timestamp >= start && s.timestamp <= end).collect();
    Json(samples)
}

#[derive(Serialize)]
struct MetricsSummary {
    from: u64,
    to: u64,
    sample_count: usize,
    avg_health_score: f64,
    avg_poll_duration_ms: f64,
    total_event_volume: u64,
    successful_polls: u32,
    failed_polls: u32,
    /// `pokeNow` refresh requests coalesced into a poll across the range
    /// (spec §A.2/§B "poke_now coalescing metric").
    total_coalesced_pokes: u32,
}

async fn get_metrics_summary(State(state): State<Arc<ServerState>>, Query(q): Query<RangeQuery>) -> Json<MetricsSummary> {
    let start = q.start.unwrap_or(0);
    let end = q.end.unwrap_or(u64::MAX);
    let samples: Vec<_> = state.metrics.samples().into_iter().filter(|s| s.timestamp >= start && s.timestamp <= end).collect();

    let sample_count = samples.len();
    let avg = |f: fn(&rigwatch_model::MetricsSample) -> f64| -> f64 {
        if samples.is_empty() {
            0.0
        } else {
            samples.iter().map(f).sum::<f64>() / samples.len() as f64
        }
    };

    Json(MetricsSummary {
        from: start,
        to: if end == u64::MAX { epoch_ms() } else { end },
        sample_count,
        avg_health_score: avg(|s| s.health_score),
        avg_poll_duration_ms: avg(|s| s.poll_duration.avg_ms),
        total_event_volume: samples.iter().map(|s| s.event_volume).sum(),
        successful_polls: samples.iter().map(|s| s.successful_polls).sum(),
        failed_polls: samples.iter().map(|s| s.failed_polls).sum(),
        total_coalesced_pokes: samples.iter().map(|s| s.coalesced_pokes).sum(),
    })
}

#[derive(Deserialize)]
struct RuleInput {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default)]
    cooldown_ms: u64,
    condition: Condition,
    #[serde(default)]
    actions: Vec<Action>,
    #[serde(default)]
    severity: Severity,
}

fn default_true() -> bool {
    true
}

async fn list_rules(State(state): State<Arc<ServerState>>) -> Json<Vec<Rule>> {
    Json(state.rule_store.list())
}

async fn get_rule(State(state): State<Arc<ServerState>>, Path(id): Path<String>) -> ApiResult<Json<Rule>> {
    state.rule_store.get(&id).map(Json).ok_or_else(|| ApiError(Error::NotFound(format!("rule {id}"))))
}

async fn create_rule(State(state): State<Arc<ServerState>>, Json(input): Json<RuleInput>) -> ApiResult<Json<Rule>> {
    state.rule_store.check_name_available(&input.name, None).map_err(ApiError)?;
    let rule = Rule {
        id: uuid::Uuid::new_v4().to_string(),
        name: input.name,
        description: input.description,
        enabled: input.enabled,
        cooldown_ms: input.cooldown_ms,
        condition: input.condition,
        actions: input.actions,
        severity: input.severity,
        last_fired_at: None,
    };
    state.rule_store.insert(rule.clone());
    state.persist().await.map_err(|_| ApiError(Error::Internal("failed to persist rules".into())))?;
    Ok(Json(rule))
}

async fn update_rule(State(state): State<Arc<ServerState>>, Path(id): Path<String>, Json(input): Json<RuleInput>) -> ApiResult<Json<Rule>> {
    let existing = state.rule_store.get(&id).ok_or_else(|| ApiError(Error::NotFound(format!("rule {id}"))))?;
    state.rule_store.check_name_available(&input.name, Some(&id)).map_err(ApiError)?;
    let rule = Rule {
        id,
        name: input.name,
        description: input.description,
        enabled: input.enabled,
        cooldown_ms: input.cooldown_ms,
        condition: input.condition,
        actions: input.actions,
        severity: input.severity,
        last_fired_at: existing.last_fired_at,
    };
    state.rule_store.insert(rule.clone());
    state.persist().await.map_err(|_| ApiError(Error::Internal("failed to persist rules".into())))?;
    Ok(Json(rule))
}

async fn delete_rule(State(state): State<Arc<ServerState>>, Path(id): Path<String>) -> ApiResult<Json<serde_json::Value>> {
    state.rule_store.remove(&id).map_err(ApiError)?;
    state.persist().await.map_err(|_| ApiError(Error::Internal("failed to persist rules".into())))?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

async fn toggle_rule(State(state): State<Arc<ServerState>>, Path(id): Path<String>) -> ApiResult<Json<Rule>> {
    let mut rule = state.rule_store.get(&id).ok_or_else(|| ApiError(Error::NotFound(format!("rule {id}"))))?;
    rule.enabled = !rule.enabled;
    state.rule_store.insert(rule.clone());
    state.persist().await.map_err(|_| ApiError(Error::Internal("failed to persist rules".into())))?;
    Ok(Json(rule))
}

#[derive(Deserialize)]
struct TestRuleRequest {
    rule: RuleInput,
    event: Event,
}

#[derive(Serialize)]
struct TestRuleResponse {
    matched: bool,
}

async fn test_rule(State(state): State<Arc<ServerState>>, Json(req): Json<TestRuleRequest>) -> Json<TestRuleResponse> {
    let rule = Rule {
        id: "dry-run".to_owned(),
        name: req.rule.name,
        description: req.rule.description,
        enabled: true,
        cooldown_ms: req.rule.cooldown_ms,
        condition: req.rule.condition,
        actions: req.rule.actions,
        severity: req.rule.severity,
        last_fired_at: None,
    };
    let error_counts = TimelineErrorCounts { timeline: Arc::clone(&state.timeline) };
    let matched = !evaluate_event(&[rule], &req.event, epoch_ms(), &error_counts).is_empty();
    Json(TestRuleResponse { matched })
}

async fn list_alerts(State(state): State<Arc<ServerState>>) -> Json<Vec<Alert>> {
    Json(state.alert_store.list())
}

async fn acknowledge_alert(State(state): State<Arc<ServerState>>, Path(id): Path<String>) -> ApiResult<Json<serde_json::Value>> {
    state.alert_store.acknowledge(&id, epoch_ms()).map_err(ApiError)?;
    Ok(Json(serde_json::json!({ "acknowledged": id })))
}

async fn resolve_alert(State(state): State<Arc<ServerState>>, Path(id): Path<String>) -> ApiResult<Json<serde_json::Value>> {
    state.alert_store.resolve(&id, epoch_ms()).map_err(ApiError)?;
    Ok(Json(serde_json::json!({ "resolved": id })))
}

async fn delete_alert(State(state): State<Arc<ServerState>>, Path(id): Path<String>) -> ApiResult<Json<serde_json::Value>> {
    state.alert_store.delete(&id).map_err(ApiError)?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

#[derive(Deserialize)]
struct ExportQuery {
    #[serde(default = "default_format")]
    format: String,
    rig: Option<String>,
    #[serde(rename = "type")]
    type_filter: Option<String>,
    search: Option<String>,
}

fn default_format() -> String {
    "json".to_owned()
}

async fn export_events(State(state): State<Arc<ServerState>>, Query(q): Query<ExportQuery>) -> ApiResult<axum::response::Response> {
    let bounds = state.timeline.bounds();
    let (start, end) = bounds.map(|b| (b.start, b.end)).unwrap_or((0, u64::MAX));
    let events: Vec<Event> = state
        .timeline
        .events_between(start, end, q.type_filter.as_deref())
        .into_iter()
        .filter(|e| q.rig.as_deref().is_none_or(|r| e.rig() == Some(r)))
        .filter(|e| q.search.as_deref().is_none_or(|needle| e.message_text().is_some_and(|m| m.contains(needle))))
        .collect();

    use axum::response::IntoResponse;
    match q.format.as_str() {
        "csv" => Ok(export_csv(&events).into_response()),
        "json" => Ok(Json(events).into_response()),
        other => Err(ApiError(Error::BadRequest(format!("unsupported export format {other}")))),
    }
}

fn export_csv(events: &[Event]) -> String {
    let mut out = String::from("type,rig,timestamp,message\n");
    for event in events {
        let rig = event.rig().unwrap_or("");
        let message = event.message_text().unwrap_or("").replace('"', "\"\"");
        out.push_str(&format!("{},{},{},\"{}\"\n", event.type_name(), rig, event.timestamp(), message));
    }
    out
}

async fn peek_agent(
    State(state): State<Arc<ServerState>>,
    Path((rig, role, name)): Path<(String, String, String)>,
) -> ApiResult<Json<serde_json::Value>> {
    parse_role(&role)?;
    let cancel = CancellationToken::new();
    let value = with_timeout(&state, rigwatch_tool::commands::polecat_peek(&state.invoker, &rig, &name, &cancel)).await.map_err(ApiError)?;
    Ok(Json(value))
}

fn parse_role(raw: &str) -> Result<AgentRole, ApiError> {
    [AgentRole::Mayor, AgentRole::Witness, AgentRole::Refinery, AgentRole::Crew, AgentRole::Polecat]
        .into_iter()
        .find(|r| r.as_str() == raw)
        .ok_or_else(|| ApiError(Error::BadRequest(format!("unknown agent role {raw}"))))
}

#[derive(Deserialize)]
struct TimelineStateQuery {
    timestamp: u64,
}

async fn get_timeline_state(State(state): State<Arc<ServerState>>, Query(q): Query<TimelineStateQuery>) -> ApiResult<Json<rigwatch_world::FleetView>> {
    state.timeline.state_at(q.timestamp).map(Json).map_err(ApiError)
}

#[derive(Deserialize)]
struct CreateReplayJobRequest {
    timestamps: Vec<u64>,
}

/// Resolve a batch of timestamps in one request, grounded on the teacher's
/// batched-lookup CLI commands rather than one round trip per timestamp.
async fn create_replay_job(State(state): State<Arc<ServerState>>, Json(req): Json<CreateReplayJobRequest>) -> Json<crate::replay::ReplayJob> {
    let results: Vec<crate::replay::ReplayResult> = req
        .timestamps
        .iter()
        .map(|&timestamp| match state.timeline.state_at(timestamp) {
            Ok(view) => crate::replay::ReplayResult { timestamp, state: Some(view), error: None },
            Err(error) => crate::replay::ReplayResult { timestamp, state: None, error: Some(error.to_string()) },
        })
        .collect();
    let status = if results.iter().any(|r| r.error.is_some()) {
        crate::replay::ReplayStatus::Failed
    } else {
        crate::replay::ReplayStatus::Completed
    };
    let job = crate::replay::ReplayJob { id: uuid::Uuid::new_v4().to_string(), created_at: epoch_ms(), status, results };
    state.replay_store.insert(job.clone());
    Json(job)
}

async fn list_replay_jobs(State(state): State<Arc<ServerState>>) -> Json<Vec<crate::replay::ReplayJob>> {
    Json(state.replay_store.list())
}

async fn get_replay_job(State(state): State<Arc<ServerState>>, Path(id): Path<String>) -> ApiResult<Json<crate::replay::ReplayJob>> {
    state.replay_store.get(&id).map(Json).ok_or_else(|| ApiError(Error::NotFound(format!("replay job {id}"))))
}
