// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use rigwatch_model::event::Event;
use rigwatch_model::rule::{Action, Rule};
use serde::Serialize;

const WEBHOOK_BACKOFFS_MS: [u64; 3] = [1_000, 3_000, 9_000];

/// What a `toast` action publishes downstream (picked up by the connection
/// hub as an `alert` frame, spec §4.6/§6).
pub enum DispatchEffect {
    Toast { rule_id: String, context: Event },
}

#[derive(Serialize)]
struct WebhookBody<'a> {
    rule: &'a str,
    context: &'a Event,
    alert: &'a str,
}

/// Shared state action dispatch needs beyond the matched rule/event.
pub struct DispatchContext<'a> {
    pub http: &'a reqwest::Client,
    pub alert_id: &'a str,
}

/// Dispatch every action on a fired rule (spec §4.6). `toast` effects are
/// returned to the caller to forward into the event stream; `log` is
/// emitted inline; `webhook` is fired as a detached retrying task so one
/// slow/unreachable endpoint can never block the rule tick.
pub fn dispatch_actions(rule: &Rule, context: &Event, ctx: &DispatchContext<'_>) -> Vec<DispatchEffect> {
    let mut effects = Vec::new();
    for action in &rule.actions {
        match action {
            Action::Toast => {
                effects.push(DispatchEffect::Toast { rule_id: rule.id.clone(), context: context.clone() });
            }
            Action::Log { level } => {
                log_action(level, rule, context);
            }
            Action::Webhook { url, method } => {
                spawn_webhook(url.clone(), method.clone(), rule.id.clone(), context.clone(), ctx.alert_id.to_owned(), ctx.http.clone());
            }
        }
    }
    effects
}

fn log_action(level: &str, rule: &Rule, context: &Event) {
    match level.to_ascii_lowercase().as_str() {
        "error" => tracing::error!(rule = %rule.name, event = ?context, "rule fired"),
        "warn" => tracing::warn!(rule = %rule.name, event = ?context, "rule fired"),
        "debug" => tracing::debug!(rule = %rule.name, event = ?context, "rule fired"),
        _ => tracing::info!(rule = %rule.name, event = ?context, "rule fired"),
    }
}

fn spawn_webhook(url: String, method: String, rule_id: String, context: Event, alert_id: String, http: reqwest::Client) {
    tokio::spawn(async move {
        let body = WebhookBody { rule: &rule_id, context: &context, alert: &alert_id };
        for (attempt, backoff_ms) in WEBHOOK_BACKOFFS_MS.iter().enumerate() {
            let result = send_once(&http, &url, &method, &body).await;
            match result {
                Ok(()) => return,
                Err(err) if attempt + 1 == WEBHOOK_BACKOFFS_MS.len() => {
                    tracing::error!(rule = %rule_id, url = %url, error = %err, "webhook delivery failed after retries");
                    return;
                }
                Err(err) => {
                    tracing::warn!(rule = %rule_id, url = %url, error = %err, attempt, "webhook attempt failed, retrying");
                    tokio::time::sleep(Duration::from_millis(*backoff_ms)).await;
                }
            }
        }
    });
}

async fn send_once(http: &reqwest::Client, url: &str, method: &str, body: &WebhookBody<'_>) -> Result<(), String> {
    let builder = match method.to_ascii_uppercase().as_str() {
        "GET" => http.get(url),
        "PUT" => http.put(url),
        "PATCH" => http.patch(url),
        _ => http.post(url),
    };
    let response = builder.json(body).send().await.map_err(|e| e.to_string())?;
    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("status {}", response.status()))
    }
}
