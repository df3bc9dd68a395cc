// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end smoke tests that spawn the real `rigwatch` binary against a
//! stub fleet CLI and exercise the HTTP and WebSocket surfaces together
//! (spec §8 scenarios, as far as they are reachable through a static stub).

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use rigwatch_specs::RigwatchProcess;

const TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::test]
async fn health_reports_liveness_and_counts() -> anyhow::Result<()> {
    let rigwatch = RigwatchProcess::start()?;
    rigwatch.wait_healthy(TIMEOUT).await?;
    rigwatch.wait_for_rig(TIMEOUT).await?;

    let resp: serde_json::Value = reqwest::get(format!("{}/health", rigwatch.base_url())).await?.json().await?;
    assert_eq!(resp["status"], "ok");
    assert_eq!(resp["rig_count"], 1);
    assert!(resp["agent_count"].as_u64().unwrap_or(0) >= 1);

    Ok(())
}

#[tokio::test]
async fn state_reflects_the_polled_fleet() -> anyhow::Result<()> {
    let rigwatch = RigwatchProcess::start()?;
    rigwatch.wait_healthy(TIMEOUT).await?;
    rigwatch.wait_for_rig(TIMEOUT).await?;

    let body: serde_json::Value = reqwest::get(format!("{}/api/state", rigwatch.base_url())).await?.json().await?;
    let rig = &body["rigs"][0];
    assert_eq!(rig["rig"], "alpha");
    let agent = &rig["agents"][0];
    assert_eq!(agent["name"], "worker1");
    assert_eq!(agent["state"], "idle");

    Ok(())
}

#[tokio::test]
async fn websocket_sends_initial_frame_then_timeline_bounds() -> anyhow::Result<()> {
    let rigwatch = RigwatchProcess::start()?;
    rigwatch.wait_healthy(TIMEOUT).await?;
    rigwatch.wait_for_rig(TIMEOUT).await?;

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("{}?username=alice", rigwatch.ws_url())).await?;

    let msg = tokio::time::timeout(TIMEOUT, ws.next()).await?.ok_or_else(|| anyhow::anyhow!("ws stream ended"))??;
    let first: serde_json::Value = match msg {
        Message::Text(t) => serde_json::from_str(&t)?,
        other => anyhow::bail!("expected text frame, got {other:?}"),
    };
    assert_eq!(first["type"], "initial");
    assert_eq!(first["data"]["rigs"][0]["rig"], "alpha");

    Ok(())
}

#[tokio::test]
async fn websocket_presence_setusername_reflects_back() -> anyhow::Result<()> {
    let rigwatch = RigwatchProcess::start()?;
    rigwatch.wait_healthy(TIMEOUT).await?;

    let (mut ws, _) = tokio_tungstenite::connect_async(rigwatch.ws_url()).await?;
    // drain the `initial` frame
    tokio::time::timeout(TIMEOUT, ws.next()).await?;

    ws.send(Message::Text(r#"{"type":"presence:setUsername","name":"bob"}"#.into())).await?;

    let deadline = tokio::time::Instant::now() + TIMEOUT;
    loop {
        if tokio::time::Instant::now() > deadline {
            anyhow::bail!("never observed a presence frame naming bob");
        }
        let msg = tokio::time::timeout(TIMEOUT, ws.next()).await?.ok_or_else(|| anyhow::anyhow!("ws stream ended"))??;
        let Message::Text(text) = msg else { continue };
        let frame: serde_json::Value = serde_json::from_str(&text)?;
        if frame["type"] == "presence" && frame["you"]["username"] == "bob" {
            return Ok(());
        }
    }
}

#[tokio::test]
async fn rule_crud_round_trip() -> anyhow::Result<()> {
    let rigwatch = RigwatchProcess::start()?;
    rigwatch.wait_healthy(TIMEOUT).await?;

    let client = reqwest::Client::new();
    let rule_body = serde_json::json!({
        "name": "agent stopped",
        "cooldown_ms": 10_000,
        "condition": { "kind": "agent_status", "agent": "*", "rig": "*", "to": "stopped" },
        "actions": [{ "kind": "log", "level": "warn" }],
    });

    let created: serde_json::Value = client.post(format!("{}/api/rules", rigwatch.base_url())).json(&rule_body).send().await?.json().await?;
    let id = created["id"].as_str().expect("created rule has an id").to_owned();
    assert_eq!(created["name"], "agent stopped");

    let fetched: serde_json::Value = client.get(format!("{}/api/rules/{id}", rigwatch.base_url())).send().await?.json().await?;
    assert_eq!(fetched["id"], id);

    let toggled: serde_json::Value = client.post(format!("{}/api/rules/{id}/toggle", rigwatch.base_url())).send().await?.json().await?;
    assert_eq!(toggled["enabled"], false);

    let delete_resp = client.delete(format!("{}/api/rules/{id}", rigwatch.base_url())).send().await?;
    assert!(delete_resp.status().is_success());

    let missing = client.get(format!("{}/api/rules/{id}", rigwatch.base_url())).send().await?;
    assert_eq!(missing.status().as_u16(), 404);

    Ok(())
}

#[tokio::test]
async fn duplicate_rule_name_is_a_conflict() -> anyhow::Result<()> {
    let rigwatch = RigwatchProcess::start()?;
    rigwatch.wait_healthy(TIMEOUT).await?;

    let client = reqwest::Client::new();
    let rule_body = serde_json::json!({
        "name": "dup",
        "cooldown_ms": 0,
        "condition": { "kind": "agent_status", "agent": "*", "rig": "*" },
        "actions": [],
    });
    let first = client.post(format!("{}/api/rules", rigwatch.base_url())).json(&rule_body).send().await?;
    assert!(first.status().is_success());

    let second = client.post(format!("{}/api/rules", rigwatch.base_url())).json(&rule_body).send().await?;
    assert_eq!(second.status().as_u16(), 409);

    Ok(())
}

#[tokio::test]
async fn rule_test_endpoint_evaluates_without_persisting() -> anyhow::Result<()> {
    let rigwatch = RigwatchProcess::start()?;
    rigwatch.wait_healthy(TIMEOUT).await?;

    let client = reqwest::Client::new();
    let body = serde_json::json!({
        "rule": {
            "name": "dry run",
            "cooldown_ms": 0,
            "condition": { "kind": "agent_status", "agent": "*", "rig": "*", "to": "stopped" },
            "actions": [],
        },
        "event": {
            "type": "agent_status_change",
            "rig": "alpha",
            "agent": "worker1",
            "from": "idle",
            "to": "stopped",
            "at": 1,
        },
    });
    let resp: serde_json::Value = client.post(format!("{}/api/rules/test", rigwatch.base_url())).json(&body).send().await?.json().await?;
    assert_eq!(resp["matched"], true);

    let rules: serde_json::Value = client.get(format!("{}/api/rules", rigwatch.base_url())).send().await?.json().await?;
    assert!(rules.as_array().expect("rules list").is_empty(), "a dry run must not persist a rule");

    Ok(())
}

#[tokio::test]
async fn alerts_list_starts_empty() -> anyhow::Result<()> {
    let rigwatch = RigwatchProcess::start()?;
    rigwatch.wait_healthy(TIMEOUT).await?;

    let alerts: serde_json::Value = reqwest::get(format!("{}/api/alerts", rigwatch.base_url())).await?.json().await?;
    assert!(alerts.as_array().expect("alerts list").is_empty());

    Ok(())
}

#[tokio::test]
async fn resolving_an_unknown_alert_is_not_found() -> anyhow::Result<()> {
    let rigwatch = RigwatchProcess::start()?;
    rigwatch.wait_healthy(TIMEOUT).await?;

    let client = reqwest::Client::new();
    let resp = client.post(format!("{}/api/alerts/does-not-exist/resolve", rigwatch.base_url())).send().await?;
    assert_eq!(resp.status().as_u16(), 404);

    Ok(())
}

#[tokio::test]
async fn replay_job_resolves_current_state_once_the_fleet_is_observed() -> anyhow::Result<()> {
    let rigwatch = RigwatchProcess::start()?;
    rigwatch.wait_healthy(TIMEOUT).await?;
    rigwatch.wait_for_rig(TIMEOUT).await?;

    let client = reqwest::Client::new();
    // any timestamp at or after the first observed snapshot is in range
    let now_ms = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH)?.as_millis() as u64;
    let body = serde_json::json!({ "timestamps": [now_ms] });
    let job: serde_json::Value = client.post(format!("{}/api/replay/jobs", rigwatch.base_url())).json(&body).send().await?.json().await?;
    assert_eq!(job["status"], "completed");

    let id = job["id"].as_str().expect("job has an id");
    let fetched: serde_json::Value = client.get(format!("{}/api/replay/jobs/{id}", rigwatch.base_url())).send().await?.json().await?;
    assert_eq!(fetched["id"], id);

    Ok(())
}

#[tokio::test]
async fn export_csv_has_a_header_row() -> anyhow::Result<()> {
    let rigwatch = RigwatchProcess::start()?;
    rigwatch.wait_healthy(TIMEOUT).await?;
    rigwatch.wait_for_rig(TIMEOUT).await?;

    let text = reqwest::get(format!("{}/api/events/export?format=csv", rigwatch.base_url())).await?.text().await?;
    assert!(text.starts_with("type,rig,timestamp,message\n"));

    Ok(())
}

#[tokio::test]
async fn peek_rejects_an_unknown_role() -> anyhow::Result<()> {
    let rigwatch = RigwatchProcess::start()?;
    rigwatch.wait_healthy(TIMEOUT).await?;

    let resp = reqwest::get(format!("{}/api/agents/alpha/not-a-role/worker1/peek", rigwatch.base_url())).await?;
    assert_eq!(resp.status().as_u16(), 400);

    Ok(())
}
