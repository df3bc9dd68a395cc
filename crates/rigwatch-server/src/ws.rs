// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The WebSocket client protocol (spec §4.8, §6.2, C9), grounded on the
//! teacher's `ws_handler`/`handle_ws`: one socket per dashboard session, a
//! `select!` loop racing the hub's outbound queue against inbound client
//! messages, cancellation observed on every iteration.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use rigwatch_hub::frame::InitialFrame;
use rigwatch_hub::hub::{timeline_bounds_frame, timeline_state_frame};
use rigwatch_hub::{ServerFrame, Subscription};
use rigwatch_model::presence::PresenceView;
use rigwatch_model::time::epoch_ms;
use serde::Deserialize;

use crate::state::ServerState;

pub fn routes() -> Router<Arc<ServerState>> {
    Router::new().route("/ws", get(ws_handler))
}

#[derive(Debug, Deserialize)]
struct WsQuery {
    #[serde(default = "default_username")]
    username: String,
    #[serde(default = "default_color")]
    color: String,
}

fn default_username() -> String {
    "anonymous".to_owned()
}

fn default_color() -> String {
    "#888888".to_owned()
}

/// Client → server frames (spec §6.2).
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ClientMessage {
    #[serde(rename = "poll:now")]
    PollNow {
        #[serde(default)]
        rig: Option<String>,
    },
    #[serde(rename = "timeline:getState")]
    TimelineGetState { timestamp: u64 },
    #[serde(rename = "presence:setUsername")]
    PresenceSetUsername { name: String },
    #[serde(rename = "presence:setView")]
    PresenceSetView {
        #[serde(default)]
        rig: Option<String>,
        #[serde(default)]
        agent: Option<String>,
    },
    #[serde(rename = "subscribe")]
    Subscribe {
        #[serde(default)]
        rig: Option<String>,
    },
}

async fn ws_handler(State(state): State<Arc<ServerState>>, Query(query): Query<WsQuery>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state, query))
}

async fn handle_ws(socket: WebSocket, state: Arc<ServerState>, query: WsQuery) {
    let initial = InitialFrame { frame_type: "initial", timestamp: epoch_ms(), data: state.world.fleet_view().await };
    let mut handle = state.hub.register(query.username, query.color, initial).await;

    if let Some(bounds) = state.timeline.bounds() {
        state.hub.send_to(handle.id, timeline_bounds_frame(bounds.start, bounds.end, Vec::new())).await;
    }

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            biased;
            _ = state.shutdown.cancelled() => break,
            outbound = handle.rx.recv() => {
                match outbound {
                    Some(frame) => {
                        let Ok(text) = serde_json::to_string(&frame) else { continue };
                        if ws_tx.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            inbound = ws_rx.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => handle_client_message(&state, handle.id, &text).await,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    state.disconnect(handle.id).await;
}

async fn handle_client_message(state: &Arc<ServerState>, session_id: rigwatch_hub::SessionId, text: &str) {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(error) => {
            tracing::debug!(%error, "malformed client frame, ignoring");
            let envelope = rigwatch_model::error::Error::BadRequest(error.to_string()).into();
            state.hub.send_to(session_id, ServerFrame::Error(rigwatch_hub::frame::ErrorFrame { frame_type: "error", envelope })).await;
            return;
        }
    };

    match message {
        ClientMessage::PollNow { rig } => state.poke(rig.as_deref()).await,
        ClientMessage::TimelineGetState { timestamp } => match state.timeline.state_at(timestamp) {
            Ok(view) => state.hub.send_to(session_id, timeline_state_frame(timestamp, view)).await,
            Err(error) => {
                state.hub.send_to(session_id, ServerFrame::Error(rigwatch_hub::frame::ErrorFrame { frame_type: "error", envelope: error.into() })).await;
            }
        },
        ClientMessage::PresenceSetUsername { name } => state.hub.set_username(session_id, name).await,
        ClientMessage::PresenceSetView { rig, agent } => state.hub.set_view(session_id, PresenceView { rig, agent }).await,
        ClientMessage::Subscribe { rig } => state.hub.set_subscription(session_id, Subscription { rig }).await,
    }
}
