// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use rigwatch_model::alert::Alert;
use rigwatch_model::error::ErrorEnvelope;
use rigwatch_model::event::Event;
use rigwatch_model::presence::{PresenceUser, PresenceView};
use rigwatch_world::FleetView;
use serde::Serialize;

/// `initial` payload, sent once on connect (spec §6.2).
#[derive(Debug, Clone, Serialize)]
pub struct InitialFrame {
    #[serde(rename = "type")]
    pub frame_type: &'static str,
    pub timestamp: u64,
    pub data: FleetView,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineBoundsFrame {
    #[serde(rename = "type")]
    pub frame_type: &'static str,
    pub bounds: Bounds,
    pub markers: Vec<u64>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Bounds {
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineStateFrame {
    #[serde(rename = "type")]
    pub frame_type: &'static str,
    pub timestamp: u64,
    pub state: FleetView,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertFrame {
    #[serde(rename = "type")]
    pub frame_type: &'static str,
    pub alert: Alert,
}

#[derive(Debug, Clone, Serialize)]
pub struct PresenceFrame {
    #[serde(rename = "type")]
    pub frame_type: &'static str,
    pub users: Vec<PresenceUser>,
    pub you: PresenceYou,
}

#[derive(Debug, Clone, Serialize)]
pub struct PresenceYou {
    pub session_id: String,
    pub color: String,
    pub username: String,
    #[serde(flatten)]
    pub view: PresenceView,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResyncHintFrame {
    #[serde(rename = "type")]
    pub frame_type: &'static str,
    pub reason: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorFrame {
    #[serde(rename = "type")]
    pub frame_type: &'static str,
    #[serde(flatten)]
    pub envelope: ErrorEnvelope,
}

/// Every server → client frame shape (spec §6.2). `Event` already carries
/// its own `type` tag (including `hooks:updated` for hook transitions), so
/// it serializes as-is here.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ServerFrame {
    Initial(InitialFrame),
    Event(Event),
    TimelineBounds(TimelineBoundsFrame),
    TimelineState(TimelineStateFrame),
    Alert(AlertFrame),
    Presence(PresenceFrame),
    ResyncHint(ResyncHintFrame),
    Error(ErrorFrame),
}

impl ServerFrame {
    pub fn resync_hint(reason: &'static str) -> Self {
        Self::ResyncHint(ResyncHintFrame { frame_type: "resync_hint", reason })
    }

    /// The rig this frame pertains to, if any — used for subscription
    /// filtering (spec §6.2 `subscribe {rig?}`).
    pub fn rig(&self) -> Option<&str> {
        match self {
            Self::Event(e) => e.rig(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_frame_serializes_with_its_own_type_tag() {
        let frame = ServerFrame::Event(Event::AgentAdded { rig: "r1".into(), agent: "p1".into(), at: 0 });
        let json = serde_json::to_value(&frame).expect("should serialize");
        assert_eq!(json["type"], "agent_added");
    }

    #[test]
    fn resync_hint_frame_has_stable_type_tag() {
        let frame = ServerFrame::resync_hint("queue_full");
        let json = serde_json::to_value(&frame).expect("should serialize");
        assert_eq!(json["type"], "resync_hint");
        assert_eq!(json["reason"], "queue_full");
    }
}
