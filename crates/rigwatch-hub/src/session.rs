// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use rigwatch_model::presence::PresenceView;
use tokio::sync::mpsc;

use crate::frame::ServerFrame;

/// Default bound for a session's outbound queue (spec §4.8).
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Opaque session identifier, stable for the lifetime of a socket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which events reach this session (spec §6.2 `subscribe {rig?}`). `None`
/// means every rig.
#[derive(Debug, Clone, Default)]
pub struct Subscription {
    pub rig: Option<String>,
}

impl Subscription {
    pub fn matches(&self, rig: Option<&str>) -> bool {
        match (&self.rig, rig) {
            (None, _) => true,
            (Some(want), Some(got)) => want == got,
            (Some(_), None) => true,
        }
    }
}

/// A connected dashboard operator, owned by the hub's session registry.
pub struct Session {
    pub id: SessionId,
    pub username: String,
    pub color: String,
    pub subscription: Subscription,
    pub view: PresenceView,
    pub dropped: u64,
}

impl Session {
    pub fn new(id: SessionId, username: String, color: String) -> Self {
        Self { id, username, color, subscription: Subscription::default(), view: PresenceView::default(), dropped: 0 }
    }
}

/// The socket-task-facing half of a registered session: a bounded receiver
/// paired with the id the hub tracks it under.
pub struct SessionHandle {
    pub id: SessionId,
    pub rx: mpsc::Receiver<ServerFrame>,
}

pub(crate) fn new_queue_with_capacity(capacity: usize) -> (mpsc::Sender<ServerFrame>, mpsc::Receiver<ServerFrame>) {
    mpsc::channel(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_with_no_rig_matches_everything() {
        let sub = Subscription::default();
        assert!(sub.matches(Some("r1")));
        assert!(sub.matches(None));
    }

    #[test]
    fn subscription_with_a_rig_only_matches_that_rig() {
        let sub = Subscription { rig: Some("r1".into()) };
        assert!(sub.matches(Some("r1")));
        assert!(!sub.matches(Some("r2")));
    }
}
