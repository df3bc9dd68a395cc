// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out registry for dashboard sockets (spec §4.8, C9), grounded on the
//! bridge's per-client registry and single-dispatcher-loop shape: a shared
//! `RwLock<HashMap<SessionId, SessionSlot>>`, one central channel, and a
//! non-blocking per-session send. Unlike the bridge's unbounded per-client
//! channels, sessions here are bounded (spec default 256): a full queue
//! drops the frame, counts it, and best-effort queues a `resync_hint`
//! instead of ever blocking the dispatcher on a slow consumer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rigwatch_model::presence::{PresenceUser, PresenceView};
use rigwatch_model::time::epoch_ms;
use tokio::sync::{mpsc, RwLock};

use crate::frame::{Bounds, InitialFrame, PresenceFrame, PresenceYou, ResyncHintFrame, ServerFrame, TimelineBoundsFrame, TimelineStateFrame};
use crate::session::{new_queue_with_capacity, SessionHandle, SessionId, Subscription, DEFAULT_QUEUE_CAPACITY};

/// Central-channel capacity: large enough to absorb a burst of events from
/// one `WorldModel::apply()` before the dispatcher drains it.
const CENTRAL_CHANNEL_CAPACITY: usize = 4_096;

/// Default ceiling on how long a session's queue may stay continuously
/// full before the hub gives up on it (spec §8 scenario 5).
const DEFAULT_MAX_BACKPRESSURE_MS: u64 = 30_000;

struct SessionSlot {
    tx: mpsc::Sender<ServerFrame>,
    subscription: Subscription,
    username: String,
    color: String,
    view: PresenceView,
    dropped: Arc<AtomicU64>,
    /// epoch ms of the first consecutive full-queue drop, 0 if the queue
    /// currently has room.
    backpressure_since: AtomicU64,
}

/// Bidirectional fan-out hub: `publish()` is the single producer-facing
/// entry point, a detached dispatcher task drains it and pushes to every
/// registered session.
pub struct Hub {
    sessions: Arc<RwLock<HashMap<SessionId, SessionSlot>>>,
    central_tx: mpsc::Sender<ServerFrame>,
    queue_capacity: usize,
}

impl Hub {
    pub fn new() -> Arc<Self> {
        Self::with_config(DEFAULT_QUEUE_CAPACITY, DEFAULT_MAX_BACKPRESSURE_MS)
    }

    pub fn with_config(queue_capacity: usize, max_backpressure_ms: u64) -> Arc<Self> {
        let (central_tx, central_rx) = mpsc::channel(CENTRAL_CHANNEL_CAPACITY);
        let sessions: Arc<RwLock<HashMap<SessionId, SessionSlot>>> = Arc::new(RwLock::new(HashMap::new()));
        tokio::spawn(dispatch_loop(Arc::clone(&sessions), central_rx, max_backpressure_ms));
        Arc::new(Self { sessions, central_tx, queue_capacity })
    }

    /// Publish a frame for fan-out. Producers await this: a full central
    /// channel means the dispatcher itself is behind, and backpressure
    /// should propagate to the producer (spec §4.8) rather than silently
    /// drop fleet-wide events.
    pub async fn publish(&self, frame: ServerFrame) {
        let _ = self.central_tx.send(frame).await;
    }

    /// Register a new session, queueing it an `initial` frame. Returns the
    /// socket-task-facing handle.
    pub async fn register(&self, username: String, color: String, initial: InitialFrame) -> SessionHandle {
        let id = SessionId::new();
        let (tx, rx) = new_queue_with_capacity(self.queue_capacity);
        let dropped = Arc::new(AtomicU64::new(0));
        let slot = SessionSlot {
            tx: tx.clone(),
            subscription: Subscription::default(),
            username,
            color,
            view: PresenceView::default(),
            dropped: Arc::clone(&dropped),
            backpressure_since: AtomicU64::new(0),
        };
        self.sessions.write().await.insert(id, slot);
        let _ = tx.try_send(ServerFrame::Initial(initial));
        self.broadcast_presence().await;
        SessionHandle { id, rx }
    }

    /// Drop a session and broadcast its departure to the remaining ones.
    pub async fn unregister(&self, id: SessionId) {
        self.sessions.write().await.remove(&id);
        self.broadcast_presence().await;
    }

    pub async fn set_subscription(&self, id: SessionId, subscription: Subscription) {
        if let Some(slot) = self.sessions.write().await.get_mut(&id) {
            slot.subscription = subscription;
        }
    }

    pub async fn set_username(&self, id: SessionId, username: String) {
        if let Some(slot) = self.sessions.write().await.get_mut(&id) {
            slot.username = username;
        }
        self.broadcast_presence().await;
    }

    pub async fn set_view(&self, id: SessionId, view: PresenceView) {
        if let Some(slot) = self.sessions.write().await.get_mut(&id) {
            slot.view = view;
        }
        self.broadcast_presence().await;
    }

    /// Frames pushed directly to one session (timeline queries, errors):
    /// these bypass the central channel since they have exactly one
    /// recipient, not every subscriber.
    pub async fn send_to(&self, id: SessionId, frame: ServerFrame) {
        if let Some(slot) = self.sessions.read().await.get(&id) {
            push(slot, frame);
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn dropped_count(&self, id: SessionId) -> u64 {
        match self.sessions.read().await.get(&id) {
            Some(slot) => slot.dropped.load(Ordering::Relaxed),
            None => 0,
        }
    }

    async fn broadcast_presence(&self) {
        let sessions = self.sessions.read().await;
        let users: Vec<PresenceUser> = sessions
            .iter()
            .map(|(id, slot)| PresenceUser {
                session_id: id.to_string(),
                username: slot.username.clone(),
                color: slot.color.clone(),
                current_view: slot.view.clone(),
                last_activity: 0,
            })
            .collect();
        for (id, slot) in sessions.iter() {
            let frame = ServerFrame::Presence(PresenceFrame {
                frame_type: "presence",
                users: users.clone(),
                you: PresenceYou {
                    session_id: id.to_string(),
                    color: slot.color.clone(),
                    username: slot.username.clone(),
                    view: slot.view.clone(),
                },
            });
            push(slot, frame);
        }
    }
}

pub fn timeline_bounds_frame(start: u64, end: u64, markers: Vec<u64>) -> ServerFrame {
    ServerFrame::TimelineBounds(TimelineBoundsFrame { frame_type: "timeline:bounds", bounds: Bounds { start, end }, markers })
}

pub fn timeline_state_frame(timestamp: u64, state: rigwatch_world::FleetView) -> ServerFrame {
    ServerFrame::TimelineState(TimelineStateFrame { frame_type: "timeline:state", timestamp, state })
}

/// Non-blocking push with drop-counting and a best-effort `resync_hint` on
/// overflow (spec §4.8): a slow consumer never stalls the dispatcher, and
/// never silently falls behind without being told to catch up.
fn push(slot: &SessionSlot, frame: ServerFrame) {
    match slot.tx.try_send(frame) {
        Ok(()) => slot.backpressure_since.store(0, Ordering::Relaxed),
        Err(mpsc::error::TrySendError::Full(_)) => {
            slot.dropped.fetch_add(1, Ordering::Relaxed);
            slot.backpressure_since.compare_exchange(0, epoch_ms(), Ordering::Relaxed, Ordering::Relaxed).ok();
            let _ = slot.tx.try_send(ServerFrame::ResyncHint(ResyncHintFrame { frame_type: "resync_hint", reason: "queue_full" }));
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {}
    }
}

async fn dispatch_loop(sessions: Arc<RwLock<HashMap<SessionId, SessionSlot>>>, mut central_rx: mpsc::Receiver<ServerFrame>, max_backpressure_ms: u64) {
    while let Some(frame) = central_rx.recv().await {
        let rig = frame.rig().map(str::to_owned);
        let overdue: Vec<SessionId> = {
            let sessions = sessions.read().await;
            for slot in sessions.values() {
                if slot.subscription.matches(rig.as_deref()) {
                    push(slot, frame.clone());
                }
            }
            sessions
                .iter()
                .filter_map(|(id, slot)| {
                    let since = slot.backpressure_since.load(Ordering::Relaxed);
                    (since != 0 && epoch_ms().saturating_sub(since) >= max_backpressure_ms).then_some(*id)
                })
                .collect()
        };
        if !overdue.is_empty() {
            // Drop the sender side for each overdue session: its socket task
            // observes `rx.recv() == None` on its next poll and tears itself
            // down through the normal disconnect path (spec §8 scenario 5).
            let mut sessions = sessions.write().await;
            for id in overdue {
                sessions.remove(&id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rigwatch_model::event::Event;

    use super::*;

    fn initial_frame() -> InitialFrame {
        InitialFrame { frame_type: "initial", timestamp: 0, data: rigwatch_world::FleetView::default() }
    }

    #[tokio::test]
    async fn registering_a_session_delivers_an_initial_frame_first() {
        let hub = Hub::new();
        let mut handle = hub.register("alice".into(), "#fff".into(), initial_frame()).await;
        let frame = handle.rx.recv().await.expect("should receive a frame");
        assert!(matches!(frame, ServerFrame::Initial(_)));
    }

    #[tokio::test]
    async fn published_events_are_filtered_by_subscription() {
        let hub = Hub::new();
        let mut handle = hub.register("alice".into(), "#fff".into(), initial_frame()).await;
        handle.rx.recv().await.expect("initial frame");
        hub.set_subscription(handle.id, Subscription { rig: Some("r1".into()) }).await;

        hub.publish(ServerFrame::Event(Event::AgentAdded { rig: "r2".into(), agent: "p1".into(), at: 0 })).await;
        hub.publish(ServerFrame::Event(Event::AgentAdded { rig: "r1".into(), agent: "p2".into(), at: 1 })).await;

        let frame = handle.rx.recv().await.expect("should receive the matching event");
        match frame {
            ServerFrame::Event(Event::AgentAdded { rig, .. }) => assert_eq!(rig, "r1"),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn full_queue_drops_and_counts_without_blocking_the_dispatcher() {
        let hub = Hub::new();
        let handle = hub.register("alice".into(), "#fff".into(), initial_frame()).await;
        // Flood well past the bounded queue capacity; the dispatcher must
        // not block even though nobody is draining `handle.rx`.
        for i in 0..(DEFAULT_QUEUE_CAPACITY as u64 + 10) {
            hub.publish(ServerFrame::Event(Event::AgentAdded { rig: "r1".into(), agent: "p1".into(), at: i })).await;
        }
        tokio::task::yield_now().await;
        assert!(hub.dropped_count(handle.id).await > 0);
    }

    #[tokio::test]
    async fn sustained_backpressure_disconnects_the_slow_session() {
        let hub = Hub::with_config(4, 0);
        let handle = hub.register("alice".into(), "#fff".into(), initial_frame()).await;
        // First send past capacity marks `backpressure_since`; with a
        // threshold of 0ms the very next publish finds it already overdue.
        for i in 0..10u64 {
            hub.publish(ServerFrame::Event(Event::AgentAdded { rig: "r1".into(), agent: "p1".into(), at: i })).await;
            tokio::task::yield_now().await;
        }
        assert_eq!(hub.session_count().await, 0, "slow session should have been dropped");
    }

    #[tokio::test]
    async fn unregister_removes_the_session() {
        let hub = Hub::new();
        let handle = hub.register("alice".into(), "#fff".into(), initial_frame()).await;
        assert_eq!(hub.session_count().await, 1);
        hub.unregister(handle.id).await;
        assert_eq!(hub.session_count().await, 0);
    }
}
