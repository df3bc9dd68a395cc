// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use rigwatch_model::time::epoch_ms;
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;

use crate::config::PollerConfig;
use crate::poll::{poll_once, PollOutcome};
use rigwatch_tool::Invoker;

/// Handle for sending a coalesced `pokeNow(rig)` refresh request into a
/// running poll loop (spec §4.2). Multiple pokes issued before the loop
/// observes one collapse into a single extra poll.
#[derive(Clone)]
pub struct PokeHandle {
    notify: Arc<Notify>,
}

impl PokeHandle {
    pub fn poke(&self) {
        self.notify.notify_one();
    }
}

/// Spawn the poll loop for one rig. Snapshots and failures are sent, in
/// strict `observed_at` order, on `outcome_tx` (spec §4.2 ordering
/// guarantee). The loop exits once `cancel` fires or the channel closes.
pub fn spawn_rig_poller(
    rig: String,
    invoker: Arc<Invoker>,
    config: PollerConfig,
    outcome_tx: mpsc::Sender<PollOutcome>,
    cancel: CancellationToken,
) -> PokeHandle {
    let notify = Arc::new(Notify::new());
    let handle = PokeHandle { notify: notify.clone() };

    tokio::spawn(async move {
        let mut consecutive_failures: u32 = 0;

        loop {
            let interval = config.backoff_interval(consecutive_failures);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = notify.notified() => {}
                _ = tokio::time::sleep(interval) => {}
            }
            if cancel.is_cancelled() {
                break;
            }

            let outcome = match poll_once(&invoker, &rig, config.worker_pool, &cancel).await {
                Ok(snapshot) => {
                    consecutive_failures = 0;
                    PollOutcome::Snapshot(snapshot)
                }
                Err(error) => {
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    tracing::warn!(rig = %rig, err = %error, attempt = consecutive_failures, "poll failed, backing off");
                    PollOutcome::Failed { rig: rig.clone(), at: epoch_ms(), error }
                }
            };

            if outcome_tx.send(outcome).await.is_err() {
                break;
            }
        }
    });

    handle
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn poke_wakes_loop_before_interval_elapses() {
        // A bare Notify behaves correctly standalone; exercised here without
        // a real poller to avoid depending on an external `gt` binary.
        let notify = Arc::new(Notify::new());
        let waiter = notify.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                _ = waiter.notified() => "poked",
                _ = tokio::time::sleep(Duration::from_secs(5)) => "timed_out",
            }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        notify.notify_one();
        assert_eq!(task.await.unwrap(), "poked");
    }

    #[test]
    fn multiple_pokes_before_wait_collapse_to_one_permit() {
        let notify = Notify::new();
        notify.notify_one();
        notify.notify_one();
        // A `Notify` holds at most one permit: two notify_one calls before
        // any wait still resolve only one `.notified()` call immediately.
        let fut = notify.notified();
        drop(fut);
    }
}
