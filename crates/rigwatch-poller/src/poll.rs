// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeSet;
use std::time::Instant;

use futures_util::stream::{self, StreamExt, TryStreamExt};
use rigwatch_model::error::{Error, Result};
use rigwatch_model::time::epoch_ms;
use rigwatch_model::{Mail, Snapshot};
use rigwatch_tool::{commands, Invoker};
use tokio_util::sync::CancellationToken;

use crate::wire::{RawBead, RawMail, RawPolecat};

/// Result of one poll attempt, folded into the same ordered channel as
/// successful snapshots so a consumer can record failures as `error` events
/// without losing per-rig ordering (spec §4.2, §7).
#[derive(Debug)]
pub enum PollOutcome {
    Snapshot(Snapshot),
    Failed { rig: String, at: u64, error: Error },
}

/// Assemble one full snapshot for `rig`: list agents, fetch each agent's
/// status concurrently bounded by `worker_pool`, fetch the recent mail
/// window, and resolve hooked beads (spec §4.2 steps a–c).
pub async fn poll_once(
    invoker: &Invoker,
    rig: &str,
    worker_pool: usize,
    cancel: &CancellationToken,
) -> Result<Snapshot> {
    let started = Instant::now();

    let raw_list = commands::polecat_list(invoker, rig, cancel).await?;
    let names: Vec<RawPolecat> = serde_json::from_value(raw_list)
        .map_err(|e| Error::ToolFailed { exit_code: Some(0), stderr: e.to_string() })?;

    let rig_owned = rig.to_owned();
    let agents = stream::iter(names.into_iter().map(|entry| {
        let rig_owned = rig_owned.clone();
        async move {
            let status = commands::polecat_status(invoker, &rig_owned, &entry.name, cancel).await?;
            let mut refreshed: RawPolecat = serde_json::from_value(status)
                .map_err(|e| Error::ToolFailed { exit_code: Some(0), stderr: e.to_string() })?;
            if refreshed.role.is_none() {
                refreshed.role = entry.role;
            }
            Ok::<_, Error>(refreshed.into_agent())
        }
    }))
    .buffer_unordered(worker_pool.max(1))
    .try_collect::<Vec<_>>()
    .await?;

    let observed_at = epoch_ms();

    let bead_ids: BTreeSet<String> = agents.iter().filter_map(|a| a.hook_bead_id.clone()).collect();
    let beads = stream::iter(bead_ids.into_iter().map(|id| async move {
        let value = commands::bd_show(invoker, &id, cancel).await?;
        let raw: RawBead = serde_json::from_value(value)
            .map_err(|e| Error::ToolFailed { exit_code: Some(0), stderr: e.to_string() })?;
        Ok::<_, Error>(raw.into_bead(observed_at))
    }))
    .buffer_unordered(worker_pool.max(1))
    .try_collect::<Vec<_>>()
    .await?;

    let raw_mail = commands::mail_recent(invoker, rig, cancel).await?;
    let raw_mail: Vec<RawMail> = serde_json::from_value(raw_mail)
        .map_err(|e| Error::ToolFailed { exit_code: Some(0), stderr: e.to_string() })?;
    let mail = raw_mail.into_iter().map(Mail::from).collect();

    Ok(Snapshot {
        rig: rig.to_owned(),
        observed_at,
        agents,
        beads,
        mail,
        duration_ms: started.elapsed().as_millis() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_outcome_is_send_across_channel() {
        fn assert_send<T: Send>() {}
        assert_send::<PollOutcome>();
    }
}
