// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-rig snapshot poller (spec §4.2, C2).
//!
//! One independent loop per rig assembles a full [`Snapshot`] on a fixed
//! cadence with adaptive back-off on consecutive failures, coalesces
//! external `pokeNow` refresh requests, and observes a cancellation token
//! between every I/O step.

pub mod config;
pub mod poll;
pub mod rig_poller;
pub mod wire;

pub use config::PollerConfig;
pub use poll::{poll_once, PollOutcome};
pub use rig_poller::{spawn_rig_poller, PokeHandle};
pub use rigwatch_model::Snapshot;
