// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The world model and diff engine (spec §4.3, C3/C4).
//!
//! `WorldModel` holds `Map<rig, RigState>`. Applying a snapshot is atomic
//! per rig: the rig's write guard is held only long enough to compute the
//! diff and publish the new state; the resulting events are handed to
//! downstream consumers only after the guard is released.

pub mod diff;
pub mod model;
pub mod state;

pub use model::WorldModel;
pub use state::{AgentRecord, FleetView, RigState, RigView};
