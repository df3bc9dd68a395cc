// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fleet data model: rigs, agents, beads, mail, events, error
//! patterns, rules, alerts, presence and metric samples.
//!
//! This crate owns only types and pure functions over them (validation,
//! fingerprinting, glob matching). No I/O, no async — every other crate in
//! the workspace depends on it.

pub mod agent;
pub mod alert;
pub mod bead;
pub mod error;
pub mod event;
pub mod glob;
pub mod mail;
pub mod metrics;
pub mod pattern;
pub mod presence;
pub mod rule;
pub mod snapshot;
pub mod time;
pub mod validate;

pub use agent::{Agent, AgentRole, AgentStatus};
pub use alert::{Alert, AlertSeverity};
pub use bead::{Bead, BeadStatus, StatusPoint};
pub use error::{Error, Result};
pub use event::Event;
pub use mail::Mail;
pub use metrics::{AgentActivity, MetricsSample, PollDuration};
pub use pattern::ErrorPattern;
pub use presence::{PresenceUser, PresenceView};
pub use rule::{Action, Condition, Rule};
pub use snapshot::Snapshot;
pub use time::epoch_ms;
