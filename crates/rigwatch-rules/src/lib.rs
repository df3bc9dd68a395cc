// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rule engine and alert store (spec §4.6, §4.7, C7/C8).

pub mod alert_store;
pub mod dispatch;
pub mod matcher;
pub mod persist;
pub mod rule_store;

pub use alert_store::AlertStore;
pub use dispatch::{dispatch_actions, DispatchContext, DispatchEffect};
pub use matcher::{BeadDurationInput, ErrorCountSource, Fired};
pub use rule_store::RuleStore;
