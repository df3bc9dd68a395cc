// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The external tool invoker (spec §4.1, C1).
//!
//! Spawns the fleet CLI (`gt` by default) with a pre-split argument vector —
//! never a shell command string — captures stdout with a timeout, and
//! parses the result as JSON. Every identifier-typed argument is validated
//! against `^[A-Za-z0-9_-]+$` before it is placed into the argv (invariant 6,
//! spec §8): a failed validation never reaches the process-spawn primitive.

pub mod commands;
pub mod config;
pub mod invoker;

pub use config::ToolConfig;
pub use invoker::Invoker;
