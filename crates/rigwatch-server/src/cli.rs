// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The server binary's own CLI surface (spec §6.4), grounded on the
//! teacher's `Cli`/`Commands` split: a flattened config plus an optional
//! subcommand, dispatched in `main`.

use clap::{Parser, Subcommand};

use crate::config::ServerConfig;

#[derive(Parser)]
#[command(name = "rigwatch", version, about = "Real-time fleet observability backend.")]
pub struct Cli {
    #[command(flatten)]
    pub config: ServerConfig,

    /// Base URL of a running `rigwatch serve` instance, used by every
    /// subcommand that talks over HTTP instead of invoking the fleet CLI
    /// directly (`replay`, `replay-start`, `replay-jobs`).
    #[arg(long, env = "RIGWATCH_SERVER_URL", default_value = "http://127.0.0.1:8787")]
    pub server_url: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Poll once and print a human-readable fleet table (the default).
    Table,
    /// Poll repeatedly, printing the table on every change.
    Watch,
    /// Run the HTTP/WebSocket server, optionally overriding the configured port.
    Serve {
        port: Option<u16>,
    },
    /// Poll once and print the fleet view as JSON.
    Json,
    /// Poll once and print only the bead/task list as JSON.
    Tasks,
    /// Poll once and print events as CSV.
    Export,
    /// Resolve a batch of timestamps against history, against a running server.
    Replay {
        /// Millisecond timestamps to resolve.
        ids: Vec<u64>,
        /// Run the resolution as an async job instead of blocking for the result.
        #[arg(long)]
        start: bool,
    },
    /// Check the status of a replay job started with `replay --start`.
    ReplayStart {
        job_id: String,
    },
    /// List all known replay jobs.
    ReplayJobs,
}
