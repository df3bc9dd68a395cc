// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use rigwatch_server::cli::{Cli, Command};
use rigwatch_server::config::ServerConfig;
use rigwatch_server::ServerState;
use rigwatch_tool::{commands, Invoker};
use rigwatch_world::{FleetView, WorldModel};
use tokio_util::sync::CancellationToken;
use tracing::error;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        None | Some(Command::Table) => run_one_shot(&cli.config, print_table).await,
        Some(Command::Watch) => run_watch(&cli.config).await,
        Some(Command::Json) => run_one_shot(&cli.config, print_json).await,
        Some(Command::Tasks) => run_one_shot(&cli.config, print_tasks).await,
        Some(Command::Export) => run_one_shot(&cli.config, print_export).await,
        Some(Command::Serve { port }) => run_serve(cli.config, port).await,
        Some(Command::Replay { ids, start }) => run_replay(&cli.server_url, ids, start).await,
        Some(Command::ReplayStart { job_id }) => run_replay_status(&cli.server_url, &job_id).await,
        Some(Command::ReplayJobs) => run_replay_jobs(&cli.server_url).await,
    };

    std::process::exit(exit_code);
}

/// Poll every known rig once and fold the snapshots into a throwaway world
/// model, the same assembly the supervisor does per-rig but run serially and
/// without a server around it (spec §6.4 `(default)`/`json`/`tasks`/`export`).
async fn fetch_fleet_view(config: &ServerConfig) -> Result<FleetView, ()> {
    let invoker = Invoker::new(config.tool_config());
    let cancel = CancellationToken::new();

    let rigs = match commands::rig_ls(&invoker, &cancel).await {
        Ok(rigs) => rigs,
        Err(error) => {
            error!(%error, "rig discovery failed");
            return Err(());
        }
    };

    let world = WorldModel::new();
    for rig in rigs {
        match rigwatch_poller::poll_once(&invoker, &rig, config.poll_worker_pool, &cancel).await {
            Ok(snapshot) => {
                world.apply(snapshot).await;
            }
            Err(error) => {
                error!(%error, %rig, "poll failed");
                return Err(());
            }
        }
    }

    Ok(world.fleet_view().await)
}

async fn run_one_shot(config: &ServerConfig, render: impl Fn(&FleetView)) -> i32 {
    match fetch_fleet_view(config).await {
        Ok(view) => {
            render(&view);
            0
        }
        Err(()) => 1,
    }
}

async fn run_watch(config: &ServerConfig) -> i32 {
    let mut interval = tokio::time::interval(config.poller_config().poll_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        match fetch_fleet_view(config).await {
            Ok(view) => print_table(&view),
            Err(()) => return 1,
        }
    }
}

async fn run_serve(mut config: ServerConfig, port: Option<u16>) -> i32 {
    if let Some(port) = port {
        config.port = port;
    }
    let state = match ServerState::new(config) {
        Ok(state) => state,
        Err(error) => {
            error!(%error, "failed to initialize server state");
            return 1;
        }
    };
    match rigwatch_server::serve(state).await {
        Ok(()) => 0,
        Err(error) => {
            error!(%error, "server exited with an error");
            1
        }
    }
}

fn print_table(view: &FleetView) {
    println!("{:<16} {:<20} {:<10} {:<12}", "RIG", "AGENT", "RUNNING", "STATE");
    for rig in &view.rigs {
        for agent in &rig.agents {
            println!("{:<16} {:<20} {:<10} {:<12}", rig.rig, agent.name, agent.session_running, agent.state);
        }
    }
}

fn print_json(view: &FleetView) {
    match serde_json::to_string_pretty(view) {
        Ok(json) => println!("{json}"),
        Err(error) => error!(%error, "failed to serialize fleet view"),
    }
}

fn print_tasks(view: &FleetView) {
    let beads: Vec<_> = view.rigs.iter().flat_map(|r| r.beads.iter()).collect();
    match serde_json::to_string_pretty(&beads) {
        Ok(json) => println!("{json}"),
        Err(error) => error!(%error, "failed to serialize task list"),
    }
}

fn print_export(view: &FleetView) {
    println!("rig,agent,running,state");
    for rig in &view.rigs {
        for agent in &rig.agents {
            println!("{},{},{},{}", rig.rig, agent.name, agent.session_running, agent.state);
        }
    }
}

fn replay_client() -> reqwest::Client {
    reqwest::Client::new()
}

async fn run_replay(server_url: &str, ids: Vec<u64>, start: bool) -> i32 {
    let client = replay_client();
    let url = format!("{server_url}/api/replay/jobs");
    let body = serde_json::json!({ "timestamps": ids });

    let response = match client.post(&url).json(&body).send().await {
        Ok(response) => response,
        Err(error) => {
            error!(%error, "failed to reach rigwatch server");
            return 1;
        }
    };

    if !response.status().is_success() {
        error!(status = %response.status(), "replay request failed");
        return 1;
    }

    let job: serde_json::Value = match response.json().await {
        Ok(job) => job,
        Err(error) => {
            error!(%error, "malformed replay job response");
            return 1;
        }
    };

    if start {
        println!("{job}");
    } else {
        match serde_json::to_string_pretty(&job) {
            Ok(pretty) => println!("{pretty}"),
            Err(_) => println!("{job}"),
        }
    }
    0
}

async fn run_replay_status(server_url: &str, job_id: &str) -> i32 {
    let client = replay_client();
    let url = format!("{server_url}/api/replay/jobs/{job_id}");
    match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => {
            match response.json::<serde_json::Value>().await {
                Ok(job) => {
                    println!("{job}");
                    0
                }
                Err(error) => {
                    error!(%error, "malformed replay job response");
                    1
                }
            }
        }
        Ok(response) => {
            error!(status = %response.status(), "replay job lookup failed");
            1
        }
        Err(error) => {
            error!(%error, "failed to reach rigwatch server");
            1
        }
    }
}

async fn run_replay_jobs(server_url: &str) -> i32 {
    let client = replay_client();
    let url = format!("{server_url}/api/replay/jobs");
    match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => {
            match response.json::<serde_json::Value>().await {
                Ok(jobs) => {
                    println!("{jobs}");
                    0
                }
                Err(error) => {
                    error!(%error, "malformed replay job list response");
                    1
                }
            }
        }
        Ok(response) => {
            error!(status = %response.status(), "replay job listing failed");
            1
        }
        Err(error) => {
            error!(%error, "failed to reach rigwatch server");
            1
        }
    }
}
