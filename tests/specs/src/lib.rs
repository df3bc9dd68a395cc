// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end binary smoke tests.
//!
//! Spawns the real `rigwatch` binary as a subprocess, pointed at a stub
//! `gt` script that plays back canned fleet CLI output, and exercises the
//! server over HTTP and WebSocket.

use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

/// Resolve the path to the compiled `rigwatch` binary.
pub fn rigwatch_binary() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs → tests → workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join("rigwatch")
}

/// Find a free TCP port by binding to :0 then releasing.
pub fn free_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

/// A shell script standing in for the external fleet CLI (spec §6.1):
/// dispatches on `$1 $2` and echoes one fixed JSON/text payload per
/// subcommand, ignoring arguments beyond that. Good enough to drive one
/// rig with one agent and one bead through a full poll cycle.
pub struct StubGt {
    _dir: tempfile::TempDir,
    path: PathBuf,
}

impl StubGt {
    pub fn write() -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("gt");
        let script = r#"#!/bin/sh
case "$1 $2" in
  "rig ls") echo "alpha" ;;
  "session list") echo '[]' ;;
  "polecat list") echo '[{"rig":"alpha","name":"worker1","role":"crew","session_running":true,"state":"idle"}]' ;;
  "polecat status") echo '{"rig":"alpha","name":"worker1","role":"crew","session_running":true,"state":"idle"}' ;;
  "mail recent") echo '[]' ;;
  "polecat peek") echo '{"lines":[]}' ;;
  "bd show") echo '{"id":"b1","description":"test bead","status":"open","title":"Test"}' ;;
  *) echo '[]' ;;
esac
"#;
        let mut file = std::fs::File::create(&path)?;
        file.write_all(script.as_bytes())?;
        let mut perms = file.metadata()?.permissions();
        perms.set_mode(0o755);
        file.set_permissions(perms)?;
        Ok(Self { _dir: dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A running `rigwatch serve` process that is killed on drop.
pub struct RigwatchProcess {
    child: Child,
    port: u16,
    _state_dir: tempfile::TempDir,
    _stub_gt: StubGt,
}

impl RigwatchProcess {
    /// Spawn `rigwatch serve` on a free port, backed by the stub fleet CLI
    /// and an isolated, throwaway state directory.
    pub fn start() -> anyhow::Result<Self> {
        let binary = rigwatch_binary();
        anyhow::ensure!(binary.exists(), "rigwatch binary not found at {}", binary.display());

        let port = free_port()?;
        let stub_gt = StubGt::write()?;
        let state_dir = tempfile::tempdir()?;

        let child = Command::new(&binary)
            .args([
                "--host",
                "127.0.0.1",
                "--port",
                &port.to_string(),
                "--gt-binary",
                &stub_gt.path().to_string_lossy(),
                "--state-dir",
                &state_dir.path().to_string_lossy(),
                "--rule-tick-ms",
                "200",
                "serve",
            ])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        Ok(Self { child, port, _state_dir: state_dir, _stub_gt: stub_gt })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}/ws", self.port)
    }

    /// Poll `/health` until it responds, or time out.
    pub async fn wait_healthy(&self, timeout: Duration) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        let client = reqwest::Client::new();
        let url = format!("{}/health", self.base_url());
        loop {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("rigwatch did not become healthy within {timeout:?}");
            }
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status().is_success() {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    /// Wait until the world model has observed at least one rig, i.e. the
    /// supervisor has completed at least one poll cycle.
    pub async fn wait_for_rig(&self, timeout: Duration) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        let client = reqwest::Client::new();
        let url = format!("{}/api/state", self.base_url());
        loop {
            if tokio::time::Instant::now() > deadline {
                anyhow::bail!("rigwatch did not observe any rig within {timeout:?}");
            }
            if let Ok(resp) = client.get(&url).send().await {
                if let Ok(body) = resp.json::<serde_json::Value>().await {
                    if body.get("rigs").and_then(|r| r.as_array()).is_some_and(|rigs| !rigs.is_empty()) {
                        return Ok(());
                    }
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

impl Drop for RigwatchProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
