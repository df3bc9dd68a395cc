// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::process::Stdio;

use rigwatch_model::error::Error;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::config::ToolConfig;

/// Maximum stderr bytes retained for `ErrToolFailed` detail (spec §4.1).
const STDERR_CAP: usize = 4096;

/// Truncate `s` to at most `cap` bytes without splitting a multi-byte UTF-8
/// character, walking back to the nearest preceding char boundary first.
fn truncate_at_char_boundary(s: &mut String, cap: usize) {
    if s.len() <= cap {
        return;
    }
    let mut cap = cap;
    while !s.is_char_boundary(cap) {
        cap -= 1;
    }
    s.truncate(cap);
}

/// Spawns the external fleet CLI with a validated, pre-split argument
/// vector. Never constructs a shell command string.
pub struct Invoker {
    config: ToolConfig,
}

impl Invoker {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    /// Invoke `binary argv... ` and return raw stdout as a UTF-8 string.
    ///
    /// Completes within `exec_timeout`; on overrun the child is cancelled and
    /// force-killed after `kill_grace`, returning `ErrTimeout`. The caller's
    /// `cancel` token is also observed so shutdown can abort an in-flight
    /// invocation (spec §4.2 cancellation).
    pub async fn invoke_raw(&self, argv: &[String], cancel: &CancellationToken) -> Result<String, Error> {
        let mut command = Command::new(&self.config.binary);
        command.args(argv);
        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|e| Error::ToolFailed { exit_code: None, stderr: e.to_string() })?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Internal("child stdout was not piped".into()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Internal("child stderr was not piped".into()))?;

        let run = async {
            let mut out_buf = Vec::new();
            let mut err_buf = Vec::new();
            let (out_res, err_res, status) = tokio::join!(
                stdout.read_to_end(&mut out_buf),
                stderr.read_to_end(&mut err_buf),
                child.wait(),
            );
            out_res.map_err(|e| Error::Internal(e.to_string()))?;
            err_res.map_err(|e| Error::Internal(e.to_string()))?;
            let status = status.map_err(|e| Error::Internal(e.to_string()))?;
            Ok::<_, Error>((out_buf, err_buf, status))
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.kill_with_grace(&mut child).await;
                return Err(Error::Internal("invocation cancelled".into()));
            }
            _ = tokio::time::sleep(self.config.exec_timeout) => {
                self.kill_with_grace(&mut child).await;
                return Err(Error::Timeout(self.config.exec_timeout.as_millis() as u64));
            }
            result = run => {
                let (out_buf, err_buf, status) = result?;
                if !status.success() {
                    let mut stderr_text = String::from_utf8_lossy(&err_buf).into_owned();
                    truncate_at_char_boundary(&mut stderr_text, STDERR_CAP);
                    tracing::warn!(exit_code = ?status.code(), "tool invocation failed");
                    return Err(Error::ToolFailed { exit_code: status.code(), stderr: stderr_text });
                }
                String::from_utf8(out_buf).map_err(|e| Error::ToolFailed {
                    exit_code: status.code(),
                    stderr: format!("stdout was not valid utf-8: {e}"),
                })
            }
        }
    }

    /// Invoke and parse stdout as JSON.
    pub async fn invoke_json(
        &self,
        argv: &[String],
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value, Error> {
        let raw = self.invoke_raw(argv, cancel).await?;
        serde_json::from_str(&raw).map_err(|e| Error::ToolFailed {
            exit_code: Some(0),
            stderr: format!("malformed json: {e}"),
        })
    }

    async fn kill_with_grace(&self, child: &mut tokio::process::Child) {
        if tokio::time::timeout(self.config.kill_grace, child.wait()).await.is_err() {
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
    }
}

#[cfg(test)]
#[path = "invoker_tests.rs"]
mod tests;

#[cfg(test)]
mod truncate_tests {
    use super::truncate_at_char_boundary;

    #[test]
    fn leaves_short_strings_untouched() {
        let mut s = "hello".to_owned();
        truncate_at_char_boundary(&mut s, 4096);
        assert_eq!(s, "hello");
    }

    #[test]
    fn backs_off_to_the_nearest_char_boundary() {
        // Each 'é' is 2 bytes; a cap landing mid-character must not panic
        // and must drop the whole straddling character rather than split it.
        let mut s = "é".repeat(10);
        let cap = 15; // odd byte offset, falls inside the 8th 'é'
        truncate_at_char_boundary(&mut s, cap);
        assert!(s.len() <= cap);
        assert!(s.is_char_boundary(s.len()));
        assert_eq!(s, "é".repeat(7));
    }
}
