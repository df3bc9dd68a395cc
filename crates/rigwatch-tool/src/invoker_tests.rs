// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use rigwatch_model::error::Error;
use tokio_util::sync::CancellationToken;

use super::*;

fn config(binary: &str, timeout_ms: u64) -> ToolConfig {
    ToolConfig {
        binary: binary.to_owned(),
        exec_timeout: Duration::from_millis(timeout_ms),
        kill_grace: Duration::from_millis(200),
    }
}

#[tokio::test]
async fn parses_stdout_as_json_on_success() {
    let invoker = Invoker::new(config("echo", 5_000));
    let cancel = CancellationToken::new();
    let value = invoker.invoke_json(&["{\"rig\":\"r1\"}".to_owned()], &cancel).await.unwrap();
    assert_eq!(value["rig"], "r1");
}

#[tokio::test]
async fn nonzero_exit_is_tool_failed_with_stderr() {
    let invoker = Invoker::new(config("false", 5_000));
    let cancel = CancellationToken::new();
    let err = invoker.invoke_raw(&[], &cancel).await.unwrap_err();
    assert!(matches!(err, Error::ToolFailed { .. }));
}

#[tokio::test]
async fn overrun_is_timeout_and_kills_child() {
    let invoker = Invoker::new(config("sleep", 50));
    let cancel = CancellationToken::new();
    let err = invoker.invoke_raw(&["2".to_owned()], &cancel).await.unwrap_err();
    assert!(matches!(err, Error::Timeout(_)));
}

#[tokio::test]
async fn cancellation_token_aborts_invocation() {
    let invoker = Invoker::new(config("sleep", 5_000));
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel_clone.cancel();
    });
    let err = invoker.invoke_raw(&["2".to_owned()], &cancel).await.unwrap_err();
    assert!(matches!(err, Error::Internal(_)));
}
