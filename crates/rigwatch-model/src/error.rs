// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Unified error kinds shared across the tool invoker, poller, world model,
/// history store, rule engine and HTTP/socket surfaces.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("tool invocation timed out after {0}ms")]
    Timeout(u64),

    #[error("tool invocation failed (exit={exit_code:?}): {stderr}")]
    ToolFailed { exit_code: Option<i32>, stderr: String },

    #[error("timestamp is outside retained history")]
    OutOfHistory,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("backpressure: {0}")]
    Backpressure(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidName(_) => "ErrInvalidName",
            Self::Timeout(_) => "ErrTimeout",
            Self::ToolFailed { .. } => "ErrToolFailed",
            Self::OutOfHistory => "ErrOutOfHistory",
            Self::NotFound(_) => "ErrNotFound",
            Self::Conflict(_) => "ErrConflict",
            Self::Backpressure(_) => "ErrBackpressure",
            Self::BadRequest(_) => "ErrBadRequest",
            Self::Internal(_) => "ErrInternal",
        }
    }

    /// HTTP status code for REST responses (spec §7).
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidName(_) | Self::BadRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Timeout(_) | Self::ToolFailed { .. } => 503,
            Self::OutOfHistory | Self::Backpressure(_) | Self::Internal(_) => 500,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            kind: self.kind().to_owned(),
            message: self.to_string(),
            detail: match self {
                Self::ToolFailed { stderr, .. } => Some(stderr.clone()),
                _ => None,
            },
        }
    }
}

/// `{error:{kind,message,detail?}}` envelope used by both REST responses and
/// socket `error` frames (spec §7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<Error> for ErrorEnvelope {
    fn from(e: Error) -> Self {
        Self { error: e.to_body() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_stable_strings() {
        assert_eq!(Error::InvalidName("x".into()).kind(), "ErrInvalidName");
        assert_eq!(Error::OutOfHistory.kind(), "ErrOutOfHistory");
    }

    #[test]
    fn tool_failed_carries_stderr_as_detail() {
        let e = Error::ToolFailed { exit_code: Some(1), stderr: "boom".into() };
        let body = e.to_body();
        assert_eq!(body.detail.as_deref(), Some("boom"));
        assert_eq!(e.http_status(), 503);
    }
}
