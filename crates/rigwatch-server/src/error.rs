// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin axum `IntoResponse` bridge for `rigwatch_model::Error`. The model
//! crate deliberately carries no axum dependency (it is used by the CLI's
//! direct-poll paths too), so the status-code/body mapping it already
//! exposes via `kind()`/`http_status()`/`to_body()` is wrapped here instead
//! of duplicated, the way the teacher's `MuxError::to_http_response` wraps
//! its own error enum at the transport boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rigwatch_model::Error;

pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let envelope = rigwatch_model::error::ErrorEnvelope::from(self.0);
        (status, Json(envelope)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
