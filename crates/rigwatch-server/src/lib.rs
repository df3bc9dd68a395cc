// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The HTTP/WebSocket surface (spec §4.9 C10) and the supervising task that
//! wires the poller, world model, history store and rule engine together
//! (spec §5, C9 hub glue). This crate is the one piece of the workspace
//! that knows about all the others; everything downstream of it stays
//! storage- and transport-agnostic.

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics_log;
pub mod replay;
pub mod state;
pub mod supervisor;
pub mod ws;

pub use config::ServerConfig;
pub use state::ServerState;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the full axum router: REST handlers, the WebSocket upgrade route
/// and the ambient middleware stack, grounded on the teacher's
/// `build_router_inner` (CORS + tracing + compression wrapped around a
/// shared `State`).
pub fn build_router(state: Arc<ServerState>) -> axum::Router {
    axum::Router::new()
        .merge(http::routes())
        .merge(ws::routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Bind and serve, running until `state.shutdown` is cancelled (spec §5
/// shutdown order: stop pollers, drain dispatcher, close sessions,
/// persist rules/alerts, exit).
pub async fn serve(state: Arc<ServerState>) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", state.config.host, state.config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "rigwatch server listening");

    let supervisor_state = Arc::clone(&state);
    let supervisor_handle = tokio::spawn(supervisor::run(supervisor_state));

    let router = build_router(Arc::clone(&state));
    let shutdown = state.shutdown.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    state.shutdown.cancel();
    let _ = supervisor_handle.await;
    state.persist().await?;
    Ok(())
}
