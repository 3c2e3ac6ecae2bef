// logtriage - GPL-3.0-or-later
// This file is part of logtriage.
//
// Copyright (C) 2025 The logtriage authors
//
// logtriage is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// logtriage is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with logtriage.  If not, see <https://www.gnu.org/licenses/>.


//! JSON HTTP service over the analyzer.
//!
//! Analysis and collaborator probes block on network calls, so handlers run
//! them on the blocking pool.

pub mod handlers;

use crate::config::Config;
use crate::core::{Analyzer, StatusReport};
use anyhow::Context;
use arc_swap::ArcSwap;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Largest accepted upload
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// How often collaborator health is probed in the background
pub const STATUS_REFRESH: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub config: Arc<Config>,
    pub status: Arc<ArcSwap<StatusReport>>,
}

impl AppState {
    pub fn new(analyzer: Arc<Analyzer>, config: Arc<Config>) -> Self {
        let status = Arc::new(ArcSwap::from_pointee(StatusReport::pending(
            &config.jira.project_key,
        )));
        Self {
            analyzer,
            config,
            status,
        }
    }

    /// Probe collaborators now and publish the result
    pub async fn refresh_status(&self) {
        let analyzer = Arc::clone(&self.analyzer);
        match tokio::task::spawn_blocking(move || analyzer.status()).await {
            Ok(report) => {
                tracing::debug!("{} | {}", report.jira_status, report.ai_status);
                self.status.store(Arc::new(report));
            }
            Err(e) => tracing::error!("Status probe task failed: {e}"),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/analyze", post(handlers::analyze))
        .route("/api/status", get(handlers::status))
        .route("/api/tickets", get(handlers::tickets))
        .route("/api/create_ticket", post(handlers::create_ticket))
        .route("/api/test-jira", get(handlers::test_jira))
        .route(
            "/api/test-team-assignment",
            post(handlers::test_team_assignment),
        )
        .route(
            "/api/test-developer-mapping",
            get(handlers::test_developer_mapping),
        )
        .route("/api/errors", get(handlers::errors))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Re-probe collaborators every `every` until the runtime shuts down
pub fn spawn_status_refresh(state: AppState, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            state.refresh_status().await;
            tokio::time::sleep(every).await;
        }
    })
}

/// Serve until Ctrl-C
pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    let refresher = spawn_status_refresh(state.clone(), STATUS_REFRESH);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    refresher.abort();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
