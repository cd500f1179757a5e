// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OpsNotebook core: a multi-target connection broker. Supervises a fleet
//! of external driver subprocesses, proxies authenticated HTTP traffic
//! through the tunnels they establish, and exposes a group/variable view
//! for a notebook-style UI.

pub mod config;
pub mod error;
pub mod exec;
pub mod groups;
pub mod model;
pub mod proxy;
pub mod state;
pub mod supervisor;
pub mod transport;
pub mod upstream;
pub mod variables;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::{Document, Settings};
use crate::state::Registry;
use crate::transport::{build_router, AppState};

/// Load configuration, connect every target, serve the Control API until
/// shutdown, then tear down every driver process group.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&settings.config_path)
        .map_err(|e| crate::error::ConfigError::Io(e.to_string()))?;
    let document = Document::load(&raw, settings.target_pattern.as_deref())?;

    let registry = Arc::new(Registry::new());
    for target in &document.targets {
        registry.insert(target.clone()).await;
    }

    tracing::info!(targets = document.targets.len(), "connecting configured targets");
    supervisor::connect_all(&registry).await;

    let state = Arc::new(AppState {
        registry: Arc::clone(&registry),
        group_by: document.group_by.clone(),
        variables: document.variables.clone(),
        static_dir: settings.static_dir.clone(),
    });

    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "control API listening");

    let stop_serving = CancellationToken::new();
    let signal_watch = stop_serving.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received shutdown signal");
        signal_watch.cancel();
    });

    let router = build_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { stop_serving.cancelled().await })
        .await?;

    tracing::info!("shutting down: terminating driver process groups");
    supervisor::shutdown(&registry).await;

    Ok(())
}
