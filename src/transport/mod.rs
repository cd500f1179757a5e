// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The thin JSON/HTTP surface exposed to the OpsNotebook UI. Handlers parse
//! the request, locate state in the [`crate::state::Registry`], invoke the
//! supervisor/proxy/exec layers, and serialize the result.

pub mod http;

use std::path::PathBuf;
use std::sync::Arc;

use axum::routing::{any, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::model::VariableRule;
use crate::state::Registry;

/// Shared state handed to every Control API handler.
pub struct AppState {
    pub registry: Arc<Registry>,
    pub group_by: Vec<String>,
    pub variables: Vec<VariableRule>,
    /// Directory of static UI assets to serve alongside the API, if any.
    /// Serving them is peripheral plumbing, not part of the API proper.
    pub static_dir: Option<PathBuf>,
}

/// Build the axum `Router` exposing the Control API.
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.static_dir.clone();

    let mut router = Router::new()
        .route("/api/config", get(http::get_config))
        .route("/api/health", get(http::health))
        .route("/api/targets", get(http::list_targets))
        .route("/api/targets/{id}", get(http::get_target))
        .route("/api/targets/{id}/reconnect", post(http::reconnect_target))
        .route("/api/targets/{id}/exec", post(http::exec_target))
        .route("/api/targets/{id}/proxy/{*path}", any(http::proxy_target))
        .route("/api/groups", get(http::list_groups))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    if let Some(dir) = static_dir {
        router = router.fallback_service(tower_http::services::ServeDir::new(dir));
    }

    router
}
