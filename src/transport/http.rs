// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the Control API.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::error::CoreError;
use crate::state::{Status, TargetSnapshot};
use crate::transport::AppState;
use crate::{exec, groups, proxy, supervisor, variables};

// -- Response types -----------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub group_by: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TargetSummary {
    pub id: String,
    pub status: &'static str,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReconnectResponse {
    pub success: bool,
}

/// Slimmed-down target view used inside a group's `targets` map:
/// `{ id, status, local_url?, headers?, error? }`. Deliberately narrower
/// than the `/api/targets` list item — groups are a read-only overview, not
/// a config surface.
#[derive(Debug, Serialize)]
pub struct GroupTargetItem {
    pub id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&TargetSnapshot> for GroupTargetItem {
    fn from(snapshot: &TargetSnapshot) -> Self {
        let (local_url, headers) = if snapshot.status == Status::Connected {
            (Some(snapshot.connection.target_url.clone()), Some(snapshot.connection.headers.clone()))
        } else {
            (None, None)
        };
        GroupTargetItem {
            id: snapshot.config.id.clone(),
            status: snapshot.status.as_str(),
            local_url,
            headers,
            error: snapshot.error.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub key: String,
    pub values: HashMap<String, String>,
    pub targets: HashMap<String, GroupTargetItem>,
}

// -- Handlers -------------------------------------------------------------

/// `GET /api/config`
pub async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ConfigResponse { group_by: state.group_by.clone() })
}

/// `GET /api/health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// `GET /api/targets` — every target's config fields, status, and resolved
/// variables. `control_url` never appears: the snapshot's own
/// `Serialize` impl omits it at the source.
pub async fn list_targets(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshots = state.registry.snapshots().await;
    let mut out = Vec::with_capacity(snapshots.len());
    for snapshot in &snapshots {
        out.push(with_resolved_variables(snapshot, &state.variables));
    }
    Json(out)
}

/// `GET /api/targets/{id}` — minimal status view.
pub async fn get_target(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let Some(target) = state.registry.get(&id).await else {
        return CoreError::TargetNotFound.to_http_response("unknown target id").into_response();
    };
    let snapshot = target.snapshot().await;
    Json(TargetSummary { id: snapshot.config.id, status: snapshot.status.as_str(), error: snapshot.error })
        .into_response()
}

/// `GET /api/groups` — targets aggregated by `group_by` tag dimensions.
pub async fn list_groups(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshots = state.registry.snapshots().await;
    let groups = groups::aggregate(&snapshots, &state.group_by);
    let out: Vec<GroupResponse> = groups
        .into_iter()
        .map(|g| GroupResponse {
            key: g.key,
            values: g.values,
            targets: g.targets.iter().map(|(variant, snap)| (variant.clone(), snap.into())).collect(),
        })
        .collect();
    Json(out)
}

/// `POST /api/targets/{id}/reconnect` — disconnect then asynchronously
/// reconnect; returns immediately.
pub async fn reconnect_target(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let Some(target) = state.registry.get(&id).await else {
        return CoreError::TargetNotFound.to_http_response("unknown target id").into_response();
    };
    tokio::spawn(async move {
        supervisor::disconnect(&target).await;
        supervisor::connect(target).await;
    });
    Json(ReconnectResponse { success: true }).into_response()
}

#[derive(Debug, serde::Deserialize)]
pub struct ExecRequest {
    pub command: String,
}

/// `POST /api/targets/{id}/exec` — forward a shell command to the driver's
/// `/execute` endpoint. The driver's status code and body are forwarded
/// verbatim; only a transport-level failure is translated into a Control
/// API error.
pub async fn exec_target(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ExecRequest>,
) -> axum::response::Response {
    let Some(target) = state.registry.get(&id).await else {
        return CoreError::TargetNotFound.to_http_response("unknown target id").into_response();
    };
    let body = serde_json::json!({ "command": req.command });
    match exec::exec(&target, &body).await {
        Ok(response) => {
            let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, response.body).into_response()
        }
        Err(err) => err.to_http_response(err.to_string()).into_response(),
    }
}

/// Header consulted by the transport wrapper to let browsers send a body
/// on what is logically a `GET`.
const METHOD_OVERRIDE_HEADER: &str = "x-http-method-override";

/// `ANY /api/targets/{id}/proxy/{path...}` — relay to the driver's tunnel.
pub async fn proxy_target(
    State(state): State<Arc<AppState>>,
    Path((id, path)): Path<(String, String)>,
    method: axum::http::Method,
    headers: HeaderMap,
    uri: axum::http::Uri,
    body: Bytes,
) -> axum::response::Response {
    let Some(target) = state.registry.get(&id).await else {
        return CoreError::TargetNotFound.to_http_response("unknown target id").into_response();
    };

    let method = headers
        .get(METHOD_OVERRIDE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| reqwest::Method::from_bytes(v.as_bytes()).ok())
        .unwrap_or_else(|| reqwest_method_from_axum(&method));

    let mut forward_path = format!("/{path}");
    if let Some(query) = uri.query() {
        forward_path.push('?');
        forward_path.push_str(query);
    }

    match proxy::proxy(&target, method, &forward_path, &HashMap::new(), body).await {
        Ok(response) => {
            let mut builder = axum::http::Response::builder()
                .status(StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY));
            for (key, value) in &response.headers {
                builder = builder.header(key, value);
            }
            builder.body(axum::body::Body::from(response.body)).unwrap_or_else(|_| {
                CoreError::Internal.to_http_response("failed to build proxy response").into_response()
            })
        }
        Err(err) => err.to_http_response(err.to_string()).into_response(),
    }
}

fn reqwest_method_from_axum(method: &axum::http::Method) -> reqwest::Method {
    reqwest::Method::from_bytes(method.as_str().as_bytes()).unwrap_or(reqwest::Method::GET)
}

/// Merge a target's resolved variables into its JSON snapshot for the
/// `/api/targets` list. The snapshot's own `Serialize` impl already
/// omits `control_url`; this only adds the `variables` field on top.
fn with_resolved_variables(
    snapshot: &TargetSnapshot,
    rules: &[crate::model::VariableRule],
) -> serde_json::Value {
    let resolved = variables::resolve(&snapshot.config, rules);
    let mut value = serde_json::to_value(snapshot).unwrap_or(serde_json::Value::Null);
    if let serde_json::Value::Object(ref mut map) = value {
        map.insert("variables".to_owned(), serde_json::to_value(resolved).unwrap_or_default());
    }
    value
}
