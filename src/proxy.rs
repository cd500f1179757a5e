// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Forwards a request to a connected target's tunnel endpoint.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;

use crate::error::CoreError;
use crate::state::{Status, TargetState};

/// Per-request timeout for a proxied call.
const PROXY_TIMEOUT: Duration = Duration::from_secs(3600);

/// The result of a successful proxy call: enough to reconstruct an HTTP
/// response without the caller needing to know about reqwest types.
pub struct ProxyResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

/// Forward `method path` (query string already folded into `path`, if any)
/// to `target`'s tunnel.
///
/// Header order matters: `Accept`/`Content-Type` defaults are written first,
/// then `extra_headers` (currently unused by the Control API layer, kept for
/// callers that need to inject additional headers ahead of the driver's
/// own), then every entry of the driver's own headers last, so
/// driver-supplied values (e.g. an `Authorization` bearer token) win on key
/// collision.
pub async fn proxy(
    target: &Arc<TargetState>,
    method: reqwest::Method,
    path: &str,
    extra_headers: &HashMap<String, String>,
    body: Bytes,
) -> Result<ProxyResponse, CoreError> {
    let (target_url, driver_headers) = {
        let fields = target.fields.read().await;
        if fields.status != Status::Connected {
            return Err(CoreError::NotConnected);
        }
        if fields.connection.target_url.is_empty() {
            return Err(CoreError::NoBaseUrl);
        }
        (fields.connection.target_url.clone(), fields.connection.headers.clone())
    };

    let url = format!("{}{}", target_url.trim_end_matches('/'), path);

    let client = Client::builder()
        .danger_accept_invalid_certs(true)
        .timeout(PROXY_TIMEOUT)
        .build()
        .map_err(|_| CoreError::Internal)?;

    let mut request = client.request(method, &url).header("Accept", "application/json");
    if !body.is_empty() {
        request = request.header("Content-Type", "application/json");
    }
    for (key, value) in extra_headers {
        request = request.header(key, value);
    }
    for (key, value) in &driver_headers {
        request = request.header(key, value);
    }
    request = request.body(body);

    let response = request.send().await.map_err(|_| CoreError::UpstreamError)?;
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_owned())))
        .collect();
    let body = response.bytes().await.map_err(|_| CoreError::UpstreamError)?;

    Ok(ProxyResponse { status, headers, body })
}

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;
