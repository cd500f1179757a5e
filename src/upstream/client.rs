// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for a single driver's control-plane endpoint.

use std::time::Duration;

use reqwest::Client;

use crate::model::ConnectionInfo;

/// Per-attempt timeout for a `/status` poll.
const STATUS_POLL_TIMEOUT: Duration = Duration::from_millis(500);
/// Timeout for the `/connect` handshake.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(120);
/// Timeout for a forwarded `/execute` request.
const EXECUTE_TIMEOUT: Duration = Duration::from_secs(3600);

/// HTTP client wrapper for one driver's control-plane server, reachable on
/// loopback at the port the supervisor assigned it.
pub struct DriverClient {
    control_url: String,
    client: Client,
}

impl DriverClient {
    pub fn new(control_url: String) -> Self {
        // The driver's own control-plane server runs on loopback behind a
        // self-signed (or plain HTTP) listener; the outbound hop from here
        // does not participate in the platform trust store.
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .unwrap_or_default();
        Self { control_url, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.control_url, path)
    }

    /// Poll `/status`. Per the driver protocol, readiness is signalled
    /// by any HTTP 200 response — the body is not interpreted. Connection
    /// errors and non-200 responses are treated as "not ready yet" by the
    /// caller, not propagated as handshake failures.
    pub async fn poll_ready(&self) -> anyhow::Result<bool> {
        let resp = self.client.get(self.url("/status")).timeout(STATUS_POLL_TIMEOUT).send().await?;
        Ok(resp.status().is_success())
    }

    /// Perform the `/connect` handshake and decode the driver's reported
    /// connection info. On a non-200 response the body is read and folded
    /// into the error message verbatim.
    pub async fn connect(&self) -> anyhow::Result<ConnectionInfo> {
        let resp = self.client.post(self.url("/connect")).timeout(CONNECT_TIMEOUT).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("connect failed: status {}: {}", status.as_u16(), body);
        }
        let info: ConnectionInfo = resp.json().await?;
        Ok(info)
    }

    /// Forward a command to the driver's `/execute` endpoint. Returns the
    /// driver's status code and raw body verbatim — the body shape
    /// (`stdout`/`stderr`/`exit_code`) is the driver protocol's concern, not
    /// this client's, so no status-based branching happens here.
    pub async fn execute(&self, command: &serde_json::Value) -> anyhow::Result<(u16, bytes::Bytes)> {
        let resp = self
            .client
            .post(self.url("/execute"))
            .timeout(EXECUTE_TIMEOUT)
            .json(command)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await?;
        Ok((status, body))
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
