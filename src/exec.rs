// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Forwards an arbitrary command to a connected target's driver over its
//! control-plane endpoint.

use std::sync::Arc;

use bytes::Bytes;

use crate::error::CoreError;
use crate::state::{Status, TargetState};
use crate::upstream::client::DriverClient;

/// The driver's `/execute` response: status and body forwarded verbatim,
/// mirroring `proxy::ProxyResponse` — the body shape is the driver
/// protocol's concern, not this layer's.
pub struct ExecResponse {
    pub status: u16,
    pub body: Bytes,
}

/// Send `command` to `target`'s driver via `/execute` and return its
/// response status and body verbatim. Only a transport-level failure (the
/// request never reaching the driver, or never coming back) is reported as
/// [`CoreError::UpstreamError`]; any HTTP status the driver does send,
/// including non-2xx, is forwarded as-is.
pub async fn exec(target: &Arc<TargetState>, command: &serde_json::Value) -> Result<ExecResponse, CoreError> {
    let control_url = {
        let fields = target.fields.read().await;
        if fields.status != Status::Connected {
            return Err(CoreError::NotConnected);
        }
        fields.connection.control_url.clone()
    };

    if control_url.is_empty() {
        return Err(CoreError::NoBaseUrl);
    }

    let client = DriverClient::new(control_url);
    let (status, body) = client.execute(command).await.map_err(|_| CoreError::UpstreamError)?;
    Ok(ExecResponse { status, body })
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
