// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Immutable configuration data types shared by the config loader, the
//! variable resolver, and the group aggregator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single target as declared in the configuration document.
///
/// Immutable after load: runtime state transitions never mutate this value,
/// only the `TargetState` wrapping it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub driver_cmd: String,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub variables: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub visual: serde_json::Value,
}

impl TargetConfig {
    /// Tag value for `variant`, defaulting to `"default"` when absent.
    pub fn variant(&self) -> &str {
        self.tags.get("variant").map(String::as_str).unwrap_or("default")
    }

    /// Tag value for an arbitrary grouping dimension, defaulting to
    /// `"unknown"` when the target has no such tag.
    pub fn tag_or_unknown(&self, key: &str) -> &str {
        self.tags.get(key).map(String::as_str).unwrap_or("unknown")
    }
}

/// A derived-variable rule: `when` must match every listed tag; `then` is
/// merged into the target's resolved variables on a match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableRule {
    #[serde(default)]
    pub when: HashMap<String, String>,
    #[serde(default)]
    pub then: HashMap<String, serde_json::Value>,
}

/// Connection information supplied by a driver at handshake time.
///
/// `control_url` is **never** serialized across the external interface:
/// every `Serialize` derive on a type built from this one must use
/// `#[serde(skip_serializing)]` on `control_url`, which is enforced here by
/// giving the field that attribute on the single canonical type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Loopback URL of the driver's own control-plane HTTP server.
    /// Internal only — never surfaced to external clients.
    #[serde(default, skip_serializing)]
    pub control_url: String,
    #[serde(default)]
    pub target_url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl ConnectionInfo {
    pub fn is_empty(&self) -> bool {
        self.target_url.is_empty()
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
