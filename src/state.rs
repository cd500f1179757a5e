// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrent map of target id → runtime state, with a per-state lock
//! guarding mutable fields.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::SystemTime;

use serde::Serialize;
use tokio::process::Child;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::model::{ConnectionInfo, TargetConfig};

/// Runtime connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        }
    }
}

/// The mutable fields of a target's runtime state, guarded together by one
/// per-state write lock.
pub struct TargetFields {
    pub status: Status,
    pub connection: ConnectionInfo,
    pub error: Option<String>,
    pub last_checked: Option<SystemTime>,
    pub process: Option<Child>,
    /// PID of the spawned driver, retained after `process` is reaped so
    /// liveness checks and log lines can still refer to it.
    pub pid: Option<u32>,
    /// Cancellation token for the in-flight connect/crash-watcher pair.
    /// Replaced on every `connect()`.
    pub cancel: CancellationToken,
    /// Bumped on every successful `connect()`; lets a crash watcher detect
    /// that it is stale (a newer connect attempt has since started) and
    /// avoid acting on an out-of-date generation.
    pub generation: u64,
}

impl TargetFields {
    fn new() -> Self {
        Self {
            status: Status::Disconnected,
            connection: ConnectionInfo::default(),
            error: None,
            last_checked: None,
            process: None,
            pid: None,
            cancel: CancellationToken::new(),
            generation: 0,
        }
    }
}

/// One target's runtime entity. Lifetime = process lifetime; never removed
/// from the registry.
pub struct TargetState {
    pub config: TargetConfig,
    pub fields: RwLock<TargetFields>,
    /// Serializes concurrent `connect()` calls for this target. Held
    /// for the duration of a connect attempt; a second concurrent caller
    /// observes `status == connecting` under `fields` and returns early
    /// without ever needing this lock (see supervisor::connect).
    pub connect_lock: tokio::sync::Mutex<()>,
    /// Root of this target's cancellation tree, held for the process
    /// lifetime. Each connect attempt's `TargetFields::cancel` is a
    /// `child_token()` of this, so cancelling it (never done directly; see
    /// `disconnect`, which cancels the per-attempt child instead) would tear
    /// down every attempt this target has ever made in one move.
    pub cancel_root: CancellationToken,
}

impl TargetState {
    pub fn new(config: TargetConfig) -> Self {
        Self {
            config,
            fields: RwLock::new(TargetFields::new()),
            connect_lock: tokio::sync::Mutex::new(()),
            cancel_root: CancellationToken::new(),
        }
    }

    pub async fn snapshot(&self) -> TargetSnapshot {
        let fields = self.fields.read().await;
        TargetSnapshot {
            config: self.config.clone(),
            status: fields.status,
            connection: fields.connection.clone(),
            error: fields.error.clone(),
            last_checked: fields.last_checked,
        }
    }
}

/// Value-copy snapshot of a target's externally-relevant state, taken under
/// the per-state read lock. Safe to hand to pure functions (group
/// aggregator) or serialize directly — callers must not treat this as a
/// live reference.
#[derive(Debug, Clone)]
pub struct TargetSnapshot {
    pub config: TargetConfig,
    pub status: Status,
    pub connection: ConnectionInfo,
    pub error: Option<String>,
    pub last_checked: Option<SystemTime>,
}

impl Serialize for TargetSnapshot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.config.id)?;
        map.serialize_entry("name", &self.config.name)?;
        map.serialize_entry("driver_cmd", &self.config.driver_cmd)?;
        map.serialize_entry("tags", &self.config.tags)?;
        map.serialize_entry("labels", &self.config.labels)?;
        map.serialize_entry("status", self.status.as_str())?;
        if self.status == Status::Connected {
            map.serialize_entry("local_url", &self.connection.target_url)?;
            map.serialize_entry("headers", &self.connection.headers)?;
            map.serialize_entry("metadata", &self.connection.metadata)?;
        }
        if self.status == Status::Error {
            if let Some(ref err) = self.error {
                map.serialize_entry("error", err)?;
            }
        }
        map.end()
    }
}

/// Epoch-millis helper, used when the API needs a JSON-friendly timestamp
/// instead of an opaque `SystemTime`.
pub fn epoch_ms(time: SystemTime) -> u64 {
    time.duration_since(SystemTime::UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

/// Standard stdio wiring for a freshly spawned driver process.
pub fn driver_stdio() -> (Stdio, Stdio, Stdio) {
    (Stdio::null(), Stdio::null(), Stdio::inherit())
}

/// The connection registry: a concurrent map of target id → runtime state.
/// Insert-only after startup; no deletions.
pub struct Registry {
    targets: RwLock<HashMap<String, Arc<TargetState>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self { targets: RwLock::new(HashMap::new()) }
    }

    pub async fn insert(&self, config: TargetConfig) {
        let mut targets = self.targets.write().await;
        targets.insert(config.id.clone(), Arc::new(TargetState::new(config)));
    }

    pub async fn get(&self, id: &str) -> Option<Arc<TargetState>> {
        self.targets.read().await.get(id).cloned()
    }

    pub async fn all(&self) -> Vec<Arc<TargetState>> {
        self.targets.read().await.values().cloned().collect()
    }

    pub async fn snapshots(&self) -> Vec<TargetSnapshot> {
        let targets = self.all().await;
        let mut out = Vec::with_capacity(targets.len());
        for target in &targets {
            out.push(target.snapshot().await);
        }
        out
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
