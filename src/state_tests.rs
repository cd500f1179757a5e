// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::model::TargetConfig;
use std::collections::HashMap;

fn config(id: &str) -> TargetConfig {
    TargetConfig {
        id: id.to_owned(),
        name: id.to_owned(),
        driver_cmd: "true".into(),
        tags: HashMap::new(),
        labels: HashMap::new(),
        variables: HashMap::new(),
        visual: serde_json::Value::Null,
    }
}

#[tokio::test]
async fn fresh_target_starts_disconnected_with_no_connection() {
    let target = TargetState::new(config("t1"));
    let snapshot = target.snapshot().await;
    assert_eq!(snapshot.status, Status::Disconnected);
    assert!(snapshot.connection.is_empty());
}

#[tokio::test]
async fn registry_insert_then_get_roundtrips() {
    let registry = Registry::new();
    registry.insert(config("t1")).await;
    let target = registry.get("t1").await;
    assert!(target.is_some());
    assert_eq!(target.unwrap().config.id, "t1");
}

#[tokio::test]
async fn registry_get_unknown_id_returns_none() {
    let registry = Registry::new();
    assert!(registry.get("nope").await.is_none());
}

#[tokio::test]
async fn registry_snapshots_covers_every_inserted_target() {
    let registry = Registry::new();
    registry.insert(config("a")).await;
    registry.insert(config("b")).await;
    let snapshots = registry.snapshots().await;
    let ids: Vec<&str> = snapshots.iter().map(|s| s.config.id.as_str()).collect();
    assert_eq!(snapshots.len(), 2);
    assert!(ids.contains(&"a"));
    assert!(ids.contains(&"b"));
}

#[test]
fn connected_snapshot_serializes_local_url_and_omits_control_url() -> anyhow::Result<()> {
    let snapshot = TargetSnapshot {
        config: config("t1"),
        status: Status::Connected,
        connection: crate::model::ConnectionInfo {
            control_url: "http://127.0.0.1:9999".into(),
            target_url: "http://127.0.0.1:9001".into(),
            headers: HashMap::new(),
            metadata: serde_json::Value::Null,
        },
        error: None,
        last_checked: None,
    };
    let json = serde_json::to_string(&snapshot)?;
    assert!(json.contains("9001"));
    assert!(!json.contains("control_url"));
    assert!(!json.contains("9999"));
    Ok(())
}

#[test]
fn error_snapshot_includes_message_but_no_local_url() -> anyhow::Result<()> {
    let snapshot = TargetSnapshot {
        config: config("t1"),
        status: Status::Error,
        connection: crate::model::ConnectionInfo::default(),
        error: Some("driver failed to start http server".into()),
        last_checked: None,
    };
    let value: serde_json::Value = serde_json::from_str(&serde_json::to_string(&snapshot)?)?;
    assert_eq!(value["error"], "driver failed to start http server");
    assert!(value.get("local_url").is_none());
    Ok(())
}
