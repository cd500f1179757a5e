// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::sync::Arc;

use super::*;
use crate::model::TargetConfig;

fn target() -> Arc<TargetState> {
    Arc::new(TargetState::new(TargetConfig {
        id: "t1".into(),
        name: "t1".into(),
        driver_cmd: "true".into(),
        tags: HashMap::new(),
        labels: HashMap::new(),
        variables: HashMap::new(),
        visual: serde_json::Value::Null,
    }))
}

#[tokio::test]
async fn exec_on_disconnected_target_fails_without_a_request() {
    let target = target();
    let result = exec(&target, &serde_json::json!({"cmd": "ls"})).await;
    assert!(matches!(result, Err(CoreError::NotConnected)));
}

#[tokio::test]
async fn exec_on_connected_target_without_control_url_reports_no_base_url() {
    let target = target();
    {
        let mut fields = target.fields.write().await;
        fields.status = Status::Connected;
    }
    let result = exec(&target, &serde_json::json!({"cmd": "ls"})).await;
    assert!(matches!(result, Err(CoreError::NoBaseUrl)));
}
