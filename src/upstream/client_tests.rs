// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn url_joins_control_url_and_path() {
    let client = DriverClient::new("http://127.0.0.1:9001".into());
    assert_eq!(client.url("/status"), "http://127.0.0.1:9001/status");
}
