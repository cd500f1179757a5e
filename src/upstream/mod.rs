// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver control-plane communication: the HTTP client used by the
//! supervisor to poll, handshake, and forward commands to a running driver.

pub mod client;
