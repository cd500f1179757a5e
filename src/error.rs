// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the Control API.

use std::fmt;

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

/// Error codes returned by the Control API, one per documented failure mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoreError {
    /// Target id does not exist in the registry.
    TargetNotFound,
    /// Request body failed to parse or validate.
    BadRequest,
    /// Requested HTTP method is not allowed on this route. In practice
    /// `axum`'s method router answers this itself — with an `Allow` header
    /// — for any route registered under a single HTTP method, so this
    /// variant exists for taxonomy completeness rather than being raised by
    /// a handler.
    MethodNotAllowed,
    /// Target is not in the `connected` state; proxying/exec is unavailable.
    NotConnected,
    /// Driver reported no usable base URL at handshake time.
    NoBaseUrl,
    /// The driver's own HTTP endpoint returned an error or was unreachable.
    UpstreamError,
    Internal,
}

impl CoreError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::TargetNotFound => 404,
            Self::BadRequest => 400,
            Self::MethodNotAllowed => 405,
            Self::NotConnected => 409,
            Self::NoBaseUrl => 502,
            Self::UpstreamError => 502,
            Self::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TargetNotFound => "TARGET_NOT_FOUND",
            Self::BadRequest => "BAD_REQUEST",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::NotConnected => "NOT_CONNECTED",
            Self::NoBaseUrl => "NO_BASE_URL",
            Self::UpstreamError => "UPSTREAM_ERROR",
            Self::Internal => "INTERNAL",
        }
    }

    pub fn to_error_body(&self, message: impl Into<String>) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: message.into() }
    }

    pub fn to_http_response(
        &self,
        message: impl Into<String>,
    ) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { error: self.to_error_body(message) };
        (status, Json(body))
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Errors raised while loading or validating the configuration document.
/// Distinct from [`CoreError`]: these occur before the server ever starts
/// accepting requests and are reported on stderr, not as an HTTP response.
#[derive(Debug, Clone)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    DuplicateTargetId(String),
    EmptyTargetId,
    EmptyDriverCmd(String),
    NoTargetsMatched,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "failed to read configuration: {msg}"),
            Self::Parse(msg) => write!(f, "failed to parse configuration: {msg}"),
            Self::DuplicateTargetId(id) => write!(f, "duplicate target id: {id}"),
            Self::EmptyTargetId => write!(f, "target id must not be empty"),
            Self::EmptyDriverCmd(id) => write!(f, "target {id} must have a non-empty driver_cmd"),
            Self::NoTargetsMatched => write!(f, "no targets matched the configured pattern"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
