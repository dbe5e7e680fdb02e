// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Wire-level error body.
///
/// Serializes as `{"error": "...", "details": {...}}`, with `details`
/// omitted when absent so the bare-message paths keep the exact
/// reference shape (`{"error": "Request body is required"}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(message: impl Into<String>, details: Value) -> Self {
        Self {
            error: message.into(),
            details: Some(details),
        }
    }

    #[must_use]
    pub fn invalid_param(name: &str, value: &str, reason: &str) -> Self {
        Self::with_details(
            format!("invalid query parameter: {name}"),
            json!({"parameter": name, "value": value, "reason": reason}),
        )
    }

    #[must_use]
    pub fn validation_failed(field: &str, reason: &str) -> Self {
        Self::with_details(
            format!("validation failed: {field} {reason}"),
            json!({"field": field, "reason": reason}),
        )
    }

    #[must_use]
    pub fn invalid_body(reason: &str) -> Self {
        Self::with_details("invalid request body", json!({"reason": reason}))
    }

    #[must_use]
    pub fn missing_body() -> Self {
        Self::new("Request body is required")
    }

    #[must_use]
    pub fn interrupted() -> Self {
        Self::new("Request interrupted")
    }

    #[must_use]
    pub fn endpoint_disabled() -> Self {
        Self::new("endpoint disabled")
    }

    #[must_use]
    pub fn draining() -> Self {
        Self::new("server draining; refusing new requests")
    }
}
