//! Legacy wire types.

use serde::{Deserialize, Serialize};

/// A legacy publish request body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PublishRequest {
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub event_type_version: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub event_time: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Body returned for a published legacy event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PublishResponse {
    #[serde(rename = "event-id")]
    pub event_id: String,
    pub status: u16,
    pub reason: String,
}

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorDetail {
    pub field: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

/// Body returned for a rejected legacy request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ErrorDetail>,
}

impl ErrorResponse {
    pub fn new(status: u16, kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            kind: kind.into(),
            message: message.into(),
            details: Vec::new(),
        }
    }
}
