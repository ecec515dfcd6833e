//! A minimal CloudEvents 1.0 model.

use std::collections::BTreeMap;

use axum::http::{header, HeaderMap};
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SPEC_VERSION: &str = "1.0";
pub const STRUCTURED_CONTENT_TYPE: &str = "application/cloudevents+json";

const BINARY_HEADER_PREFIX: &str = "ce-";

/// A CloudEvent in structured form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudEvent {
    pub id: String,
    pub source: String,
    pub specversion: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacontenttype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_base64: Option<String>,
    /// Extension attributes, serialized as top-level members. Structured
    /// events may carry strings, integers or booleans; binary-mode
    /// extensions arrive as strings.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, serde_json::Value>,
}

/// A CloudEvent that violates a required-attribute rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid cloud event: {0}")]
pub struct InvalidEvent(pub String);

impl CloudEvent {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        event_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            specversion: SPEC_VERSION.to_string(),
            event_type: event_type.into(),
            datacontenttype: None,
            time: None,
            data: None,
            data_base64: None,
            extensions: BTreeMap::new(),
        }
    }

    /// Check the required attributes.
    pub fn validate(&self) -> Result<(), InvalidEvent> {
        if self.specversion != SPEC_VERSION {
            return Err(InvalidEvent(format!(
                "unsupported specversion '{}'",
                self.specversion
            )));
        }
        for (name, value) in [
            ("id", &self.id),
            ("source", &self.source),
            ("type", &self.event_type),
        ] {
            if value.trim().is_empty() {
                return Err(InvalidEvent(format!("{} is required", name)));
            }
        }
        Ok(())
    }
}

/// Why a request could not be read as a CloudEvent.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed structured event: {0}")]
    Structured(#[from] serde_json::Error),

    #[error("missing header ce-{0}")]
    MissingHeader(&'static str),

    #[error("header {0} is not valid UTF-8")]
    InvalidHeader(String),

    #[error("invalid ce-time: {0}")]
    InvalidTime(String),

    #[error("request is neither a structured nor a binary cloud event")]
    UnsupportedMode,

    #[error(transparent)]
    Invalid(#[from] InvalidEvent),
}

/// Read a CloudEvent from an HTTP request in structured or binary mode.
pub fn decode(headers: &HeaderMap, body: &[u8]) -> Result<CloudEvent, DecodeError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let event = if content_type.starts_with(STRUCTURED_CONTENT_TYPE) {
        serde_json::from_slice::<CloudEvent>(body)?
    } else if headers.contains_key("ce-specversion") {
        decode_binary(headers, content_type, body)?
    } else {
        return Err(DecodeError::UnsupportedMode);
    };

    event.validate()?;
    Ok(event)
}

fn decode_binary(headers: &HeaderMap, content_type: &str, body: &[u8]) -> Result<CloudEvent, DecodeError> {
    let mut attributes = BTreeMap::new();
    for (name, value) in headers {
        if let Some(attribute) = name.as_str().strip_prefix(BINARY_HEADER_PREFIX) {
            let value = value
                .to_str()
                .map_err(|_| DecodeError::InvalidHeader(name.to_string()))?;
            attributes.insert(attribute.to_string(), value.to_string());
        }
    }

    let mut take = |name: &'static str| attributes.remove(name).ok_or(DecodeError::MissingHeader(name));
    let specversion = take("specversion")?;
    let id = take("id")?;
    let source = take("source")?;
    let event_type = take("type")?;
    let time = match attributes.remove("time") {
        Some(raw) => Some(
            DateTime::parse_from_rfc3339(&raw)
                .map_err(|e| DecodeError::InvalidTime(e.to_string()))?
                .with_timezone(&Utc),
        ),
        None => None,
    };

    let mut data_base64 = None;
    let data = if body.is_empty() {
        None
    } else if content_type.contains("json") {
        Some(serde_json::from_slice(body)?)
    } else {
        match std::str::from_utf8(body) {
            Ok(text) => Some(serde_json::Value::String(text.to_string())),
            Err(_) => {
                data_base64 = Some(base64::engine::general_purpose::STANDARD.encode(body));
                None
            }
        }
    };

    Ok(CloudEvent {
        id,
        source,
        specversion,
        event_type,
        datacontenttype: (!content_type.is_empty()).then(|| content_type.to_string()),
        time,
        data,
        data_base64,
        extensions: attributes
            .into_iter()
            .map(|(name, value)| (name, serde_json::Value::String(value)))
            .collect(),
    })
}
