//! Legacy request validation and conversion.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use thiserror::Error;
use uuid::Uuid;

use crate::cloudevents::{CloudEvent, InvalidEvent};
use crate::cluster::ApplicationLister;
use crate::eventtype::clean::clean_segments;
use crate::eventtype::{build, clean_name, CleanError};
use crate::legacy::types::{ErrorDetail, ErrorResponse, PublishRequest, PublishResponse};

const CONTENT_TYPE_JSON: &str = "application/json";
const REASON_PUBLISHED: &str = "Message successfully published to the context";

// Word characters joined by single dashes.
static EVENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+(-[A-Za-z0-9_]+)*$").expect("event id pattern"));

/// A single invalid field in a legacy request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub kind: &'static str,
    pub message: String,
}

impl FieldViolation {
    fn missing(field: &'static str) -> Self {
        Self {
            field,
            kind: "missing_field",
            message: "field is missing".to_string(),
        }
    }

    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            kind: "invalid_field",
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LegacyError {
    #[error("request body is not valid JSON: {0}")]
    Body(#[from] serde_json::Error),

    #[error("validation failed for {}", fields(.0))]
    Validation(Vec<FieldViolation>),

    #[error(transparent)]
    Clean(#[from] CleanError),

    #[error(transparent)]
    Invalid(#[from] InvalidEvent),
}

fn fields(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.field)
        .collect::<Vec<_>>()
        .join(", ")
}

impl LegacyError {
    /// The 400 body describing this error.
    pub fn to_response(&self) -> ErrorResponse {
        match self {
            LegacyError::Validation(violations) => ErrorResponse {
                details: violations
                    .iter()
                    .map(|v| ErrorDetail {
                        field: v.field.to_string(),
                        kind: v.kind.to_string(),
                        message: v.message.clone(),
                    })
                    .collect(),
                ..ErrorResponse::new(400, "validation_violation", "Validation failed")
            },
            LegacyError::Body(e) => ErrorResponse::new(400, "bad_payload_syntax", e.to_string()),
            other => ErrorResponse::new(400, "validation_violation", other.to_string()),
        }
    }
}

/// Converts legacy publish requests into CloudEvents.
#[derive(Debug, Clone)]
pub struct LegacyTransformer {
    namespace: String,
    prefix: String,
    applications: ApplicationLister,
}

impl LegacyTransformer {
    pub fn new(
        namespace: impl Into<String>,
        prefix: impl Into<String>,
        applications: ApplicationLister,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            prefix: prefix.into(),
            applications,
        }
    }

    /// Parse a raw request body.
    pub fn parse(&self, body: &[u8]) -> Result<PublishRequest, LegacyError> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Check every field, collecting all violations.
    pub fn validate(&self, request: &PublishRequest) -> Result<(), LegacyError> {
        let mut violations = Vec::new();

        match request.event_type.as_deref() {
            None | Some("") => violations.push(FieldViolation::missing("event-type")),
            Some(_) => {}
        }

        match request.event_type_version.as_deref() {
            None | Some("") => violations.push(FieldViolation::missing("event-type-version")),
            Some(v) if !v.chars().all(|c| c.is_ascii_alphanumeric()) => violations.push(
                FieldViolation::invalid("event-type-version", "must be alphanumeric"),
            ),
            Some(_) => {}
        }

        match request.event_time.as_deref() {
            None | Some("") => violations.push(FieldViolation::missing("event-time")),
            Some(t) if DateTime::parse_from_rfc3339(t).is_err() => {
                violations.push(FieldViolation::invalid("event-time", "must be RFC 3339"))
            }
            Some(_) => {}
        }

        if let Some(id) = request.event_id.as_deref().filter(|id| !id.is_empty()) {
            if !EVENT_ID.is_match(id) {
                violations.push(FieldViolation::invalid(
                    "event-id",
                    "must be word characters separated by single dashes",
                ));
            }
        }

        if request.data.is_none() {
            violations.push(FieldViolation::missing("data"));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(LegacyError::Validation(violations))
        }
    }

    /// The event type a request from `application` publishes.
    pub fn event_type(&self, application: &str, request: &PublishRequest) -> Result<String, LegacyError> {
        let name = match &self.applications {
            ApplicationLister::Present(lister) => lister
                .get(application)
                .map(|app| app.type_or_name().to_string())
                .unwrap_or_else(|| application.to_string()),
            ApplicationLister::Absent => application.to_string(),
        };
        let name = clean_name(&name);
        if name.is_empty() {
            return Err(CleanError::Empty("application name").into());
        }

        let raw = clean_segments(request.event_type.as_deref().unwrap_or_default());
        let segments: Vec<&str> = raw.split('.').filter(|s| !s.is_empty()).collect();
        let event = match segments.split_last() {
            None => return Err(CleanError::Empty("event-type").into()),
            Some((operation, [])) => operation.to_string(),
            Some((operation, object)) => format!("{}.{}", object.concat(), operation),
        };

        let version = request.event_type_version.as_deref().unwrap_or_default();
        Ok(clean_segments(&build(&self.prefix, &name, &event, version)))
    }

    /// Validate `request` and convert it into a CloudEvent.
    pub fn transform(&self, application: &str, request: PublishRequest) -> Result<CloudEvent, LegacyError> {
        self.validate(&request)?;
        let event_type = self.event_type(application, &request)?;

        let id = request
            .event_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let time = request
            .event_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc));

        let mut event = CloudEvent::new(id, self.namespace.clone(), event_type);
        event.time = time;
        event.datacontenttype = Some(CONTENT_TYPE_JSON.to_string());
        event.data = request.data;
        event.validate()?;
        Ok(event)
    }

    /// The response body for an event the backend accepted or rejected.
    pub fn response(&self, event: &CloudEvent, status: u16, reason: Option<String>) -> PublishResponse {
        PublishResponse {
            event_id: event.id.clone(),
            status,
            reason: reason.unwrap_or_else(|| REASON_PUBLISHED.to_string()),
        }
    }
}
