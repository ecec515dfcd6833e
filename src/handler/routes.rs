//! Route handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{FromRef, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::cloudevents::{decode, CloudEvent, EventResolver};
use crate::health::Checker;
use crate::legacy::{ErrorResponse, LegacyError, LegacyTransformer};
use crate::observability::Collector;
use crate::sender::{MessageSender, SendAck, SendError};
use crate::subscribed::{EventsResponse, Processor};

pub const PUBLISH_ROUTE: &str = "/publish";
pub const LEGACY_ROUTE: &str = "/{application}/v1/events";
pub const SUBSCRIBED_ROUTE: &str = "/{application}/v1/events/subscribed";

/// Shared state injected into every route.
#[derive(Clone)]
pub struct AppState {
    pub sender: Arc<dyn MessageSender>,
    pub resolver: Arc<EventResolver>,
    pub legacy: Arc<LegacyTransformer>,
    pub subscribed: Arc<Processor>,
    pub health: Arc<Checker>,
    pub collector: Collector,
}

impl FromRef<AppState> for Arc<Checker> {
    fn from_ref(state: &AppState) -> Self {
        state.health.clone()
    }
}

/// `POST /publish`: a CloudEvent in structured or binary mode.
pub async fn publish(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let start = Instant::now();
    let response = publish_event(&state, &headers, &body).await;
    state
        .collector
        .record_request(PUBLISH_ROUTE, "POST", response.status().as_u16(), start);
    response
}

async fn publish_event(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Response {
    let event = match decode(headers, body) {
        Ok(event) => event,
        Err(e) => {
            tracing::info!(error = %e, "Rejected malformed cloud event");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let resolved = match state.resolver.resolve(&event) {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::info!(error = %e, event_type = %event.event_type, "Rejected event type");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    match forward(state, &resolved, &event.source).await {
        Ok(ack) if ack.is_success() => StatusCode::NO_CONTENT.into_response(),
        Ok(ack) => (backend_status(&ack), ack.body).into_response(),
        Err(e) => (StatusCode::BAD_GATEWAY, e.to_string()).into_response(),
    }
}

/// `POST /{application}/v1/events`: a legacy publish request.
pub async fn legacy_publish(
    State(state): State<AppState>,
    Path(application): Path<String>,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let response = publish_legacy(&state, &application, &body).await;
    state
        .collector
        .record_request(LEGACY_ROUTE, "POST", response.status().as_u16(), start);
    response
}

async fn publish_legacy(state: &AppState, application: &str, body: &[u8]) -> Response {
    let event = match state
        .legacy
        .parse(body)
        .and_then(|request| state.legacy.transform(application, request))
    {
        Ok(event) => event,
        Err(e) => return legacy_rejection(application, e),
    };

    match forward(state, &event, application).await {
        Ok(ack) if ack.is_success() => {
            (StatusCode::OK, Json(state.legacy.response(&event, StatusCode::OK.as_u16(), None)))
                .into_response()
        }
        Ok(ack) => {
            let status = backend_status(&ack);
            let body = state.legacy.response(&event, ack.status, Some(ack.body));
            (status, Json(body)).into_response()
        }
        Err(e) => {
            let body = ErrorResponse::new(
                StatusCode::BAD_GATEWAY.as_u16(),
                "internal_server_error",
                e.to_string(),
            );
            (StatusCode::BAD_GATEWAY, Json(body)).into_response()
        }
    }
}

fn legacy_rejection(application: &str, error: LegacyError) -> Response {
    tracing::info!(application = %application, error = %error, "Rejected legacy request");
    (StatusCode::BAD_REQUEST, Json(error.to_response())).into_response()
}

/// `GET /{application}/v1/events/subscribed`
pub async fn subscribed_events(
    State(state): State<AppState>,
    Path(application): Path<String>,
) -> Json<EventsResponse> {
    let start = Instant::now();
    let events_info = state.subscribed.extract_events(&application);
    state
        .collector
        .record_request(SUBSCRIBED_ROUTE, "GET", StatusCode::OK.as_u16(), start);
    Json(EventsResponse { events_info })
}

async fn forward(state: &AppState, event: &CloudEvent, source: &str) -> Result<SendAck, SendError> {
    let start = Instant::now();
    match state.sender.send(event).await {
        Ok(ack) => {
            state
                .collector
                .record_backend_request(state.sender.url(), ack.status, start);
            state
                .collector
                .record_event_type(&event.event_type, source, ack.status);
            if !ack.is_success() {
                tracing::warn!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    status = ack.status,
                    "Backend rejected event"
                );
            }
            Ok(ack)
        }
        Err(e) => {
            tracing::error!(event_id = %event.id, error = %e, "Failed to send event");
            Err(e)
        }
    }
}

fn backend_status(ack: &SendAck) -> StatusCode {
    StatusCode::from_u16(ack.status).unwrap_or(StatusCode::BAD_GATEWAY)
}
