//! Metrics collection and exposition.
//!
//! # Metrics
//! - `epp_requests_total` (counter): inbound requests by route and status
//! - `epp_requests_duration_seconds` (histogram): inbound latency
//! - `epp_backend_requests_total` (counter): publish calls by status
//! - `epp_backend_duration_seconds` (histogram): publish latency
//! - `epp_event_type_published_total` (counter): published events by
//!   event type, source and status

use std::net::SocketAddr;
use std::time::Instant;

use axum::{routing::get, Router};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tokio::net::TcpListener;

use crate::lifecycle::LifecycleContext;

/// Records per-request and per-publish metrics for the handler and sender.
///
/// Cheap to clone; all state lives in the globally installed recorder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Collector;

impl Collector {
    pub fn new() -> Self {
        Self
    }

    /// Record a completed inbound request.
    pub fn record_request(&self, route: &'static str, method: &str, status: u16, start: Instant) {
        let elapsed = start.elapsed().as_secs_f64();
        let code = status.to_string();
        ::metrics::counter!(
            "epp_requests_total",
            "route" => route,
            "method" => method.to_string(),
            "code" => code.clone()
        )
        .increment(1);
        ::metrics::histogram!(
            "epp_requests_duration_seconds",
            "route" => route,
            "code" => code
        )
        .record(elapsed);
    }

    /// Record a publish call to the backend.
    pub fn record_backend_request(&self, destination: &str, status: u16, start: Instant) {
        let elapsed = start.elapsed().as_secs_f64();
        let code = status.to_string();
        ::metrics::counter!(
            "epp_backend_requests_total",
            "destination" => destination.to_string(),
            "code" => code.clone()
        )
        .increment(1);
        ::metrics::histogram!(
            "epp_backend_duration_seconds",
            "destination" => destination.to_string(),
            "code" => code
        )
        .record(elapsed);
    }

    /// Record a published event type.
    pub fn record_event_type(&self, event_type: &str, source: &str, status: u16) {
        ::metrics::counter!(
            "epp_event_type_published_total",
            "event_type" => event_type.to_string(),
            "event_source" => source.to_string(),
            "code" => status.to_string()
        )
        .increment(1);
    }
}

/// Install the global Prometheus recorder.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Serve `/metrics` until the context is cancelled.
pub async fn serve_metrics(
    handle: PrometheusHandle,
    addr: SocketAddr,
    ctx: LifecycleContext,
) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "Metrics server listening");

    let app = Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { ctx.cancelled().await })
        .await
}
