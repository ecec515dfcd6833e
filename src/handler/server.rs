//! Router construction and the serve loop.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::cloudevents::EventResolver;
use crate::config::Options;
use crate::handler::routes::{self, AppState, LEGACY_ROUTE, PUBLISH_ROUTE, SUBSCRIBED_ROUTE};
use crate::health::{checker, Checker};
use crate::legacy::LegacyTransformer;
use crate::lifecycle::LifecycleContext;
use crate::observability::Collector;
use crate::receiver::{HttpMessageReceiver, ServeError};
use crate::sender::MessageSender;
use crate::subscribed::Processor;

/// Extra time open connections get after the request timeout once
/// shutdown starts.
const DRAIN_MARGIN: Duration = Duration::from_secs(1);

/// Serves the publish API on the receiver's port.
pub struct Handler {
    pub receiver: HttpMessageReceiver,
    pub sender: Arc<dyn MessageSender>,
    pub health: Arc<Checker>,
    pub request_timeout: Duration,
    pub legacy: Arc<LegacyTransformer>,
    pub options: Options,
    pub subscribed: Arc<Processor>,
    pub resolver: Arc<EventResolver>,
    pub collector: Collector,
}

impl Handler {
    /// Build the router with all middleware layers.
    #[allow(deprecated)]
    pub fn router(&self) -> Router {
        let state = AppState {
            sender: self.sender.clone(),
            resolver: self.resolver.clone(),
            legacy: self.legacy.clone(),
            subscribed: self.subscribed.clone(),
            health: self.health.clone(),
            collector: self.collector,
        };

        Router::new()
            .route(PUBLISH_ROUTE, post(routes::publish))
            .route(LEGACY_ROUTE, post(routes::legacy_publish))
            .route(SUBSCRIBED_ROUTE, get(routes::subscribed_events))
            .route("/healthz", get(checker::liveness))
            .route("/readyz", get(checker::readiness))
            .with_state(state)
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(self.options.max_request_size))
            .layer(TimeoutLayer::new(self.request_timeout))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until `ctx` is cancelled.
    ///
    /// In-flight requests are drained for at most the request timeout plus
    /// a small margin; connections still open after that are dropped.
    pub async fn start(self, ctx: LifecycleContext) -> Result<(), ServeError> {
        let listener = self.receiver.bind().await?;
        let router = self.router();
        let drain = self.request_timeout + DRAIN_MARGIN;

        let signal = ctx.clone();
        let serve = axum::serve(listener, router)
            .with_graceful_shutdown(async move { signal.cancelled().await })
            .into_future();
        tokio::pin!(serve);

        self.health.set_ready(true);
        tracing::info!(port = self.receiver.port(), "Handler started");

        let result = tokio::select! {
            result = &mut serve => result.map_err(ServeError::Serve),
            _ = async {
                ctx.cancelled().await;
                tokio::time::sleep(drain).await;
            } => {
                tracing::warn!(window = ?drain, "Shutdown window elapsed, dropping open connections");
                Ok(())
            }
        };

        self.health.set_ready(false);
        tracing::info!("Handler stopped");
        result
    }
}
