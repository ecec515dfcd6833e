//! Health endpoints.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;

/// Tracks whether the publisher is ready for traffic.
#[derive(Debug, Default)]
pub struct Checker {
    ready: AtomicBool,
}

impl Checker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ready(&self, ready: bool) {
        let was = self.ready.swap(ready, Ordering::AcqRel);
        if was != ready {
            tracing::info!(ready, "Readiness changed");
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}

/// `GET /healthz`
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// `GET /readyz`
pub async fn readiness(State(checker): State<Arc<Checker>>) -> StatusCode {
    if checker.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
