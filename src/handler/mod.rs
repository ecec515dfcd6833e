//! HTTP ingress for publish requests.
//!
//! # Data Flow
//! ```text
//! HttpMessageReceiver (bound TCP listener)
//!     → server.rs  (axum router, body limit, timeout, tracing)
//!     → routes.rs
//!         POST /publish                          → resolve → sender
//!         POST /{application}/v1/events          → legacy → sender
//!         GET  /{application}/v1/events/subscribed → subscribed::Processor
//!         GET  /healthz, /readyz                 → health::Checker
//! ```
//!
//! # Design Decisions
//! - The handler owns no state beyond what the commander hands it
//! - Serving stops when the lifecycle context is cancelled; open
//!   connections get a bounded drain window

pub mod routes;
pub mod server;

pub use routes::AppState;
pub use server::Handler;
