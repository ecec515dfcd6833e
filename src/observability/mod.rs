//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Commander / handler / sender produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters and histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, JSON or console)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) by default for machine parsing
//! - Metric updates go through the `metrics` facade, so they are no-ops
//!   until a recorder is installed (tests never install one)

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::Collector;
