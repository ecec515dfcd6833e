//! Liveness and readiness.
//!
//! # States
//! ```text
//! not ready → ready      once the handler is bound and serving
//! ready → not ready      when shutdown begins
//! ```
//!
//! Liveness is unconditional while the process can answer HTTP.

pub mod checker;

pub use checker::Checker;
