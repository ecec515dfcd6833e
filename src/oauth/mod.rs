//! OAuth2 client-credentials authentication for the backend.
//!
//! # Data Flow
//! ```text
//! sender asks for a bearer token
//!     → client.rs returns the cached token while it is fresh
//!     → otherwise POSTs grant_type=client_credentials to TOKEN_ENDPOINT
//!     → caches the new token until shortly before `expires_in`
//! ```
//!
//! # Design Decisions
//! - One pooled `reqwest::Client`, swapped out on teardown so idle pooled
//!   connections are released without killing in-flight requests
//! - Token requests observe the lifecycle context and abort on cancellation

pub mod client;

pub use client::{AuthClient, AuthError, IdleConnectionGuard};
