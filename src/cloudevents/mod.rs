//! CloudEvents handling.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → event.rs   (structured JSON or ce-* binary headers → CloudEvent)
//!     → resolve.rs (prefixed types: application-aware cleaner,
//!                   others: builder.rs EventMesh rewrite)
//!     → sender     (always structured JSON)
//! ```

pub mod builder;
pub mod event;
pub mod resolve;

pub use builder::{BuildError, EventMeshBuilder, ORIGINAL_TYPE_EXTENSION};
pub use event::{
    decode, CloudEvent, DecodeError, InvalidEvent, SPEC_VERSION, STRUCTURED_CONTENT_TYPE,
};
pub use resolve::EventResolver;
