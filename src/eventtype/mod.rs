//! Event type resolution.
//!
//! # Data Flow
//! ```text
//! raw event type ("sap.kyma.custom.my-app.order.created.v1")
//!     → parse.rs   (strip prefix, split application/event/version)
//!     → clean.rs   (resolve application via lister, strip invalid chars)
//!     → parse.rs   (rebuild "prefix.app.event.version")
//!
//! CloudEvents for EventMesh:
//!     → eventmesh.rs (clean source and type segments separately)
//! ```
//!
//! # Design Decisions
//! - Rules sit behind traits so deployments can swap them
//! - Every rule is a pure function of its inputs and the read-only lister
//! - Malformed input yields `CleanError`, never a panic

pub mod clean;
pub mod eventmesh;
pub mod parse;

pub use clean::{clean_name, CleanError, Cleaner, EventTypeCleaner};
pub use eventmesh::{BackendCleaner, EventMeshCleaner};
pub use parse::{build, parse, ParsedType};
