//! The legacy application publish API.
//!
//! # Data Flow
//! ```text
//! POST /{application}/v1/events   (JSON body, kebab-case fields)
//!     → types.rs        (PublishRequest)
//!     → transformer.rs  (validate, resolve application, build CloudEvent)
//!     → sender
//!     → types.rs        (PublishResponse or ErrorResponse)
//! ```

pub mod transformer;
pub mod types;

pub use transformer::{LegacyError, LegacyTransformer};
pub use types::{ErrorDetail, ErrorResponse, PublishRequest, PublishResponse};
