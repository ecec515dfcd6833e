//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! environment variables (or an explicit key/value map)
//!     → loader.rs (collect & deserialize)
//!     → validation.rs (semantic checks)
//!     → BackendConfig (validated, immutable)
//!     → shared by value/Arc with every collaborator
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - Required fields have no defaults, so a missing variable fails Init
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_backend_config, load_options, ConfigError, EnvSource};
pub use schema::{BackendConfig, LogFormat, Options};
pub use validation::ValidationError;
