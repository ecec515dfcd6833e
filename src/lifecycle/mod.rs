//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! Commander (commander.rs):
//!     init   → load BackendConfig
//!     start  → receiver → auth client → sender → cluster access
//!            → application lister → legacy transformer
//!            → subscription cache sync → cleaners and builder
//!            → handler serves until the context is cancelled
//!     stop   → cancel the context
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → cancel the root context
//! ```
//!
//! # Design Decisions
//! - Everything a start builds shares one child context of the caller's
//! - Cancellation is terminal: a stopped commander cannot start again
//! - Every start failure carries the commander's name

pub mod commander;
pub mod shutdown;
pub mod signals;

pub use commander::{
    Commander, CommanderError, CommanderState, StartError, StopHandle, BACKEND, COMMANDER_NAME,
};
pub use shutdown::LifecycleContext;
